//! Collision probing module
//!
//! Sphere-cast queries used to keep the camera out of scene geometry.
//!
//! The camera controller only depends on the [`SphereCaster`] trait, so a host can answer
//! queries from its own physics scene. [`ObstacleSet`] is a self-contained implementation over
//! axis-aligned boxes and spheres, used by the simulation binary and the tests.
//!
//! # Sphere casts
//!
//! A sphere of radius `r` swept along a ray touches a shape exactly when the ray's centre line
//! touches the shape grown by `r`. Spheres grow exactly (radius + r). Boxes are grown by `r` on
//! every face, which slightly over-reports hits near edges and corners.
//!
//! # Example
//!
//! ```ignore
//! use spring_cam_engine::physics::collision::{
//!     LayerMask, ObstacleSet, SphereCastQuery, SphereCaster,
//! };
//! use glam::Vec3;
//!
//! let mut world = ObstacleSet::new();
//! world.add_box(Vec3::new(-1.0, 0.0, -3.0), Vec3::new(1.0, 2.0, -2.5), LayerMask::DEFAULT);
//!
//! let query = SphereCastQuery::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 0.1, 10.0);
//! if let Some(hit) = world.sphere_cast(&query) {
//!     println!("Hit at distance {}", hit.distance);
//! }
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Bit set of collision layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    /// Layer 0, static world geometry
    pub const DEFAULT: LayerMask = LayerMask(1);
    /// Layer 8, the character's own colliders
    pub const CHARACTER: LayerMask = LayerMask(1 << 8);

    /// Mask containing the single layer `index` (0..32).
    pub const fn layer(index: u32) -> LayerMask {
        LayerMask(1 << (index & 31))
    }

    #[inline]
    pub const fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn without(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 & !other.0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

/// A swept-sphere query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereCastQuery {
    /// Start of the sweep (sphere centre)
    pub origin: Vec3,
    /// Normalized sweep direction
    pub direction: Vec3,
    /// Sphere radius
    pub radius: f32,
    /// Length of the sweep
    pub max_distance: f32,
    /// Layers the query can hit
    pub layer_mask: LayerMask,
}

impl SphereCastQuery {
    /// Query that hits every layer. `direction` is normalized here.
    pub fn new(origin: Vec3, direction: Vec3, radius: f32, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            radius,
            max_distance,
            layer_mask: LayerMask::ALL,
        }
    }

    /// Restrict the query to `layer_mask`.
    pub fn with_layers(mut self, layer_mask: LayerMask) -> Self {
        self.layer_mask = layer_mask;
        self
    }
}

/// Result of a sphere cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// Distance the sphere centre travelled before touching
    pub distance: f32,
    /// Sphere centre at the moment of contact
    pub point: Vec3,
    /// Outward surface normal at the contact
    pub normal: Vec3,
}

/// Anything that can answer sphere-cast queries.
pub trait SphereCaster {
    /// Return the nearest hit within `query.max_distance`, or `None` when the sweep is clear.
    fn sphere_cast(&self, query: &SphereCastQuery) -> Option<CastHit>;
}

impl<F> SphereCaster for F
where
    F: Fn(&SphereCastQuery) -> Option<CastHit>,
{
    fn sphere_cast(&self, query: &SphereCastQuery) -> Option<CastHit> {
        self(query)
    }
}

/// A caster for open space: never hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollision;

impl SphereCaster for NoCollision {
    fn sphere_cast(&self, _query: &SphereCastQuery) -> Option<CastHit> {
        None
    }
}

/// Performs ray-AABB intersection using the slab method.
///
/// # Arguments
///
/// * `ray_origin` - Starting point of the ray
/// * `ray_dir` - Direction of the ray (must be normalized)
/// * `aabb_min` - Minimum corner of the AABB
/// * `aabb_max` - Maximum corner of the AABB
///
/// # Returns
///
/// * `Some(t)` - Distance to the entry point, or `0.0` when the origin is inside the box
/// * `None` - No intersection in front of the origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray_origin[axis];
        let dir = ray_dir[axis];
        if dir.abs() < 1e-10 {
            // Parallel to this slab: must already be between its planes
            if origin < aabb_min[axis] || origin > aabb_max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let t1 = (aabb_min[axis] - origin) * inv;
        let t2 = (aabb_max[axis] - origin) * inv;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
    }

    if t_max >= t_min && t_max >= 0.0 {
        Some(t_min.max(0.0))
    } else {
        None
    }
}

/// Ray-sphere intersection.
///
/// Returns the distance to the first surface crossing in front of the origin, or `0.0` when the
/// origin is already inside the sphere.
pub fn ray_sphere_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    radius: f32,
) -> Option<f32> {
    let to_origin = ray_origin - center;
    let c = to_origin.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let b = to_origin.dot(ray_dir);
    if b > 0.0 {
        // Outside and pointing away
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

/// Computes the outward normal of the AABB face nearest to `point`.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(1e-6));
    let normalized = (point - center) / half_extents;
    let abs_normalized = normalized.abs();

    if abs_normalized.x >= abs_normalized.y && abs_normalized.x >= abs_normalized.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs_normalized.y >= abs_normalized.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}

/// Shape of a single obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Box { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

/// An obstacle with its collision layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub shape: ObstacleShape,
    pub layer: LayerMask,
}

impl Obstacle {
    /// Sphere-cast against this obstacle alone.
    fn cast(&self, query: &SphereCastQuery) -> Option<CastHit> {
        let r = query.radius.max(0.0);
        let distance = match self.shape {
            ObstacleShape::Box { min, max } => {
                let grown_min = min - Vec3::splat(r);
                let grown_max = max + Vec3::splat(r);
                ray_aabb_intersect(query.origin, query.direction, grown_min, grown_max)?
            }
            ObstacleShape::Sphere { center, radius } => {
                ray_sphere_intersect(query.origin, query.direction, center, radius + r)?
            }
        };
        if distance > query.max_distance {
            return None;
        }

        let point = query.origin + query.direction * distance;
        let normal = match self.shape {
            ObstacleShape::Box { min, max } => aabb_surface_normal(point, min, max),
            ObstacleShape::Sphere { center, .. } => (point - center).normalize_or(Vec3::Y),
        };
        Some(CastHit { distance, point, normal })
    }
}

/// Flat list of obstacles answering sphere casts by brute force.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an axis-aligned box. Corners may be given in any order.
    pub fn add_box(&mut self, a: Vec3, b: Vec3, layer: LayerMask) -> &mut Self {
        self.obstacles.push(Obstacle {
            shape: ObstacleShape::Box { min: a.min(b), max: a.max(b) },
            layer,
        });
        self
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32, layer: LayerMask) -> &mut Self {
        self.obstacles.push(Obstacle {
            shape: ObstacleShape::Sphere { center, radius: radius.abs() },
            layer,
        });
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }
}

impl SphereCaster for ObstacleSet {
    fn sphere_cast(&self, query: &SphereCastQuery) -> Option<CastHit> {
        if query.direction == Vec3::ZERO || !(query.max_distance > 0.0) {
            return None;
        }
        self.obstacles
            .iter()
            .filter(|o| o.layer.intersects(query.layer_mask))
            .filter_map(|o| o.cast(query))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
