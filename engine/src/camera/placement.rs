//! Camera placement
//!
//! Final position resolution for the first-person camera: the look-down offset that keeps the
//! camera out of the character's own chest, and the sphere-cast that pulls the camera in front of
//! walls.
//!
//! The probe runs from the anchor raised to camera height toward the candidate position, so it
//! only sweeps the part of the offset that the springs and look-down push sideways or forward.
//! On a hit the camera stops `near_clip_plane` short of the contact.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::collision::{LayerMask, SphereCastQuery, SphereCaster};

/// Camera collision tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub enabled: bool,
    /// Radius of the swept sphere (meters)
    pub radius: f32,
    /// Distance kept between the camera and the hit (meters)
    pub near_clip_plane: f32,
    /// Layers the camera collides with
    pub collision_layers: LayerMask,
    /// The character's own layer, always excluded
    pub character_layer: LayerMask,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.05,
            near_clip_plane: 0.03,
            collision_layers: LayerMask::ALL,
            character_layer: LayerMask::CHARACTER,
        }
    }
}

/// Offset applied while looking steeply down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookDownConfig {
    /// Degrees below the horizon where the offset starts
    pub start_angle: f32,
    /// Degrees below the horizon where the full offset applies
    pub full_angle: f32,
    /// Full offset in the camera's yaw frame (-Z forward)
    pub offset: Vec3,
}

impl Default for LookDownConfig {
    fn default() -> Self {
        Self {
            start_angle: 30.0,
            full_angle: 72.0,
            offset: Vec3::new(0.0, -0.06, -0.12),
        }
    }
}

/// Look-down offset for the given pitch (degrees, negative looks down).
pub fn look_down_offset(pitch: f32, config: &LookDownConfig) -> Vec3 {
    let below = -pitch;
    if !(below > config.start_angle) {
        return Vec3::ZERO;
    }
    let span = (config.full_angle - config.start_angle).max(f32::EPSILON);
    config.offset * ((below - config.start_angle) / span).clamp(0.0, 1.0)
}

/// Outcome of resolving the camera position against the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Where the camera ends up
    pub position: Vec3,
    /// Where the camera wanted to be
    pub target: Vec3,
    /// Start of the collision probe
    pub origin: Vec3,
    /// Whether the probe was blocked
    pub obstructed: bool,
}

/// Pull `target` back toward `origin` when the sweep between them is blocked.
pub fn resolve_position(
    origin: Vec3,
    target: Vec3,
    config: &CollisionConfig,
    caster: &dyn SphereCaster,
) -> Placement {
    let unobstructed = Placement {
        position: target,
        target,
        origin,
        obstructed: false,
    };
    if !config.enabled {
        return unobstructed;
    }

    let to_target = target - origin;
    let distance = to_target.length();
    if !(distance > 1e-5) || !distance.is_finite() {
        return unobstructed;
    }
    let direction = to_target / distance;
    let near_clip = config.near_clip_plane.max(0.0);

    let radius = config.radius.max(0.0);
    let query = SphereCastQuery::new(origin, direction, radius, distance + near_clip)
        .with_layers(config.collision_layers.without(config.character_layer));

    match caster.sphere_cast(&query) {
        Some(hit) if hit.distance.is_finite() && hit.distance - near_clip < distance => Placement {
            position: origin + direction * (hit.distance - near_clip).max(0.0),
            target,
            origin,
            obstructed: true,
        },
        _ => unobstructed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::{CastHit, NoCollision, ObstacleSet};

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_look_down_zero_when_level() {
        assert_eq!(look_down_offset(0.0, &LookDownConfig::default()), Vec3::ZERO);
        assert_eq!(look_down_offset(45.0, &LookDownConfig::default()), Vec3::ZERO);
    }

    #[test]
    fn test_look_down_scales_with_pitch() {
        let config = LookDownConfig::default();
        let half = look_down_offset(-(config.start_angle + config.full_angle) * 0.5, &config);
        let full = look_down_offset(-90.0, &config);
        assert!((half - config.offset * 0.5).length() < EPSILON);
        assert!((full - config.offset).length() < EPSILON);
    }

    #[test]
    fn test_clear_path_keeps_target() {
        let target = Vec3::new(0.0, 1.6, -0.3);
        let origin = Vec3::new(0.0, 1.6, 0.0);
        let placement =
            resolve_position(origin, target, &CollisionConfig::default(), &NoCollision);
        assert_eq!(placement.position, target);
        assert!(!placement.obstructed);
    }

    #[test]
    fn test_hit_pulls_back_by_near_clip() {
        let config = CollisionConfig::default();
        let caster = |q: &SphereCastQuery| {
            Some(CastHit {
                distance: 0.2,
                point: q.origin + q.direction * 0.2,
                normal: -q.direction,
            })
        };
        let placement = resolve_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), &config, &caster);
        assert!(placement.obstructed);
        assert!((placement.position.length() - (0.2 - config.near_clip_plane)).abs() < EPSILON);
    }

    #[test]
    fn test_hit_inside_near_clip_clamps_to_origin() {
        let caster = |q: &SphereCastQuery| {
            Some(CastHit {
                distance: 0.0,
                point: q.origin,
                normal: -q.direction,
            })
        };
        let origin = Vec3::new(1.0, 2.0, 3.0);
        let config = CollisionConfig::default();
        let placement = resolve_position(origin, origin + Vec3::X, &config, &caster);
        assert_eq!(placement.position, origin);
    }

    #[test]
    fn test_character_layer_excluded() {
        let mut world = ObstacleSet::new();
        world.add_sphere(Vec3::new(0.0, 0.0, -0.5), 0.2, LayerMask::CHARACTER);
        let target = Vec3::new(0.0, 0.0, -1.0);
        let placement = resolve_position(Vec3::ZERO, target, &CollisionConfig::default(), &world);
        assert_eq!(placement.position, target);
    }

    #[test]
    fn test_disabled_collision_ignores_hits() {
        let mut world = ObstacleSet::new();
        world.add_sphere(Vec3::new(0.0, 0.0, -0.5), 0.2, LayerMask::DEFAULT);
        let config = CollisionConfig {
            enabled: false,
            ..Default::default()
        };
        let target = Vec3::new(0.0, 0.0, -1.0);
        assert_eq!(resolve_position(Vec3::ZERO, target, &config, &world).position, target);
    }
}
