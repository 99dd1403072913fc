//! Physics module
//!
//! Scene queries the camera needs, built without an external physics library.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! # Submodules
//!
//! - [`collision`] - Sphere casts against boxes and spheres, plus the [`SphereCaster`] seam

pub mod collision;

pub use collision::{
    aabb_surface_normal, ray_aabb_intersect, ray_sphere_intersect, CastHit, LayerMask,
    NoCollision, Obstacle, ObstacleSet, ObstacleShape, SphereCastQuery, SphereCaster,
};
