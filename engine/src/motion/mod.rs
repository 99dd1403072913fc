//! Motion Module
//!
//! Numeric building blocks for procedural camera motion: damped springs, a smoothing
//! buffer and degree-based angle helpers. Nothing here knows about cameras.

pub mod angles;
pub mod offset_buffer;
pub mod spring;

pub use angles::{
    clamp_angle, delta_angle, euler_to_quat, lerp_angle, quat_to_euler, wrap_angle, wrap_euler,
};
pub use offset_buffer::{SmoothedOffsetBuffer, DEFAULT_OFFSET_SAMPLES};
pub use spring::{Spring, SpringConfig, SpringMode, SpringState, MAX_SOFT_FORCE_FRAMES};
