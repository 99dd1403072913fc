//! Camera Module
//!
//! First-person view motion: anchors, profiles, procedural effects, collision-aware placement
//! and the controllers that combine them. This module is window-system agnostic - it only deals
//! with camera state and math.

pub mod anchor;
pub mod placement;
pub mod procedural;
pub mod profile;
pub mod rig;
pub mod view_motion;

pub use anchor::{AnchorProvider, BoneAnchor, BonePose, RootAnchor};
pub use placement::{look_down_offset, resolve_position, CollisionConfig, LookDownConfig, Placement};
pub use procedural::{
    sway_force, BobConfig, BobGenerator, BobOutput, ShakeConfig, ShakeGenerator, SwayConfig,
};
pub use profile::{LockOnTarget, RotationOverride, ViewFamily, ViewProfile};
pub use rig::ViewRig;
pub use view_motion::{CharacterState, MotionHandoff, ViewMotionController, ViewTransform};
