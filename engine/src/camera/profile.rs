//! View Profiles
//!
//! A view type is plain data: limits and flags consumed by the one generic
//! [`ViewMotionController`](super::ViewMotionController). Variants such as a free-look view are
//! just different profiles, plus an optional [`RotationOverride`] strategy for aim assist or
//! lock-on.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Views of the same family can hand motion to each other when switching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewFamily {
    #[default]
    FirstPerson,
    ThirdPerson,
}

/// Per-view limits and behaviour flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewProfile {
    /// Display name, used in logs
    pub name: String,
    pub family: ViewFamily,
    /// Pitch range `(min, max)` in degrees. A range of 360 or more disables clamping.
    pub pitch_limit: Vec2,
    /// Optional yaw range `(min, max)` in degrees relative to the base rotation
    pub yaw_limit: Option<Vec2>,
    /// How fast yaw past the limit is pulled back (1/s)
    pub yaw_limit_lerp_speed: f32,
    /// Base rotation copies the character rotation every tick
    pub rotate_with_character: bool,
    /// Blend the head bone's pitch into the final rotation
    pub rotate_with_head: bool,
    /// Blend rate toward a rotation override (1/s)
    pub secondary_rotation_speed: f32,
}

impl Default for ViewProfile {
    fn default() -> Self {
        Self::first_person()
    }
}

impl ViewProfile {
    /// Standard first-person view: the character turns with the camera.
    pub fn first_person() -> Self {
        Self {
            name: "first_person".to_string(),
            family: ViewFamily::FirstPerson,
            pitch_limit: Vec2::new(-72.0, 72.0),
            yaw_limit: None,
            yaw_limit_lerp_speed: 12.0,
            rotate_with_character: false,
            rotate_with_head: false,
            secondary_rotation_speed: 8.0,
        }
    }

    /// Free-look view: the camera follows the character and can look around within a yaw cone.
    pub fn free_look() -> Self {
        Self {
            name: "free_look".to_string(),
            yaw_limit: Some(Vec2::new(-110.0, 110.0)),
            rotate_with_character: true,
            ..Self::first_person()
        }
    }

    /// Whether the pitch range is narrow enough to clamp.
    #[inline]
    pub fn clamps_pitch(&self) -> bool {
        self.pitch_limit.y - self.pitch_limit.x < 360.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pitch_limit.is_finite() || self.pitch_limit.x > self.pitch_limit.y {
            return Err(ConfigError::invalid(
                "profile.pitch_limit",
                format!("min must not exceed max, got {}", self.pitch_limit),
            ));
        }
        if self.clamps_pitch() && (self.pitch_limit.x < -180.0 || self.pitch_limit.y > 180.0) {
            return Err(ConfigError::invalid(
                "profile.pitch_limit",
                format!("a clamped range must lie within [-180, 180], got {}", self.pitch_limit),
            ));
        }
        if let Some(yaw) = self.yaw_limit {
            if !yaw.is_finite() || yaw.x > yaw.y || yaw.x < -180.0 || yaw.y > 180.0 {
                return Err(ConfigError::invalid(
                    "profile.yaw_limit",
                    format!("must be an ordered range within [-180, 180], got {yaw}"),
                ));
            }
        }
        if !(self.yaw_limit_lerp_speed >= 0.0) || !(self.secondary_rotation_speed >= 0.0) {
            return Err(ConfigError::invalid("profile", "lerp speeds must be non-negative"));
        }
        Ok(())
    }

    /// Order the limit ranges, keep clamped ranges within [-180, 180] and zero negative speeds.
    /// The flag reports whether anything changed.
    pub fn normalized(&self) -> (Self, bool) {
        let ordered = |v: Vec2| Vec2::new(v.x.min(v.y), v.x.max(v.y));
        let half_turn = |v: Vec2| v.clamp(Vec2::splat(-180.0), Vec2::splat(180.0));
        let speed = |s: f32| if s >= 0.0 { s } else { 0.0 };

        let mut profile = self.clone();
        profile.pitch_limit = if self.pitch_limit.is_finite() {
            ordered(self.pitch_limit)
        } else {
            Self::first_person().pitch_limit
        };
        if profile.clamps_pitch() {
            profile.pitch_limit = half_turn(profile.pitch_limit);
        }
        profile.yaw_limit = self
            .yaw_limit
            .filter(|yaw| yaw.is_finite())
            .map(|yaw| half_turn(ordered(yaw)));
        profile.yaw_limit_lerp_speed = speed(self.yaw_limit_lerp_speed);
        profile.secondary_rotation_speed = speed(self.secondary_rotation_speed);

        let changed = profile != *self;
        (profile, changed)
    }
}

/// Strategy that can take over the camera rotation, e.g. aim assist or lock-on.
pub trait RotationOverride {
    /// Given the camera position and the rotation about to be produced, return the rotation to
    /// steer toward, or `None` to leave the player in control.
    fn override_rotation(&mut self, position: Vec3, rotation: Quat) -> Option<Quat>;
}

impl<F> RotationOverride for F
where
    F: FnMut(Vec3, Quat) -> Option<Quat>,
{
    fn override_rotation(&mut self, position: Vec3, rotation: Quat) -> Option<Quat> {
        self(position, rotation)
    }
}

/// Steers toward a fixed world point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockOnTarget {
    pub target: Vec3,
}

impl RotationOverride for LockOnTarget {
    fn override_rotation(&mut self, position: Vec3, _rotation: Quat) -> Option<Quat> {
        let direction = (self.target - position).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        Some(Quat::from_rotation_arc(Vec3::NEG_Z, direction))
    }
}
