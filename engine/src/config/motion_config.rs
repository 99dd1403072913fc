//! Motion Configuration
//!
//! Every tuning constant of the first-person view model in one serde-friendly struct.
//! `Default` gives a grounded walking feel; JSON files may override any subset of fields.
//!
//! # Example
//!
//! ```ignore
//! use spring_cam_engine::config::MotionConfig;
//!
//! let config = MotionConfig::load("motion.json")?;
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::camera::placement::{CollisionConfig, LookDownConfig};
use crate::camera::procedural::{BobConfig, ShakeConfig, SwayConfig};
use crate::motion::spring::SpringConfig;

/// Impulses applied when the character lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingConfig {
    /// Downward position impulse per meter fallen
    pub position_fall_impact: f32,
    /// Frames the position impulse is spread over
    pub position_fall_impact_softness: usize,
    /// Roll impulse (degrees/s) per meter fallen, random sign
    pub rotation_fall_impact: f32,
    /// Frames the roll impulse is spread over
    pub rotation_fall_impact_softness: usize,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            position_fall_impact: 1.0,
            position_fall_impact_softness: 4,
            rotation_fall_impact: 6.0,
            rotation_fall_impact_softness: 6,
        }
    }
}

/// Full tuning of a view motion controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Camera rest offset from the anchor, in the camera's yaw frame
    pub look_offset: Vec3,
    pub position_spring: SpringConfig,
    pub rotation_spring: SpringConfig,
    pub secondary_position_spring: SpringConfig,
    pub secondary_rotation_spring: SpringConfig,
    pub bob: BobConfig,
    pub sway: SwayConfig,
    pub shake: ShakeConfig,
    pub landing: LandingConfig,
    pub look_down: LookDownConfig,
    pub collision: CollisionConfig,
    /// Head-bone samples averaged by the smoothing buffer
    pub smooth_head_offset_samples: usize,
    /// Rate the height adjustment approaches its target (1/s)
    pub vertical_offset_lerp_speed: f32,
    /// Rate the base rotation realigns to the character's up vector (1/s)
    pub alignment_speed: f32,
    /// Seed for the landing roll direction
    pub seed: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            look_offset: Vec3::new(0.0, 0.12, -0.1),
            position_spring: SpringConfig {
                stiffness: Vec3::new(180.0, 140.0, 180.0),
                damping: Vec3::new(27.0, 24.0, 27.0),
                ..SpringConfig::default()
            }
            .with_limits(Vec3::new(-0.5, -0.6, -0.5), Vec3::new(0.5, 0.4, 0.5)),
            rotation_spring: SpringConfig::critically_damped(90.0),
            secondary_position_spring: SpringConfig::critically_damped(600.0),
            secondary_rotation_spring: SpringConfig::critically_damped(400.0),
            bob: BobConfig::default(),
            sway: SwayConfig::default(),
            shake: ShakeConfig::default(),
            landing: LandingConfig::default(),
            look_down: LookDownConfig::default(),
            collision: CollisionConfig::default(),
            smooth_head_offset_samples: 2,
            vertical_offset_lerp_speed: 6.0,
            alignment_speed: 10.0,
            seed: 0x5eed,
        }
    }
}

impl MotionConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MotionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value, reporting the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.look_offset.is_finite() {
            return Err(ConfigError::invalid("look_offset", "must be finite"));
        }
        self.position_spring.validate("position_spring")?;
        self.rotation_spring.validate("rotation_spring")?;
        self.secondary_position_spring.validate("secondary_position_spring")?;
        self.secondary_rotation_spring.validate("secondary_rotation_spring")?;

        if self.smooth_head_offset_samples == 0 {
            return Err(ConfigError::invalid("smooth_head_offset_samples", "must be at least 1"));
        }

        let non_negative = [
            ("bob.max_input_velocity", self.bob.max_input_velocity),
            ("bob.input_velocity_scale", self.bob.input_velocity_scale),
            ("sway.max_velocity", self.sway.max_velocity),
            ("shake.speed", self.shake.speed),
            ("shake.trauma_decay", self.shake.trauma_decay),
            ("landing.position_fall_impact", self.landing.position_fall_impact),
            ("landing.rotation_fall_impact", self.landing.rotation_fall_impact),
            ("collision.radius", self.collision.radius),
            ("collision.near_clip_plane", self.collision.near_clip_plane),
            ("vertical_offset_lerp_speed", self.vertical_offset_lerp_speed),
            ("alignment_speed", self.alignment_speed),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }

        if self.look_down.full_angle < self.look_down.start_angle {
            return Err(ConfigError::invalid(
                "look_down.full_angle",
                "must not be below look_down.start_angle",
            ));
        }
        Ok(())
    }
}
