//! Config Module
//!
//! Tuning data for the view motion model and the errors raised when loading it.

pub mod error;
pub mod motion_config;

pub use error::ConfigError;
pub use motion_config::{LandingConfig, MotionConfig};
