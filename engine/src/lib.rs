//! Spring Camera Engine Library
//!
//! A damped-spring first-person camera motion model. Look input, locomotion and discrete
//! character events are turned into a camera transform with bob, sway, shake, landing impacts,
//! leaning and recoil, then pulled out of scene geometry with a sphere-cast.
//!
//! # Modules
//!
//! - [`motion`] - Springs, the smoothed offset buffer and angle helpers
//! - [`camera`] - View profiles, procedural effects, placement and the view controllers
//! - [`physics`] - Sphere-cast collision queries
//! - [`events`] - View events and the subscription bus
//! - [`config`] - Serde tuning data and config errors
//! - [`clock`] - Frame counter and scaled delta time
//!
//! # Example
//!
//! ```ignore
//! use spring_cam_engine::camera::{CharacterState, ViewMotionController, ViewProfile};
//! use spring_cam_engine::clock::FrameClock;
//! use spring_cam_engine::config::MotionConfig;
//! use spring_cam_engine::physics::NoCollision;
//! use glam::Vec2;
//!
//! let mut view = ViewMotionController::new(ViewProfile::first_person(), MotionConfig::default());
//! let mut clock = FrameClock::new();
//!
//! let time = clock.tick(1.0 / 60.0);
//! view.begin_tick(time.frame, CharacterState::default());
//! let transform = view.update(Vec2::new(2.0, -1.0), time.delta, &NoCollision);
//! ```

pub mod camera;
pub mod clock;
pub mod config;
pub mod events;
pub mod motion;
pub mod physics;

pub use camera::{CharacterState, ViewMotionController, ViewProfile, ViewRig, ViewTransform};
pub use clock::{FrameClock, FrameTime};
pub use config::{ConfigError, MotionConfig};
pub use events::{EventBus, ViewEvent, ViewEventHandler};
pub use motion::{SmoothedOffsetBuffer, Spring, SpringConfig, SpringMode, SpringState};
