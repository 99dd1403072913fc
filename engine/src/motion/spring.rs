//! Damped Spring
//!
//! A damped harmonic oscillator over a `Vec3`, used for every procedural camera offset.
//! Position springs drive a local-space offset; rotation springs drive a `(pitch, yaw, roll)`
//! Euler triple in degrees that wraps instead of clamping.
//!
//! # Integration
//!
//! Each axis solves `x'' = -k (x - rest) - c x'` with a backward (implicit) Euler step:
//!
//! ```text
//! v' = (v - dt * k * (x - rest)) / (1 + dt * c + dt^2 * k)
//! x' = x + dt * v'
//! ```
//!
//! The step is unconditionally stable, so a 30 Hz frame cannot blow the spring up, and it never
//! overshoots the rest value once `c >= 2 * sqrt(k)`. With `k = c = 0` the velocity is carried
//! unchanged and the spring degenerates into a plain force accumulator.
//!
//! # Soft Forces
//!
//! `add_force(force, softness)` with `softness > 1` splits the force into `softness` equal
//! portions, one applied to the velocity at the start of each of the next `softness` updates.
//!
//! # Example
//!
//! ```ignore
//! use spring_cam_engine::motion::{Spring, SpringConfig, SpringMode};
//! use glam::Vec3;
//!
//! let mut spring = Spring::new(SpringMode::Position, SpringConfig::critically_damped(120.0));
//! spring.add_force(Vec3::new(0.0, -2.0, 0.0), 4);
//! let offset = spring.update(1.0 / 60.0);
//! ```

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::angles::wrap_euler;
use crate::config::ConfigError;

/// Upper bound on the number of frames a soft force can be spread across.
pub const MAX_SOFT_FORCE_FRAMES: usize = 120;

static_assertions::const_assert!(MAX_SOFT_FORCE_FRAMES > 1);

/// How the spring integrates its value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpringMode {
    /// Linear offset, optionally clamped to `[min_value, max_value]`
    #[default]
    Position,
    /// Euler degrees, each axis wrapped into (-180, 180]
    Rotation,
}

/// Tuning for a single spring.
///
/// Stiffness and damping are per-axis so a spring can, for example, be stiffer vertically.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Spring constant `k` per axis (1/s^2)
    pub stiffness: Vec3,
    /// Damping coefficient `c` per axis (1/s)
    pub damping: Vec3,
    /// Equilibrium value
    pub rest_value: Vec3,
    /// Lower clamp (position springs only)
    pub min_value: Vec3,
    /// Upper clamp (position springs only)
    pub max_value: Vec3,
    /// Whether position updates are clamped to `[min_value, max_value]`
    pub use_min_max: bool,
    /// Optional cap on the velocity magnitude
    pub max_velocity: Option<f32>,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: Vec3::splat(120.0),
            damping: Vec3::splat(22.0),
            rest_value: Vec3::ZERO,
            min_value: Vec3::splat(-1.0),
            max_value: Vec3::splat(1.0),
            use_min_max: false,
            max_velocity: None,
        }
    }
}

impl SpringConfig {
    /// Uniform stiffness and damping on every axis.
    pub fn uniform(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness: Vec3::splat(stiffness),
            damping: Vec3::splat(damping),
            ..Default::default()
        }
    }

    /// Uniform stiffness with exactly critical damping (`c = 2 * sqrt(k)`).
    pub fn critically_damped(stiffness: f32) -> Self {
        let stiffness = stiffness.max(0.0);
        Self::uniform(stiffness, 2.0 * stiffness.sqrt())
    }

    /// A spring with no restoring force and no damping: forces simply accumulate.
    pub fn accumulator() -> Self {
        Self::uniform(0.0, 0.0)
    }

    /// Builder-style rest value.
    pub fn with_rest(mut self, rest_value: Vec3) -> Self {
        self.rest_value = rest_value;
        self
    }

    /// Builder-style clamp range; enables clamping.
    pub fn with_limits(mut self, min_value: Vec3, max_value: Vec3) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self.use_min_max = true;
        self
    }

    /// Check the configuration, reporting the first problem found.
    ///
    /// `field` prefixes the reported field path (e.g. `"position_spring"`).
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let coefficients = [("stiffness", self.stiffness), ("damping", self.damping)];
        for (name, value) in coefficients {
            if !value.is_finite() || value.min_element() < 0.0 {
                return Err(ConfigError::invalid(
                    format!("{field}.{name}"),
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        if !self.rest_value.is_finite() {
            return Err(ConfigError::invalid(format!("{field}.rest_value"), "must be finite"));
        }
        if self.use_min_max && self.min_value.cmpgt(self.max_value).any() {
            return Err(ConfigError::invalid(
                format!("{field}.min_value"),
                format!("min {} exceeds max {}", self.min_value, self.max_value),
            ));
        }
        if let Some(max_velocity) = self.max_velocity {
            if !(max_velocity > 0.0) {
                return Err(ConfigError::invalid(
                    format!("{field}.max_velocity"),
                    "must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Return a copy with every problem `validate` would report repaired.
    ///
    /// The second value is `true` when anything had to change.
    pub fn normalized(&self) -> (Self, bool) {
        let sanitize = |v: Vec3| {
            Vec3::new(
                if v.x.is_finite() { v.x.max(0.0) } else { 0.0 },
                if v.y.is_finite() { v.y.max(0.0) } else { 0.0 },
                if v.z.is_finite() { v.z.max(0.0) } else { 0.0 },
            )
        };
        let mut config = *self;
        config.stiffness = sanitize(self.stiffness);
        config.damping = sanitize(self.damping);
        if !config.rest_value.is_finite() {
            config.rest_value = Vec3::ZERO;
        }
        let min = self.min_value.min(self.max_value);
        let max = self.min_value.max(self.max_value);
        config.min_value = min;
        config.max_value = max;
        config.max_velocity = self.max_velocity.filter(|v| *v > 0.0);
        (config, config != *self)
    }
}

/// Snapshot of a spring's motion, used to carry motion across view switches and reconfiguration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpringState {
    pub value: Vec3,
    pub velocity: Vec3,
}

static_assertions::assert_impl_all!(SpringState: Copy, Send, Sync);

/// Damped spring over a `Vec3`.
#[derive(Clone, Debug)]
pub struct Spring {
    mode: SpringMode,
    config: SpringConfig,
    value: Vec3,
    velocity: Vec3,
    /// Pending per-frame force portions, front is applied on the next update
    soft_forces: VecDeque<Vec3>,
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(SpringMode::Position, SpringConfig::default())
    }
}

impl Spring {
    /// Create a spring at rest.
    ///
    /// An invalid configuration is repaired rather than rejected
    /// (see [`SpringConfig::normalized`]).
    pub fn new(mode: SpringMode, config: SpringConfig) -> Self {
        let config = Self::accept_config(config);
        Self {
            mode,
            config,
            value: config.rest_value,
            velocity: Vec3::ZERO,
            soft_forces: VecDeque::with_capacity(MAX_SOFT_FORCE_FRAMES),
        }
    }

    fn accept_config(config: SpringConfig) -> SpringConfig {
        let (normalized, changed) = config.normalized();
        if changed {
            warn!(?config, ?normalized, "spring configuration normalized");
        }
        normalized
    }

    /// Select the integration mode and clamping, then reset to rest.
    pub fn initialize(&mut self, mode: SpringMode, use_min_max: bool) {
        self.mode = mode;
        self.config.use_min_max = use_min_max;
        self.reset();
    }

    /// Snap to the rest value, zero the velocity and drop every pending soft force.
    pub fn reset(&mut self) {
        self.value = self.config.rest_value;
        self.velocity = Vec3::ZERO;
        self.soft_forces.clear();
    }

    #[inline]
    pub fn mode(&self) -> SpringMode {
        self.mode
    }

    #[inline]
    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    /// Swap the tuning while keeping the current value, velocity and pending forces.
    pub fn set_config(&mut self, config: SpringConfig) {
        self.config = Self::accept_config(config);
        self.value = self.constrain(self.value);
    }

    #[inline]
    pub fn value(&self) -> Vec3 {
        self.value
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn rest_value(&self) -> Vec3 {
        self.config.rest_value
    }

    /// Move the equilibrium point. The value then springs toward it.
    pub fn set_rest_value(&mut self, rest_value: Vec3) {
        if rest_value.is_finite() {
            self.config.rest_value = rest_value;
        } else {
            warn!(%rest_value, "ignoring non-finite spring rest value");
        }
    }

    /// Overwrite the current value (clamped or wrapped per the mode).
    pub fn set_value(&mut self, value: Vec3) {
        if value.is_finite() {
            self.value = self.constrain(value);
        }
    }

    /// Overwrite the current velocity.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        if velocity.is_finite() {
            self.velocity = velocity;
        }
    }

    /// Number of updates that still have a pending soft-force portion.
    #[inline]
    pub fn pending_soft_frames(&self) -> usize {
        self.soft_forces.len()
    }

    /// Capture value and velocity.
    #[inline]
    pub fn state(&self) -> SpringState {
        SpringState {
            value: self.value,
            velocity: self.velocity,
        }
    }

    /// Restore a captured value and velocity exactly.
    pub fn restore(&mut self, state: SpringState) {
        self.set_value(state.value);
        self.set_velocity(state.velocity);
    }

    /// Whether both the displacement from rest and the velocity are within `epsilon`.
    pub fn is_at_rest(&self, epsilon: f32) -> bool {
        self.displacement().abs().max_element() <= epsilon
            && self.velocity.abs().max_element() <= epsilon
            && self.soft_forces.is_empty()
    }

    /// Add an impulse to the velocity.
    ///
    /// With `softness <= 1` the impulse lands immediately. Otherwise it is split into `softness`
    /// equal portions (capped at [`MAX_SOFT_FORCE_FRAMES`]) applied across the next updates, adding
    /// onto any portions already queued.
    pub fn add_force(&mut self, force: Vec3, softness: usize) {
        if !force.is_finite() {
            warn!(%force, "ignoring non-finite spring force");
            return;
        }

        let frames = softness.clamp(1, MAX_SOFT_FORCE_FRAMES);
        if frames == 1 {
            self.velocity += force;
            return;
        }

        let portion = force / frames as f32;
        if self.soft_forces.len() < frames {
            self.soft_forces.resize(frames, Vec3::ZERO);
        }
        for slot in self.soft_forces.iter_mut().take(frames) {
            *slot += portion;
        }
    }

    /// Advance the spring by `dt` seconds and return the new value.
    ///
    /// A zero, negative or non-finite `dt` is a no-op: value, velocity and the soft-force queue
    /// are left untouched.
    pub fn update(&mut self, dt: f32) -> Vec3 {
        if !(dt > 0.0) || !dt.is_finite() {
            trace!(dt, "skipping spring update");
            return self.value;
        }

        if let Some(portion) = self.soft_forces.pop_front() {
            self.velocity += portion;
        }

        let k = self.config.stiffness;
        let c = self.config.damping;
        let displacement = self.displacement();

        let denominator = Vec3::ONE + c * dt + k * (dt * dt);
        self.velocity = (self.velocity - k * displacement * dt) / denominator;

        if let Some(max_velocity) = self.config.max_velocity {
            self.velocity = self.velocity.clamp_length_max(max_velocity);
        }

        self.value += self.velocity * dt;
        self.apply_limits();

        if !self.value.is_finite() || !self.velocity.is_finite() {
            warn!("spring diverged, resetting to rest");
            self.reset();
        }

        self.value
    }

    /// Offset of the value from rest (shortest arc per axis in rotation mode).
    fn displacement(&self) -> Vec3 {
        let raw = self.value - self.config.rest_value;
        match self.mode {
            SpringMode::Position => raw,
            SpringMode::Rotation => wrap_euler(raw),
        }
    }

    fn constrain(&self, value: Vec3) -> Vec3 {
        match self.mode {
            SpringMode::Rotation => wrap_euler(value),
            SpringMode::Position if self.config.use_min_max => {
                value.clamp(self.config.min_value, self.config.max_value)
            }
            SpringMode::Position => value,
        }
    }

    /// Clamp or wrap the value after integration. A clamped axis loses the velocity that pushed
    /// it into the limit.
    fn apply_limits(&mut self) {
        match self.mode {
            SpringMode::Rotation => self.value = wrap_euler(self.value),
            SpringMode::Position if self.config.use_min_max => {
                let min = self.config.min_value;
                let max = self.config.max_value;
                for axis in 0..3 {
                    if self.value[axis] < min[axis] {
                        self.value[axis] = min[axis];
                        self.velocity[axis] = self.velocity[axis].max(0.0);
                    } else if self.value[axis] > max[axis] {
                        self.value[axis] = max[axis];
                        self.velocity[axis] = self.velocity[axis].min(0.0);
                    }
                }
            }
            SpringMode::Position => {}
        }
    }
}
