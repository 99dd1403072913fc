//! Procedural Motion Generators
//!
//! Sources of procedural camera motion that feed the view springs:
//!
//! - [`BobGenerator`] - footstep bob keyed to horizontal speed, with a trough impulse once
//!   per cycle
//! - [`sway_force`] - roll/pitch from the character's local velocity
//! - [`ShakeGenerator`] - Perlin noise shake with an event-driven trauma boost
//!
//! Generators only produce forces. The controller decides which spring receives them.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use noise::{NoiseFn, Perlin};

// ============================================================================
// Bob
// ============================================================================

/// Footstep bob tuning.
///
/// The bob phase advances with distance travelled, so rates are cycles per meter. Amplitudes
/// are force rates (velocity change per second) at full input speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BobConfig {
    /// Positional cycles per meter on each axis
    pub positional_rate: Vec3,
    /// Positional force amplitude on each axis
    pub positional_amplitude: Vec3,
    /// Roll cycles per meter
    pub roll_rate: f32,
    /// Roll force amplitude (degrees/s^2)
    pub roll_amplitude: f32,
    /// Multiplier on horizontal speed before it drives the bob
    pub input_velocity_scale: f32,
    /// Scaled speed at which the bob reaches full amplitude
    pub max_input_velocity: f32,
    /// Vertical offset the bob wave must dip below for a trough impulse
    pub min_trough_vertical_offset: f32,
    /// Impulse added to the position spring at each trough
    pub trough_force: Vec3,
    /// Bob only while grounded
    pub require_ground_contact: bool,
}

impl Default for BobConfig {
    fn default() -> Self {
        Self {
            positional_rate: Vec3::new(0.45, 0.9, 0.0),
            positional_amplitude: Vec3::new(0.35, 0.7, 0.0),
            roll_rate: 0.45,
            roll_amplitude: 18.0,
            input_velocity_scale: 1.0,
            max_input_velocity: 6.0,
            min_trough_vertical_offset: -0.35,
            trough_force: Vec3::new(0.0, -0.04, 0.0),
            require_ground_contact: true,
        }
    }
}

/// Forces produced by one bob step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BobOutput {
    /// Positional force rate (scale by `dt` before applying)
    pub position_force: Vec3,
    /// Roll force rate in degrees (scale by `dt` before applying)
    pub roll_force: f32,
    /// Impulse to apply once, set on the frame the vertical wave bottoms out
    pub trough: Option<Vec3>,
}

/// Footstep bob state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BobGenerator {
    /// Positional wave phases in cycles, each in [0, 1)
    phase: Vec3,
    /// Roll wave phase in cycles, in [0, 1)
    roll_phase: f32,
    /// Vertical wave on the previous step
    last_vertical: f32,
    descending: bool,
}

impl BobGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional wave phases in cycles.
    #[inline]
    pub fn phase(&self) -> Vec3 {
        self.phase
    }

    #[inline]
    pub fn roll_phase(&self) -> f32 {
        self.roll_phase
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the bob by `dt` at the given horizontal speed.
    pub fn update(
        &mut self,
        dt: f32,
        horizontal_speed: f32,
        grounded: bool,
        config: &BobConfig,
    ) -> BobOutput {
        if !(dt > 0.0) {
            return BobOutput::default();
        }

        let mut speed = (horizontal_speed * config.input_velocity_scale)
            .clamp(0.0, config.max_input_velocity.max(0.0));
        if config.require_ground_contact && !grounded {
            speed = 0.0;
        }
        let weight = if config.max_input_velocity > 0.0 {
            speed / config.max_input_velocity
        } else {
            0.0
        };

        // Each wave wraps its own phase in cycles
        let travelled = speed * dt;
        self.phase = (self.phase + config.positional_rate * travelled).rem_euclid(Vec3::ONE);
        self.roll_phase = (self.roll_phase + config.roll_rate * travelled).rem_euclid(1.0);

        let wave = |cycles: f32| (cycles * TAU).sin();
        let position_force = Vec3::new(wave(self.phase.x), wave(self.phase.y), wave(self.phase.z))
            * config.positional_amplitude
            * weight;
        let roll_force = wave(self.roll_phase) * config.roll_amplitude * weight;

        let vertical = position_force.y;
        let mut trough = None;
        if vertical < self.last_vertical {
            self.descending = true;
        } else if self.descending && vertical > self.last_vertical {
            // Wave turned upward: the previous sample was the bottom of this cycle
            self.descending = false;
            let contact = grounded || !config.require_ground_contact;
            if contact && self.last_vertical <= config.min_trough_vertical_offset {
                trough = Some(config.trough_force);
            }
        }
        self.last_vertical = vertical;

        BobOutput {
            position_force,
            roll_force,
            trough,
        }
    }
}

// ============================================================================
// Sway
// ============================================================================

/// Velocity sway tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayConfig {
    /// Roll force rate per m/s of lateral velocity (degrees/s^2)
    pub roll_per_velocity: f32,
    /// Pitch force rate per m/s of forward velocity (degrees/s^2)
    pub pitch_per_velocity: f32,
    /// Local speed above which sway stops growing (m/s)
    pub max_velocity: f32,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            roll_per_velocity: 4.0,
            pitch_per_velocity: 0.0,
            max_velocity: 8.0,
        }
    }
}

/// Rotation force rate from the camera-local velocity (scale by `dt` before applying).
///
/// Moving right (+X) rolls the view to the left; moving forward (-Z) dips the pitch.
pub fn sway_force(local_velocity: Vec3, config: &SwayConfig) -> Vec3 {
    if !local_velocity.is_finite() {
        return Vec3::ZERO;
    }
    let limited = local_velocity.clamp_length_max(config.max_velocity.max(0.0));
    Vec3::new(
        limited.z * config.pitch_per_velocity,
        0.0,
        -limited.x * config.roll_per_velocity,
    )
}

// ============================================================================
// Shake
// ============================================================================

/// Shake tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    /// Noise lattice units travelled per second
    pub speed: f32,
    /// Idle shake amplitude `(yaw, pitch)` in degrees
    pub amplitude: Vec2,
    /// Extra amplitude at full trauma `(yaw, pitch)` in degrees
    pub trauma_amplitude: Vec2,
    /// Trauma lost per second
    pub trauma_decay: f32,
    /// Roll impulse per degree of yaw shake
    pub roll_factor: f32,
    /// Perlin permutation seed
    pub seed: u32,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            speed: 8.0,
            amplitude: Vec2::ZERO,
            trauma_amplitude: Vec2::new(4.0, 3.0),
            trauma_decay: 1.5,
            roll_factor: 2.0,
            seed: 0x5eed,
        }
    }
}

/// Perlin rows sampled for the yaw and pitch channels. Off the integer lattice, where Perlin
/// noise is always zero.
const YAW_ROW: f64 = 0.5;
const PITCH_ROW: f64 = 7.5;

/// Shake state. `Copy` so it can be handed to another view on a switch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShakeGenerator {
    /// Position along the noise rows, kept in f64 so it never needs wrapping
    noise_time: f64,
    trauma: f32,
    /// Current shake `(yaw, pitch)` in degrees
    current: Vec2,
}

impl ShakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current shake offset `(yaw, pitch)` in degrees.
    #[inline]
    pub fn shake(&self) -> Vec2 {
        self.current
    }

    #[inline]
    pub fn trauma(&self) -> f32 {
        self.trauma
    }

    /// Add trauma, saturating at 1.
    pub fn add_trauma(&mut self, amount: f32) {
        if amount.is_finite() {
            self.trauma = (self.trauma + amount).clamp(0.0, 1.0);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the shake and return how much it moved `(yaw, pitch)` since the last step.
    pub fn update(&mut self, dt: f32, config: &ShakeConfig) -> Vec2 {
        if !(dt > 0.0) {
            return Vec2::ZERO;
        }

        self.trauma = (self.trauma - config.trauma_decay.max(0.0) * dt).max(0.0);
        self.noise_time += f64::from(dt * config.speed.max(0.0));

        let amplitude = config.amplitude + config.trauma_amplitude * (self.trauma * self.trauma);
        let next = if amplitude == Vec2::ZERO {
            Vec2::ZERO
        } else {
            let perlin = Perlin::new(config.seed);
            let t = self.noise_time;
            let sample = |row: f64| (perlin.get([t, row]) as f32).clamp(-1.0, 1.0);
            Vec2::new(sample(YAW_ROW), sample(PITCH_ROW)) * amplitude
        };

        let delta = next - self.current;
        self.current = next;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_bob_idle_produces_nothing() {
        let mut bob = BobGenerator::new();
        let out = bob.update(DT, 0.0, true, &BobConfig::default());
        assert_eq!(out.position_force, Vec3::ZERO);
        assert_eq!(out.roll_force, 0.0);
        assert!(out.trough.is_none());
    }

    #[test]
    fn test_bob_requires_ground() {
        let mut bob = BobGenerator::new();
        for _ in 0..120 {
            let out = bob.update(DT, 5.0, false, &BobConfig::default());
            assert_eq!(out.position_force, Vec3::ZERO);
        }
        assert_eq!(bob.phase(), Vec3::ZERO);
        assert_eq!(bob.roll_phase(), 0.0);
    }

    #[test]
    fn test_bob_trough_once_per_cycle() {
        let config = BobConfig::default();
        let mut bob = BobGenerator::new();
        let mut troughs = 0;

        // 6 m/s for 10 s = 60 m, vertical rate 0.9 cycles/m = 54 cycles
        for _ in 0..600 {
            if bob.update(DT, 6.0, true, &config).trough.is_some() {
                troughs += 1;
            }
        }
        assert!((52..=55).contains(&troughs), "troughs = {troughs}");
    }

    #[test]
    fn test_bob_slow_walk_skips_trough() {
        let config = BobConfig::default();
        let mut bob = BobGenerator::new();
        // Weight 0.25 keeps the wave above the -0.35 threshold (amplitude 0.7 * 0.25)
        for _ in 0..600 {
            assert!(bob.update(DT, 1.5, true, &config).trough.is_none());
        }
    }

    #[test]
    fn test_sway_rolls_against_lateral_motion() {
        let force = sway_force(Vec3::new(2.0, 0.0, 0.0), &SwayConfig::default());
        assert!(force.z < 0.0);
        assert_eq!(force.x, 0.0);
    }

    #[test]
    fn test_sway_limited_by_max_velocity() {
        let config = SwayConfig::default();
        let fast = sway_force(Vec3::new(100.0, 0.0, 0.0), &config);
        let capped = sway_force(Vec3::new(config.max_velocity, 0.0, 0.0), &config);
        assert!((fast.z - capped.z).abs() < 0.001);
    }

    #[test]
    fn test_shake_disabled_without_amplitude_or_trauma() {
        let mut shake = ShakeGenerator::new();
        for _ in 0..60 {
            assert_eq!(shake.update(DT, &ShakeConfig::default()), Vec2::ZERO);
        }
    }

    #[test]
    fn test_shake_deltas_sum_to_current() {
        let config = ShakeConfig::default();
        let mut shake = ShakeGenerator::new();
        shake.add_trauma(1.0);

        let mut total = Vec2::ZERO;
        for _ in 0..90 {
            total += shake.update(DT, &config);
        }
        assert!((total - shake.shake()).length() < 0.001);
        assert!(shake.shake().x.abs() <= config.trauma_amplitude.x + 0.001);
    }

    #[test]
    fn test_bob_phase_wraps_without_jump() {
        let config = BobConfig {
            positional_rate: Vec3::new(0.37, 0.91, 0.0),
            roll_rate: 0.53,
            ..BobConfig::default()
        };
        let mut bob = BobGenerator::new();
        let mut previous = bob.update(DT, 6.0, true, &config).position_force;
        // 6 m/s for 5 minutes = 1.8 km, many wraps of every wave
        for _ in 0..18_000 {
            let force = bob.update(DT, 6.0, true, &config).position_force;
            // At most one step of the fastest wave: 2 pi * 0.91 cycles/m * 0.1 m * 0.7
            assert!((force - previous).abs().max_element() < 0.45, "jump {previous} -> {force}");
            previous = force;
        }
        assert!(bob.phase().cmplt(Vec3::ONE).all() && bob.phase().cmpge(Vec3::ZERO).all());
        assert!((0.0..1.0).contains(&bob.roll_phase()));
    }

    #[test]
    fn test_idle_shake_is_smooth() {
        let config = ShakeConfig {
            speed: 2.0,
            amplitude: Vec2::splat(1.0),
            ..ShakeConfig::default()
        };
        let mut shake = ShakeGenerator::new();
        let mut moved = false;
        for _ in 0..(20 * 60) {
            let delta = shake.update(DT, &config);
            assert!(delta.abs().max_element() < 0.5, "delta {delta}");
            moved |= delta != Vec2::ZERO;
        }
        assert!(moved);
    }

    #[test]
    fn test_trauma_decays() {
        let config = ShakeConfig::default();
        let mut shake = ShakeGenerator::new();
        shake.add_trauma(5.0);
        assert_eq!(shake.trauma(), 1.0);

        for _ in 0..120 {
            shake.update(DT, &config);
        }
        assert_eq!(shake.trauma(), 0.0);
    }
}
