//! View Motion Controller
//!
//! Drives a first-person camera from look input, character locomotion and discrete events.
//! Four springs carry all procedural motion:
//!
//! - primary position / rotation - bob, sway, landing, lean and shake roll
//! - secondary position / rotation - stiff, short-lived kicks such as recoil
//!
//! Each tick the host calls [`begin_tick`](ViewMotionController::begin_tick), then
//! [`rotate`](ViewMotionController::rotate), then
//! [`move_camera`](ViewMotionController::move_camera) (or [`update`](ViewMotionController::update)
//! for both).
//!
//! # Rotation
//!
//! ```text
//! rotation = base * euler(pitch + shake, yaw + shake, 0)
//!          * rotation_spring * secondary_rotation_spring * head
//! ```
//!
//! `base` is the character-relative reference frame. It follows moving platforms and realigns to
//! the character's up vector. Look input is clamped to the profile limits; the shake rides on
//! top of the clamped angles and never feeds back into them.
//!
//! # Position
//!
//! The camera hangs from the anchor (head bone, or the character root when there is none) at
//! `look_offset` plus both position springs, the height adjustment, the smoothed head-bone
//! motion and the look-down offset. A sphere-cast then pulls it in front of any obstruction.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut view = ViewMotionController::new(ViewProfile::first_person(), MotionConfig::default());
//! view.attach_to_anchor(Some(head_bone.clone()));
//!
//! // Each frame:
//! view.begin_tick(time.frame, character_state);
//! let transform = view.update(look_delta, time.delta, &scene);
//! ```

use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use super::anchor::AnchorProvider;
use super::placement::{look_down_offset, resolve_position, Placement};
use super::procedural::{sway_force, BobGenerator, ShakeGenerator};
use super::profile::{RotationOverride, ViewFamily, ViewProfile};
use crate::config::MotionConfig;
use crate::events::{ViewEvent, ViewEventHandler};
use crate::motion::angles::{
    clamp_angle, euler_to_quat, lerp, lerp_angle, quat_to_euler, wrap_angle,
};
use crate::motion::offset_buffer::SmoothedOffsetBuffer;
use crate::motion::spring::{Spring, SpringConfig, SpringMode, SpringState};
use crate::physics::collision::SphereCaster;

/// Per-tick locomotion state of the character the camera belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterState {
    /// Root position in world space
    pub position: Vec3,
    /// Root rotation in world space
    pub rotation: Quat,
    /// World-space velocity (m/s)
    pub velocity: Vec3,
    pub grounded: bool,
    /// Character up direction (gravity opposite)
    pub up: Vec3,
    /// Rotation the moving platform applied since the previous tick
    pub platform_rotation_delta: Quat,
    pub on_moving_platform: bool,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            grounded: true,
            up: Vec3::Y,
            platform_rotation_delta: Quat::IDENTITY,
            on_moving_platform: false,
        }
    }
}

/// Camera transform produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Motion carried from an outgoing view to the incoming one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionHandoff {
    pub family: ViewFamily,
    /// Look angles in degrees, without shake
    pub pitch: f32,
    pub yaw: f32,
    pub base_rotation: Quat,
    pub position_spring: SpringState,
    pub rotation_spring: SpringState,
    pub shake: ShakeGenerator,
}

/// Spring states captured around a configuration change.
#[derive(Debug, Clone, Copy)]
struct SpringSnapshot {
    position: SpringState,
    rotation: SpringState,
    secondary_position: SpringState,
    secondary_rotation: SpringState,
}

/// First-person view motion model.
pub struct ViewMotionController {
    profile: ViewProfile,
    config: MotionConfig,

    position_spring: Spring,
    rotation_spring: Spring,
    secondary_position_spring: Spring,
    secondary_rotation_spring: Spring,

    head_offsets: SmoothedOffsetBuffer,
    bob: BobGenerator,
    shake: ShakeGenerator,
    rng: StdRng,

    anchor: Option<Rc<dyn AnchorProvider>>,
    /// Head-bone offset captured on the first grounded tick after attaching
    anchor_rest_offset: Option<Vec3>,
    /// Frame the smoothing buffer last sampled
    last_offset_frame: Option<u64>,

    /// Look angles from input and overrides, within the profile limits
    pitch: f32,
    yaw: f32,
    base_rotation: Quat,

    character: CharacterState,
    frame: u64,

    vertical_adjustment: f32,
    target_vertical_adjustment: f32,

    lean_position: Vec3,
    lean_rotation: Vec3,
    recoil_position_rest: Vec3,
    recoil_rotation_rest: Vec3,

    rotation_override: Option<Box<dyn RotationOverride>>,
    snapshot: Option<SpringSnapshot>,
    active: bool,

    transform: ViewTransform,
    placement: Option<Placement>,
}

impl ViewMotionController {
    /// Create a controller using the profile limits and the config's look offset.
    pub fn new(profile: ViewProfile, config: MotionConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let look_offset = config.look_offset;
        let pitch_limit = profile.pitch_limit;
        let yaw_limit = profile.yaw_limit;

        let mut controller = Self {
            position_spring: Spring::new(SpringMode::Position, config.position_spring),
            rotation_spring: Spring::new(SpringMode::Rotation, config.rotation_spring),
            secondary_position_spring: Spring::new(
                SpringMode::Position,
                config.secondary_position_spring,
            ),
            secondary_rotation_spring: Spring::new(
                SpringMode::Rotation,
                config.secondary_rotation_spring,
            ),
            head_offsets: SmoothedOffsetBuffer::new(config.smooth_head_offset_samples),
            bob: BobGenerator::new(),
            shake: ShakeGenerator::new(),
            rng,
            anchor: None,
            anchor_rest_offset: None,
            last_offset_frame: None,
            pitch: 0.0,
            yaw: 0.0,
            base_rotation: Quat::IDENTITY,
            character: CharacterState::default(),
            frame: 0,
            vertical_adjustment: 0.0,
            target_vertical_adjustment: 0.0,
            lean_position: Vec3::ZERO,
            lean_rotation: Vec3::ZERO,
            recoil_position_rest: Vec3::ZERO,
            recoil_rotation_rest: Vec3::ZERO,
            rotation_override: None,
            snapshot: None,
            active: true,
            transform: ViewTransform::default(),
            placement: None,
            profile,
            config,
        };
        controller.initialize(look_offset, pitch_limit, yaw_limit);
        controller
    }

    /// Set the rest offset and angle limits, and bring every spring to rest.
    ///
    /// Invalid limits are normalized with a warning.
    pub fn initialize(&mut self, rest_offset: Vec3, pitch_limit: Vec2, yaw_limit: Option<Vec2>) {
        if rest_offset.is_finite() {
            self.config.look_offset = rest_offset;
        }
        self.profile.pitch_limit = pitch_limit;
        self.profile.yaw_limit = yaw_limit;
        self.profile = Self::accept_profile(std::mem::take(&mut self.profile));

        let use_min_max = self.config.position_spring.use_min_max;
        self.position_spring.initialize(SpringMode::Position, use_min_max);
        let use_min_max = self.config.secondary_position_spring.use_min_max;
        self.secondary_position_spring.initialize(SpringMode::Position, use_min_max);
        self.rotation_spring.initialize(SpringMode::Rotation, false);
        self.secondary_rotation_spring.initialize(SpringMode::Rotation, false);
        self.head_offsets.clear();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn profile(&self) -> &ViewProfile {
        &self.profile
    }

    #[inline]
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Pitch the camera looks at in degrees, shake included. (-180, 180], positive looks up.
    #[inline]
    pub fn pitch(&self) -> f32 {
        wrap_angle(self.pitch + self.shake.shake().y)
    }

    /// Yaw relative to the base rotation in degrees, shake included. (-180, 180].
    #[inline]
    pub fn yaw(&self) -> f32 {
        wrap_angle(self.yaw + self.shake.shake().x)
    }

    /// Look angles `(pitch, yaw)` from input alone, without shake.
    #[inline]
    pub fn look_angles(&self) -> Vec2 {
        Vec2::new(self.pitch, self.yaw)
    }

    #[inline]
    pub fn base_rotation(&self) -> Quat {
        self.base_rotation
    }

    /// Current shake `(yaw, pitch)` in degrees, for crosshair compensation.
    #[inline]
    pub fn shake(&self) -> Vec2 {
        self.shake.shake()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Result of the last collision probe.
    #[inline]
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    #[inline]
    pub fn position_spring(&self) -> &Spring {
        &self.position_spring
    }

    #[inline]
    pub fn rotation_spring(&self) -> &Spring {
        &self.rotation_spring
    }

    #[inline]
    pub fn secondary_position_spring(&self) -> &Spring {
        &self.secondary_position_spring
    }

    #[inline]
    pub fn secondary_rotation_spring(&self) -> &Spring {
        &self.secondary_rotation_spring
    }

    /// Direct spring access for hosts that drive custom effects.
    #[inline]
    pub fn position_spring_mut(&mut self) -> &mut Spring {
        &mut self.position_spring
    }

    #[inline]
    pub fn rotation_spring_mut(&mut self) -> &mut Spring {
        &mut self.rotation_spring
    }

    #[inline]
    pub fn head_offsets(&self) -> &SmoothedOffsetBuffer {
        &self.head_offsets
    }

    #[inline]
    pub fn vertical_adjustment(&self) -> f32 {
        self.vertical_adjustment
    }

    /// Whether the anchor exposes a head bone (otherwise the root is used).
    pub fn has_bone_anchor(&self) -> bool {
        self.anchor.as_ref().is_some_and(|a| a.local_offset().is_some())
    }

    pub fn set_rotation_override(&mut self, strategy: Option<Box<dyn RotationOverride>>) {
        self.rotation_override = strategy;
    }

    /// Set the look angles directly (degrees). Pitch is clamped to the profile limits.
    pub fn set_look(&mut self, pitch: f32, yaw: f32) {
        if !pitch.is_finite() || !yaw.is_finite() {
            return;
        }
        self.pitch = self.limit_pitch(pitch);
        self.yaw = wrap_angle(yaw);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Bind to a new character anchor, discarding all motion from the previous one.
    ///
    /// `None` or an anchor without a bone falls back to the character root and leaves the
    /// smoothing buffer empty.
    pub fn attach_to_anchor(&mut self, anchor: Option<Rc<dyn AnchorProvider>>) {
        self.anchor = anchor;
        self.anchor_rest_offset = None;
        self.last_offset_frame = None;

        self.pitch = 0.0;
        self.yaw = 0.0;
        self.base_rotation = self.character.rotation.normalize();

        self.lean_position = Vec3::ZERO;
        self.lean_rotation = Vec3::ZERO;
        self.recoil_position_rest = Vec3::ZERO;
        self.recoil_rotation_rest = Vec3::ZERO;
        self.refresh_rest_values();

        self.position_spring.reset();
        self.rotation_spring.reset();
        self.secondary_position_spring.reset();
        self.secondary_rotation_spring.reset();
        self.head_offsets.clear();
        self.bob.reset();
        self.shake.reset();

        self.vertical_adjustment = 0.0;
        self.target_vertical_adjustment = 0.0;
        self.snapshot = None;

        debug!(view = %self.profile.name, bone = self.has_bone_anchor(), "view attached to anchor");
    }

    /// Provide this tick's frame number and character state.
    pub fn begin_tick(&mut self, frame: u64, character: CharacterState) {
        self.frame = frame;
        self.character = character;
    }

    /// Activate or deactivate this view.
    ///
    /// Deactivating writes this view's motion into `handoff`. Activating consumes a handoff from
    /// a view of the same family and continues its look angles, springs and shake, so the switch
    /// has no visible pop.
    pub fn on_change_view_type(&mut self, activate: bool, handoff: &mut Option<MotionHandoff>) {
        if !activate {
            if self.active {
                *handoff = Some(self.handoff());
                self.active = false;
                debug!(view = %self.profile.name, "view deactivated");
            }
            return;
        }

        self.active = true;
        if let Some(incoming) = handoff.take() {
            if incoming.family == self.profile.family {
                self.base_rotation = incoming.base_rotation;
                self.set_look(incoming.pitch, incoming.yaw);
                self.position_spring.restore(incoming.position_spring);
                self.rotation_spring.restore(incoming.rotation_spring);
                self.shake = incoming.shake;
                debug!(view = %self.profile.name, "view activated with handoff");
            } else {
                debug!(
                    view = %self.profile.name,
                    "view activated, handoff from other family dropped"
                );
            }
        }
    }

    /// Motion to hand to the next view.
    pub fn handoff(&self) -> MotionHandoff {
        MotionHandoff {
            family: self.profile.family,
            pitch: self.pitch,
            yaw: self.yaw,
            base_rotation: self.base_rotation,
            position_spring: self.position_spring.state(),
            rotation_spring: self.rotation_spring.state(),
            shake: self.shake,
        }
    }

    /// Replace the tuning, keeping the current motion of all four springs.
    pub fn set_config(&mut self, config: MotionConfig) {
        let snapshot = self.capture_springs();

        if config.smooth_head_offset_samples.max(1) != self.head_offsets.capacity() {
            self.head_offsets = SmoothedOffsetBuffer::new(config.smooth_head_offset_samples);
        }
        self.config = config;
        self.refresh_rest_values();
        self.restore_springs(snapshot);
        debug!(view = %self.profile.name, "view configuration replaced");
    }

    // ========================================================================
    // Per-tick update
    // ========================================================================

    /// Apply look input and return the camera rotation.
    ///
    /// `horizontal` and `vertical` are yaw and pitch deltas in degrees.
    pub fn rotate(&mut self, horizontal: f32, vertical: f32, dt: f32) -> Quat {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let horizontal = if horizontal.is_finite() { horizontal } else { 0.0 };
        let vertical = if vertical.is_finite() { vertical } else { 0.0 };

        // Shake rolls the camera as it swings
        let shake_delta = self.shake.update(dt, &self.config.shake);
        if shake_delta.x != 0.0 {
            self.rotation_spring
                .add_force(Vec3::Z * -shake_delta.x * self.config.shake.roll_factor, 1);
        }

        self.update_base_rotation(dt);

        self.pitch = self.limit_pitch(self.pitch + vertical);

        // Yaw: past the limit it is pulled back rather than stopped
        self.yaw += horizontal;
        if let Some(yaw_limit) = self.profile.yaw_limit {
            let clamped = clamp_angle(self.yaw, yaw_limit.x, yaw_limit.y);
            let t = (self.profile.yaw_limit_lerp_speed * dt).min(1.0);
            self.yaw = lerp_angle(self.yaw, clamped, t);
        }

        self.pitch = wrap_angle(self.pitch);
        self.yaw = wrap_angle(self.yaw);

        self.rotation_spring.update(dt);
        self.secondary_rotation_spring.update(dt);

        let mut view = self.look_rotation();

        if let Some(strategy) = self.rotation_override.as_mut() {
            if let Some(target) = strategy.override_rotation(self.transform.position, view) {
                let t = (self.profile.secondary_rotation_speed * dt).min(1.0);
                let blended = view.slerp(target.normalize(), t);
                let local = quat_to_euler(self.base_rotation.inverse() * blended);
                let shake = self.shake.shake();
                self.pitch = self.limit_pitch(local.x - shake.y);
                self.yaw = wrap_angle(local.y - shake.x);
                view = self.look_rotation();
            }
        }

        let head = if self.profile.rotate_with_head {
            self.anchor
                .as_ref()
                .and_then(|anchor| anchor.local_rotation())
                .map(|rotation| Quat::from_rotation_x(quat_to_euler(rotation).x.to_radians()))
                .unwrap_or(Quat::IDENTITY)
        } else {
            Quat::IDENTITY
        };

        let rotation = (view
            * euler_to_quat(self.rotation_spring.value())
            * euler_to_quat(self.secondary_rotation_spring.value())
            * head)
            .normalize();
        self.transform.rotation = rotation;
        rotation
    }

    /// Advance the positional motion and return the collision-resolved camera position.
    pub fn move_camera(&mut self, dt: f32, caster: &dyn SphereCaster) -> Vec3 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let character = self.character;
        let yaw_frame = self.yaw_frame();

        if dt > 0.0 {
            let local_velocity = yaw_frame.inverse() * character.velocity;

            let sway = sway_force(local_velocity, &self.config.sway);
            self.rotation_spring.add_force(sway * dt, 1);

            let horizontal_speed = Vec2::new(local_velocity.x, local_velocity.z).length();
            let bob = self
                .bob
                .update(dt, horizontal_speed, character.grounded, &self.config.bob);
            self.position_spring.add_force(bob.position_force * dt, 1);
            self.rotation_spring.add_force(Vec3::Z * bob.roll_force * dt, 1);
            if let Some(trough) = bob.trough {
                self.position_spring.add_force(trough, 1);
            }

            let t = (self.config.vertical_offset_lerp_speed * dt).min(1.0);
            self.vertical_adjustment =
                lerp(self.vertical_adjustment, self.target_vertical_adjustment, t);
        }

        self.sample_head_offset();

        self.position_spring.update(dt);
        self.secondary_position_spring.update(dt);

        let anchor_world = character.position + character.rotation * self.anchor_local_offset();
        let head_motion = character.rotation * self.head_offsets.average();

        let local = self.config.look_offset
            + self.position_spring.value()
            + self.secondary_position_spring.value()
            + Vec3::Y * self.vertical_adjustment
            + look_down_offset(self.pitch, &self.config.look_down);

        let target = anchor_world + head_motion + yaw_frame * local;
        let origin = anchor_world + head_motion + yaw_frame * Vec3::new(0.0, local.y, 0.0);

        let placement = resolve_position(origin, target, &self.config.collision, caster);
        if placement.obstructed {
            trace!(
                wanted = %placement.target,
                resolved = %placement.position,
                "camera obstructed"
            );
        }
        self.placement = Some(placement);
        self.transform.position = placement.position;
        placement.position
    }

    /// Rotate then move. `look` is `(horizontal, vertical)` in degrees.
    pub fn update(&mut self, look: Vec2, dt: f32, caster: &dyn SphereCaster) -> ViewTransform {
        self.rotate(look.x, look.y, dt);
        self.move_camera(dt, caster);
        self.transform
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Landing impact after a fall of `height` meters.
    pub fn on_land(&mut self, height: f32) {
        if !(height > 0.0) || !height.is_finite() {
            return;
        }
        let landing = self.config.landing;
        self.position_spring.add_force(
            Vec3::NEG_Y * height * landing.position_fall_impact,
            landing.position_fall_impact_softness,
        );

        let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        self.rotation_spring.add_force(
            Vec3::Z * height * landing.rotation_fall_impact * sign,
            landing.rotation_fall_impact_softness,
        );
    }

    /// Shift the spring rests sideways and tilt them while leaning. Zeros end the lean.
    pub fn on_lean(&mut self, distance: f32, tilt: f32, multiplier: f32) {
        if !distance.is_finite() || !tilt.is_finite() || !multiplier.is_finite() {
            return;
        }
        self.lean_position = Vec3::X * distance * multiplier;
        self.lean_rotation = Vec3::Z * tilt * multiplier;
        self.refresh_rest_values();
    }

    /// Set the pending eye-height change that the camera eases toward.
    pub fn on_adjust_height(&mut self, amount: f32) {
        if amount.is_finite() {
            self.target_vertical_adjustment = amount;
        }
    }

    pub fn add_shake(&mut self, intensity: f32) {
        self.shake.add_trauma(intensity);
    }

    /// Kick the secondary springs.
    ///
    /// `rest_accumulation` (0..1) of each force permanently shifts the spring's rest value. The
    /// remainder is an elastic impulse spread over `softness` frames.
    pub fn add_secondary_force(
        &mut self,
        position: Vec3,
        rotation: Vec3,
        rest_accumulation: f32,
        softness: usize,
    ) {
        let Some(accumulation) = self.accumulate_recoil_rest(position, rotation, rest_accumulation)
        else {
            return;
        };

        self.secondary_position_spring
            .add_force(position * (1.0 - accumulation), softness);
        self.secondary_rotation_spring
            .add_force(rotation * (1.0 - accumulation), softness);
    }

    /// Shift the secondary rest values by `rest_accumulation` of a recoil kick without the
    /// elastic part. Inactive views use this to stay in step with the active one.
    ///
    /// Returns the accumulation fraction applied, or `None` if the kick was ignored.
    pub fn accumulate_recoil_rest(
        &mut self,
        position: Vec3,
        rotation: Vec3,
        rest_accumulation: f32,
    ) -> Option<f32> {
        if !position.is_finite() || !rotation.is_finite() {
            return None;
        }
        let accumulation = if rest_accumulation.is_finite() {
            rest_accumulation.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.recoil_position_rest += position * accumulation;
        self.recoil_rotation_rest += rotation * accumulation;
        self.refresh_rest_values();
        Some(accumulation)
    }

    /// Return the secondary springs to their configured rest values.
    pub fn clear_recoil_accumulation(&mut self) {
        self.recoil_position_rest = Vec3::ZERO;
        self.recoil_rotation_rest = Vec3::ZERO;
        self.refresh_rest_values();
    }

    /// Capture spring motion before a configuration change.
    pub fn on_state_will_change(&mut self) {
        self.snapshot = Some(self.capture_springs());
    }

    /// Apply an optional new configuration and restore the motion captured by
    /// [`on_state_will_change`](Self::on_state_will_change).
    pub fn on_state_did_change(&mut self, config: Option<MotionConfig>) {
        if let Some(config) = config {
            self.set_config(config);
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.restore_springs(snapshot);
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn accept_profile(profile: ViewProfile) -> ViewProfile {
        match profile.validate() {
            Ok(()) => profile,
            Err(err) => {
                let (normalized, _) = profile.normalized();
                warn!(
                    view = %profile.name,
                    %err,
                    pitch_limit = %normalized.pitch_limit,
                    yaw_limit = ?normalized.yaw_limit,
                    "view profile normalized"
                );
                normalized
            }
        }
    }

    fn limit_pitch(&self, pitch: f32) -> f32 {
        let limit = self.profile.pitch_limit;
        if self.profile.clamps_pitch() {
            clamp_angle(pitch, limit.x, limit.y)
        } else {
            wrap_angle(pitch)
        }
    }

    /// Base rotation turned by the look angles plus the current shake.
    fn look_rotation(&self) -> Quat {
        self.base_rotation * euler_to_quat(Vec3::new(self.pitch(), self.yaw(), 0.0))
    }

    fn yaw_frame(&self) -> Quat {
        self.base_rotation * Quat::from_rotation_y(self.yaw.to_radians())
    }

    /// Follow moving platforms and realign the base rotation to the character's up vector.
    fn update_base_rotation(&mut self, dt: f32) {
        let character = self.character;

        if self.profile.rotate_with_character {
            self.base_rotation = character.rotation.normalize();
        } else if character.platform_rotation_delta != Quat::IDENTITY {
            let delta = character.platform_rotation_delta.normalize();
            self.base_rotation = (delta * self.base_rotation).normalize();
        }

        let up = character.up.normalize_or(Vec3::Y);
        let current_up = self.base_rotation * Vec3::Y;
        if current_up.dot(up) < 1.0 - 1e-6 {
            let aligned = Quat::from_rotation_arc(current_up, up) * self.base_rotation;
            self.base_rotation = if character.on_moving_platform {
                aligned
            } else {
                let t = (self.config.alignment_speed * dt).clamp(0.0, 1.0);
                self.base_rotation.slerp(aligned, t)
            }
            .normalize();
        }
    }

    /// Anchor position in character space: the cached bone rest, the live bone, or the root.
    fn anchor_local_offset(&self) -> Vec3 {
        self.anchor_rest_offset
            .or_else(|| self.anchor.as_ref().and_then(|anchor| anchor.local_offset()))
            .unwrap_or(Vec3::ZERO)
    }

    /// Feed the smoothing buffer once per frame. The bone rest is only captured once the
    /// character stands on the ground; until then sampling is retried every frame.
    fn sample_head_offset(&mut self) {
        if self.last_offset_frame == Some(self.frame) {
            return;
        }
        let Some(current) = self.anchor.as_ref().and_then(|anchor| anchor.local_offset()) else {
            return;
        };

        let rest = match self.anchor_rest_offset {
            Some(rest) => rest,
            None if self.character.grounded => {
                self.anchor_rest_offset = Some(current);
                current
            }
            None => {
                trace!(frame = self.frame, "character airborne, deferring anchor capture");
                return;
            }
        };

        self.head_offsets.push(current - rest);
        self.last_offset_frame = Some(self.frame);
    }

    fn refresh_rest_values(&mut self) {
        let config = &self.config;
        self.position_spring
            .set_rest_value(config.position_spring.rest_value + self.lean_position);
        self.rotation_spring
            .set_rest_value(config.rotation_spring.rest_value + self.lean_rotation);
        self.secondary_position_spring.set_rest_value(
            config.secondary_position_spring.rest_value + self.recoil_position_rest,
        );
        self.secondary_rotation_spring.set_rest_value(
            config.secondary_rotation_spring.rest_value + self.recoil_rotation_rest,
        );
    }

    fn capture_springs(&self) -> SpringSnapshot {
        SpringSnapshot {
            position: self.position_spring.state(),
            rotation: self.rotation_spring.state(),
            secondary_position: self.secondary_position_spring.state(),
            secondary_rotation: self.secondary_rotation_spring.state(),
        }
    }

    fn restore_springs(&mut self, snapshot: SpringSnapshot) {
        let with_rest =
            |config: SpringConfig, spring: &Spring| config.with_rest(spring.rest_value());
        let config = &self.config;
        let position = with_rest(config.position_spring, &self.position_spring);
        let rotation = with_rest(config.rotation_spring, &self.rotation_spring);
        let secondary_position =
            with_rest(config.secondary_position_spring, &self.secondary_position_spring);
        let secondary_rotation =
            with_rest(config.secondary_rotation_spring, &self.secondary_rotation_spring);

        self.position_spring.set_config(position);
        self.rotation_spring.set_config(rotation);
        self.secondary_position_spring.set_config(secondary_position);
        self.secondary_rotation_spring.set_config(secondary_rotation);

        self.position_spring.restore(snapshot.position);
        self.rotation_spring.restore(snapshot.rotation);
        self.secondary_position_spring.restore(snapshot.secondary_position);
        self.secondary_rotation_spring.restore(snapshot.secondary_rotation);
    }
}

impl ViewEventHandler for ViewMotionController {
    fn on_view_event(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::Land { height } => self.on_land(*height),
            ViewEvent::Lean {
                distance,
                tilt,
                multiplier,
            } => self.on_lean(*distance, *tilt, *multiplier),
            ViewEvent::AdjustHeight { amount } => self.on_adjust_height(*amount),
            ViewEvent::Shake { intensity } => self.add_shake(*intensity),
            ViewEvent::SecondaryForce {
                position,
                rotation,
                rest_accumulation,
                softness,
            } => self.add_secondary_force(*position, *rotation, *rest_accumulation, *softness),
            ViewEvent::ModelSwitched { anchor } => self.attach_to_anchor(anchor.clone()),
            ViewEvent::StateWillChange => self.on_state_will_change(),
            ViewEvent::StateDidChange { config } => {
                self.on_state_did_change(config.as_deref().cloned())
            }
        }
    }
}
