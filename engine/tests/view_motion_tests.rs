//! View Motion Tests - Look Input, Events, Anchors and Collision
//!
//! Drives the view motion controller through whole ticks the way a host would.

use std::rc::Rc;

use approx::assert_abs_diff_eq;
use glam::{Vec2, Vec3};
use spring_cam_engine::camera::{
    AnchorProvider, BoneAnchor, CharacterState, MotionHandoff, RootAnchor, ViewFamily,
    ViewMotionController, ViewProfile,
};
use spring_cam_engine::config::MotionConfig;
use spring_cam_engine::events::{ViewEvent, ViewEventHandler};
use spring_cam_engine::motion::{SpringConfig, SpringState};
use spring_cam_engine::physics::{CastHit, LayerMask, NoCollision, ObstacleSet, SphereCastQuery};

const DT: f32 = 1.0 / 60.0;

fn controller(config: MotionConfig) -> ViewMotionController {
    let mut view = ViewMotionController::new(ViewProfile::first_person(), config);
    view.begin_tick(1, CharacterState::default());
    view
}

fn tick(view: &mut ViewMotionController, frame: u64, character: CharacterState) {
    view.begin_tick(frame, character);
    view.update(Vec2::ZERO, DT, &NoCollision);
}

// ============================================================================
// Look input
// ============================================================================

#[test]
fn test_pitch_clamped_to_profile_limits() {
    let mut view = controller(MotionConfig::default());

    view.rotate(0.0, 100.0, DT);
    assert_abs_diff_eq!(view.pitch(), 72.0, epsilon = 1e-4);

    view.rotate(0.0, -200.0, DT);
    assert_abs_diff_eq!(view.pitch(), -72.0, epsilon = 1e-4);
}

#[test]
fn test_yaw_wraps_past_180() {
    let mut view = controller(MotionConfig::default());

    view.rotate(170.0, 0.0, DT);
    view.rotate(20.0, 0.0, DT);
    assert_abs_diff_eq!(view.yaw(), -170.0, epsilon = 1e-3);

    view.rotate(-400.0, 0.0, DT);
    assert!(view.yaw() > -180.0 && view.yaw() <= 180.0);
}

#[test]
fn test_yaw_past_limit_is_pulled_back() {
    let mut view = ViewMotionController::new(ViewProfile::free_look(), MotionConfig::default());
    view.begin_tick(1, CharacterState::default());

    view.rotate(150.0, 0.0, DT);
    assert!(view.yaw() < 150.0 && view.yaw() > 110.0, "yaw {}", view.yaw());

    for _ in 0..240 {
        view.rotate(0.0, 0.0, DT);
    }
    assert_abs_diff_eq!(view.yaw(), 110.0, epsilon = 1e-2);
}

#[test]
fn test_rotation_faces_forward_at_rest() {
    let mut view = controller(MotionConfig::default());
    let rotation = view.rotate(0.0, 0.0, DT);
    let forward = rotation * Vec3::NEG_Z;
    assert_abs_diff_eq!(forward.z, -1.0, epsilon = 1e-4);
}

#[test]
fn test_shake_leaves_no_residual_offset() {
    let mut view = controller(MotionConfig::default());
    view.add_shake(1.0);

    let limit = MotionConfig::default().shake.trauma_amplitude;
    let mut moved = false;
    for _ in 0..30 {
        view.rotate(0.0, 0.0, DT);
        moved |= view.yaw().abs() > 1e-3;
        assert!(view.yaw().abs() <= limit.x + 1e-3);
        assert!(view.pitch().abs() <= limit.y + 1e-3);
    }
    assert!(moved);

    // Trauma is gone well before three seconds
    for _ in 0..180 {
        view.rotate(0.0, 0.0, DT);
    }
    assert_eq!(view.shake(), Vec2::ZERO);
    assert_abs_diff_eq!(view.yaw(), 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(view.pitch(), 0.0, epsilon = 1e-3);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_landing_impulse_spread_over_softness() {
    let config = MotionConfig {
        position_spring: SpringConfig::accumulator(),
        ..MotionConfig::default()
    };
    let mut view = controller(config);
    view.on_land(2.0);

    let mut frame = 1;
    tick(&mut view, frame, CharacterState::default());
    assert_abs_diff_eq!(view.position_spring().velocity().y, -0.5, epsilon = 1e-5);

    for _ in 0..3 {
        frame += 1;
        tick(&mut view, frame, CharacterState::default());
    }
    assert_abs_diff_eq!(view.position_spring().velocity().y, -2.0, epsilon = 1e-5);
    assert_eq!(view.position_spring().pending_soft_frames(), 0);
}

#[test]
fn test_landing_ignores_non_positive_height() {
    let mut view = controller(MotionConfig::default());
    view.on_land(0.0);
    view.on_land(-3.0);
    assert_eq!(view.position_spring().pending_soft_frames(), 0);
    assert_eq!(view.position_spring().velocity(), Vec3::ZERO);
}

#[test]
fn test_lean_moves_rest_values() {
    let mut view = controller(MotionConfig::default());

    view.on_lean(0.3, 10.0, 0.5);
    assert_abs_diff_eq!(view.position_spring().rest_value().x, 0.15, epsilon = 1e-6);
    assert_abs_diff_eq!(view.rotation_spring().rest_value().z, 5.0, epsilon = 1e-6);

    view.on_lean(0.0, 0.0, 1.0);
    assert_eq!(view.position_spring().rest_value(), Vec3::ZERO);
    assert_eq!(view.rotation_spring().rest_value(), Vec3::ZERO);
}

#[test]
fn test_secondary_force_accumulates_rest() {
    let mut view = controller(MotionConfig::default());
    view.add_secondary_force(Vec3::new(0.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 0.0), 0.25, 1);

    let spring = view.secondary_position_spring();
    assert_abs_diff_eq!(spring.rest_value().z, 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(spring.velocity().z, 0.75, epsilon = 1e-6);
    assert_abs_diff_eq!(view.secondary_rotation_spring().rest_value().x, 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(view.secondary_rotation_spring().velocity().x, 1.5, epsilon = 1e-6);

    view.clear_recoil_accumulation();
    assert_eq!(view.secondary_position_spring().rest_value(), Vec3::ZERO);
    assert_eq!(view.secondary_rotation_spring().rest_value(), Vec3::ZERO);
}

#[test]
fn test_height_adjustment_eases_to_target() {
    let mut view = controller(MotionConfig::default());
    view.on_view_event(&ViewEvent::AdjustHeight { amount: -0.5 });

    tick(&mut view, 2, CharacterState::default());
    let first = view.vertical_adjustment();
    assert!(first < 0.0 && first > -0.5);

    for frame in 3..300 {
        tick(&mut view, frame, CharacterState::default());
    }
    assert_abs_diff_eq!(view.vertical_adjustment(), -0.5, epsilon = 1e-3);
}

#[test]
fn test_config_change_keeps_motion() {
    let mut view = controller(MotionConfig::default());
    let state = SpringState {
        value: Vec3::new(0.0, 0.1, 0.0),
        velocity: Vec3::new(0.0, -0.4, 0.2),
    };
    view.position_spring_mut().restore(state);

    let mut config = MotionConfig::default();
    config.position_spring.stiffness = Vec3::splat(42.0);

    view.on_view_event(&ViewEvent::StateWillChange);
    view.on_view_event(&ViewEvent::StateDidChange {
        config: Some(Box::new(config)),
    });

    assert_eq!(view.position_spring().state(), state);
    assert_eq!(view.position_spring().config().stiffness, Vec3::splat(42.0));
}

// ============================================================================
// Anchors
// ============================================================================

#[test]
fn test_head_offset_sampled_once_per_frame() {
    let mut view = controller(MotionConfig::default());
    let head = Rc::new(BoneAnchor::at(Vec3::new(0.0, 1.6, 0.0)));
    view.attach_to_anchor(Some(head.clone() as Rc<dyn AnchorProvider>));
    assert!(view.has_bone_anchor());

    tick(&mut view, 1, CharacterState::default());
    view.move_camera(DT, &NoCollision);
    assert_eq!(view.head_offsets().len(), 1);

    head.set_offset(Vec3::new(0.0, 1.7, 0.0));
    tick(&mut view, 2, CharacterState::default());
    assert_eq!(view.head_offsets().len(), 2);
    assert_abs_diff_eq!(view.head_offsets().average().y, 0.05, epsilon = 1e-5);
}

#[test]
fn test_anchor_capture_waits_for_ground() {
    let mut view = controller(MotionConfig::default());
    let head = Rc::new(BoneAnchor::at(Vec3::new(0.0, 1.6, 0.0)));
    view.attach_to_anchor(Some(head.clone() as Rc<dyn AnchorProvider>));

    let airborne = CharacterState {
        grounded: false,
        ..CharacterState::default()
    };
    tick(&mut view, 1, airborne);
    assert!(view.head_offsets().is_empty());

    tick(&mut view, 2, CharacterState::default());
    assert_eq!(view.head_offsets().len(), 1);
    assert_eq!(view.head_offsets().average(), Vec3::ZERO);
}

#[test]
fn test_missing_bone_falls_back_to_root() {
    let mut view = controller(MotionConfig::default());
    view.attach_to_anchor(Some(Rc::new(RootAnchor)));
    assert!(!view.has_bone_anchor());

    for frame in 1..10 {
        tick(&mut view, frame, CharacterState::default());
    }
    assert!(view.head_offsets().is_empty());
    let expected = MotionConfig::default().look_offset;
    assert_abs_diff_eq!(view.transform().position.y, expected.y, epsilon = 1e-4);
}

#[test]
fn test_attach_resets_motion() {
    let mut view = controller(MotionConfig::default());
    view.rotate(30.0, 20.0, DT);
    view.on_land(3.0);
    view.on_lean(0.3, 8.0, 1.0);
    tick(&mut view, 2, CharacterState::default());

    view.attach_to_anchor(None);
    assert_eq!(view.pitch(), 0.0);
    assert_eq!(view.yaw(), 0.0);
    assert!(view.position_spring().is_at_rest(0.0));
    assert!(view.rotation_spring().is_at_rest(0.0));
    assert_eq!(view.position_spring().rest_value(), Vec3::ZERO);
}

// ============================================================================
// View switching
// ============================================================================

#[test]
fn test_handoff_copies_spring_state_exactly() {
    let mut outgoing = controller(MotionConfig::default());
    let mut incoming = ViewMotionController::new(ViewProfile::free_look(), MotionConfig::default());
    let state = SpringState {
        value: Vec3::new(0.0, 0.05, 0.0),
        velocity: Vec3::new(0.0, 1.0, 0.0),
    };
    outgoing.position_spring_mut().restore(state);
    outgoing.set_look(20.0, 50.0);

    let mut handoff: Option<MotionHandoff> = None;
    outgoing.on_change_view_type(false, &mut handoff);
    assert!(!outgoing.is_active());
    assert!(handoff.is_some());

    incoming.on_change_view_type(true, &mut handoff);
    assert!(incoming.is_active());
    assert!(handoff.is_none());
    assert_eq!(incoming.position_spring().state(), state);
    assert_eq!(incoming.look_angles(), Vec2::new(20.0, 50.0));
}

#[test]
fn test_handoff_from_other_family_ignored() {
    let mut outgoing = ViewMotionController::new(
        ViewProfile {
            family: ViewFamily::ThirdPerson,
            ..ViewProfile::first_person()
        },
        MotionConfig::default(),
    );
    let mut incoming = controller(MotionConfig::default());
    outgoing.position_spring_mut().set_velocity(Vec3::new(0.0, 1.0, 0.0));
    outgoing.set_look(20.0, 50.0);

    let mut handoff = None;
    outgoing.on_change_view_type(false, &mut handoff);
    incoming.on_change_view_type(true, &mut handoff);

    assert!(incoming.position_spring().is_at_rest(0.0));
    assert_eq!(incoming.look_angles(), Vec2::ZERO);
}

// ============================================================================
// Collision
// ============================================================================

fn straight_ahead_config() -> MotionConfig {
    MotionConfig {
        look_offset: Vec3::new(0.0, 0.0, -1.0),
        ..MotionConfig::default()
    }
}

#[test]
fn test_blocked_camera_stops_short_of_hit() {
    let mut view = controller(straight_ahead_config());
    let caster = |query: &SphereCastQuery| {
        assert!(!query.layer_mask.intersects(LayerMask::CHARACTER));
        Some(CastHit {
            distance: 0.4,
            point: query.origin + query.direction * 0.4,
            normal: Vec3::Z,
        })
    };

    let position = view.move_camera(DT, &caster);
    let placement = view.placement().copied().unwrap();

    assert!(placement.obstructed);
    assert_eq!(placement.origin, Vec3::ZERO);
    assert_abs_diff_eq!((position - placement.origin).length(), 0.4 - 0.03, epsilon = 1e-5);
}

#[test]
fn test_camera_pulled_in_front_of_wall() {
    let mut view = controller(straight_ahead_config());
    let mut wall = ObstacleSet::new();
    wall.add_box(Vec3::new(-1.0, -1.0, -0.7), Vec3::new(1.0, 1.0, -0.5), LayerMask::DEFAULT);

    let position = view.move_camera(DT, &wall);
    // Sphere radius 0.05 touches at 0.45, then the near clip keeps 0.03 more
    assert_abs_diff_eq!(position.z, -0.42, epsilon = 1e-4);
}

#[test]
fn test_character_layer_never_blocks() {
    let mut view = controller(straight_ahead_config());
    let mut body = ObstacleSet::new();
    body.add_box(Vec3::new(-1.0, -1.0, -0.7), Vec3::new(1.0, 1.0, -0.5), LayerMask::CHARACTER);

    let position = view.move_camera(DT, &body);
    assert_abs_diff_eq!(position.z, -1.0, epsilon = 1e-4);
    assert!(!view.placement().unwrap().obstructed);
}
