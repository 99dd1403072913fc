//! Rig Tests - View Switching and Event Routing
//!
//! Tests for the view rig and its use behind the event bus.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use glam::{Vec2, Vec3};
use spring_cam_engine::camera::{
    AnchorProvider, BoneAnchor, CharacterState, ViewMotionController, ViewProfile, ViewRig,
};
use spring_cam_engine::config::MotionConfig;
use spring_cam_engine::events::{EventBus, ViewEvent};
use spring_cam_engine::motion::SpringState;
use spring_cam_engine::physics::NoCollision;

const DT: f32 = 1.0 / 60.0;

fn two_view_rig() -> ViewRig {
    let mut rig = ViewRig::new(ViewMotionController::new(
        ViewProfile::first_person(),
        MotionConfig::default(),
    ));
    rig.add_view(ViewMotionController::new(
        ViewProfile::free_look(),
        MotionConfig::default(),
    ));
    rig
}

// ============================================================================
// Switching
// ============================================================================

#[test]
fn test_new_rig_activates_first_view() {
    let rig = two_view_rig();
    assert_eq!(rig.len(), 2);
    assert_eq!(rig.active_index(), 0);
    assert!(rig.active().is_active());
    assert!(!rig.view(1).unwrap().is_active());
}

#[test]
fn test_switch_carries_motion() {
    let mut rig = two_view_rig();
    let state = SpringState {
        value: Vec3::new(0.0, 0.05, 0.0),
        velocity: Vec3::new(0.0, 1.0, 0.0),
    };
    rig.active_mut().position_spring_mut().restore(state);

    assert!(rig.switch_to(1));
    assert_eq!(rig.active_index(), 1);
    assert!(!rig.view(0).unwrap().is_active());
    assert_eq!(rig.active().position_spring().state(), state);
}

#[test]
fn test_switch_keeps_look_direction() {
    let mut rig = two_view_rig();
    let character = CharacterState::default();
    rig.update(1, character, Vec2::new(40.0, 15.0), DT, &NoCollision);
    let before = rig.active().transform().rotation;
    let look = rig.active().look_angles();

    assert!(rig.switch_to(1));
    assert_eq!(rig.active().look_angles(), look);

    let after = rig.update(2, character, Vec2::ZERO, DT, &NoCollision).rotation;
    assert!(before.angle_between(after).to_degrees() < 1.0);
}

#[test]
fn test_shake_settles_after_switch() {
    let mut rig = two_view_rig();
    let character = CharacterState::default();
    rig.update(1, character, Vec2::new(30.0, 10.0), DT, &NoCollision);
    rig.active_mut().add_shake(1.0);
    for frame in 2..20 {
        rig.update(frame, character, Vec2::ZERO, DT, &NoCollision);
    }
    assert_ne!(rig.active().shake(), Vec2::ZERO);

    let pitch = rig.active().pitch();
    let yaw = rig.active().yaw();
    assert!(rig.switch_to(1));
    assert_abs_diff_eq!(rig.active().pitch(), pitch, epsilon = 1e-4);
    assert_abs_diff_eq!(rig.active().yaw(), yaw, epsilon = 1e-4);

    for frame in 20..240 {
        rig.update(frame, character, Vec2::ZERO, DT, &NoCollision);
    }
    assert_eq!(rig.active().shake(), Vec2::ZERO);
    assert_abs_diff_eq!(rig.active().pitch(), 10.0, epsilon = 1e-3);
    assert_abs_diff_eq!(rig.active().yaw(), 30.0, epsilon = 1e-3);
}

#[test]
fn test_switch_to_unknown_view_fails() {
    let mut rig = two_view_rig();
    assert!(!rig.switch_to(7));
    assert_eq!(rig.active_index(), 0);
    assert!(rig.switch_to(0));
}

#[test]
fn test_update_ticks_only_active_view() {
    let mut rig = two_view_rig();
    let look = Vec2::new(10.0, 0.0);
    let transform = rig.update(1, CharacterState::default(), look, DT, &NoCollision);

    assert!(transform.position.is_finite());
    assert!((rig.active().yaw() - 10.0).abs() < 1e-3);
    assert_eq!(rig.view(1).unwrap().yaw(), 0.0);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn test_bus_reaches_inactive_views_with_lasting_events() {
    let rig = Rc::new(RefCell::new(two_view_rig()));
    let mut bus = EventBus::new();
    bus.subscribe(&rig);

    bus.publish(&ViewEvent::Lean {
        distance: 0.2,
        tilt: 6.0,
        multiplier: 1.0,
    });
    bus.publish(&ViewEvent::AdjustHeight { amount: -0.5 });

    let rig = rig.borrow();
    for index in 0..rig.len() {
        let view = rig.view(index).unwrap();
        assert_abs_diff_eq!(view.position_spring().rest_value().x, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(view.rotation_spring().rest_value().z, 6.0, epsilon = 1e-6);
    }
}

#[test]
fn test_lean_ended_while_inactive_is_released() {
    let rig = Rc::new(RefCell::new(two_view_rig()));
    let mut bus = EventBus::new();
    bus.subscribe(&rig);

    bus.publish(&ViewEvent::Lean {
        distance: 0.3,
        tilt: 10.0,
        multiplier: 1.0,
    });
    assert!(rig.borrow_mut().switch_to(1));
    bus.publish(&ViewEvent::Lean {
        distance: 0.0,
        tilt: 0.0,
        multiplier: 1.0,
    });
    assert!(rig.borrow_mut().switch_to(0));

    let rig = rig.borrow();
    assert_eq!(rig.active().position_spring().rest_value(), Vec3::ZERO);
    assert_eq!(rig.active().rotation_spring().rest_value(), Vec3::ZERO);
}

#[test]
fn test_recoil_rest_shared_but_kick_stays_active() {
    let rig = Rc::new(RefCell::new(two_view_rig()));
    let mut bus = EventBus::new();
    bus.subscribe(&rig);

    bus.publish(&ViewEvent::SecondaryForce {
        position: Vec3::new(0.0, 0.0, 1.0),
        rotation: Vec3::new(4.0, 0.0, 0.0),
        rest_accumulation: 0.25,
        softness: 1,
    });

    let rig = rig.borrow();
    for index in 0..rig.len() {
        let spring = rig.view(index).unwrap().secondary_position_spring();
        assert_abs_diff_eq!(spring.rest_value().z, 0.25, epsilon = 1e-6);
    }
    let kicked = rig.active().secondary_position_spring().velocity();
    assert_abs_diff_eq!(kicked.z, 0.75, epsilon = 1e-6);
    let idle = rig.view(1).unwrap().secondary_position_spring().velocity();
    assert_eq!(idle, Vec3::ZERO);
}

#[test]
fn test_impulses_move_active_view_only() {
    let rig = Rc::new(RefCell::new(two_view_rig()));
    let mut bus = EventBus::new();
    bus.subscribe(&rig);

    bus.publish(&ViewEvent::Land { height: 2.0 });
    bus.publish(&ViewEvent::Shake { intensity: 0.5 });

    let rig = rig.borrow();
    assert!(rig.active().position_spring().pending_soft_frames() > 0);
    assert_eq!(rig.view(1).unwrap().position_spring().pending_soft_frames(), 0);
    assert_eq!(rig.view(1).unwrap().shake(), Vec2::ZERO);
}

#[test]
fn test_model_switch_rebinds_every_view() {
    let rig = Rc::new(RefCell::new(two_view_rig()));
    let mut bus = EventBus::new();
    bus.subscribe(&rig);

    let head: Rc<dyn AnchorProvider> = Rc::new(BoneAnchor::at(Vec3::new(0.0, 1.7, 0.0)));
    assert_eq!(bus.publish(&ViewEvent::ModelSwitched { anchor: Some(head) }), 1);

    let rig = rig.borrow();
    assert!(rig.view(0).unwrap().has_bone_anchor());
    assert!(rig.view(1).unwrap().has_bone_anchor());
}

#[test]
fn test_dropped_rig_stops_receiving() {
    let mut bus = EventBus::new();
    {
        let rig = Rc::new(RefCell::new(two_view_rig()));
        bus.subscribe(&rig);
    }
    assert_eq!(bus.publish(&ViewEvent::Shake { intensity: 0.5 }), 0);
}
