//! View Motion Simulation
//!
//! Run with: `cargo run --bin view_motion_sim -- [config.json] [frames]`
//!
//! Headless scripted run of the first-person view model inside a small walled room.
//! The character walks forward, hops and lands, leans, fires a few recoil
//! kicks, takes a hit and swaps between the first-person and free-look views.
//!
//! Logging follows `RUST_LOG` (default `info`); `RUST_LOG=spring_cam_engine=trace` shows
//! every spring step.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use spring_cam_engine::camera::{
    AnchorProvider, BoneAnchor, CharacterState, ViewMotionController, ViewProfile, ViewRig,
};
use spring_cam_engine::clock::FrameClock;
use spring_cam_engine::config::{ConfigError, MotionConfig};
use spring_cam_engine::events::{EventBus, ViewEvent};
use spring_cam_engine::physics::{LayerMask, ObstacleSet};

// ============================================================================
// SCRIPT
// ============================================================================

const DEFAULT_FRAMES: u64 = 600;
const FRAME_DT: f32 = 1.0 / 60.0;
const WALK_SPEED: f32 = 3.5;
const HEAD_HEIGHT: f32 = 1.6;

/// Walls, a ceiling and a pillar around the spawn point
fn build_room() -> ObstacleSet {
    let mut room = ObstacleSet::new();
    room.add_box(Vec3::new(-4.0, 0.0, -12.2), Vec3::new(4.0, 3.0, -12.0), LayerMask::DEFAULT)
        .add_box(Vec3::new(-4.2, 0.0, -12.0), Vec3::new(-4.0, 3.0, 2.0), LayerMask::DEFAULT)
        .add_box(Vec3::new(4.0, 0.0, -12.0), Vec3::new(4.2, 3.0, 2.0), LayerMask::DEFAULT)
        .add_box(Vec3::new(-4.0, 3.0, -12.0), Vec3::new(4.0, 3.2, 2.0), LayerMask::DEFAULT)
        .add_sphere(Vec3::new(0.6, 1.7, -10.5), 0.4, LayerMask::DEFAULT);
    room
}

/// Character pose and events for a frame of the script
fn script_frame(frame: u64, state: &mut CharacterState, events: &mut Vec<ViewEvent>) {
    let forward = state.rotation * Vec3::NEG_Z;
    let walking = (30..360).contains(&frame);
    state.velocity = if walking { forward * WALK_SPEED } else { Vec3::ZERO };

    // Short hop between frames 120 and 150
    state.grounded = !(120..150).contains(&frame);
    if frame == 150 {
        events.push(ViewEvent::Land { height: 1.2 });
    }

    match frame {
        200 => events.push(ViewEvent::Lean {
            distance: 0.35,
            tilt: 12.0,
            multiplier: 1.0,
        }),
        260 => events.push(ViewEvent::Lean {
            distance: 0.0,
            tilt: 0.0,
            multiplier: 1.0,
        }),
        300 | 308 | 316 => events.push(ViewEvent::SecondaryForce {
            position: Vec3::new(0.0, 0.0, 0.6),
            rotation: Vec3::new(2.5, 0.0, 0.0),
            rest_accumulation: 0.15,
            softness: 1,
        }),
        340 => events.push(ViewEvent::Shake { intensity: 0.8 }),
        380 => events.push(ViewEvent::AdjustHeight { amount: -0.5 }),
        440 => events.push(ViewEvent::AdjustHeight { amount: 0.0 }),
        _ => {}
    }

    state.position += state.velocity * FRAME_DT;
}

fn parse_args() -> Result<(MotionConfig, u64), ConfigError> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => {
            info!(%path, "loading motion config");
            MotionConfig::load(&path)?
        }
        None => MotionConfig::default(),
    };

    let frames = match args.next() {
        Some(text) => text
            .parse::<u64>()
            .map_err(|e| ConfigError::invalid("frames", e.to_string()))?,
        None => DEFAULT_FRAMES,
    };

    Ok((config, frames))
}

fn main() -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== View Motion Simulation ===");

    let (config, frames) = parse_args()?;
    let room = build_room();

    let first_person = ViewMotionController::new(ViewProfile::first_person(), config.clone());
    let free_look = ViewMotionController::new(ViewProfile::free_look(), config);
    let rig = Rc::new(RefCell::new(ViewRig::new(first_person)));
    let free_look_index = rig.borrow_mut().add_view(free_look);

    let head = Rc::new(BoneAnchor::at(Vec3::new(0.0, HEAD_HEIGHT, 0.0)));
    let anchor: Rc<dyn AnchorProvider> = head.clone();

    let mut bus = EventBus::new();
    bus.subscribe(&rig);
    bus.publish(&ViewEvent::ModelSwitched { anchor: Some(anchor) });

    let mut clock = FrameClock::new();
    let mut character = CharacterState::default();
    let mut events = Vec::new();
    let mut obstructed_frames = 0u32;

    for _ in 0..frames {
        let time = clock.tick(FRAME_DT);
        script_frame(time.frame, &mut character, &mut events);

        // Head bone bobs with the gait
        let step = (time.elapsed * 9.0).sin();
        let speed = character.velocity.length() / WALK_SPEED;
        head.set_offset(Vec3::new(0.0, HEAD_HEIGHT + step * 0.02 * speed, 0.0));

        for event in events.drain(..) {
            info!(frame = time.frame, ?event, "event");
            bus.publish(&event);
        }

        match time.frame {
            400 => {
                rig.borrow_mut().switch_to(free_look_index);
            }
            500 => {
                rig.borrow_mut().switch_to(0);
            }
            _ => {}
        }

        let look = Vec2::new(if time.frame < 90 { 0.5 } else { -0.2 }, 0.0);
        let transform = rig
            .borrow_mut()
            .update(time.frame, character, look, time.delta, &room);

        if rig.borrow().active().placement().is_some_and(|p| p.obstructed) {
            obstructed_frames += 1;
        }
        if !transform.position.is_finite() {
            warn!(frame = time.frame, "camera position went non-finite");
        }

        if time.frame % 30 == 0 {
            let rig = rig.borrow();
            let view = rig.active();
            let (axis, angle) = transform.rotation.to_axis_angle();
            info!(
                frame = time.frame,
                view = %view.profile().name,
                position = %transform.position,
                pitch = view.pitch(),
                yaw = view.yaw(),
                axis = %axis,
                angle = angle.to_degrees(),
                bob = %view.position_spring().value(),
                roll = view.rotation_spring().value().z,
                shake = %view.shake(),
                "camera"
            );
        }
    }

    info!(frames, obstructed_frames, "simulation finished");
    Ok(())
}
