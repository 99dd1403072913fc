//! View Rig
//!
//! Owns the set of views a character can look through (first person, free look, ...) and
//! switches between them. Only the active view is ticked; a switch hands the outgoing view's
//! look angles and spring motion to the incoming one.
//!
//! Events that leave lasting state behind (lean, height, recoil rest, model and configuration
//! changes) reach every view so an inactive view is current when it is switched to. One-off
//! impulses (landing, shake, the elastic part of recoil) only move the active view.

use std::rc::Rc;

use glam::Vec2;
use tracing::{debug, warn};

use super::anchor::AnchorProvider;
use super::view_motion::{CharacterState, ViewMotionController, ViewTransform};
use crate::events::{ViewEvent, ViewEventHandler};
use crate::physics::collision::SphereCaster;

/// A collection of views with exactly one active.
pub struct ViewRig {
    views: Vec<ViewMotionController>,
    active: usize,
}

impl ViewRig {
    /// Create a rig whose first view is active.
    pub fn new(mut first: ViewMotionController) -> Self {
        let mut handoff = None;
        first.on_change_view_type(true, &mut handoff);
        Self {
            views: vec![first],
            active: 0,
        }
    }

    /// Add an inactive view and return its index.
    pub fn add_view(&mut self, mut view: ViewMotionController) -> usize {
        let mut discard = None;
        view.on_change_view_type(false, &mut discard);
        self.views.push(view);
        self.views.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &ViewMotionController {
        &self.views[self.active]
    }

    pub fn active_mut(&mut self) -> &mut ViewMotionController {
        &mut self.views[self.active]
    }

    pub fn view(&self, index: usize) -> Option<&ViewMotionController> {
        self.views.get(index)
    }

    /// Make `index` the active view. Returns `false` for an unknown index.
    pub fn switch_to(&mut self, index: usize) -> bool {
        if index >= self.views.len() {
            warn!(index, views = self.views.len(), "no such view");
            return false;
        }
        if index == self.active {
            return true;
        }

        let mut handoff = None;
        self.views[self.active].on_change_view_type(false, &mut handoff);
        self.views[index].on_change_view_type(true, &mut handoff);
        debug!(from = self.active, to = index, "switched view");
        self.active = index;
        true
    }

    /// Bind every view to the character's head anchor.
    pub fn attach_anchor(&mut self, anchor: Option<Rc<dyn AnchorProvider>>) {
        for view in &mut self.views {
            view.attach_to_anchor(anchor.clone());
        }
    }

    /// Tick the active view.
    pub fn update(
        &mut self,
        frame: u64,
        character: CharacterState,
        look: Vec2,
        dt: f32,
        caster: &dyn SphereCaster,
    ) -> ViewTransform {
        let view = self.active_mut();
        view.begin_tick(frame, character);
        view.update(look, dt, caster)
    }
}

impl ViewEventHandler for ViewRig {
    fn on_view_event(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::ModelSwitched { anchor } => self.attach_anchor(anchor.clone()),
            ViewEvent::Land { .. } | ViewEvent::Shake { .. } => {
                self.active_mut().on_view_event(event)
            }
            ViewEvent::SecondaryForce {
                position,
                rotation,
                rest_accumulation,
                ..
            } => {
                let active = self.active;
                for (index, view) in self.views.iter_mut().enumerate() {
                    if index == active {
                        view.on_view_event(event);
                    } else {
                        view.accumulate_recoil_rest(*position, *rotation, *rest_accumulation);
                    }
                }
            }
            ViewEvent::Lean { .. }
            | ViewEvent::AdjustHeight { .. }
            | ViewEvent::StateWillChange
            | ViewEvent::StateDidChange { .. } => {
                for view in &mut self.views {
                    view.on_view_event(event);
                }
            }
        }
    }
}
