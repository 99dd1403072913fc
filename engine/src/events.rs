//! View Events
//!
//! Discrete character events that nudge the camera (landing, leaning, recoil, ...) and a small
//! synchronous publish/subscribe bus to deliver them.
//!
//! Subscribers register explicitly and are held weakly, so dropping a view is enough to stop
//! delivery. Handlers run immediately inside [`EventBus::publish`]; nothing is queued.
//!
//! # Example
//!
//! ```ignore
//! use std::{cell::RefCell, rc::Rc};
//! use spring_cam_engine::events::{EventBus, ViewEvent};
//!
//! let view = Rc::new(RefCell::new(controller));
//! let mut bus = EventBus::new();
//! let id = bus.subscribe(&view);
//! bus.publish(&ViewEvent::Land { height: 2.0 });
//! bus.unsubscribe(id);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;
use tracing::warn;

use crate::camera::anchor::AnchorProvider;
use crate::config::MotionConfig;

/// An event delivered to view controllers.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// The character landed after falling `height` meters.
    Land { height: f32 },
    /// Lean state changed. Zero distance and tilt end the lean.
    Lean { distance: f32, tilt: f32, multiplier: f32 },
    /// The character's eye height changed by `amount` (crouch, slopes, ...).
    AdjustHeight { amount: f32 },
    /// Add shake trauma in [0, 1].
    Shake { intensity: f32 },
    /// Recoil style impulse into the secondary springs.
    SecondaryForce {
        position: Vec3,
        rotation: Vec3,
        rest_accumulation: f32,
        softness: usize,
    },
    /// The character model changed; rebind to its head anchor.
    ModelSwitched { anchor: Option<Rc<dyn AnchorProvider>> },
    /// Configuration is about to change.
    StateWillChange,
    /// Configuration changed. `config` is the new tuning, if any.
    StateDidChange { config: Option<Box<MotionConfig>> },
}

/// Receiver of view events.
pub trait ViewEventHandler {
    fn on_view_event(&mut self, event: &ViewEvent);
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Single-threaded synchronous event bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Weak<RefCell<dyn ViewEventHandler>>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. The bus keeps only a weak reference.
    pub fn subscribe<H>(&mut self, handler: &Rc<RefCell<H>>) -> SubscriptionId
    where
        H: ViewEventHandler + 'static,
    {
        let handler: Rc<RefCell<dyn ViewEventHandler>> = handler.clone();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Rc::downgrade(&handler)));
        id
    }

    /// Remove a handler. Returns `false` when the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.iter().filter(|(_, h)| h.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every live subscriber, returning how many received it.
    ///
    /// Dropped subscribers are pruned. A handler that is already borrowed (an event published
    /// from inside a handler back to itself) is skipped.
    pub fn publish(&mut self, event: &ViewEvent) -> usize {
        self.subscribers.retain(|(_, handler)| handler.strong_count() > 0);

        let mut delivered = 0;
        for (id, handler) in &self.subscribers {
            let Some(handler) = handler.upgrade() else {
                continue;
            };
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    handler.on_view_event(event);
                    delivered += 1;
                }
                Err(_) => warn!(?id, "skipping re-entrant view event delivery"),
            }
        }
        delivered
    }
}
