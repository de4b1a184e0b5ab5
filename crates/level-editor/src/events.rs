//! 名前付きイベントの購読管理
//!
//! `subscribe` は [`Subscription`] ハンドルを返し、ハンドルの drop または
//! `dispose()` で購読が解除される。シングルスレッド前提なので `Rc`/`RefCell`。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use scene_core::NodeId;
use tracing::trace;

use crate::input::Modifiers;

/// Published when the picker's hovered node changes
pub const HOVER_ENTER: &str = "hover-enter";
pub const HOVER_LEAVE: &str = "hover-leave";
/// Published after every change of the selection
pub const SELECTION_CHANGED: &str = "selection-changed";

/// Event payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,
    Modifiers(Modifiers),
    Name(String),
    Node(NodeId),
}

type Callback = Rc<RefCell<dyn FnMut(&EventPayload)>>;

/// 購読情報
struct Listener {
    id: u32,
    event: String,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    listeners: Vec<Listener>,
    next_id: u32,
}

/// Shared named-event bus. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        event: impl Into<String>,
        callback: impl FnMut(&EventPayload) + 'static,
    ) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.push(Listener {
            id,
            event: event.into(),
            callback: Rc::new(RefCell::new(callback)),
        });

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Deliver `payload` to every listener of `event`; returns how many ran.
    ///
    /// Listeners may subscribe or unsubscribe while being called. A listener
    /// that publishes an event it listens to is not re-entered.
    pub fn publish(&self, event: &str, payload: EventPayload) -> usize {
        let callbacks: Vec<Callback> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .map(|l| Rc::clone(&l.callback))
            .collect();

        let mut delivered = 0;
        for callback in callbacks {
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(&payload);
                delivered += 1;
            }
        }
        trace!("published '{}' to {} listener(s)", event, delivered);
        delivered
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.registry.borrow().listeners.len();
        f.debug_struct("EventBus").field("listeners", &count).finish()
    }
}

/// Keeps a listener registered for as long as it lives.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u32,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    /// 購読を解除
    pub fn dispose(self) {}

    /// True while both the bus and the listener are alive.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| {
                let registry = registry.borrow();
                registry.listeners.iter().any(|l| l.id == self.id)
            })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.listeners.retain(|l| l.id != self.id);
            }
        }
    }
}
