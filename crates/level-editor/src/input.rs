//! Per-frame input: pointer access and the queue of actions translated from
//! host events.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use scene_core::math::{Ray, Vec2};
use scene_view::Camera;
use serde::{Deserialize, Serialize};

use crate::config::InputBindings;
use crate::events::{EventBus, EventPayload, Subscription};

/// Where the pointer is, in normalized screen coordinates (`[-1, 1]`, +y up).
pub trait PointerSource {
    /// `None` while the pointer is outside the viewport.
    fn pointer(&self) -> Option<Vec2>;
}

impl PointerSource for Option<Vec2> {
    fn pointer(&self) -> Option<Vec2> {
        *self
    }
}

impl PointerSource for Vec2 {
    fn pointer(&self) -> Option<Vec2> {
        Some(*self)
    }
}

/// Camera and pointer for the current frame.
#[derive(Clone, Copy)]
pub struct Viewport<'a> {
    pub camera: &'a Camera,
    pub pointer: &'a dyn PointerSource,
}

impl<'a> Viewport<'a> {
    pub fn new(camera: &'a Camera, pointer: &'a dyn PointerSource) -> Self {
        Self { camera, pointer }
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer.pointer()
    }

    /// World ray through the pointer.
    pub fn pointer_ray(&self) -> Option<Ray> {
        self.camera.ray_from_ndc(self.pointer()?)
    }
}

/// Modifier keys held with a button press
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
    };

    /// Add to the current selection instead of replacing it.
    pub fn append(&self) -> bool {
        self.shift || self.control
    }
}

/// Editor-level action decoded from a host event
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    PrimaryDown(Modifiers),
    PrimaryUp,
    SecondaryDown,
    SecondaryUp,
    /// `None` deactivates every gizmo
    SetActiveGizmo(Option<String>),
    ToggleLocal,
    IncreaseSize,
    DecreaseSize,
    FocusLost,
    ToggleSnapping,
    Undo,
    Redo,
    DeleteSelection,
}

/// Actions queued by bus callbacks, drained once per tick.
pub struct InputQueue {
    actions: Rc<RefCell<VecDeque<InputAction>>>,
    _subscriptions: Vec<Subscription>,
}

impl InputQueue {
    /// Subscribe to every bound event on `bus`.
    pub fn connect(bus: &EventBus, bindings: &InputBindings) -> Self {
        let actions = Rc::new(RefCell::new(VecDeque::new()));

        let bind = |event: &str, decode: fn(&EventPayload) -> InputAction| {
            let queue = Rc::clone(&actions);
            bus.subscribe(event, move |payload| {
                queue.borrow_mut().push_back(decode(payload));
            })
        };

        let subscriptions = vec![
            bind(&bindings.primary_down, |p| match p {
                EventPayload::Modifiers(m) => InputAction::PrimaryDown(*m),
                _ => InputAction::PrimaryDown(Modifiers::NONE),
            }),
            bind(&bindings.primary_up, |_| InputAction::PrimaryUp),
            bind(&bindings.secondary_down, |_| InputAction::SecondaryDown),
            bind(&bindings.secondary_up, |_| InputAction::SecondaryUp),
            bind(&bindings.set_active_gizmo, |p| match p {
                EventPayload::Name(name) => InputAction::SetActiveGizmo(Some(name.clone())),
                _ => InputAction::SetActiveGizmo(None),
            }),
            bind(&bindings.toggle_local, |_| InputAction::ToggleLocal),
            bind(&bindings.increase_size, |_| InputAction::IncreaseSize),
            bind(&bindings.decrease_size, |_| InputAction::DecreaseSize),
            bind(&bindings.focus_lost, |_| InputAction::FocusLost),
            bind(&bindings.toggle_snapping, |_| InputAction::ToggleSnapping),
            bind(&bindings.undo, |_| InputAction::Undo),
            bind(&bindings.redo, |_| InputAction::Redo),
            bind(&bindings.delete_selection, |_| InputAction::DeleteSelection),
        ];

        Self {
            actions,
            _subscriptions: subscriptions,
        }
    }

    pub fn push(&self, action: InputAction) {
        self.actions.borrow_mut().push_back(action);
    }

    /// Queued actions, oldest first.
    pub fn drain(&self) -> Vec<InputAction> {
        self.actions.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InputQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputQueue")
            .field("pending", &self.len())
            .field("subscriptions", &self._subscriptions.len())
            .finish()
    }
}
