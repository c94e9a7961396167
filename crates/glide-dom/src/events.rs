//! # DOM Events
//!
//! Event types and the capture/bubble dispatch mechanism.
//!
//! Three low-level attachment mechanisms coexist on every [`EventTarget`],
//! matching what different hosts expose: standard listeners (with a capture
//! flag), legacy `attachEvent`-style handlers keyed by `on<type>`, and a single
//! `on<type>` property slot per event type.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Element, NodeId, Point};

/// Serial number of a dispatched event, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

impl EventId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Where an event is in its walk through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Not being dispatched.
    None,
    /// Root down to the target's parent.
    Capturing,
    AtTarget,
    /// Target's parent back up to the root.
    Bubbling,
}

/// State shared by every kind of event.
///
/// Dispatch bookkeeping lives in `Cell`s so handlers can stop propagation or
/// prevent the default through a shared reference.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    /// `"mousedown"`, `"transitionend"`, ...
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    phase: Cell<EventPhase>,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    stopped: Cell<bool>,
    prevented: Cell<bool>,
}

impl Event {
    pub fn new(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        Self {
            id: EventId::next(),
            event_type: event_type.to_string(),
            bubbles,
            cancelable,
            phase: Cell::new(EventPhase::None),
            target: Cell::new(None),
            current_target: Cell::new(None),
            stopped: Cell::new(false),
            prevented: Cell::new(false),
        }
    }

    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// The node whose handlers are running now.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Skip every node after the current one.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    /// Ignored unless the event is cancelable.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.prevented.set(true);
        }
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stopped.get()
    }

    pub fn default_prevented(&self) -> bool {
        self.prevented.get()
    }

    pub(crate) fn enter(&self, phase: EventPhase, node: Option<NodeId>) {
        self.phase.set(phase);
        self.current_target.set(node);
    }

    pub(crate) fn retarget(&self, target: NodeId) {
        self.target.set(Some(target));
    }
}

/// Mouse and touch event data.
#[derive(Debug, Clone, Default)]
pub struct MouseEventData {
    pub client_x: f64,
    pub client_y: f64,
    /// 0 for the primary button.
    pub button: i16,
    /// Node the pointer came from (`over`) or went to (`out`).
    pub related_target: Option<NodeId>,
    /// Active touch points, in viewport coordinates. Empty for mouse input.
    pub touches: Vec<Point>,
}

impl MouseEventData {
    /// Mouse data at a viewport position.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            client_x: x,
            client_y: y,
            ..Default::default()
        }
    }

    /// Set the related target.
    pub fn with_related(mut self, related: Option<NodeId>) -> Self {
        self.related_target = related;
        self
    }

    /// Pointer position: the first touch if any, else the client coordinates.
    pub fn pointer_position(&self) -> Point {
        self.touches
            .first()
            .copied()
            .unwrap_or(Point::new(self.client_x, self.client_y))
    }
}

/// Transition-end event data.
#[derive(Debug, Clone, Default)]
pub struct TransitionEventData {
    /// Name of the property that finished transitioning.
    pub property_name: String,
    /// Seconds the transition ran for.
    pub elapsed_time: f64,
}

/// An event plus whatever payload its kind carries.
#[derive(Debug, Clone)]
pub enum DomEvent {
    Generic(Event),
    /// Mouse or touch input.
    Mouse(Event, MouseEventData),
    Transition(Event, TransitionEventData),
}

impl DomEvent {
    pub fn event(&self) -> &Event {
        match self {
            DomEvent::Generic(event)
            | DomEvent::Mouse(event, _)
            | DomEvent::Transition(event, _) => event,
        }
    }

    /// Mouse data, if this is a mouse event.
    pub fn mouse_data(&self) -> Option<&MouseEventData> {
        match self {
            DomEvent::Mouse(_, data) => Some(data),
            _ => None,
        }
    }

    /// A cancelable event with no payload.
    pub fn generic(event_type: &str, bubbles: bool) -> Self {
        DomEvent::Generic(Event::new(event_type, bubbles, true))
    }

    pub fn mouse(event_type: &str, bubbles: bool, data: MouseEventData) -> Self {
        DomEvent::Mouse(Event::new(event_type, bubbles, true), data)
    }

    /// Create a transition-end event under one of its vendor names.
    pub fn transition_end(event_type: &str, property_name: &str, elapsed_time: f64) -> Self {
        DomEvent::Transition(
            Event::new(event_type, true, false),
            TransitionEventData {
                property_name: property_name.to_string(),
                elapsed_time,
            },
        )
    }
}

/// Stop an event from bubbling further.
pub fn cancel_bubble(event: &DomEvent) {
    event.event().stop_propagation();
}

/// Unique identity of an installed handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Event handler callback.
pub type EventHandler = dyn Fn(&DomEvent);

/// A shareable, identity-comparable event handler.
///
/// Two refs are equal when they were cloned from the same [`HandlerRef::new`] call.
#[derive(Clone)]
pub struct HandlerRef {
    id: HandlerId,
    callback: Rc<EventHandler>,
}

impl HandlerRef {
    pub fn new(callback: impl Fn(&DomEvent) + 'static) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self {
            id: HandlerId(COUNTER.fetch_add(1, Ordering::Relaxed)),
            callback: Rc::new(callback),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn call(&self, event: &DomEvent) {
        (self.callback)(event)
    }
}

impl PartialEq for HandlerRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HandlerRef {}

impl std::fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HandlerRef").field(&self.id.0).finish()
    }
}

/// Bind an element to an action, producing a handler that ignores the event.
pub fn closure(element: &Rc<Element>, action: impl Fn(&Rc<Element>) + 'static) -> HandlerRef {
    let element = element.clone();
    HandlerRef::new(move |_| action(&element))
}

struct StandardListener {
    handler: HandlerRef,
    capture: bool,
}

/// Event target mixin - manages the low-level listeners of a node.
#[derive(Default)]
pub struct EventTarget {
    /// Standard listeners keyed by event type.
    listeners: RefCell<HashMap<String, Vec<StandardListener>>>,
    /// Legacy handlers keyed by `on<type>`.
    legacy: RefCell<HashMap<String, Vec<HandlerRef>>>,
    /// `on<type>` property slots.
    properties: RefCell<HashMap<String, HandlerRef>>,
}

impl EventTarget {
    /// Create a new event target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a standard listener.
    pub fn add_event_listener(&self, event_type: &str, handler: HandlerRef, capture: bool) {
        self.listeners
            .borrow_mut()
            .entry(event_type.to_string())
            .or_default()
            .push(StandardListener { handler, capture });
    }

    /// Remove the first standard listener matching handler and capture flag.
    pub fn remove_event_listener(&self, event_type: &str, handler: &HandlerRef, capture: bool) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(event_type) {
            if let Some(pos) = list
                .iter()
                .position(|l| &l.handler == handler && l.capture == capture)
            {
                list.remove(pos);
            }
            if list.is_empty() {
                listeners.remove(event_type);
            }
        }
    }

    /// Attach a legacy handler under `on<type>`.
    pub fn attach_event(&self, on_type: &str, handler: HandlerRef) {
        self.legacy
            .borrow_mut()
            .entry(on_type.to_string())
            .or_default()
            .push(handler);
    }

    /// Detach a legacy handler.
    pub fn detach_event(&self, on_type: &str, handler: &HandlerRef) {
        let mut legacy = self.legacy.borrow_mut();
        if let Some(list) = legacy.get_mut(on_type) {
            if let Some(pos) = list.iter().position(|h| h == handler) {
                list.remove(pos);
            }
            if list.is_empty() {
                legacy.remove(on_type);
            }
        }
    }

    /// Assign or clear the `on<type>` property slot.
    pub fn set_property_handler(&self, on_type: &str, handler: Option<HandlerRef>) {
        let mut properties = self.properties.borrow_mut();
        match handler {
            Some(handler) => {
                properties.insert(on_type.to_string(), handler);
            }
            None => {
                properties.remove(on_type);
            }
        }
    }

    /// Check if anything would run for an event type.
    pub fn has_listeners(&self, event_type: &str) -> bool {
        let on_type = format!("on{}", event_type);
        self.listeners.borrow().contains_key(event_type)
            || self.legacy.borrow().contains_key(&on_type)
            || self.properties.borrow().contains_key(&on_type)
    }

    /// Total number of installed handlers across all mechanisms.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum::<usize>()
            + self.legacy.borrow().values().map(Vec::len).sum::<usize>()
            + self.properties.borrow().len()
    }

    /// Snapshot the handlers that should run for an event in a phase.
    ///
    /// The snapshot is taken before anything runs, so handlers may add or
    /// remove listeners on this target while the event is being dispatched.
    fn handlers_for(&self, event_type: &str, phase: EventPhase) -> Vec<HandlerRef> {
        let mut handlers = Vec::new();

        if let Some(list) = self.listeners.borrow().get(event_type) {
            handlers.extend(
                list.iter()
                    .filter(|l| match phase {
                        EventPhase::Capturing => l.capture,
                        EventPhase::AtTarget => true,
                        EventPhase::Bubbling => !l.capture,
                        EventPhase::None => false,
                    })
                    .map(|l| l.handler.clone()),
            );
        }

        if matches!(phase, EventPhase::AtTarget | EventPhase::Bubbling) {
            let on_type = format!("on{}", event_type);
            if let Some(list) = self.legacy.borrow().get(&on_type) {
                handlers.extend(list.iter().cloned());
            }
            if let Some(handler) = self.properties.borrow().get(&on_type) {
                handlers.push(handler.clone());
            }
        }

        handlers
    }

    fn invoke(&self, event: &DomEvent, phase: EventPhase) {
        for handler in self.handlers_for(&event.event().event_type, phase) {
            handler.call(event);
        }
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Walks an event through capture, target and bubble.
pub struct EventDispatcher;

impl EventDispatcher {
    /// `ancestors` run root first. Returns false when a handler prevented the
    /// default action.
    pub fn dispatch(event: &DomEvent, target: &Rc<Element>, ancestors: &[Rc<Element>]) -> bool {
        let base = event.event();
        base.retarget(target.id);

        for node in ancestors {
            if base.propagation_stopped() {
                break;
            }
            base.enter(EventPhase::Capturing, Some(node.id));
            node.event_target.invoke(event, EventPhase::Capturing);
        }

        if !base.propagation_stopped() {
            base.enter(EventPhase::AtTarget, Some(target.id));
            target.event_target.invoke(event, EventPhase::AtTarget);
        }

        if base.bubbles {
            for node in ancestors.iter().rev() {
                if base.propagation_stopped() {
                    break;
                }
                base.enter(EventPhase::Bubbling, Some(node.id));
                node.event_target.invoke(event, EventPhase::Bubbling);
            }
        }

        base.enter(EventPhase::None, None);
        !base.default_prevented()
    }
}
