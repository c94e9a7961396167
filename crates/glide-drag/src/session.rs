//! Per-gesture drag state and the press/move/release handlers.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glide_css::px;
use glide_dom::{
    cancel_bubble, total_offset, DomEvent, Element, EventRegistry, HandlerRef, NodeId, Point,
};
use tracing::{debug, trace};

use crate::engine::{Callback, DropZone};
use crate::{next_z_index, ACTIVE_CLASS, DROPABLE_CLASS};

/// State of one press-to-release gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Pointer position at press.
    pub click_offset: Point,
    /// Element offset at press.
    pub start_offset: Point,
    /// Page scroll at press.
    pub start_scroll: Point,
    /// Last position written to the element.
    pub position: Point,
    /// Zone the element currently sits in, if any.
    pub active_zone: Option<NodeId>,
    pub z_index: u64,
}

/// Event names for one input kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventNames {
    pub press: &'static str,
    pub motion: &'static str,
    pub release: &'static str,
}

impl EventNames {
    pub fn for_host(touch: bool) -> Self {
        if touch {
            Self {
                press: "touchstart",
                motion: "touchmove",
                release: "touchend",
            }
        } else {
            Self {
                press: "mousedown",
                motion: "mousemove",
                release: "mouseup",
            }
        }
    }
}

/// Everything the handlers of one binding share.
pub(crate) struct Shared {
    pub element: Rc<Element>,
    pub restrict: bool,
    /// Parent border widths, left+right and top+bottom.
    pub borders: Point,
    pub zones: Vec<DropZone>,
    pub tolerance_lead: f64,
    pub tolerance_tail: f64,
    pub names: EventNames,
    pub registry: Weak<EventRegistry>,
    pub session: RefCell<Option<DragSession>>,
    /// Document-level move and release handlers of the running gesture.
    pub listeners: RefCell<Option<(HandlerRef, HandlerRef)>>,
    pub on_start: RefCell<Option<Callback>>,
    pub on_tween: RefCell<Option<Callback>>,
    pub on_complete: RefCell<Option<Callback>>,
}

fn pointer(event: &DomEvent) -> Point {
    event
        .mouse_data()
        .map(|data| data.pointer_position())
        .unwrap_or_default()
}

fn call(callback: &RefCell<Option<Callback>>) {
    if let Some(callback) = callback.borrow_mut().as_mut() {
        callback();
    }
}

impl Shared {
    pub fn press(self: &Rc<Self>, event: &DomEvent) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let document = registry.document().clone();

        cancel_bubble(event);

        // A press without a release leaves listeners behind; drop them first
        self.detach_listeners(&registry);

        let element = &self.element;
        let start_offset = Point::new(element.offset_left(), element.offset_top());
        let session = DragSession {
            click_offset: pointer(event),
            start_offset,
            start_scroll: document.scroll(),
            position: start_offset,
            active_zone: None,
            z_index: next_z_index(),
        };

        element.set_style("z-index", &session.z_index.to_string());
        element.set_style("margin", "0");
        element.set_style("bottom", "auto");
        element.set_style("right", "auto");
        element.set_style("position", "absolute");
        element.add_class(ACTIVE_CLASS);

        debug!(
            element = element.id.raw(),
            z_index = session.z_index,
            x = session.click_offset.x,
            y = session.click_offset.y,
            "drag started"
        );
        *self.session.borrow_mut() = Some(session);

        call(&self.on_start);

        event.event().prevent_default();

        let root = document.root();
        let mover = {
            let shared = self.clone();
            HandlerRef::new(move |e| shared.drag_move(e))
        };
        let dropper = {
            let shared = self.clone();
            HandlerRef::new(move |e| shared.release(e))
        };
        let mover = registry.attach(&root, self.names.motion, mover, false);
        let dropper = registry.attach(&root, self.names.release, dropper, false);
        if let (Some(mover), Some(dropper)) = (mover, dropper) {
            *self.listeners.borrow_mut() = Some((mover, dropper));
        }

        self.drag_move(event);
    }

    pub fn drag_move(&self, event: &DomEvent) {
        if !self.element.has_class(ACTIVE_CLASS) {
            return;
        }
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        cancel_bubble(event);
        event.event().prevent_default();

        let Some(session) = self.session.borrow().clone() else {
            return;
        };
        let pointer = pointer(event);
        let scroll = registry.document().scroll();

        let mut position = Point::new(
            pointer.x - session.click_offset.x + session.start_offset.x
                - (session.start_scroll.x - scroll.x),
            pointer.y - session.click_offset.y + session.start_offset.y
                - (session.start_scroll.y - scroll.y),
        );

        if self.restrict {
            if let Some(parent) = self.element.parent() {
                let end_x = parent.offset_width() - self.element.offset_width() - self.borders.x;
                let end_y =
                    parent.offset_height() - self.element.offset_height() - self.borders.y;
                position.x = clamp_axis(position.x, end_x);
                position.y = clamp_axis(position.y, end_y);
            }
        }

        let mut active_zone = None;
        if !self.zones.is_empty() {
            let (snapped, zone) = self.evaluate_zones(position, false);
            position = snapped;
            active_zone = zone;
        }

        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.position = position;
            session.active_zone = active_zone;
        }

        self.element.set_style("margin", "0");
        self.element.set_style("left", &px(position.x));
        self.element.set_style("top", &px(position.y));
        trace!(
            element = self.element.id.raw(),
            x = position.x,
            y = position.y,
            "drag move"
        );

        call(&self.on_tween);
    }

    pub fn release(&self, _event: &DomEvent) {
        if !self.element.has_class(ACTIVE_CLASS) {
            return;
        }
        self.element.remove_class(ACTIVE_CLASS);

        if !self.zones.is_empty() {
            let position = self
                .session
                .borrow()
                .as_ref()
                .map(|s| s.position)
                .unwrap_or_default();
            let (_, zone) = self.evaluate_zones(position, true);
            if let Some(session) = self.session.borrow_mut().as_mut() {
                session.active_zone = zone;
            }
        }

        if let Some(registry) = self.registry.upgrade() {
            self.detach_listeners(&registry);
        }
        debug!(element = self.element.id.raw(), "drag ended");

        call(&self.on_complete);
    }

    /// Snap `position` onto the zones it falls into.
    ///
    /// Later zones are tested against the already-snapped position. With
    /// `commit`, each matching zone's drop callback runs.
    pub fn evaluate_zones(&self, position: Point, commit: bool) -> (Point, Option<NodeId>) {
        let mut position = position;
        let mut matched = None;
        let dragged = self.element.geometry();

        for zone in &self.zones {
            let zone_element = &zone.element;
            let origin = total_offset(zone_element, true);
            let size = zone_element.geometry();

            let inside_x = position.x > (origin.x - self.tolerance_lead).trunc()
                && position.x < (origin.x + size.width - self.tolerance_tail).trunc();
            let inside_y = position.y > (origin.y - self.tolerance_lead).trunc()
                && position.y < (origin.y + size.height - self.tolerance_tail).trunc();

            if !(inside_x && inside_y) {
                zone_element.remove_class(ACTIVE_CLASS);
                continue;
            }

            matched = Some(zone_element.id);
            zone_element.add_class(ACTIVE_CLASS);

            position = origin;
            if size.width > dragged.width {
                position.x += (size.width - dragged.width) / 2.0;
            }
            if size.height > dragged.height {
                position.y += (size.height - dragged.height) / 2.0;
            }

            if commit {
                zone_element.remove_class(ACTIVE_CLASS);
                debug!(
                    element = self.element.id.raw(),
                    zone = zone_element.id.raw(),
                    "dropped"
                );
                zone.drop_onto(&self.element);
            }
        }

        if matched.is_some() {
            self.element.add_class(DROPABLE_CLASS);
        } else {
            self.element.remove_class(DROPABLE_CLASS);
        }

        (position, matched)
    }

    pub fn detach_listeners(&self, registry: &EventRegistry) {
        let Some((mover, dropper)) = self.listeners.borrow_mut().take() else {
            return;
        };
        let root = registry.document().root();
        registry.detach(&root, self.names.motion, &mover, false);
        registry.detach(&root, self.names.release, &dropper, false);
    }
}

/// Clamp to `0..=end`, with 0 winning when `end` is negative.
fn clamp_axis(value: f64, end: f64) -> f64 {
    let value = if value > end { end } else { value };
    if value < 0.0 {
        0.0
    } else {
        value
    }
}
