//! Event registry: attaches handlers through whichever mechanism the host
//! supports and remembers every attachment so it can be undone in bulk.
//!
//! Handlers commonly capture the element they are installed on, which forms an
//! `Rc` cycle through the element's listener table. [`EventRegistry::teardown`]
//! breaks all of those cycles at once.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::events::{DomEvent, HandlerRef};
use crate::{is_child_of, Document, Element, ListenerApi};

/// One attachment made through the registry.
#[derive(Debug, Clone)]
pub struct ListenerRecord {
    pub target: Rc<Element>,
    /// Primitive event name actually installed (`mouseenter` is recorded as `mouseover`).
    pub event_name: String,
    /// The handler as installed, which for enter/leave is the wrapper.
    pub handler: HandlerRef,
    pub capture: bool,
}

/// Records every listener attached through it.
#[derive(Debug)]
pub struct EventRegistry {
    document: Rc<Document>,
    records: RefCell<Vec<ListenerRecord>>,
}

/// Map the synthetic enter/leave names onto the primitives they are built from.
fn primitive_name(event_name: &str) -> &str {
    match event_name {
        "mouseenter" => "mouseover",
        "mouseleave" => "mouseout",
        other => other,
    }
}

impl EventRegistry {
    pub fn new(document: Rc<Document>) -> Rc<Self> {
        Rc::new(Self {
            document,
            records: RefCell::new(Vec::new()),
        })
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    /// Attach a handler and record it.
    ///
    /// Returns the handler as installed, which differs from `handler` for
    /// `mouseenter`/`mouseleave`. Returns `None` when the host has no listener
    /// mechanism at all.
    pub fn attach(
        &self,
        target: &Rc<Element>,
        event_name: &str,
        handler: HandlerRef,
        capture: bool,
    ) -> Option<HandlerRef> {
        let Some(api) = self.document.capabilities().listener_api() else {
            warn!(event = event_name, "host has no listener mechanism, handler dropped");
            return None;
        };

        let primitive = primitive_name(event_name);
        let installed = if primitive != event_name {
            self.wrap_enter_leave(target, handler)
        } else {
            handler
        };

        let on_type = format!("on{}", primitive);
        match api {
            ListenerApi::Standard => {
                target
                    .event_target
                    .add_event_listener(primitive, installed.clone(), capture)
            }
            ListenerApi::Legacy => target.event_target.attach_event(&on_type, installed.clone()),
            ListenerApi::Property => target
                .event_target
                .set_property_handler(&on_type, Some(installed.clone())),
        }

        trace!(
            target = target.id.raw(),
            event = primitive,
            ?api,
            capture,
            "attached listener"
        );

        self.records.borrow_mut().push(ListenerRecord {
            target: target.clone(),
            event_name: primitive.to_string(),
            handler: installed.clone(),
            capture,
        });

        Some(installed)
    }

    /// Detach a handler previously returned by [`attach`](Self::attach) and
    /// drop the first matching record.
    pub fn detach(&self, target: &Rc<Element>, event_name: &str, handler: &HandlerRef, capture: bool) {
        let primitive = primitive_name(event_name);
        let on_type = format!("on{}", primitive);

        match self.document.capabilities().listener_api() {
            Some(ListenerApi::Standard) => {
                target
                    .event_target
                    .remove_event_listener(primitive, handler, capture)
            }
            Some(ListenerApi::Legacy) => target.event_target.detach_event(&on_type, handler),
            // The slot holds one handler; clearing it is all that can be done
            Some(ListenerApi::Property) => target.event_target.set_property_handler(&on_type, None),
            None => {}
        }

        let mut records = self.records.borrow_mut();
        if let Some(pos) = records.iter().position(|r| {
            r.target.id == target.id && r.event_name == primitive && &r.handler == handler
        }) {
            records.remove(pos);
        }
    }

    /// Detach every recorded listener, or only those on `target`.
    ///
    /// Records are processed from newest to oldest.
    pub fn detach_all(&self, target: Option<&Rc<Element>>) {
        let mut index = self.records.borrow().len();
        let mut removed = 0usize;
        while index > 0 {
            index -= 1;
            let record = match self.records.borrow().get(index) {
                Some(record) => record.clone(),
                None => continue,
            };
            if target.is_some_and(|t| t.id != record.target.id) {
                continue;
            }
            self.detach(&record.target, &record.event_name, &record.handler, record.capture);
            removed += 1;
        }
        debug!(
            removed,
            scoped = target.is_some(),
            "detached recorded listeners"
        );
    }

    /// Remove everything, as done when the page unloads.
    pub fn teardown(&self) {
        self.detach_all(None);
    }

    /// Whether `maybe_ancestor` is a strict ancestor of `candidate`, below `body`.
    pub fn ancestor_of(&self, candidate: &Rc<Element>, maybe_ancestor: &Rc<Element>) -> bool {
        candidate.id != maybe_ancestor.id && is_child_of(candidate, maybe_ancestor, &self.document)
    }

    /// Records currently held for `target`.
    pub fn records_for(&self, target: &Rc<Element>) -> Vec<ListenerRecord> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.target.id == target.id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Wrap a handler so it only fires when the pointer crosses the boundary of
    /// the element it is installed on, not when moving between its descendants.
    fn wrap_enter_leave(&self, target: &Rc<Element>, handler: HandlerRef) -> HandlerRef {
        let document: Weak<Document> = Rc::downgrade(&self.document);
        let this: Weak<Element> = Rc::downgrade(target);

        HandlerRef::new(move |event: &DomEvent| {
            let (Some(document), Some(this)) = (document.upgrade(), this.upgrade()) else {
                return;
            };
            let related = event
                .mouse_data()
                .and_then(|data| data.related_target)
                .and_then(|id| document.get(id));
            if let Some(related) = related {
                if is_child_of(&related, &this, &document) {
                    return;
                }
            }
            handler.call(event);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HostCapabilities, MouseEventData};
    use std::cell::Cell;

    fn setup(capabilities: HostCapabilities) -> (Rc<EventRegistry>, Rc<Element>, Rc<Element>) {
        let doc = Document::new(capabilities);
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.body().append_child(outer.clone());
        outer.append_child(inner.clone());
        (EventRegistry::new(doc), outer, inner)
    }

    fn counter() -> (Rc<Cell<u32>>, HandlerRef) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        (count, HandlerRef::new(move |_| count_clone.set(count_clone.get() + 1)))
    }

    #[test]
    fn test_attach_records_and_fires() {
        let (registry, outer, _) = setup(HostCapabilities::modern());
        let (count, handler) = counter();

        let installed = registry.attach(&outer, "click", handler.clone(), false);
        assert_eq!(installed, Some(handler));
        assert_eq!(registry.len(), 1);

        registry
            .document()
            .dispatch(&outer, &DomEvent::generic("click", true));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_detach_removes_listener_and_record() {
        let (registry, outer, _) = setup(HostCapabilities::modern());
        let (count, handler) = counter();

        let installed = registry.attach(&outer, "click", handler, false);
        let installed = installed.expect("installed");
        registry.detach(&outer, "click", &installed, false);

        assert!(registry.is_empty());
        registry
            .document()
            .dispatch(&outer, &DomEvent::generic("click", true));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_enter_is_recorded_as_over() {
        let (registry, outer, _) = setup(HostCapabilities::modern());
        let (_, handler) = counter();

        let installed = registry
            .attach(&outer, "mouseenter", handler.clone(), false)
            .expect("installed");
        assert_ne!(installed, handler);

        let records = registry.records_for(&outer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_name, "mouseover");
        assert!(outer.event_target.has_listeners("mouseover"));

        registry.detach(&outer, "mouseenter", &installed, false);
        assert!(!outer.event_target.has_listeners("mouseover"));
    }

    #[test]
    fn test_enter_ignores_moves_within_element() {
        let (registry, outer, inner) = setup(HostCapabilities::modern());
        let (count, handler) = counter();
        registry.attach(&outer, "mouseenter", handler, false);
        let doc = registry.document().clone();

        // Pointer moves from a descendant onto the element itself
        let over = DomEvent::mouse(
            "mouseover",
            true,
            MouseEventData::at(1.0, 1.0).with_related(Some(inner.id)),
        );
        doc.dispatch(&outer, &over);
        assert_eq!(count.get(), 0);

        // Pointer arrives from outside
        let over = DomEvent::mouse(
            "mouseover",
            true,
            MouseEventData::at(1.0, 1.0).with_related(Some(doc.body().id)),
        );
        doc.dispatch(&outer, &over);
        assert_eq!(count.get(), 1);

        // No related target at all
        let over = DomEvent::mouse("mouseover", true, MouseEventData::at(1.0, 1.0));
        doc.dispatch(&outer, &over);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_detach_all_scoped() {
        let (registry, outer, inner) = setup(HostCapabilities::modern());
        let (_, a) = counter();
        let (_, b) = counter();
        let (_, c) = counter();
        registry.attach(&outer, "click", a, false);
        registry.attach(&inner, "click", b, true);
        registry.attach(&outer, "mousedown", c, false);

        registry.detach_all(Some(&outer));
        assert_eq!(registry.len(), 1);
        assert_eq!(outer.event_target.listener_count(), 0);
        assert_eq!(inner.event_target.listener_count(), 1);

        registry.teardown();
        assert!(registry.is_empty());
        assert_eq!(inner.event_target.listener_count(), 0);
    }

    #[test]
    fn test_legacy_mechanism() {
        let (registry, outer, _) = setup(HostCapabilities::legacy());
        let (count, handler) = counter();

        let installed = registry
            .attach(&outer, "click", handler, false)
            .expect("installed");
        registry
            .document()
            .dispatch(&outer, &DomEvent::generic("click", true));
        assert_eq!(count.get(), 1);

        registry.detach(&outer, "click", &installed, false);
        assert!(!outer.event_target.has_listeners("click"));
    }

    #[test]
    fn test_property_mechanism_keeps_one_handler() {
        let (registry, outer, _) = setup(HostCapabilities::property_only());
        let (first, a) = counter();
        let (second, b) = counter();
        registry.attach(&outer, "click", a, false);
        registry.attach(&outer, "click", b, false);

        registry
            .document()
            .dispatch(&outer, &DomEvent::generic("click", true));
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_no_mechanism_returns_none() {
        let caps = HostCapabilities {
            property_handlers: false,
            ..HostCapabilities::property_only()
        };
        let (registry, outer, _) = setup(caps);
        let (_, handler) = counter();
        assert!(registry.attach(&outer, "click", handler, false).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ancestor_of() {
        let (registry, outer, inner) = setup(HostCapabilities::modern());
        assert!(registry.ancestor_of(&inner, &outer));
        assert!(!registry.ancestor_of(&outer, &inner));
        assert!(!registry.ancestor_of(&outer, &outer));
    }
}
