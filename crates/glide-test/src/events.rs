//! # Event Registry Tests
//!
//! Registry bookkeeping, bulk removal and enter/leave filtering, driven through
//! real dispatch on a [`Stage`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glide_dom::{closure, DomEvent, HandlerRef, HostCapabilities, MouseEventData, Rect};

use crate::Stage;

fn counter() -> (Rc<Cell<u32>>, HandlerRef) {
    let count = Rc::new(Cell::new(0));
    let sink = count.clone();
    (count, HandlerRef::new(move |_| sink.set(sink.get() + 1)))
}

fn over(related: Option<glide_dom::NodeId>) -> DomEvent {
    DomEvent::mouse("mouseover", true, MouseEventData::at(5.0, 5.0).with_related(related))
}

/// Bulk removal leaves nothing recorded and nothing firing.
#[test]
fn test_detach_all_silences_everything() {
    let stage = Stage::new(HostCapabilities::modern());
    let panel = stage.element("div", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    let button = stage.element("button", Some(&panel), Rect::new(10.0, 10.0, 20.0, 20.0));

    let (count, handler) = counter();
    stage.registry.attach(&panel, "click", handler.clone(), false);
    stage.registry.attach(&button, "click", handler.clone(), true);
    stage.registry.attach(&button, "mouseenter", handler, false);
    assert_eq!(stage.registry.len(), 3);

    stage
        .document
        .dispatch(&button, &DomEvent::generic("click", true));
    assert_eq!(count.get(), 2);

    stage.registry.detach_all(None);
    assert!(stage.registry.is_empty());

    stage
        .document
        .dispatch(&button, &DomEvent::generic("click", true));
    stage.document.dispatch(&button, &over(None));
    assert_eq!(count.get(), 2);
    assert_eq!(panel.event_target.listener_count(), 0);
    assert_eq!(button.event_target.listener_count(), 0);
}

/// Capture listeners are removed too; removal honors each record's flag.
#[test]
fn test_teardown_removes_capture_listeners() {
    let stage = Stage::new(HostCapabilities::modern());
    let panel = stage.element("div", None, Rect::default());
    let (count, handler) = counter();
    stage.registry.attach(&panel, "mousedown", handler, true);

    stage.registry.teardown();
    stage.document.dispatch(
        &panel,
        &DomEvent::mouse("mousedown", true, MouseEventData::at(0.0, 0.0)),
    );
    assert_eq!(count.get(), 0);
    assert!(!panel.event_target.has_listeners("mousedown"));
}

/// Moving between descendants does not count as entering.
#[test]
fn test_mouseenter_filters_descendant_moves() {
    let stage = Stage::new(HostCapabilities::modern());
    let menu = stage.element("ul", None, Rect::new(0.0, 0.0, 100.0, 100.0));
    let item = stage.element("li", Some(&menu), Rect::new(0.0, 0.0, 100.0, 20.0));
    let label = stage.element("span", Some(&item), Rect::new(0.0, 0.0, 40.0, 20.0));

    let (count, handler) = counter();
    stage.registry.attach(&menu, "mouseenter", handler, false);

    // From a descendant to a deeper descendant, bubbling up to the menu
    stage.document.dispatch(&label, &over(Some(item.id)));
    // From a descendant back onto the menu itself
    stage.document.dispatch(&menu, &over(Some(label.id)));
    assert_eq!(count.get(), 0);

    // From outside the menu
    stage
        .document
        .dispatch(&item, &over(Some(stage.document.body().id)));
    assert_eq!(count.get(), 1);
}

/// `mouseleave` is recorded as `mouseout` and filtered the same way.
#[test]
fn test_mouseleave_fires_once_when_pointer_exits() {
    let stage = Stage::new(HostCapabilities::modern());
    let card = stage.element("div", None, Rect::default());
    let inner = stage.element("p", Some(&card), Rect::default());
    let outside = stage.element("div", None, Rect::default());

    let (count, handler) = counter();
    stage.registry.attach(&card, "mouseleave", handler, false);
    assert_eq!(stage.registry.records_for(&card)[0].event_name, "mouseout");

    let out = |related: &Rc<glide_dom::Element>| {
        DomEvent::mouse(
            "mouseout",
            true,
            MouseEventData::at(0.0, 0.0).with_related(Some(related.id)),
        )
    };
    stage.document.dispatch(&card, &out(&inner));
    assert_eq!(count.get(), 0);

    stage.document.dispatch(&card, &out(&outside));
    assert_eq!(count.get(), 1);
}

/// Every host mechanism supports the same attach/detach round.
#[test]
fn test_mechanisms_agree() {
    for capabilities in [
        HostCapabilities::modern(),
        HostCapabilities::legacy(),
        HostCapabilities::property_only(),
    ] {
        let stage = Stage::new(capabilities.clone());
        let target = stage.element("div", None, Rect::default());
        let (count, handler) = counter();

        let installed = stage
            .registry
            .attach(&target, "click", handler, false)
            .unwrap();
        stage
            .document
            .dispatch(&target, &DomEvent::generic("click", true));
        assert_eq!(count.get(), 1, "{:?}", capabilities.listener_api());

        stage.registry.detach(&target, "click", &installed, false);
        stage
            .document
            .dispatch(&target, &DomEvent::generic("click", true));
        assert_eq!(count.get(), 1, "{:?}", capabilities.listener_api());
        assert!(stage.registry.is_empty());
    }
}

/// Handlers that detach themselves during dispatch do not disturb the others.
#[test]
fn test_self_detaching_handler() {
    let stage = Stage::new(HostCapabilities::modern());
    let target = stage.element("div", None, Rect::default());
    let registry = stage.registry.clone();

    let slot: Rc<RefCell<Option<HandlerRef>>> = Rc::new(RefCell::new(None));
    let fired = Rc::new(Cell::new(0));
    let once = {
        let (slot, fired, target) = (slot.clone(), fired.clone(), target.clone());
        HandlerRef::new(move |_| {
            fired.set(fired.get() + 1);
            if let Some(me) = slot.borrow_mut().take() {
                registry.detach(&target, "click", &me, false);
            }
        })
    };
    *slot.borrow_mut() = stage.registry.attach(&target, "click", once, false);
    let (count, other) = counter();
    stage.registry.attach(&target, "click", other, false);

    for _ in 0..3 {
        stage
            .document
            .dispatch(&target, &DomEvent::generic("click", true));
    }
    assert_eq!(fired.get(), 1);
    assert_eq!(count.get(), 3);
    assert_eq!(stage.registry.len(), 1);
}

/// `closure` hands the bound element to its action.
#[test]
fn test_closure_handler_through_registry() {
    let stage = Stage::new(HostCapabilities::modern());
    let toggle = stage.element("a", None, Rect::default());
    let handler = closure(&toggle, |elm| {
        elm.toggle_class("open");
    });
    stage.registry.attach(&toggle, "click", handler, false);

    stage
        .document
        .dispatch(&toggle, &DomEvent::generic("click", true));
    assert!(toggle.has_class("open"));
    stage
        .document
        .dispatch(&toggle, &DomEvent::generic("click", true));
    assert!(!toggle.has_class("open"));
}
