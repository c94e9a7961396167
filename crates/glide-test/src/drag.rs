//! # Drag Tests
//!
//! Containment, drop-zone matching and stacking through real dispatch, plus
//! drags that hand off to the tween engine.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glide_animation::{Timeline, TweenOptions};
use glide_drag::{DragOptions, DropZone, ACTIVE_CLASS, DROPABLE_CLASS};
use glide_dom::{Element, HostCapabilities, Rect};

use crate::Stage;

fn board(stage: &Stage) -> (Rc<Element>, Rc<Element>) {
    let parent = stage.element("div", None, Rect::new(0.0, 0.0, 200.0, 200.0));
    parent.set_base_style("position", "relative");
    let item = stage.element("div", Some(&parent), Rect::new(0.0, 0.0, 50.0, 50.0));
    (parent, item)
}

/// A contained drag pinned to the far corner.
#[test]
fn test_contained_drag_stops_at_parent_edge() {
    let stage = Stage::new(HostCapabilities::modern());
    let (_, item) = board(&stage);
    let binding = stage
        .drag
        .bind(DragOptions::new(item.clone()).restrict())
        .unwrap();

    stage.press(&item, 0.0, 0.0);
    stage.move_to(9999.0, 9999.0);
    assert_eq!((item.offset_left(), item.offset_top()), (150.0, 150.0));

    stage.move_to(-300.0, 40.0);
    assert_eq!((item.offset_left(), item.offset_top()), (0.0, 40.0));

    stage.release(-300.0, 40.0);
    assert!(!binding.is_dragging());
    assert_eq!(binding.session().unwrap().position.y, 40.0);
}

/// Zone matching uses the lead and tail tolerances.
#[test]
fn test_zone_matches_within_tolerance() {
    let stage = Stage::new(HostCapabilities::modern());
    let (parent, item) = board(&stage);
    let zone = stage.element("div", Some(&parent), Rect::new(100.0, 100.0, 80.0, 80.0));
    let binding = stage
        .drag
        .bind(DragOptions::new(item.clone()).drop_zone(DropZone::new(zone.clone())))
        .unwrap();

    stage.press(&item, 0.0, 0.0);

    stage.move_to(75.0, 105.0);
    assert!(zone.has_class(ACTIVE_CLASS));
    assert!(item.has_class(DROPABLE_CLASS));
    assert_eq!(binding.session().unwrap().active_zone, Some(zone.id));

    stage.move_to(60.0, 105.0);
    assert!(!zone.has_class(ACTIVE_CLASS));
    assert!(!item.has_class(DROPABLE_CLASS));
    assert_eq!((item.offset_left(), item.offset_top()), (60.0, 105.0));
    assert_eq!(binding.session().unwrap().active_zone, None);

    // Far edge is trimmed by the tail tolerance
    stage.move_to(171.0, 120.0);
    assert!(!zone.has_class(ACTIVE_CLASS));
    stage.move_to(169.0, 120.0);
    assert!(zone.has_class(ACTIVE_CLASS));
}

/// Only the zone that was released over gets the drop.
#[test]
fn test_release_drops_on_matching_zone_only() {
    let stage = Stage::new(HostCapabilities::modern());
    let (parent, item) = board(&stage);
    let left = stage.element("div", Some(&parent), Rect::new(0.0, 120.0, 60.0, 60.0));
    let right = stage.element("div", Some(&parent), Rect::new(130.0, 120.0, 60.0, 60.0));

    let log = Rc::new(RefCell::new(Vec::new()));
    let (a, b) = (log.clone(), log.clone());
    let _binding = stage
        .drag
        .bind(
            DragOptions::new(item.clone())
                .drop_zone(DropZone::new(left).on_drop(move |_| a.borrow_mut().push("left")))
                .drop_zone(DropZone::new(right).on_drop(move |_| b.borrow_mut().push("right"))),
        )
        .unwrap();

    stage.press(&item, 0.0, 0.0);
    stage.move_to(140.0, 130.0);
    stage.release(140.0, 130.0);

    assert_eq!(*log.borrow(), vec!["right"]);
    // Snapped into the larger zone, centered
    assert_eq!((item.offset_left(), item.offset_top()), (135.0, 125.0));
}

/// Each grab goes on top of everything grabbed before.
#[test]
fn test_latest_grab_is_on_top() {
    let stage = Stage::new(HostCapabilities::modern());
    let (parent, first) = board(&stage);
    let second = stage.element("div", Some(&parent), Rect::new(60.0, 0.0, 50.0, 50.0));
    let a = stage.drag.bind(DragOptions::new(first.clone())).unwrap();
    let b = stage.drag.bind(DragOptions::new(second.clone())).unwrap();

    stage.press(&first, 0.0, 0.0);
    stage.release(0.0, 0.0);
    stage.press(&second, 60.0, 0.0);
    stage.release(60.0, 0.0);

    let (za, zb) = (a.session().unwrap().z_index, b.session().unwrap().z_index);
    assert!(zb > za);
    assert!(za > 99);
    assert_eq!(second.style("z-index"), Some(zb.to_string()));
}

/// Legacy hosts install the gesture listeners with `attachEvent`.
#[test]
fn test_drag_on_legacy_host() {
    let stage = Stage::new(HostCapabilities::legacy());
    let (_, item) = board(&stage);
    let binding = stage.drag.bind(DragOptions::new(item.clone())).unwrap();

    stage.press(&item, 5.0, 5.0);
    assert_eq!(stage.registry.records_for(&stage.document.root()).len(), 2);
    stage.move_to(25.0, 35.0);
    assert_eq!((item.offset_left(), item.offset_top()), (20.0, 30.0));
    stage.release(25.0, 35.0);

    assert!(!binding.is_dragging());
    assert!(stage.registry.records_for(&stage.document.root()).is_empty());
}

/// Registry teardown cuts a gesture off mid-drag.
#[test]
fn test_teardown_stops_drag() {
    let stage = Stage::new(HostCapabilities::modern());
    let (_, item) = board(&stage);
    let moves = Rc::new(Cell::new(0));
    let counter = moves.clone();
    let _binding = stage
        .drag
        .bind(DragOptions::new(item.clone()).on_tween(move || counter.set(counter.get() + 1)))
        .unwrap();

    stage.press(&item, 0.0, 0.0);
    stage.move_to(10.0, 10.0);
    assert_eq!(moves.get(), 2);

    stage.registry.teardown();
    assert!(stage.registry.is_empty());
    stage.move_to(80.0, 80.0);
    stage.press(&item, 0.0, 0.0);
    assert_eq!(moves.get(), 2);
    assert_eq!(item.offset_left(), 10.0);
}

/// A release outside every zone tweens the element back home.
#[test]
fn test_missed_drop_slides_back() {
    let stage = Rc::new(Stage::new(HostCapabilities::stepped()));
    let (parent, item) = board(&stage);
    item.set_style("left", "0px");
    let zone = stage.element("div", Some(&parent), Rect::new(120.0, 120.0, 70.0, 70.0));

    let timeline = Rc::new(RefCell::new(Timeline::new()));
    let returned = {
        let (stage, item, zone, timeline) =
            (Rc::downgrade(&stage), item.clone(), zone.clone(), timeline.clone());
        move || {
            let Some(stage) = stage.upgrade() else {
                return;
            };
            if zone.has_class(ACTIVE_CLASS) || item.has_class(DROPABLE_CLASS) {
                return;
            }
            let job = stage
                .animator
                .animate(&item, TweenOptions::new("left", 0.0).duration_ms(200))
                .ok()
                .and_then(|tween| tween.into_job());
            if let Some(job) = job {
                timeline.borrow_mut().add(job, 0);
            }
        }
    };
    let _binding = stage
        .drag
        .bind(
            DragOptions::new(item.clone())
                .drop_zone(DropZone::new(zone))
                .on_complete(returned),
        )
        .unwrap();

    stage.press(&item, 0.0, 0.0);
    stage.move_to(40.0, 0.0);
    stage.release(40.0, 0.0);
    assert_eq!(item.offset_left(), 40.0);
    assert_eq!(timeline.borrow().len(), 1);

    timeline.borrow_mut().run_until_idle(0);
    assert_eq!(item.offset_left(), 0.0);
    assert_eq!(item.style("left").as_deref(), Some("0px"));
}
