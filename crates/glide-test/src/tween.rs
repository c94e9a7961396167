//! # Tween Tests
//!
//! Step planning, easing end points, color channel bounds and the one-tween-
//! per-element rule, across the stepped and native paths.

use std::cell::Cell;
use std::rc::Rc;

use glide_animation::{
    ease, AnimationError, Easing, StepOutcome, Timeline, TweenOptions, ANIMATING_CLASS,
};
use glide_css::parse_color;
use glide_dom::{DomEvent, HostCapabilities, Rect, StyleInspector, StyleValue};

use crate::Stage;

fn easings() -> Vec<Easing> {
    vec![
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::Custom("steps(4, end)".to_string()),
    ]
}

/// The final step lands on the end value exactly, whatever the curve.
#[test]
fn test_final_step_is_exact_for_every_easing() {
    for easing in easings() {
        assert_eq!(ease(3.0, 7, 7, 0.123, 97.25, &easing), 97.25);
        assert_eq!(ease(-4.5, 1, 1, 1.0, 0.1, &easing), 0.1);

        let stage = Stage::new(HostCapabilities::stepped());
        let elm = stage.element("div", None, Rect::default());
        let mut job = stage
            .animator
            .animate(
                &elm,
                TweenOptions::new("left", 97.0)
                    .from(3.0)
                    .easing(easing.clone()),
            )
            .unwrap()
            .into_job()
            .unwrap();
        let frames = job.run_to_completion();
        assert_eq!(frames.len(), 20, "{}", easing);
        assert_eq!(frames.last().unwrap().value, "97px", "{}", easing);
        assert_eq!(elm.style("left").as_deref(), Some("97px"));
    }
}

/// Steps are the distance capped by the number of intervals in the duration.
#[test]
fn test_step_count_formula() {
    let cases: [(&str, f64, f64, u64, u64, u32); 5] = [
        ("opacity", 0.0, 1.0, 1000, 50, 20),
        ("opacity", 1.0, 0.5, 1000, 10, 50),
        ("width", 0.0, 7.0, 1000, 50, 7),
        ("height", 300.0, 0.0, 400, 30, 14),
        ("top", 10.0, 10.0, 1000, 50, 0),
    ];

    for (property, from, to, duration, interval, expected) in cases {
        let stage = Stage::new(HostCapabilities::stepped());
        let elm = stage.element("div", None, Rect::default());
        let job = stage
            .animator
            .animate(
                &elm,
                TweenOptions::new(property, to)
                    .from(from)
                    .duration_ms(duration)
                    .interval_ms(interval),
            )
            .unwrap()
            .into_job()
            .unwrap();
        assert_eq!(
            job.total_steps(),
            expected,
            "{} {} -> {} over {}/{}",
            property,
            from,
            to,
            duration,
            interval
        );
    }
}

/// No rendered color frame ever leaves `0..=255`.
#[test]
fn test_color_channels_stay_in_range() {
    for easing in easings() {
        let stage = Stage::new(HostCapabilities::stepped());
        let elm = stage.element("div", None, Rect::default());
        let mut job = stage
            .animator
            .animate(
                &elm,
                TweenOptions::new("border-color", "#00FF80")
                    .from("rgb(255, 0, 0)")
                    .easing(easing.clone()),
            )
            .unwrap()
            .into_job()
            .unwrap();

        let frames = job.run_to_completion();
        assert_eq!(frames.len(), 20);
        for frame in &frames {
            assert_eq!(frame.value.len(), 7, "{} {}", easing, frame.value);
            let rgb = parse_color(&frame.value);
            for channel in rgb.channels() {
                assert!((0.0..=255.0).contains(&channel), "{} {}", easing, frame.value);
            }
        }
        assert_eq!(frames.last().unwrap().value, "#00FF80");
    }
}

/// Starting a second tween is refused and leaves the element alone.
#[test]
fn test_second_tween_refused_on_both_paths() {
    let stage = Stage::new(HostCapabilities::stepped());
    let elm = stage.element("div", None, Rect::default());
    let mut job = stage
        .animator
        .animate(&elm, TweenOptions::new("width", 40.0).from(0.0))
        .unwrap()
        .into_job()
        .unwrap();
    job.advance();
    let before = elm.style("width");

    let refused = stage
        .animator
        .animate(&elm, TweenOptions::new("width", 0.0).from(100.0));
    assert!(matches!(refused, Err(AnimationError::AlreadyAnimating(id)) if id == elm.id));
    assert_eq!(elm.style("width"), before);

    let stage = Stage::new(HostCapabilities::modern());
    let elm = stage.element("div", None, Rect::default());
    let first = stage
        .animator
        .animate(&elm, TweenOptions::new("height", 10.0).from(0.0))
        .unwrap();
    assert!(first.is_native());
    let transition = elm.style("transition");

    let refused = stage.animator.animate(
        &elm,
        TweenOptions::new("opacity", 0.0).duration_ms(200),
    );
    assert!(refused.is_err());
    assert_eq!(elm.style("transition"), transition);
    assert_eq!(elm.style("opacity"), None);
    assert_eq!(stage.registry.records_for(&elm).len(), 3);
}

/// A finished native tween frees the element for the next one.
#[test]
fn test_native_completion_allows_next_tween() {
    let stage = Stage::new(HostCapabilities::modern());
    let elm = stage.element("div", None, Rect::default());
    let done = Rc::new(Cell::new(false));
    let flag = done.clone();

    stage
        .animator
        .animate(
            &elm,
            TweenOptions::new("opacity", 0.0)
                .from(1.0)
                .on_complete(move || flag.set(true)),
        )
        .unwrap();
    assert_eq!(elm.style("opacity").as_deref(), Some("0"));

    stage.document.dispatch(
        &elm,
        &DomEvent::transition_end("mozTransitionEnd", "opacity", 1.0),
    );
    assert!(done.get());
    assert!(!elm.has_class(ANIMATING_CLASS));
    assert_eq!(elm.style("display").as_deref(), Some("none"));
    assert!(stage.registry.is_empty());

    let again = stage
        .animator
        .animate(&elm, TweenOptions::new("opacity", 1.0).from(0.0));
    assert!(again.is_ok());
    // Fading back in shows the element before the transition runs
    assert_eq!(elm.style("display").as_deref(), Some("block"));
}

/// Removing the animating class stops a job after one more frame.
#[test]
fn test_clearing_class_stops_after_one_more_frame() {
    let stage = Stage::new(HostCapabilities::stepped());
    let elm = stage.element("div", None, Rect::default());
    let mut job = stage
        .animator
        .animate(&elm, TweenOptions::new("left", 100.0).from(0.0))
        .unwrap()
        .into_job()
        .unwrap();

    assert!(matches!(job.advance(), StepOutcome::Continue { .. }));
    elm.remove_class(ANIMATING_CLASS);
    assert_eq!(job.advance(), StepOutcome::Finished);
    assert_eq!(job.step_index(), 2);
    assert_eq!(elm.style("left").as_deref(), Some("10px"));
    assert_eq!(job.advance(), StepOutcome::Finished);
    assert_eq!(elm.style("left").as_deref(), Some("10px"));
}

/// Fading out to nothing hides the element; fading in shows it again.
#[test]
fn test_stepped_fade_hides_and_shows() {
    let stage = Stage::new(HostCapabilities::stepped());
    let elm = stage.element("div", None, Rect::default());

    let mut timeline = Timeline::new();
    let out = stage
        .animator
        .animate(&elm, TweenOptions::new("opacity", 0.0).from(1.0))
        .unwrap()
        .into_job()
        .unwrap();
    timeline.add(out, 0);
    let end = timeline.run_until_idle(0);
    assert_eq!(end, 19 * 50);
    assert_eq!(elm.style("display").as_deref(), Some("none"));

    let mut back = stage
        .animator
        .animate(&elm, TweenOptions::new("opacity", 1.0))
        .unwrap()
        .into_job()
        .unwrap();
    back.advance();
    assert_eq!(elm.style("display").as_deref(), Some("block"));
    back.run_to_completion();
    assert_eq!(elm.style("opacity").as_deref(), Some("1"));
}

/// Box offsets never hide, even when they reach zero.
#[test]
fn test_offsets_do_not_hide() {
    let stage = Stage::new(HostCapabilities::stepped());
    let elm = stage.element("div", None, Rect::default());
    let mut job = stage
        .animator
        .animate(&elm, TweenOptions::new("left", 0.0).from(50.0))
        .unwrap()
        .into_job()
        .unwrap();
    job.run_to_completion();
    assert_eq!(elm.style("display"), None);
    assert_eq!(elm.offset_left(), 0.0);
}

/// Filter-opacity hosts round-trip through the inspector.
#[test]
fn test_filter_opacity_host() {
    let stage = Stage::new(HostCapabilities::legacy());
    let elm = stage.element("div", None, Rect::default());
    let mut job = stage
        .animator
        .animate(&elm, TweenOptions::new("opacity", 0.5))
        .unwrap()
        .into_job()
        .unwrap();
    job.run_to_completion();
    assert_eq!(elm.style("filter").as_deref(), Some("alpha(opacity=50)"));

    let inspector = glide_dom::ComputedStyleInspector::new(glide_dom::OpacitySupport::Filter);
    assert_eq!(inspector.read(&elm, "opacity"), StyleValue::Number(0.5));

    // The next tween starts where the last one ended
    let job = stage
        .animator
        .animate(&elm, TweenOptions::new("opacity", 1.0))
        .unwrap()
        .into_job()
        .unwrap();
    assert_eq!(job.total_steps(), 20);
    assert!((job.delta().unwrap() - 0.025).abs() < 1e-12);
}
