//! Starting tweens.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use glide_common::TweenDefaults;
use glide_css::{is_box_offset, parse_color, px, PropertyKind, Rgb};
use glide_dom::{
    set_opacity, ComputedStyleInspector, Element, EventRegistry, HandlerRef, StyleInspector,
    StyleValue,
};
use tracing::debug;

use crate::easing::Easing;
use crate::job::{CompleteCallback, JobParams, StartCallback, Track, TweenCallback, TweenJob};
use crate::{AnimationError, ANIMATING_CLASS};

/// Vendor names of the transition-end event.
pub const TRANSITION_END_EVENTS: [&str; 3] =
    ["transitionend", "webkitTransitionEnd", "mozTransitionEnd"];

/// Style properties that carry the native transition declaration.
const TRANSITION_PROPERTIES: [&str; 5] = [
    "transition",
    "-webkit-transition",
    "-moz-transition",
    "-ms-transition",
    "-o-transition",
];

/// A start or end value.
#[derive(Debug, Clone, PartialEq)]
pub enum TweenValue {
    Number(f64),
    /// Colors (`#RRGGBB`, `#RGB`, `rgb(...)`) or lengths with units.
    Text(String),
}

impl TweenValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            TweenValue::Number(n) => Some(*n),
            TweenValue::Text(text) => StyleValue::Text(text.clone())
                .as_number()
                .or_else(|| glide_css::strip_units(text)),
        }
    }

    fn as_color(&self) -> Option<Rgb> {
        match self {
            TweenValue::Text(text) => Some(parse_color(text)),
            TweenValue::Number(_) => None,
        }
    }

    fn as_css(&self) -> String {
        match self {
            TweenValue::Number(n) => n.to_string(),
            TweenValue::Text(text) => text.clone(),
        }
    }
}

impl From<f64> for TweenValue {
    fn from(n: f64) -> Self {
        TweenValue::Number(n)
    }
}

impl From<&str> for TweenValue {
    fn from(text: &str) -> Self {
        TweenValue::Text(text.to_string())
    }
}

impl From<String> for TweenValue {
    fn from(text: String) -> Self {
        TweenValue::Text(text)
    }
}

/// A tween request. Unset fields take the animator's defaults.
pub struct TweenOptions {
    pub property: String,
    pub start: Option<TweenValue>,
    pub end: TweenValue,
    pub duration: Option<Duration>,
    pub interval: Option<Duration>,
    pub easing: Option<Easing>,
    pub hide_if_needed: Option<bool>,
    /// Force the stepped path even when the host has native transitions.
    pub no_native: bool,
    on_start: Option<StartCallback>,
    on_tween: Option<TweenCallback>,
    on_complete: Option<CompleteCallback>,
}

impl TweenOptions {
    pub fn new(property: &str, end: impl Into<TweenValue>) -> Self {
        Self {
            property: property.to_string(),
            start: None,
            end: end.into(),
            duration: None,
            interval: None,
            easing: None,
            hide_if_needed: None,
            no_native: false,
            on_start: None,
            on_tween: None,
            on_complete: None,
        }
    }

    pub fn from(mut self, start: impl Into<TweenValue>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration = Some(Duration::from_millis(ms));
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.interval = Some(Duration::from_millis(ms));
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn hide_if_needed(mut self, hide: bool) -> Self {
        self.hide_if_needed = Some(hide);
        self
    }

    pub fn no_native(mut self) -> Self {
        self.no_native = true;
        self
    }

    pub fn on_start(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Per-frame callback. Setting one forces the stepped path.
    pub fn on_tween(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_tween = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for TweenOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenOptions")
            .field("property", &self.property)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("duration", &self.duration)
            .field("interval", &self.interval)
            .field("easing", &self.easing)
            .field("hide_if_needed", &self.hide_if_needed)
            .field("no_native", &self.no_native)
            .finish_non_exhaustive()
    }
}

/// A tween handed to the host's transition mechanism.
///
/// Completion is signalled by a transition-end event on the element. If the
/// host never fires one, the element keeps its `animating` class.
#[derive(Debug, Clone)]
pub struct NativeTween {
    element: Rc<Element>,
    declaration: String,
    handler: HandlerRef,
}

impl NativeTween {
    pub fn element(&self) -> &Rc<Element> {
        &self.element
    }

    /// The `transition` value written to the element.
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// The completion handler registered for every transition-end name.
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}

/// A started tween.
#[derive(Debug)]
pub enum Tween {
    Native(NativeTween),
    Stepped(TweenJob),
}

impl Tween {
    pub fn is_native(&self) -> bool {
        matches!(self, Tween::Native(_))
    }

    /// The stepped job, if the tween needs driving.
    pub fn into_job(self) -> Option<TweenJob> {
        match self {
            Tween::Stepped(job) => Some(job),
            Tween::Native(_) => None,
        }
    }
}

/// Starts tweens on elements of one document.
pub struct Animator {
    registry: Rc<EventRegistry>,
    inspector: Box<dyn StyleInspector>,
    defaults: TweenDefaults,
    default_easing: Easing,
}

impl Animator {
    pub fn new(registry: Rc<EventRegistry>) -> Self {
        let opacity = registry.document().capabilities().opacity;
        Self {
            registry,
            inspector: Box::new(ComputedStyleInspector::new(opacity)),
            defaults: TweenDefaults::default(),
            default_easing: Easing::Linear,
        }
    }

    /// Use configured defaults for every unset request field.
    pub fn with_defaults(
        registry: Rc<EventRegistry>,
        defaults: TweenDefaults,
    ) -> Result<Self, AnimationError> {
        let default_easing = Easing::parse(&defaults.easing)?;
        Ok(Self {
            defaults,
            default_easing,
            ..Self::new(registry)
        })
    }

    /// Replace the style inspector used to resolve missing start values.
    pub fn with_inspector(mut self, inspector: impl StyleInspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn registry(&self) -> &Rc<EventRegistry> {
        &self.registry
    }

    /// Start a tween.
    ///
    /// Fails without touching the element if it is already animating.
    pub fn animate(
        &self,
        element: &Rc<Element>,
        mut options: TweenOptions,
    ) -> Result<Tween, AnimationError> {
        if element.has_class(ANIMATING_CLASS) {
            return Err(AnimationError::AlreadyAnimating(element.id));
        }

        let property = options.property.clone();
        let kind = PropertyKind::of(&property);

        let duration = options
            .duration
            .unwrap_or(Duration::from_millis(self.defaults.duration_ms));
        let interval = options
            .interval
            .unwrap_or(Duration::from_millis(self.defaults.interval_ms));
        let easing = options
            .easing
            .take()
            .unwrap_or_else(|| self.default_easing.clone());
        let hide_if_needed = options
            .hide_if_needed
            .unwrap_or(self.defaults.hide_if_needed);

        let capabilities = self.registry.document().capabilities();
        let native = options.on_tween.is_none()
            && capabilities.native_transitions
            && self.defaults.allow_native
            && !options.no_native;

        if native {
            return self.start_native(element, kind, options, duration, &easing, hide_if_needed);
        }

        let start = match options.start.take() {
            Some(start) => start,
            None => self.resolve_start(element, &property, kind),
        };
        let (track, steps) = plan(kind, &property, &start, &options.end, duration, interval)?;

        element.add_class(ANIMATING_CLASS);
        if let Some(on_start) = options.on_start.take() {
            on_start();
        }

        let job = TweenJob::new(JobParams {
            element: element.clone(),
            property,
            kind,
            track,
            steps,
            easing,
            interval,
            hide_if_needed,
            opacity: capabilities.opacity,
            on_tween: options.on_tween.take(),
            on_complete: options.on_complete.take(),
        });
        debug!(
            job = ?job.id(),
            element = element.id.raw(),
            property = %job.property(),
            steps,
            "stepped tween started"
        );
        Ok(Tween::Stepped(job))
    }

    /// Unset colors come back empty and parse to `NaN` channels; the job still
    /// runs and lands on the end color.
    fn resolve_start(&self, element: &Element, property: &str, kind: PropertyKind) -> TweenValue {
        match self.inspector.read(element, property) {
            StyleValue::Number(n) => TweenValue::Number(n),
            StyleValue::Text(text) => TweenValue::Text(text),
            StyleValue::Missing => match kind {
                PropertyKind::Opacity => TweenValue::Number(1.0),
                PropertyKind::Scalar => TweenValue::Number(0.0),
                PropertyKind::Color => TweenValue::Text(String::new()),
            },
        }
    }

    fn start_native(
        &self,
        element: &Rc<Element>,
        kind: PropertyKind,
        mut options: TweenOptions,
        duration: Duration,
        easing: &Easing,
        hide_if_needed: bool,
    ) -> Result<Tween, AnimationError> {
        let property = options.property.clone();
        let end_number = match kind {
            PropertyKind::Color => None,
            _ => Some(options.end.as_number().ok_or_else(|| {
                AnimationError::PropertyNotAnimatable(format!(
                    "{} cannot end at {}",
                    property,
                    options.end.as_css()
                ))
            })?),
        };

        let declaration = format!("{} {}s {}", property, duration.as_secs_f64(), easing);
        for name in TRANSITION_PROPERTIES {
            element.set_style(name, &declaration);
        }

        element.add_class(ANIMATING_CLASS);
        if let Some(on_start) = options.on_start.take() {
            on_start();
        }

        if element.style("display").as_deref() == Some("none")
            && end_number.is_some_and(|end| end > 0.0)
        {
            element.set_style("display", "block");
        }

        let handler = self.completion_handler(
            element,
            &property,
            end_number,
            hide_if_needed,
            options.on_complete.take(),
        );
        for name in TRANSITION_END_EVENTS {
            self.registry.attach(element, name, handler.clone(), false);
        }

        let opacity = self.registry.document().capabilities().opacity;
        match (kind, end_number) {
            (PropertyKind::Opacity, Some(end)) => set_opacity(element, end, opacity),
            (PropertyKind::Scalar, Some(end)) => element.set_style(&property, &px(end)),
            _ => element.set_style(&property, &options.end.as_css()),
        }

        debug!(
            element = element.id.raw(),
            transition = %declaration,
            "native tween started"
        );
        Ok(Tween::Native(NativeTween {
            element: element.clone(),
            declaration,
            handler,
        }))
    }

    /// One-shot handler shared by all transition-end names.
    fn completion_handler(
        &self,
        element: &Rc<Element>,
        property: &str,
        end_number: Option<f64>,
        hide_if_needed: bool,
        on_complete: Option<CompleteCallback>,
    ) -> HandlerRef {
        let element: Weak<Element> = Rc::downgrade(element);
        let registry: Weak<EventRegistry> = Rc::downgrade(&self.registry);
        let property = property.to_string();
        let on_complete = RefCell::new(on_complete);
        // Filled in below; taken on first fire so the handler runs once
        let slot: Rc<RefCell<Option<HandlerRef>>> = Rc::new(RefCell::new(None));
        let own = slot.clone();

        let handler = HandlerRef::new(move |_| {
            let Some(me) = own.borrow_mut().take() else {
                return;
            };
            let Some(element) = element.upgrade() else {
                return;
            };

            element.remove_class(ANIMATING_CLASS);
            if hide_if_needed
                && end_number.is_some_and(|end| end <= 0.0)
                && !is_box_offset(&property)
            {
                element.set_style("display", "none");
            }

            if let Some(on_complete) = on_complete.borrow_mut().take() {
                on_complete();
            }

            if let Some(registry) = registry.upgrade() {
                for name in TRANSITION_END_EVENTS {
                    registry.detach(&element, name, &me, false);
                }
            }
            debug!(element = element.id.raw(), property = %property, "native tween finished");
        });

        *slot.borrow_mut() = Some(handler.clone());
        handler
    }
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("defaults", &self.defaults)
            .field("default_easing", &self.default_easing)
            .finish_non_exhaustive()
    }
}

/// Compute the track and step count of a stepped tween.
fn plan(
    kind: PropertyKind,
    property: &str,
    start: &TweenValue,
    end: &TweenValue,
    duration: Duration,
    interval: Duration,
) -> Result<(Track, u32), AnimationError> {
    let interval_ms = interval.as_millis().max(1) as f64;
    let max_steps = (duration.as_millis() as f64 / interval_ms).ceil();

    match kind {
        PropertyKind::Color => {
            let not_a_color = |value: &TweenValue| {
                AnimationError::PropertyNotAnimatable(format!(
                    "{} cannot use {} as a color",
                    property,
                    value.as_css()
                ))
            };
            let from = start.as_color().ok_or_else(|| not_a_color(start))?;
            let to = end.as_color().ok_or_else(|| not_a_color(end))?;

            let deltas = [to.r - from.r, to.g - from.g, to.b - from.b];
            let largest = deltas[0].max(deltas[1]).max(deltas[2]);
            let steps = largest.min(max_steps).floor().abs() as u32;
            let delta = if steps == 0 {
                [0.0; 3]
            } else {
                deltas.map(|d| (d / f64::from(steps)).ceil())
            };

            Ok((
                Track::Color {
                    start: from,
                    end: to,
                    delta,
                },
                steps,
            ))
        }
        PropertyKind::Scalar | PropertyKind::Opacity => {
            let not_a_number = |value: &TweenValue| {
                AnimationError::PropertyNotAnimatable(format!(
                    "{} cannot use {} as a number",
                    property,
                    value.as_css()
                ))
            };
            let from = start.as_number().ok_or_else(|| not_a_number(start))?;
            let to = end.as_number().ok_or_else(|| not_a_number(end))?;

            // Fractional ranges step in hundredths
            let fractional = from <= 1.0 && to <= 1.0;
            let scale = if fractional { 100.0 } else { 1.0 };
            let (faux_from, faux_to) = (from * scale, to * scale);

            let steps = (faux_to - faux_from).abs().min(max_steps).floor() as u32;
            let delta = if steps == 0 {
                0.0
            } else {
                (faux_to - faux_from) / f64::from(steps) / scale
            };

            Ok((
                Track::Number {
                    start: from,
                    end: to,
                    delta,
                },
                steps,
            ))
        }
    }
}
