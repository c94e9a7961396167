//! Stepped tween jobs.
//!
//! A [`TweenJob`] holds everything needed to render the next frame of one
//! property on one element. It does not schedule itself: a driver calls
//! [`TweenJob::advance`] and honors the returned delay.

use std::rc::Rc;
use std::time::Duration;

use glide_css::{is_background, is_box_offset, px, rgb_to_hex, PropertyKind, Rgb};
use glide_dom::{set_opacity, Element, OpacitySupport};
use tracing::{debug, trace};

use crate::easing::{ease, ease_channel, Easing};
use crate::{TweenId, ANIMATING_CLASS};

/// Called once before the first frame.
pub type StartCallback = Box<dyn FnOnce()>;
/// Called after every frame that is not the last.
pub type TweenCallback = Box<dyn FnMut()>;
/// Called once when the job finishes.
pub type CompleteCallback = Box<dyn FnOnce()>;

/// What a driver should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Call `advance` again after `delay`.
    Continue { delay: Duration },
    /// The job is done; further calls do nothing.
    Finished,
}

/// One rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Step index the frame was rendered at (1-based).
    pub step: u32,
    /// The value written to the element, e.g. `"42px"`, `"0.5"` or `"#FF8000"`.
    pub value: String,
}

/// Start, end and per-step delta for one job.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Track {
    /// Lengths and opacity. `delta` is already in the property's own units.
    Number { start: f64, end: f64, delta: f64 },
    /// Three independently eased channels.
    Color {
        start: Rgb,
        end: Rgb,
        delta: [f64; 3],
    },
}

/// One in-flight stepped interpolation.
pub struct TweenJob {
    id: TweenId,
    element: Rc<Element>,
    property: String,
    kind: PropertyKind,
    track: Track,
    easing: Easing,
    interval: Duration,
    steps: u32,
    step_index: u32,
    hide_if_needed: bool,
    opacity: OpacitySupport,
    on_tween: Option<TweenCallback>,
    on_complete: Option<CompleteCallback>,
    last_frame: Option<Frame>,
    finished: bool,
}

/// Everything needed to build a job, resolved by the animator.
pub(crate) struct JobParams {
    pub element: Rc<Element>,
    pub property: String,
    pub kind: PropertyKind,
    pub track: Track,
    pub steps: u32,
    pub easing: Easing,
    pub interval: Duration,
    pub hide_if_needed: bool,
    pub opacity: OpacitySupport,
    pub on_tween: Option<TweenCallback>,
    pub on_complete: Option<CompleteCallback>,
}

impl TweenJob {
    pub(crate) fn new(params: JobParams) -> Self {
        Self {
            id: TweenId::new(),
            element: params.element,
            property: params.property,
            kind: params.kind,
            track: params.track,
            easing: params.easing,
            interval: params.interval,
            steps: params.steps,
            step_index: 0,
            hide_if_needed: params.hide_if_needed,
            opacity: params.opacity,
            on_tween: params.on_tween,
            on_complete: params.on_complete,
            last_frame: None,
            finished: false,
        }
    }

    pub fn id(&self) -> TweenId {
        self.id
    }

    pub fn element(&self) -> &Rc<Element> {
        &self.element
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Total number of steps.
    pub fn total_steps(&self) -> u32 {
        self.steps
    }

    pub fn step_index(&self) -> u32 {
        self.step_index
    }

    /// Per-step delta of a numeric job.
    pub fn delta(&self) -> Option<f64> {
        match self.track {
            Track::Number { delta, .. } => Some(delta),
            Track::Color { .. } => None,
        }
    }

    /// Per-channel deltas of a color job.
    pub fn channel_deltas(&self) -> Option<[f64; 3]> {
        match self.track {
            Track::Color { delta, .. } => Some(delta),
            Track::Number { .. } => None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The most recently rendered frame.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Render the next frame.
    pub fn advance(&mut self) -> StepOutcome {
        if self.finished {
            return StepOutcome::Finished;
        }

        self.step_index += 1;

        let value = match self.track.clone() {
            Track::Number { start, end, delta } => self.advance_number(start, end, delta),
            Track::Color { start, end, delta } => self.advance_color(start, end, delta),
        };

        trace!(
            job = ?self.id,
            property = %self.property,
            step = self.step_index,
            of = self.steps,
            value = %value,
            "tween step"
        );
        self.last_frame = Some(Frame {
            step: self.step_index,
            value,
        });

        if self.steps > self.step_index && self.element.has_class(ANIMATING_CLASS) {
            if let Some(on_tween) = self.on_tween.as_mut() {
                on_tween();
            }
            return StepOutcome::Continue {
                delay: self.interval,
            };
        }

        self.finish();
        StepOutcome::Finished
    }

    fn advance_number(&mut self, start: f64, end: f64, delta: f64) -> String {
        let mut value = ease(start, self.step_index, self.steps, delta, end, &self.easing);

        if self.step_index >= self.steps {
            self.step_index = self.steps;
            value = end;
        }

        if start > end {
            if value <= end {
                self.step_index = self.steps;
                value = end;
            }

            let projected = start + f64::from(self.step_index) * delta;
            if self.hide_if_needed
                && projected <= 0.0
                && !is_box_offset(&self.property)
                && !is_background(&self.property)
            {
                self.element.set_style("display", "none");
            }
        } else {
            if value >= end {
                self.step_index = self.steps;
                value = end;
            }

            if self.element.style("display").as_deref() == Some("none") && end > 0.0 {
                self.element.set_style("display", "block");
            }
        }

        match self.kind {
            PropertyKind::Opacity => {
                set_opacity(&self.element, value, self.opacity);
                value.to_string()
            }
            _ => {
                let rendered = px(value);
                self.element.set_style(&self.property, &rendered);
                rendered
            }
        }
    }

    fn advance_color(&mut self, start: Rgb, end: Rgb, delta: [f64; 3]) -> String {
        if self.step_index >= self.steps {
            self.step_index = self.steps;
        }

        let (from, to) = (start.channels(), end.channels());
        let mut channels = [0.0; 3];
        for (c, channel) in channels.iter_mut().enumerate() {
            *channel = ease_channel(
                from[c],
                self.step_index,
                self.steps,
                delta[c],
                to[c],
                &self.easing,
            );
        }

        let rendered = rgb_to_hex(Rgb::from_channels(channels));
        self.element.set_style(&self.property, &rendered);
        rendered
    }

    fn finish(&mut self) {
        if self.kind == PropertyKind::Color {
            self.step_index = 0;
        }
        self.element.remove_class(ANIMATING_CLASS);
        self.finished = true;
        debug!(job = ?self.id, property = %self.property, "tween finished");

        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }

    /// Iterate over the remaining frames, rendering each as it is pulled.
    pub fn steps(&mut self) -> Steps<'_> {
        Steps { job: self }
    }

    /// Render every remaining frame immediately.
    pub fn run_to_completion(&mut self) -> Vec<Frame> {
        self.steps().collect()
    }
}

impl std::fmt::Debug for TweenJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenJob")
            .field("id", &self.id)
            .field("element", &self.element.id)
            .field("property", &self.property)
            .field("track", &self.track)
            .field("easing", &self.easing)
            .field("steps", &self.steps)
            .field("step_index", &self.step_index)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Lazy, finite sequence of frames. Once the job finishes it yields nothing,
/// even from a fresh iterator.
pub struct Steps<'a> {
    job: &'a mut TweenJob,
}

impl Iterator for Steps<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.job.is_finished() {
            return None;
        }
        self.job.advance();
        self.job.last_frame.clone()
    }
}
