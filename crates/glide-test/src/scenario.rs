//! JSON-described drag gestures and tweens.
//!
//! A scenario file holds an array of scenarios:
//!
//! ```json
//! [
//!   {
//!     "kind": "drag",
//!     "name": "contained-drag",
//!     "item": [0, 0, 50, 50],
//!     "restrict": true,
//!     "gestures": [{ "press": { "x": 0, "y": 0 } }, { "move": { "x": 500, "y": 20 } }],
//!     "expect": { "left": 150, "top": 20 }
//!   },
//!   {
//!     "kind": "tween",
//!     "name": "slide",
//!     "property": "left",
//!     "from": 0,
//!     "to": 10,
//!     "easing": "linear",
//!     "expect": { "steps": 10, "final": "10px" }
//!   }
//! ]
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use glide_animation::{Easing, TweenOptions, TweenValue};
use glide_drag::{DragOptions, DropZone};
use glide_dom::{HostCapabilities, Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{elapsed_ms, Stage, TestError, TestResult, TestSummary};

/// One scenario of either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Scenario {
    Drag(DragScenario),
    Tween(TweenScenario),
}

impl Scenario {
    pub fn name(&self) -> &str {
        match self {
            Scenario::Drag(s) => &s.name,
            Scenario::Tween(s) => &s.name,
        }
    }
}

/// Pointer step in a drag scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Press { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Release { x: f64, y: f64 },
    /// Scroll the page to an absolute offset.
    Scroll { x: f64, y: f64 },
}

fn default_parent() -> [f64; 4] {
    [0.0, 0.0, 200.0, 200.0]
}

/// A parent box, a draggable item inside it and a gesture sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragScenario {
    pub name: String,
    /// `[left, top, width, height]` of the positioned parent.
    #[serde(default = "default_parent")]
    pub parent: [f64; 4],
    #[serde(default)]
    pub parent_style: BTreeMap<String, String>,
    pub item: [f64; 4],
    #[serde(default)]
    pub restrict: bool,
    #[serde(default)]
    pub zones: Vec<[f64; 4]>,
    pub gestures: Vec<Gesture>,
    pub expect: DragExpectation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragExpectation {
    pub left: f64,
    pub top: f64,
    /// Index into `zones` of the zone the item was dropped on.
    #[serde(default)]
    pub dropped_on: Option<usize>,
    #[serde(default)]
    pub dragging: Option<bool>,
}

/// Number or CSS text in a tween scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    Number(f64),
    Text(String),
}

impl From<Endpoint> for TweenValue {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Number(n) => TweenValue::Number(n),
            Endpoint::Text(t) => TweenValue::Text(t),
        }
    }
}

fn default_duration() -> u64 {
    1000
}

fn default_interval() -> u64 {
    25
}

/// A stepped tween driven to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweenScenario {
    pub name: String,
    pub property: String,
    #[serde(default)]
    pub from: Option<Endpoint>,
    pub to: Endpoint,
    #[serde(default = "default_duration")]
    pub duration_ms: u64,
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    #[serde(default)]
    pub easing: Option<String>,
    pub expect: TweenExpectation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweenExpectation {
    #[serde(default)]
    pub steps: Option<u32>,
    /// Last rendered value.
    #[serde(rename = "final")]
    pub final_value: String,
    /// Every rendered value, in order.
    #[serde(default)]
    pub frames: Option<Vec<String>>,
}

fn rect(values: [f64; 4]) -> Rect {
    Rect::new(values[0], values[1], values[2], values[3])
}

/// Runs scenarios against a fresh [`Stage`] each.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    capabilities: HostCapabilities,
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self {
            capabilities: HostCapabilities::stepped(),
        }
    }

    pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
        Self { capabilities }
    }

    /// Parse a JSON array of scenarios.
    pub fn parse(json: &str) -> Result<Vec<Scenario>, TestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<Scenario>, TestError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Run every scenario in every file matching `pattern`.
    pub fn run_glob(&self, pattern: &str) -> Result<TestSummary, TestError> {
        let paths = glob::glob(pattern).map_err(|e| TestError::Setup(e.to_string()))?;
        let mut summary = TestSummary::new();
        for entry in paths {
            let path = entry.map_err(|e| TestError::Io(e.into()))?;
            debug!(path = %path.display(), "loading scenarios");
            for scenario in Self::load_file(&path)? {
                summary.add(self.run(&scenario));
            }
        }
        summary.log();
        Ok(summary)
    }

    pub fn run_all(&self, scenarios: &[Scenario]) -> TestSummary {
        let mut summary = TestSummary::new();
        for scenario in scenarios {
            summary.add(self.run(scenario));
        }
        summary.log();
        summary
    }

    pub fn run(&self, scenario: &Scenario) -> TestResult {
        let result = match scenario {
            Scenario::Drag(s) => self.run_drag(s),
            Scenario::Tween(s) => self.run_tween(s),
        };
        if result.status != crate::TestStatus::Pass {
            warn!(name = %result.name, status = ?result.status, "scenario did not pass");
        }
        result
    }

    fn run_drag(&self, scenario: &DragScenario) -> TestResult {
        let start = Instant::now();
        let stage = Stage::new(self.capabilities.clone());

        let parent = stage.element("div", None, rect(scenario.parent));
        parent.set_base_style("position", "relative");
        for (property, value) in &scenario.parent_style {
            parent.set_style(property, value);
        }
        let item = stage.element("div", Some(&parent), rect(scenario.item));

        let dropped = Rc::new(RefCell::new(None));
        let mut options = DragOptions::new(item.clone());
        if scenario.restrict {
            options = options.restrict();
        }
        for (index, zone) in scenario.zones.iter().enumerate() {
            let zone = stage.element("div", Some(&parent), rect(*zone));
            let sink = dropped.clone();
            options = options.drop_zone(
                DropZone::new(zone).on_drop(move |_| *sink.borrow_mut() = Some(index)),
            );
        }

        let binding = match stage.drag.bind(options) {
            Ok(binding) => binding,
            Err(e) => return TestResult::error(&scenario.name, elapsed_ms(start), e.to_string()),
        };

        for gesture in &scenario.gestures {
            match *gesture {
                Gesture::Press { x, y } => {
                    stage.press(binding.handle(), x, y);
                }
                Gesture::Move { x, y } => {
                    stage.move_to(x, y);
                }
                Gesture::Release { x, y } => {
                    stage.release(x, y);
                }
                Gesture::Scroll { x, y } => stage.document.set_scroll(Point::new(x, y)),
            }
        }

        let expect = &scenario.expect;
        let expected = describe_drag(
            expect.left,
            expect.top,
            expect.dropped_on,
            expect.dragging.unwrap_or_else(|| binding.is_dragging()),
        );
        let actual = describe_drag(
            item.offset_left(),
            item.offset_top(),
            if expect.dropped_on.is_some() {
                *dropped.borrow()
            } else {
                None
            },
            binding.is_dragging(),
        );
        binding.unbind();

        finish(&scenario.name, start, expected, actual)
    }

    fn run_tween(&self, scenario: &TweenScenario) -> TestResult {
        let start = Instant::now();
        let stage = Stage::new(self.capabilities.clone());
        let element = stage.element("div", None, Rect::default());

        let mut options = TweenOptions::new(&scenario.property, scenario.to.clone())
            .duration_ms(scenario.duration_ms)
            .interval_ms(scenario.interval_ms)
            .no_native();
        if let Some(from) = &scenario.from {
            options = options.from(from.clone());
        }
        if let Some(name) = &scenario.easing {
            match Easing::parse(name) {
                Ok(easing) => options = options.easing(easing),
                Err(e) => {
                    return TestResult::error(&scenario.name, elapsed_ms(start), e.to_string())
                }
            }
        }

        let job = match stage.animator.animate(&element, options) {
            Ok(tween) => tween.into_job(),
            Err(e) => return TestResult::error(&scenario.name, elapsed_ms(start), e.to_string()),
        };
        let Some(mut job) = job else {
            return TestResult::error(&scenario.name, elapsed_ms(start), "tween ran natively");
        };
        let total_steps = job.total_steps();
        let frames: Vec<String> = job.run_to_completion().into_iter().map(|f| f.value).collect();

        let expect = &scenario.expect;
        let expected = describe_tween(
            expect.steps.unwrap_or(total_steps),
            &expect.final_value,
            expect.frames.as_deref().unwrap_or(frames.as_slice()),
        );
        let actual = describe_tween(
            total_steps,
            frames.last().map(String::as_str).unwrap_or_default(),
            &frames,
        );

        finish(&scenario.name, start, expected, actual)
    }
}

fn describe_drag(left: f64, top: f64, dropped_on: Option<usize>, dragging: bool) -> String {
    format!(
        "left: {}\ntop: {}\ndropped_on: {:?}\ndragging: {}\n",
        left, top, dropped_on, dragging
    )
}

fn describe_tween(steps: u32, final_value: &str, frames: &[String]) -> String {
    let mut out = format!("steps: {}\nfinal: {}\n", steps, final_value);
    for frame in frames {
        out.push_str(frame);
        out.push('\n');
    }
    out
}

fn finish(name: &str, start: Instant, expected: String, actual: String) -> TestResult {
    if expected == actual {
        TestResult::pass(name, elapsed_ms(start))
    } else {
        TestResult::fail_with_diff(name, elapsed_ms(start), expected, actual)
    }
}
