//! # Glide Test
//!
//! Cross-crate scenarios for the Glide toolkit.
//!
//! The `events`, `tween` and `drag` test modules drive the engines through
//! real dispatch on a [`Stage`]. Data-driven cases live in `scenarios/*.json`
//! and go through [`ScenarioRunner`]:
//!
//! ```rust,ignore
//! let summary = ScenarioRunner::new().run_glob("scenarios/*.json")?;
//! assert_eq!(summary.failed + summary.errors, 0);
//! ```

use std::rc::Rc;
use std::time::Instant;

use glide_animation::Animator;
use glide_common::{init_logging, GlideConfig, LogConfig};
use glide_drag::DragEngine;
use glide_dom::{Document, DomEvent, Element, EventRegistry, HostCapabilities, MouseEventData, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod scenario;

#[cfg(test)]
mod drag;
#[cfg(test)]
mod events;
#[cfg(test)]
mod tween;

pub use scenario::{DragScenario, Gesture, Scenario, ScenarioRunner, TweenScenario};

/// Failure to load or set up a scenario, as opposed to a scenario that ran and
/// disagreed with its expectation.
#[derive(Error, Debug)]
pub enum TestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    #[error("Setup failed: {0}")]
    Setup(String),
}

/// Install a subscriber for test output, honoring `RUST_LOG`.
pub fn init_test_logging() {
    init_logging(LogConfig::from_section(&GlideConfig::default().logging));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Pass,
    Fail,
    Error,
}

/// Outcome of one scenario. Failures carry both renderings and a line diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl TestResult {
    pub fn pass(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Pass,
            duration_ms,
            message: None,
            expected: None,
            actual: None,
        }
    }

    pub fn fail_with_diff(
        name: impl Into<String>,
        duration_ms: u64,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (expected, actual) = (expected.into(), actual.into());
        Self {
            name: name.into(),
            status: TestStatus::Fail,
            duration_ms,
            message: Some(diff_strings(&expected, &actual)),
            expected: Some(expected),
            actual: Some(actual),
        }
    }

    pub fn error(name: impl Into<String>, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Error,
            duration_ms,
            message: Some(message.into()),
            expected: None,
            actual: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: TestResult) {
        self.total += 1;
        self.duration_ms += result.duration_ms;

        match result.status {
            TestStatus::Pass => self.passed += 1,
            TestStatus::Fail => self.failed += 1,
            TestStatus::Error => self.errors += 1,
        }

        self.results.push(result);
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }

    pub fn log(&self) {
        info!(
            total = self.total,
            passed = self.passed,
            failed = self.failed,
            errors = self.errors,
            "Scenario run complete"
        );
    }
}

/// A document with a registry and both engines, plus gesture helpers.
pub struct Stage {
    pub document: Rc<Document>,
    pub registry: Rc<EventRegistry>,
    pub animator: Animator,
    pub drag: DragEngine,
}

impl Stage {
    pub fn new(capabilities: HostCapabilities) -> Self {
        let document = Document::new(capabilities);
        let registry = EventRegistry::new(document.clone());
        Self {
            animator: Animator::new(registry.clone()),
            drag: DragEngine::new(registry.clone()),
            document,
            registry,
        }
    }

    /// Like [`Stage::new`], with engine defaults taken from `config`.
    pub fn with_config(
        capabilities: HostCapabilities,
        config: &GlideConfig,
    ) -> Result<Self, TestError> {
        let document = Document::new(capabilities);
        let registry = EventRegistry::new(document.clone());
        let animator = Animator::with_defaults(registry.clone(), config.tween.clone())
            .map_err(|e| TestError::Setup(e.to_string()))?;
        Ok(Self {
            animator,
            drag: DragEngine::with_defaults(registry.clone(), config.drag.clone()),
            document,
            registry,
        })
    }

    /// Create an element under `parent` (or `body`) with the given offset box.
    pub fn element(&self, tag: &str, parent: Option<&Rc<Element>>, rect: Rect) -> Rc<Element> {
        let element = self.document.create_element(tag);
        let parent = parent.cloned().unwrap_or_else(|| self.document.body());
        parent.append_child(element.clone());
        element.set_geometry(rect);
        element
    }

    pub fn mouse(&self, target: &Rc<Element>, kind: &str, x: f64, y: f64) -> bool {
        debug!(kind, x, y, target = target.id.raw(), "synthetic mouse event");
        self.document
            .dispatch(target, &DomEvent::mouse(kind, true, MouseEventData::at(x, y)))
    }

    pub fn press(&self, target: &Rc<Element>, x: f64, y: f64) -> bool {
        self.mouse(target, "mousedown", x, y)
    }

    /// Move the pointer; delivered to `body` like a move over empty page.
    pub fn move_to(&self, x: f64, y: f64) -> bool {
        self.mouse(&self.document.body(), "mousemove", x, y)
    }

    pub fn release(&self, x: f64, y: f64) -> bool {
        self.mouse(&self.document.body(), "mouseup", x, y)
    }
}

/// Milliseconds since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Line diff with `-`/`+`/` ` prefixes.
pub fn diff_strings(expected: &str, actual: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(expected, actual);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        output.push_str(&format!("{}{}", sign, change));
    }

    output
}
