//! # Glide Bench
//!
//! Fixtures and a quick in-process runner for the Glide toolkit's hot paths.
//!
//! ## Features
//!
//! - Easing curve evaluation
//! - Stepped scalar and color tweens
//! - Event dispatch through deep trees
//! - Drag move handling with containment and drop zones
//!
//! Criterion benchmarks live in `benches/glide.rs`; this crate provides the
//! fixtures they share and a runner for quick comparisons without criterion.
//!
//! ```rust,ignore
//! use glide_bench::Benchmark;
//!
//! let suite = Benchmark::new().run_all();
//! suite.print_summary();
//! ```

use std::rc::Rc;
use std::time::{Duration, Instant};

use glide_animation::{ease, Animator, Easing, TweenJob, TweenOptions};
use glide_drag::{DragBinding, DragEngine, DragOptions, DropZone};
use glide_dom::{
    Document, DomEvent, Element, EventRegistry, HandlerRef, HostCapabilities, MouseEventData,
    Rect,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Benchmark errors.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Timing of one benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub iterations: u64,
    pub mean_ns: u64,
    pub min_ns: u64,
    pub max_ns: u64,
}

impl BenchmarkResult {
    pub fn from_samples(name: impl Into<String>, samples: &[Duration]) -> Self {
        let nanos: Vec<u64> = samples
            .iter()
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .collect();
        let iterations = nanos.len() as u64;
        let mean_ns = if iterations == 0 {
            0
        } else {
            nanos.iter().sum::<u64>() / iterations
        };

        Self {
            name: name.into(),
            iterations,
            mean_ns,
            min_ns: nanos.iter().copied().min().unwrap_or(0),
            max_ns: nanos.iter().copied().max().unwrap_or(0),
        }
    }

    pub fn line(&self) -> String {
        format!(
            "{:40} {:>12} {:>12} {:>12}",
            self.name,
            format_nanos(self.mean_ns),
            format_nanos(self.min_ns),
            format_nanos(self.max_ns)
        )
    }
}

fn format_nanos(ns: u64) -> String {
    match ns {
        n if n >= 1_000_000 => format!("{:.2} ms", n as f64 / 1e6),
        n if n >= 1_000 => format!("{:.2} µs", n as f64 / 1e3),
        n => format!("{} ns", n),
    }
}

/// Results of [`Benchmark::run_all`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkSuite {
    pub results: Vec<BenchmarkResult>,
    pub total_time: Duration,
}

impl BenchmarkSuite {
    pub fn print_summary(&self) {
        println!("{:40} {:>12} {:>12} {:>12}", "Name", "Mean", "Min", "Max");
        for result in &self.results {
            println!("{}", result.line());
        }
        println!("Total time: {:?}", self.total_time);
    }

    pub fn save_json(&self, path: &str) -> Result<(), BenchError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// A `depth`-deep chain of elements under `body`; returns the innermost.
pub fn deep_tree(document: &Document, depth: usize) -> Rc<Element> {
    let mut current = document.body();
    for _ in 0..depth {
        let child = document.create_element("div");
        current.append_child(child.clone());
        current = child;
    }
    current
}

/// A stepped tween of `property` from `from` to `to` over 1000ms at 10ms.
pub fn stepped_job(property: &str, from: &str, to: &str) -> Option<TweenJob> {
    let document = Document::new(HostCapabilities::stepped());
    let element = document.create_element("div");
    document.body().append_child(element.clone());
    let animator = Animator::new(EventRegistry::new(document));

    let options = match (from.parse::<f64>(), to.parse::<f64>()) {
        (Ok(from), Ok(to)) => TweenOptions::new(property, to).from(from),
        _ => TweenOptions::new(property, to).from(from),
    };
    animator
        .animate(&element, options.interval_ms(10))
        .ok()
        .and_then(|tween| tween.into_job())
}

/// A contained drag with `zones` drop zones, already pressed at the origin.
pub struct DragFixture {
    pub document: Rc<Document>,
    pub item: Rc<Element>,
    pub binding: DragBinding,
}

impl DragFixture {
    pub fn new(zones: usize) -> Option<Self> {
        let document = Document::new(HostCapabilities::modern());
        let parent = document.create_element("div");
        document.body().append_child(parent.clone());
        parent.set_base_style("position", "relative");
        parent.set_geometry(Rect::new(0.0, 0.0, 1000.0, 1000.0));

        let item = document.create_element("div");
        parent.append_child(item.clone());
        item.set_geometry(Rect::new(0.0, 0.0, 50.0, 50.0));

        let mut options = DragOptions::new(item.clone()).restrict();
        for i in 0..zones {
            let zone = document.create_element("div");
            parent.append_child(zone.clone());
            let offset = (i % 10) as f64 * 100.0;
            zone.set_geometry(Rect::new(offset, offset, 80.0, 80.0));
            options = options.drop_zone(DropZone::new(zone));
        }

        let engine = DragEngine::new(EventRegistry::new(document.clone()));
        let binding = engine.bind(options).ok()?;
        document.dispatch(
            &item,
            &DomEvent::mouse("mousedown", true, MouseEventData::at(0.0, 0.0)),
        );

        Some(Self {
            document,
            item,
            binding,
        })
    }

    /// Deliver one pointer move to the document.
    pub fn move_to(&self, x: f64, y: f64) {
        self.document.dispatch(
            &self.document.body(),
            &DomEvent::mouse("mousemove", true, MouseEventData::at(x, y)),
        );
    }
}

/// In-process runner.
pub struct Benchmark {
    pub warmup: u64,
    pub iterations: u64,
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::new()
    }
}

impl Benchmark {
    pub fn new() -> Self {
        Self {
            warmup: 10,
            iterations: 100,
        }
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn run(&self, name: &str, mut f: impl FnMut()) -> BenchmarkResult {
        debug!(name, iterations = self.iterations, "running benchmark");
        for _ in 0..self.warmup {
            f();
        }
        let samples: Vec<Duration> = (0..self.iterations)
            .map(|_| {
                let start = Instant::now();
                f();
                start.elapsed()
            })
            .collect();
        BenchmarkResult::from_samples(name, &samples)
    }

    pub fn run_all(&self) -> BenchmarkSuite {
        let start = Instant::now();
        let mut suite = BenchmarkSuite::default();

        for easing in [Easing::Linear, Easing::EaseIn, Easing::EaseInOut] {
            suite.results.push(self.run(&format!("ease/{}", easing), || {
                let mut acc = 0.0;
                for step in 0..=100 {
                    acc += ease(0.0, step, 100, 1.0, 100.0, &easing);
                }
                std::hint::black_box(acc);
            }));
        }

        suite.results.push(self.run("tween/scalar (100 steps)", || {
            if let Some(mut job) = stepped_job("left", "0", "400") {
                std::hint::black_box(job.run_to_completion());
            }
        }));
        suite.results.push(self.run("tween/color (100 steps)", || {
            if let Some(mut job) = stepped_job("color", "#000000", "#FF8040") {
                std::hint::black_box(job.run_to_completion());
            }
        }));

        let document = Document::new(HostCapabilities::modern());
        let leaf = deep_tree(&document, 32);
        let registry = EventRegistry::new(document.clone());
        registry.attach(&document.body(), "click", HandlerRef::new(|_| {}), false);
        suite.results.push(self.run("dispatch/depth 32", || {
            document.dispatch(&leaf, &DomEvent::generic("click", true));
        }));

        if let Some(fixture) = DragFixture::new(10) {
            let mut x = 0.0;
            suite.results.push(self.run("drag/move (10 zones)", || {
                x = (x + 7.0) % 900.0;
                fixture.move_to(x, x);
            }));
        }

        suite.total_time = start.elapsed();
        suite
    }
}
