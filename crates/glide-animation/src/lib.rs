//! # Glide Animation
//!
//! Property tweens for the Glide toolkit.
//!
//! ## Features
//!
//! - **Native transitions**: Hand the tween to the host when it supports CSS transitions
//! - **Stepped tweens**: Frame-by-frame interpolation of lengths, opacity and colors
//! - **Easing**: Linear, ease-in, ease-out and ease-in-out curves
//! - **Drivers**: Pull frames synchronously, schedule many jobs on a manual clock,
//!   or await a job on the tokio timer
//!
//! ## Architecture
//!
//! ```text
//! Animator::animate
//!    ├── Tween::Native ── transition-end listeners (EventRegistry)
//!    └── Tween::Stepped
//!           └── TweenJob::advance ── Steps iterator
//!                                 ── Timeline::tick
//!                                 ── run_timed
//! ```
//!
//! An element carrying the `animating` class is already being tweened and
//! rejects further requests until the running tween finishes.

use std::sync::atomic::{AtomicU64, Ordering};

use glide_common::GlideError;
use glide_dom::NodeId;
use thiserror::Error;

pub mod animator;
pub mod driver;
pub mod easing;
pub mod job;
pub mod timeline;

pub use animator::{Animator, NativeTween, Tween, TweenOptions, TweenValue, TRANSITION_END_EVENTS};
pub use driver::run_timed;
pub use easing::{ease, ease_channel, Easing};
pub use job::{Frame, StepOutcome, Steps, TweenJob};
pub use timeline::Timeline;

/// Class marking an element with a tween in flight.
pub const ANIMATING_CLASS: &str = "animating";

// ==================== Errors ====================

/// Errors that can occur in animations.
#[derive(Error, Debug)]
pub enum AnimationError {
    #[error("Element {0:?} is already animating")]
    AlreadyAnimating(NodeId),

    #[error("Invalid easing: {0:?}")]
    InvalidEasing(String),

    #[error("Property not animatable: {0}")]
    PropertyNotAnimatable(String),
}

impl From<AnimationError> for GlideError {
    fn from(err: AnimationError) -> Self {
        GlideError::animation_with_source(err.to_string(), err)
    }
}

// ==================== Identifiers ====================

/// Unique tween identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(u64);

impl TweenId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TweenId {
    fn default() -> Self {
        Self::new()
    }
}
