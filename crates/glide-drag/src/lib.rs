//! # Glide Drag
//!
//! Press-move-release repositioning of elements, with optional containment
//! inside the parent and snapping onto drop zones.
//!
//! ## Lifecycle
//!
//! ```text
//! DragEngine::bind ── press listener on the handle
//!    press   ── z-index, absolute positioning, `active` class,
//!               document move/release listeners
//!    move    ── position, containment, drop-zone snapping
//!    release ── drop callbacks, listeners detached
//! ```
//!
//! Every gesture on every binding takes the next value of one process-wide
//! z-index counter, so the most recently grabbed element is on top.

use std::sync::atomic::{AtomicU64, Ordering};

use glide_common::GlideError;
use glide_dom::NodeId;
use thiserror::Error;

pub mod engine;
pub mod session;

pub use engine::{DragBinding, DragEngine, DragOptions, DropZone};
pub use session::DragSession;

/// Class carried by an element while it is being dragged, and by a drop zone
/// while the dragged element hovers over it.
pub const ACTIVE_CLASS: &str = "active";

/// Class carried by a dragged element while it is over a drop zone.
pub const DROPABLE_CLASS: &str = "dropable";

/// Z-index counter value before the first drag.
pub const DEFAULT_Z_INDEX_BASE: u64 = 99;

static Z_INDEX: AtomicU64 = AtomicU64::new(DEFAULT_Z_INDEX_BASE);

/// Take the next z-index. The first call returns 100.
pub fn next_z_index() -> u64 {
    Z_INDEX.fetch_add(1, Ordering::Relaxed) + 1
}

/// Make sure later z-indices are above `base`.
pub fn raise_z_index_floor(base: u64) {
    Z_INDEX.fetch_max(base, Ordering::Relaxed);
}

/// Errors that can occur when binding a drag.
#[derive(Error, Debug)]
pub enum DragError {
    #[error("Element {0:?} has no parent to drag within")]
    Detached(NodeId),
}

impl From<DragError> for GlideError {
    fn from(err: DragError) -> Self {
        GlideError::drag(err.to_string())
    }
}
