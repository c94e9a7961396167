//! # Glide Common
//!
//! Pieces every Glide crate shares: the crate-spanning error type, engine
//! defaults loaded from JSON ([`GlideConfig`]) and `tracing` subscriber setup.
//!
//! Each engine keeps its own precise error enum and converts into
//! [`GlideError`] at crate boundaries, so callers juggling several engines can
//! use one `Result`.

use thiserror::Error;

pub mod config;
pub mod logging;

pub use config::{DragDefaults, GlideConfig, LoggingSection, TweenDefaults};
pub use logging::{init_logging, LogConfig, LogFormat};

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum GlideError {
    #[error("animation error: {message}")]
    Animation {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("drag error: {message}")]
    Drag {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GlideError {
    pub fn animation_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Animation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn drag(message: impl Into<String>) -> Self {
        Self::Drag {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short label used as the `category` field in log events.
    pub fn category(&self) -> &'static str {
        match self {
            GlideError::Animation { .. } => "animation",
            GlideError::Drag { .. } => "drag",
            GlideError::Config { .. } => "config",
            GlideError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, GlideError>;
