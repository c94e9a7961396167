//! `tracing` subscriber setup.
//!
//! Engines log per-frame tween detail and per-move drag detail at `trace`,
//! lifecycle events (tween start and finish, drag grab and drop) at `debug`.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingSection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    Json,
}

impl LogFormat {
    /// Unrecognized names give `Pretty`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "compact" => LogFormat::Compact,
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used when neither `filter` nor `RUST_LOG` says otherwise.
    pub level: Level,
    pub format: LogFormat,
    /// Print file and line for each event.
    pub with_location: bool,
    /// Emit span enter and close events.
    pub with_spans: bool,
    /// `EnvFilter` directives such as `"glide_drag=trace,glide_dom=warn"`.
    /// Takes precedence over `RUST_LOG`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::at(Level::INFO)
    }
}

impl LogConfig {
    fn at(level: Level) -> Self {
        Self {
            level,
            format: LogFormat::Pretty,
            with_location: false,
            with_spans: false,
            filter: None,
        }
    }

    fn verbose(level: Level) -> Self {
        Self {
            with_location: true,
            with_spans: true,
            ..Self::at(level)
        }
    }

    pub fn debug() -> Self {
        Self::verbose(Level::DEBUG)
    }

    /// Shows every tween frame and drag move.
    pub fn trace() -> Self {
        Self::verbose(Level::TRACE)
    }

    pub fn from_section(section: &LoggingSection) -> Self {
        Self {
            format: LogFormat::parse(&section.format),
            filter: section.filter.clone(),
            ..Self::at(section.level.parse().unwrap_or(Level::INFO))
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let parsed = match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).ok(),
            None => EnvFilter::try_from_default_env().ok(),
        };
        parsed.unwrap_or_else(|| EnvFilter::new(self.level.as_str()))
    }

    fn span_events(&self) -> FmtSpan {
        if self.with_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// Only the first call in a process takes effect, so every test may call it.
pub fn init_logging(config: LogConfig) {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let spans = config.span_events();

    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_file(config.with_location)
                    .with_line_number(config.with_location)
                    .with_span_events(spans),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_span_events(spans))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_span_events(spans))
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}
