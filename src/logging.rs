//! Logging setup for wirebox
//!
//! The container emits `tracing` events under the `wirebox` target:
//! registrations, plan compilation, copies and delegation at `DEBUG`, cache
//! hits and parameter binding at `TRACE`. This module installs a subscriber
//! for them.
//!
//! # Features
//!
//! - `logging` - Emit events (default)
//! - `logging-json` - JSON structured output
//! - `logging-pretty` - Human-readable output
//!
//! Without one of the output features the initializers are no-ops.
//!
//! # Example
//!
//! ```rust,ignore
//! use wirebox::logging;
//!
//! // Container events only, at trace level, as compact lines
//! logging::builder()
//!     .trace()
//!     .wirebox_only()
//!     .compact()
//!     .init();
//! ```
//!
//! `RUST_LOG`, when set, replaces the level and target chosen here.

use tracing::Level;

/// Target every container event is emitted under
pub const TARGET: &str = "wirebox";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON objects, one per line
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
}

/// Builder for the global subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: default_format(),
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

/// JSON when `logging-json` is enabled, pretty otherwise
fn default_format() -> LogFormat {
    if cfg!(feature = "logging-json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Show every binding decision and cache hit
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Show registrations, compilations and copies
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show container events
    pub fn wirebox_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive built from the level and target
    pub fn directive(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber, failing if one is already installed.
    ///
    /// `Json` falls back to compact output unless `logging-json` is enabled.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn try_init(self) -> Result<(), tracing_subscriber::util::TryInitError> {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directive()));
        let registry = tracing_subscriber::registry().with(filter);
        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer.compact()).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        }
    }

    /// Install the subscriber.
    ///
    /// # Panics
    ///
    /// If a global subscriber is already installed. Use
    /// [`try_init`](LoggingBuilder::try_init) to handle that case.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        if let Err(err) = self.try_init() {
            panic!("failed to install the wirebox subscriber: {err}");
        }
    }

    /// No-op without an output feature
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install the default subscriber at `DEBUG`; panics if one is installed
pub fn init() {
    builder().debug().init();
}

/// Install a subscriber for container events only
pub fn init_wirebox_only() {
    builder().wirebox_only().debug().init();
}
