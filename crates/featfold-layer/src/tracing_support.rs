//! Subscriber setup for the layer's tracing events
//!
//! Events come from two targets: [`RESHAPER_TARGET`] (`debug!` on setup,
//! `warn!` for odd `sample_step` values) and [`SPACE_TO_DEPTH_TARGET`]
//! (`debug!` on shape changes, `trace!` per forward/backward pass). The
//! default filter keeps both at [`TracingConfig::layer_level`] and everything
//! else at [`TracingConfig::base_level`].
//!
//! [`init_tracing`] needs the `tracing` feature; without it the call is a
//! no-op.
//!
//! # Example
//!
//! ```ignore
//! use featfold_layer::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//! use tracing::level_filters::LevelFilter;
//!
//! init_tracing(TracingConfig {
//!     format: TracingFormat::Compact,
//!     layer_level: LevelFilter::TRACE,
//!     ..TracingConfig::default()
//! })?;
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: full filter directive, replaces the per-target defaults
//! - `FEATFOLD_LAYER_LOG`: level for the two layer targets (default: `info`)
//! - `FEATFOLD_LOG_FORMAT`: `pretty`, `json` or `compact` (default: `pretty`)

use anyhow::Result;
use tracing::level_filters::LevelFilter;
#[cfg(feature = "tracing")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Target of the layer adapters' lifecycle events.
pub const RESHAPER_TARGET: &str = "featfold_layer::reshaper";

/// Target of the shared component's shape and pass events.
pub const SPACE_TO_DEPTH_TARGET: &str = "featfold_layer::space_to_depth";

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "FEATFOLD_LOG_FORMAT";

/// Environment variable selecting the level of both layer targets.
pub const LAYER_LEVEL_ENV: &str = "FEATFOLD_LAYER_LOG";

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line per event
    Compact,
}

impl TracingFormat {
    /// Parse a format name; unknown names fall back to `Pretty`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Level for [`RESHAPER_TARGET`] and [`SPACE_TO_DEPTH_TARGET`]
    pub layer_level: LevelFilter,
    /// Level for every other target
    pub base_level: LevelFilter,
    /// Raw `EnvFilter` directive used instead of the per-target levels
    pub filter_override: Option<String>,
    /// ANSI colors (ignored for JSON)
    pub with_ansi: bool,
    /// Show source file and line
    pub with_location: bool,
}

impl TracingConfig {
    /// Build a config from `RUST_LOG`, `FEATFOLD_LAYER_LOG` and
    /// `FEATFOLD_LOG_FORMAT`.
    ///
    /// An unparsable `FEATFOLD_LAYER_LOG` keeps the default layer level.
    pub fn from_env() -> Self {
        let mut config = Self::quiet();
        if let Ok(format) = std::env::var(LOG_FORMAT_ENV) {
            config.format = TracingFormat::parse(&format);
        }
        if let Some(level) = std::env::var(LAYER_LEVEL_ENV)
            .ok()
            .and_then(|s| s.trim().parse::<LevelFilter>().ok())
        {
            config.layer_level = level;
        }
        config.filter_override = std::env::var("RUST_LOG").ok().filter(|s| !s.is_empty());
        config
    }

    /// Layer targets at `info`, everything else at `warn`, ignoring the
    /// environment.
    pub fn quiet() -> Self {
        Self {
            format: TracingFormat::Pretty,
            layer_level: LevelFilter::INFO,
            base_level: LevelFilter::WARN,
            filter_override: None,
            with_ansi: true,
            with_location: false,
        }
    }

    /// The `EnvFilter` directive this config installs.
    pub fn directive(&self) -> String {
        match &self.filter_override {
            Some(filter) => filter.clone(),
            None => format!(
                "{},{RESHAPER_TARGET}={},{SPACE_TO_DEPTH_TARGET}={}",
                self.base_level, self.layer_level, self.layer_level
            ),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Install a global subscriber. Call once at startup.
///
/// # Errors
///
/// Fails when the filter directive does not parse or a global subscriber is
/// already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.directive())?;

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        TracingFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(config.with_ansi)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        TracingFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        TracingFormat::Compact => fmt::layer()
            .compact()
            .with_ansi(config.with_ansi)
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()?;
    tracing::debug!(target: RESHAPER_TARGET, format = ?config.format, "tracing installed");
    Ok(())
}

/// No-op when the `tracing` feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}
