//! Layer configuration
//!
//! [`ReshapeConfig`] carries the single recognized option, `sample_step`,
//! the block size of the configurable layer. The fixed-step layer accepts the
//! same config and ignores the value.
//!
//! With the `serde` feature the config can be loaded from JSON; missing
//! fields take their defaults:
//!
//! ```
//! # #[cfg(feature = "serde")]
//! # {
//! use featfold_layer::ReshapeConfig;
//!
//! let config = ReshapeConfig::from_json(r#"{ "sample_step": 4 }"#).unwrap();
//! assert_eq!(config.sample_step, 4);
//!
//! let config = ReshapeConfig::from_json("{}").unwrap();
//! assert_eq!(config.sample_step, 2);
//! # }
//! ```

use featfold_core::{BlockSize, FeatFoldError};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document could not be parsed
    #[cfg(feature = "serde")]
    #[error("failed to parse reshape config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but holds an out-of-range value
    #[error(transparent)]
    Invalid(#[from] FeatFoldError),
}

/// Configuration of a space-to-depth layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ReshapeConfig {
    /// Side length of the spatial block folded into channels (default: 2)
    pub sample_step: usize,
}

impl ReshapeConfig {
    /// Default block size.
    pub const DEFAULT_SAMPLE_STEP: usize = 2;

    /// Create a config with the given sample step.
    ///
    /// The value is not checked here; see [`ReshapeConfig::validate`].
    pub fn new(sample_step: usize) -> Self {
        Self { sample_step }
    }

    /// Validate the config and return the block size it describes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `sample_step` is zero.
    pub fn validate(&self) -> Result<BlockSize, FeatFoldError> {
        BlockSize::new(self.sample_step)
    }

    /// Parse and validate a JSON config.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for ReshapeConfig {
    fn default() -> Self {
        Self {
            sample_step: Self::DEFAULT_SAMPLE_STEP,
        }
    }
}
