//! Construction parameters for a [`crate::Tree`].
//!
//! # Environment variables (demonstration binary and tests only)
//!
//! - `TREEBUFFER_HISTORY` - positive integer, default 3
//! - `TREEBUFFER_ALGORITHM` - one of `naive`, `mark`, `amortized`, `real-time`, default `mark`
//! - `TREEBUFFER_STATS_PATH` - optional path to an append-only statistics file
//!
//! The library itself never reads the environment; only [`TreeBufferConfig::from_env`] does,
//! and it is intended for the `demo` binary and integration tests, not for the engine itself.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which reclamation strategy a [`crate::Tree`] uses.
///
/// Modelled as a variant tag checked at each operation site, matching the C
/// original, rather than a capability trait: the four strategies share almost
/// all of their call sequence and differ only in a handful of branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Naive,
    Mark,
    Amortized,
    RealTime,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naive" => Ok(Algorithm::Naive),
            "mark" | "gc" => Ok(Algorithm::Mark),
            "amortized" => Ok(Algorithm::Amortized),
            "real-time" | "real_time" | "realtime" | "real" => Ok(Algorithm::RealTime),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Naive => "naive",
            Algorithm::Mark => "mark",
            Algorithm::Amortized => "amortized",
            Algorithm::RealTime => "real-time",
        }
    }
}

/// Validated construction parameters for a [`crate::Tree`].
#[derive(Debug, Clone)]
pub struct TreeBufferConfig {
    pub history: u32,
    pub algorithm: Algorithm,
    pub stats_path: Option<PathBuf>,
}

impl TreeBufferConfig {
    /// Builds a config, validating `history > 0`.
    pub fn new(history: u32, algorithm: Algorithm) -> Result<Self, ConfigError> {
        if history == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        Ok(Self {
            history,
            algorithm,
            stats_path: None,
        })
    }

    pub fn with_stats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_path = Some(path.into());
        self
    }

    /// Loads defaults from the environment, for the demo binary and tests.
    pub fn from_env() -> Result<Self, ConfigError> {
        let history = match env::var("TREEBUFFER_HISTORY") {
            Ok(v) => v
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue("TREEBUFFER_HISTORY", v))?,
            Err(_) => 3,
        };
        let algorithm = match env::var("TREEBUFFER_ALGORITHM") {
            Ok(v) => Algorithm::from_str(&v)?,
            Err(_) => Algorithm::Mark,
        };
        let mut config = Self::new(history, algorithm)?;
        if let Ok(path) = env::var("TREEBUFFER_STATS_PATH") {
            config = config.with_stats_path(path);
        }
        Ok(config)
    }
}
