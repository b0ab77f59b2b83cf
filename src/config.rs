//! Forest and fleet configuration.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ForestError;

/// Tunables shared by forests and the [`crate::fleet::Fleet`] driving them.
///
/// Missing JSON fields fall back to [`ForestConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Maximum lookahead depth of every expansion tree.
    pub depth: usize,
    /// Observation radius in metres.
    pub radius_m: f64,
    /// Expansion levels below this fan out on the worker pool.
    pub parallel_levels: usize,
    /// Worker threads for the fleet pool; `0` lets rayon decide.
    pub worker_threads: usize,
    /// Maximum number of objects updated concurrently.
    pub max_in_flight: usize,
    /// Optional cap on the number of tracked objects.
    pub max_objects: Option<usize>,
    /// Length of reconstructed historical paths.
    pub history_len: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            depth: 6,
            radius_m: 50.0,
            parallel_levels: 2,
            worker_threads: 0,
            max_in_flight: 64,
            max_objects: None,
            history_len: 3,
        }
    }
}

impl ForestConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    /// I/O, parse and validation failures, with the path attached.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading forest config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("parsing forest config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating forest config {}", path.display()))?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// [`ForestError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.depth == 0 {
            return Err(ForestError::InvalidConfig("depth must be at least 1"));
        }
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(ForestError::InvalidConfig("radius_m must be positive"));
        }
        if self.max_in_flight == 0 {
            return Err(ForestError::InvalidConfig("max_in_flight must be at least 1"));
        }
        if self.history_len == 0 {
            return Err(ForestError::InvalidConfig("history_len must be at least 1"));
        }
        Ok(())
    }
}
