//! Path-prediction forests.
//!
//! - [`Region`] / [`RegionalNode`]: the per-object window of step snapshots
//!   with backward-cascading pruning.
//! - [`PredictiveNode`] / [`ExpansionForest`]: bounded-depth lookahead trees,
//!   rebuilt from scratch on every update and indexed by level and root.
//! - [`PredictiveForest`]: incremental maintenance (query, intersect, prune,
//!   append, expand).
//! - [`NaiveForest`]: expansion only, no history.

mod expansion;
mod naive;
mod predictive;
mod predictive_node;
mod region;
mod regional_node;

pub use expansion::{ExpansionForest, LevelBuckets};
pub use naive::NaiveForest;
pub use predictive::PredictiveForest;
pub use predictive_node::PredictiveNode;
pub use region::{Region, Snapshot};
pub use regional_node::RegionalNode;

use crate::error::ForestError;
use crate::graph::Coordinate;

/// A forest that advances one observation at a time.
pub trait StepForest: Send {
    /// Applies the observation `(center, radius_m)` as the next step.
    ///
    /// # Errors
    /// Implementation-specific sequencing failures.
    fn update(&mut self, center: Coordinate, radius_m: f64) -> Result<(), ForestError>;

    /// Number of updates applied so far.
    fn current_step(&self) -> usize;

    /// Lookahead forest of the latest update.
    fn expansion(&self) -> &ExpansionForest;

    /// Recorded observations replayed by [`StepForest::update_next`].
    fn locations(&self) -> &[Coordinate];

    /// Regional nodes retained as history.
    fn historic_node_count(&self) -> usize {
        0
    }

    /// Replays the recorded location for the current step.
    ///
    /// Returns `Ok(false)` once every recorded location has been applied.
    ///
    /// # Errors
    /// Whatever [`StepForest::update`] returns.
    fn update_next(&mut self, radius_m: f64) -> Result<bool, ForestError> {
        let Some(&center) = self.locations().get(self.current_step()) else {
            return Ok(false);
        };
        self.update(center, radius_m)?;
        Ok(true)
    }
}
