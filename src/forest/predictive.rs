//! Per-object forest with incremental region maintenance.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::expansion::{ExpansionForest, Planting};
use super::region::{build_snapshot, Region};
use super::StepForest;
use crate::config::ForestConfig;
use crate::diagnostics::Anomalies;
use crate::error::ForestError;
use crate::graph::{Coordinate, NodeId, RoadNetwork};

/// Tracks one moving object: a window of region snapshots plus a lookahead
/// forest rebuilt from the surviving nodes after every update.
///
/// Updates must be applied in step order from a single thread; distinct
/// forests share nothing mutable and may be updated in parallel.
#[derive(Debug)]
pub struct PredictiveForest {
    network: Arc<RoadNetwork>,
    depth: usize,
    parallel_levels: usize,
    history_len: usize,
    current_step: usize,
    region: Region,
    expansion: ExpansionForest,
    locations: Vec<Coordinate>,
    anomalies: Arc<Anomalies>,
    failure: Option<usize>,
}

impl PredictiveForest {
    /// Creates a forest with lookahead `depth`.
    pub fn new(network: Arc<RoadNetwork>, depth: usize) -> Self {
        let defaults = ForestConfig::default();
        Self {
            network,
            depth,
            parallel_levels: defaults.parallel_levels,
            history_len: defaults.history_len,
            current_step: 0,
            region: Region::new(),
            expansion: ExpansionForest::empty(depth),
            locations: Vec::new(),
            anomalies: Arc::new(Anomalies::new()),
            failure: None,
        }
    }

    /// Creates a forest from `config`, replaying `locations` on [`StepForest::update_next`].
    pub fn from_config(network: Arc<RoadNetwork>, config: &ForestConfig, locations: Vec<Coordinate>) -> Self {
        let mut forest = Self::new(network, config.depth).with_locations(locations);
        forest.parallel_levels = config.parallel_levels;
        forest.history_len = config.history_len;
        forest
    }

    /// Sets the locations replayed by [`StepForest::update_next`].
    #[must_use]
    pub fn with_locations(mut self, locations: Vec<Coordinate>) -> Self {
        self.locations = locations;
        self
    }

    /// Shares an anomaly counter with other forests.
    #[must_use]
    pub fn with_anomalies(mut self, anomalies: Arc<Anomalies>) -> Self {
        self.anomalies = anomalies;
        self
    }

    /// Sets how many expansion levels fan out on the worker pool.
    #[must_use]
    pub fn with_parallel_levels(mut self, levels: usize) -> Self {
        self.parallel_levels = levels;
        self
    }

    /// Lookahead depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The snapshot window.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Mutable access to the snapshot window, e.g. to reset it between runs.
    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    /// Anomaly counters this forest reports to.
    pub fn anomalies(&self) -> &Arc<Anomalies> {
        &self.anomalies
    }

    /// Historical paths of the configured length, ready for a prediction model.
    pub fn recent_paths(&self) -> Vec<Vec<NodeId>> {
        self.region.fixed_length_paths(self.history_len)
    }

    /// Returns `true` once an update has failed fatally.
    pub fn is_aborted(&self) -> bool {
        self.failure.is_some()
    }

    /// Clears snapshots, the step counter and the lookahead forest for an
    /// independent run. The obsolete set survives.
    pub fn restart(&mut self) {
        self.region.reset();
        self.current_step = 0;
        self.expansion = ExpansionForest::empty(self.depth);
        self.failure = None;
    }

    fn seed(&mut self, ids: Vec<NodeId>) {
        let step = self.region.update(&self.network, ids, &self.anomalies);
        tracing::debug!(
            step,
            nodes = self.region.latest().map_or(0, |s| s.len()),
            "seeded region"
        );
    }

    fn advance(&mut self, ids: Vec<NodeId>) -> Result<(), ForestError> {
        let step = self.current_step;
        if self.region.len() != step {
            return Err(ForestError::MissingPredecessorRegion { step });
        }
        let Some(past) = self.region.snapshot_mut(step - 1) else {
            return Err(ForestError::MissingPredecessorRegion { step });
        };

        let children: BTreeSet<NodeId> = past
            .values()
            .flat_map(|n| n.children().iter().copied())
            .collect();

        // Only nodes reachable from a live parent survive.
        let current: BTreeSet<NodeId> = ids.into_iter().filter(|id| children.contains(id)).collect();

        let mut obsolete_parents = BTreeSet::new();
        let mut valid_parents = BTreeSet::new();
        for (&id, node) in past.iter_mut() {
            if node.retain_children(&current) {
                valid_parents.insert(id);
            } else {
                obsolete_parents.insert(id);
            }
        }

        let snapshot = build_snapshot(&self.network, current, Some(&valid_parents), &self.anomalies);
        let live = snapshot.len();
        let appended = self.region.push(snapshot);
        debug_assert_eq!(appended, step);

        let obsolete = obsolete_parents.len();
        let removed = self.region.prune(step - 1, obsolete_parents);
        tracing::debug!(
            step,
            live,
            obsolete,
            removed,
            total_obsolete = self.region.obsolete().len(),
            "advanced region"
        );
        Ok(())
    }

    fn rebuild_expansion(&mut self) {
        let roots: Vec<NodeId> = self
            .region
            .latest()
            .map(|s| s.keys().copied().collect())
            .unwrap_or_default();
        self.expansion = Planting {
            network: &self.network,
            obsolete: self.region.obsolete(),
            anomalies: &self.anomalies,
            max_depth: self.depth,
            parallel_levels: self.parallel_levels,
        }
        .grow(roots);
    }
}

impl StepForest for PredictiveForest {
    /// Applies one observation.
    ///
    /// # Errors
    /// - [`ForestError::MissingPredecessorRegion`] if the previous snapshot is
    ///   gone; the forest is then poisoned
    /// - [`ForestError::Aborted`] on every call after such a failure
    fn update(&mut self, center: Coordinate, radius_m: f64) -> Result<(), ForestError> {
        if let Some(step) = self.failure {
            return Err(ForestError::Aborted { step });
        }

        let ids = self.network.nodes_within_range(center, radius_m);
        if self.current_step == 0 {
            self.seed(ids);
        } else if let Err(err) = self.advance(ids) {
            tracing::warn!(step = self.current_step, %err, "aborting forest update stream");
            self.failure = Some(self.current_step);
            return Err(err);
        }

        self.rebuild_expansion();
        self.current_step += 1;
        Ok(())
    }

    fn current_step(&self) -> usize {
        self.current_step
    }

    fn expansion(&self) -> &ExpansionForest {
        &self.expansion
    }

    fn locations(&self) -> &[Coordinate] {
        &self.locations
    }

    fn historic_node_count(&self) -> usize {
        self.region.node_count()
    }
}
