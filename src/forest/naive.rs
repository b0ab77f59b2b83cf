//! Memoryless baseline forest.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::expansion::{ExpansionForest, Planting};
use super::StepForest;
use crate::config::ForestConfig;
use crate::diagnostics::Anomalies;
use crate::error::ForestError;
use crate::graph::{Coordinate, NodeId, RoadNetwork};

/// Rebuilds the lookahead forest from the raw spatial query on every update.
///
/// There is no region window: nothing is pruned and nothing becomes obsolete.
#[derive(Debug)]
pub struct NaiveForest {
    network: Arc<RoadNetwork>,
    depth: usize,
    parallel_levels: usize,
    current_step: usize,
    expansion: ExpansionForest,
    locations: Vec<Coordinate>,
    anomalies: Arc<Anomalies>,
}

impl NaiveForest {
    /// Creates a baseline forest with lookahead `depth`.
    pub fn new(network: Arc<RoadNetwork>, depth: usize) -> Self {
        Self {
            network,
            depth,
            parallel_levels: ForestConfig::default().parallel_levels,
            current_step: 0,
            expansion: ExpansionForest::empty(depth),
            locations: Vec::new(),
            anomalies: Arc::new(Anomalies::new()),
        }
    }

    /// Creates a baseline forest from `config`, replaying `locations`.
    pub fn from_config(network: Arc<RoadNetwork>, config: &ForestConfig, locations: Vec<Coordinate>) -> Self {
        Self {
            parallel_levels: config.parallel_levels,
            locations,
            ..Self::new(network, config.depth)
        }
    }

    /// Shares an anomaly counter with other forests.
    #[must_use]
    pub fn with_anomalies(mut self, anomalies: Arc<Anomalies>) -> Self {
        self.anomalies = anomalies;
        self
    }

    /// Lookahead depth.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl StepForest for NaiveForest {
    fn update(&mut self, center: Coordinate, radius_m: f64) -> Result<(), ForestError> {
        let roots: Vec<NodeId> = self.network.nodes_within_range(center, radius_m);
        let nothing_obsolete = BTreeSet::new();
        self.expansion = Planting {
            network: &self.network,
            obsolete: &nothing_obsolete,
            anomalies: &self.anomalies,
            max_depth: self.depth,
            parallel_levels: self.parallel_levels,
        }
        .grow(roots);
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
}
