//! The lookahead forest: concurrent registration index and its frozen view.
//!
//! During a pass every [`PredictiveNode`] registers itself under
//! `(level, root)` in an [`ExpansionIndex`]. Buckets are created with
//! insert-if-absent semantics and appended to under the bucket's shard lock,
//! so concurrent first writers never lose a node. Once the pass has joined the
//! index is frozen into an immutable [`ExpansionForest`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dashmap::DashMap;
use rayon::prelude::*;

use super::predictive_node::{ExpansionContext, PredictiveNode};
use crate::diagnostics::Anomalies;
use crate::graph::{NodeId, RoadNetwork};

/// Lookahead-tree nodes grouped by graph node.
pub type LevelBuckets = BTreeMap<NodeId, Vec<Arc<PredictiveNode>>>;

#[derive(Debug, Default)]
pub(crate) struct ExpansionIndex {
    buckets: DashMap<(usize, NodeId), Vec<Arc<PredictiveNode>>>,
}

impl ExpansionIndex {
    pub(crate) fn register(&self, level: usize, root: NodeId, node: Arc<PredictiveNode>) {
        self.buckets.entry((level, root)).or_default().push(node);
    }

    fn freeze(self, max_depth: usize) -> ExpansionForest {
        let mut levels: Vec<LevelBuckets> = (0..=max_depth).map(|_| BTreeMap::new()).collect();
        for ((level, root), nodes) in self.buckets {
            levels[level].insert(root, nodes);
        }
        ExpansionForest { max_depth, levels }
    }
}

/// Inputs of one expansion pass.
pub(crate) struct Planting<'a> {
    pub(crate) network: &'a RoadNetwork,
    pub(crate) obsolete: &'a BTreeSet<NodeId>,
    pub(crate) anomalies: &'a Anomalies,
    pub(crate) max_depth: usize,
    pub(crate) parallel_levels: usize,
}

impl Planting<'_> {
    /// Grows one lookahead tree per non-obsolete root and freezes the result.
    pub(crate) fn grow(&self, roots: impl IntoIterator<Item = NodeId>) -> ExpansionForest {
        let index = ExpansionIndex::default();
        let ctx = ExpansionContext {
            network: self.network,
            obsolete: self.obsolete,
            index: &index,
            anomalies: self.anomalies,
            parallel_levels: self.parallel_levels,
        };

        let roots: Vec<NodeId> = roots
            .into_iter()
            .filter(|id| !self.obsolete.contains(id))
            .filter(|&id| {
                let known = self.network.contains(id);
                if !known {
                    self.anomalies.record_unknown_node(id);
                }
                known
            })
            .collect();

        let plant = |&root: &NodeId| {
            let tree = PredictiveNode::spawn(&ctx, root, 0.0, self.max_depth, self.max_depth, None);
            tree.expand(&ctx);
        };
        if self.parallel_levels > 0 {
            roots.par_iter().for_each(plant);
        } else {
            roots.iter().for_each(plant);
        }

        let forest = index.freeze(self.max_depth);
        tracing::trace!(
            roots = roots.len(),
            nodes = forest.node_count(),
            "expansion forest rebuilt"
        );
        forest
    }
}

/// Immutable lookahead forest: level → graph node → tree nodes at that level.
///
/// Level 0 holds exactly one node per tree root. Node order inside a bucket
/// follows completion order and is not meaningful.
#[derive(Debug, Clone, Default)]
pub struct ExpansionForest {
    max_depth: usize,
    levels: Vec<LevelBuckets>,
}

impl ExpansionForest {
    /// An empty forest with `max_depth + 1` empty levels.
    pub fn empty(max_depth: usize) -> Self {
        Self {
            max_depth,
            levels: (0..=max_depth).map(|_| BTreeMap::new()).collect(),
        }
    }

    /// Depth budget the forest was grown with.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Buckets at `level`.
    pub fn level(&self, level: usize) -> Option<&LevelBuckets> {
        self.levels.get(level)
    }

    /// All levels in order.
    pub fn levels(&self) -> &[LevelBuckets] {
        &self.levels
    }

    /// Graph nodes that appear at `level`, ascending.
    pub fn roots_at(&self, level: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.levels.get(level).into_iter().flat_map(|b| b.keys().copied())
    }

    /// Tree nodes standing for graph node `root` at `level`.
    pub fn nodes_at(&self, level: usize, root: NodeId) -> &[Arc<PredictiveNode>] {
        self.levels
            .get(level)
            .and_then(|b| b.get(&root))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tree rooted at graph node `root`.
    pub fn tree(&self, root: NodeId) -> Option<&Arc<PredictiveNode>> {
        self.nodes_at(0, root).first()
    }

    /// Every tree root.
    pub fn trees(&self) -> impl Iterator<Item = &Arc<PredictiveNode>> + '_ {
        self.levels.first().into_iter().flat_map(|b| b.values().flatten())
    }

    /// Total number of tree nodes.
    pub fn node_count(&self) -> usize {
        self.levels
            .iter()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Returns `true` if no tree was grown.
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(BTreeMap::is_empty)
    }

    /// Number of lookahead paths that reach each graph node at `level`.
    pub fn candidate_weights(&self, level: usize) -> BTreeMap<NodeId, usize> {
        self.levels
            .get(level)
            .map(|b| b.iter().map(|(&id, nodes)| (id, nodes.len())).collect())
            .unwrap_or_default()
    }
}
