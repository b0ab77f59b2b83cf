//! Lookahead-tree nodes built fresh on every forest update.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;

use super::expansion::ExpansionIndex;
use crate::diagnostics::Anomalies;
use crate::graph::{NodeId, RoadNetwork};

/// Shared, read-only state of one expansion pass.
pub(crate) struct ExpansionContext<'a> {
    pub(crate) network: &'a RoadNetwork,
    pub(crate) obsolete: &'a BTreeSet<NodeId>,
    pub(crate) index: &'a ExpansionIndex,
    pub(crate) anomalies: &'a Anomalies,
    /// Levels below this fan out on the worker pool; deeper ones run inline.
    pub(crate) parallel_levels: usize,
}

/// A node of a bounded-depth lookahead tree.
///
/// `depth` is the remaining budget and `level = max_depth - depth`. The
/// predecessor is the graph node this one was reached from and is only used
/// to forbid stepping straight back to it; longer cycles are allowed.
#[derive(Debug)]
pub struct PredictiveNode {
    root: NodeId,
    cost: f64,
    depth: usize,
    max_depth: usize,
    level: usize,
    predecessor: Option<NodeId>,
    children: OnceLock<BTreeMap<NodeId, Arc<PredictiveNode>>>,
}

impl PredictiveNode {
    /// Creates the node and registers it under `(level, root)` before any
    /// expansion happens.
    pub(crate) fn spawn(
        ctx: &ExpansionContext<'_>,
        root: NodeId,
        cost: f64,
        depth: usize,
        max_depth: usize,
        predecessor: Option<NodeId>,
    ) -> Arc<Self> {
        debug_assert!(depth <= max_depth);
        let node = Arc::new(Self {
            root,
            cost,
            depth,
            max_depth,
            level: max_depth - depth,
            predecessor,
            children: OnceLock::new(),
        });
        ctx.index.register(node.level, root, Arc::clone(&node));
        node
    }

    /// Graph node this tree node stands for.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Cost of the hop that reached this node (`0.0` for tree roots).
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Remaining depth budget.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Depth budget the tree was grown with.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Distance from the tree root, in hops.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Graph node this one was reached from.
    pub fn predecessor(&self) -> Option<NodeId> {
        self.predecessor
    }

    /// Expanded children keyed by graph node. Empty for leaves and for nodes
    /// whose expansion has not completed.
    pub fn children(&self) -> impl Iterator<Item = (NodeId, &Arc<PredictiveNode>)> + '_ {
        self.children
            .get()
            .into_iter()
            .flat_map(|c| c.iter().map(|(&id, n)| (id, n)))
    }

    /// Child reached through graph node `id`.
    pub fn child(&self, id: NodeId) -> Option<&Arc<PredictiveNode>> {
        self.children.get().and_then(|c| c.get(&id))
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.get().map_or(0, BTreeMap::len)
    }

    /// Grows the subtree below this node; returns once every descendant is expanded.
    pub(crate) fn expand(&self, ctx: &ExpansionContext<'_>) {
        if self.depth == 0 || self.level == self.max_depth {
            let _ = self.children.set(BTreeMap::new());
            return;
        }
        if !ctx.network.contains(self.root) {
            ctx.anomalies.record_unknown_node(self.root);
            let _ = self.children.set(BTreeMap::new());
            return;
        }

        let candidates: Vec<(NodeId, f64)> = ctx
            .network
            .outgoing(self.root)
            .filter(|&(nbr, _)| !ctx.obsolete.contains(&nbr) && self.predecessor != Some(nbr))
            .map(|(nbr, edge)| (nbr, edge.cost))
            .collect();

        let grow = |&(nbr, cost): &(NodeId, f64)| {
            let child = Self::spawn(ctx, nbr, cost, self.depth - 1, self.max_depth, Some(self.root));
            child.expand(ctx);
            (nbr, child)
        };

        let children: BTreeMap<NodeId, Arc<PredictiveNode>> =
            if self.level < ctx.parallel_levels && candidates.len() > 1 {
                candidates.par_iter().map(grow).collect()
            } else {
                candidates.iter().map(grow).collect()
            };

        let _ = self.children.set(children);
    }
}
