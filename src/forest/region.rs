//! The per-object window of region snapshots.
//!
//! Snapshot `k` maps every node still considered live at update step `k` to
//! its [`RegionalNode`]. Snapshots are append-only in step order; pruning only
//! removes nodes and narrows child sets. The obsolete set accumulates every
//! node that ever lost all live descendants and is never shrunk, including by
//! [`Region::reset`].
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `update` | \(O(n \cdot d)\) | `n` seeded nodes, `d` = degree |
//! | `prune` | \(O(r \cdot p)\) | `r` removed nodes, `p` = parents each; iterative |
//! | `fixed_length_paths` | output-sensitive | Visits only the last `len` snapshots |
//! | `trajectories` | output-sensitive | Paths can multiply at every step |

use std::collections::{BTreeMap, BTreeSet};

use super::RegionalNode;
use crate::diagnostics::Anomalies;
use crate::graph::{NodeId, RoadNetwork, PAD_NODE};

/// Nodes of one update step keyed by identifier.
pub type Snapshot = BTreeMap<NodeId, RegionalNode>;

/// Builds a snapshot for `ids`, filtering parents against `valid_parents`.
///
/// Identifiers unknown to the network are skipped and counted.
pub(crate) fn build_snapshot(
    network: &RoadNetwork,
    ids: impl IntoIterator<Item = NodeId>,
    valid_parents: Option<&BTreeSet<NodeId>>,
    anomalies: &Anomalies,
) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for id in ids {
        if !network.contains(id) {
            anomalies.record_unknown_node(id);
            continue;
        }
        snapshot.insert(id, RegionalNode::new(network, id, valid_parents));
    }
    snapshot
}

/// Ordered window of snapshots plus the accumulated obsolete set.
#[derive(Debug, Clone, Default)]
pub struct Region {
    snapshots: Vec<Snapshot>,
    obsolete: BTreeSet<NodeId>,
}

impl Region {
    /// Creates an empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no snapshot is held.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot for `step`.
    pub fn snapshot(&self, step: usize) -> Option<&Snapshot> {
        self.snapshots.get(step)
    }

    pub(crate) fn snapshot_mut(&mut self, step: usize) -> Option<&mut Snapshot> {
        self.snapshots.get_mut(step)
    }

    /// Most recent snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// All snapshots in step order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Every identifier that has been declared obsolete.
    pub fn obsolete(&self) -> &BTreeSet<NodeId> {
        &self.obsolete
    }

    /// Returns `true` if `id` is permanently excluded from expansion.
    pub fn is_obsolete(&self, id: NodeId) -> bool {
        self.obsolete.contains(&id)
    }

    /// Total number of regional nodes across all snapshots.
    pub fn node_count(&self) -> usize {
        self.snapshots.iter().map(BTreeMap::len).sum()
    }

    /// Seeds a snapshot with parentless nodes and returns its step index.
    ///
    /// Only the first step is seeded this way; later steps are built by
    /// [`crate::forest::PredictiveForest::update`].
    pub fn update(
        &mut self,
        network: &RoadNetwork,
        ids: impl IntoIterator<Item = NodeId>,
        anomalies: &Anomalies,
    ) -> usize {
        self.push(build_snapshot(network, ids, None, anomalies))
    }

    pub(crate) fn push(&mut self, snapshot: Snapshot) -> usize {
        self.snapshots.push(snapshot);
        self.snapshots.len() - 1
    }

    /// Drops every snapshot. The obsolete set is kept.
    pub fn reset(&mut self) {
        self.snapshots.clear();
    }

    /// Removes `obsolete` nodes from snapshot `step` and cascades backwards.
    ///
    /// For each removed node, its recorded parents in snapshot `step - 1` lose
    /// it as a child; parents left childless are removed in turn one step
    /// further back. Stops once no candidates remain or step 0 has been
    /// processed. Every candidate is added to the obsolete set.
    ///
    /// Returns the number of regional nodes removed.
    pub fn prune(&mut self, mut step: usize, mut obsolete: BTreeSet<NodeId>) -> usize {
        let mut removed = 0usize;

        loop {
            self.obsolete.extend(obsolete.iter().copied());
            if obsolete.is_empty() {
                break;
            }

            let mut detached: Vec<(NodeId, BTreeSet<NodeId>)> = Vec::with_capacity(obsolete.len());
            if let Some(snapshot) = self.snapshots.get_mut(step) {
                for id in &obsolete {
                    if let Some(node) = snapshot.remove(id) {
                        removed += 1;
                        detached.push((*id, node.into_parents()));
                    }
                }
            }

            let Some(parent_step) = step.checked_sub(1) else {
                break;
            };

            let mut orphaned = BTreeSet::new();
            if let Some(parental) = self.snapshots.get_mut(parent_step) {
                for (child, parents) in detached {
                    for p in parents {
                        if let Some(parent) = parental.get_mut(&p) {
                            if parent.remove_child(child) {
                                orphaned.insert(p);
                            }
                        }
                    }
                }
            }

            tracing::trace!(step, next = orphaned.len(), "pruned region step");
            step = parent_step;
            obsolete = orphaned;
        }

        removed
    }

    /// Every historical path through the snapshots, oldest node first, in
    /// ascending order.
    ///
    /// Paths are walked backward from the latest snapshot through parent
    /// links. A path starts at a node without recorded parents, which is where
    /// the window was seeded or restarted. The number of paths can grow
    /// geometrically with the number of snapshots; prefer
    /// [`Region::fixed_length_paths`] for long-running objects.
    pub fn trajectories(&self) -> Vec<Vec<NodeId>> {
        self.backward_paths(self.snapshots.len())
    }

    /// Distinct historical paths ending at the latest snapshot, cut to exactly
    /// `len` ids in ascending order. Only the last `len` snapshots are visited;
    /// paths that start inside that window are left-padded with [`PAD_NODE`].
    pub fn fixed_length_paths(&self, len: usize) -> Vec<Vec<NodeId>> {
        self.backward_paths(len)
            .into_iter()
            .map(|path| {
                let mut padded = vec![PAD_NODE; len - path.len()];
                padded.extend(path);
                padded
            })
            .collect()
    }

    /// Parent chains of at most `window` ids ending at the latest snapshot.
    ///
    /// Each chain is a distinct choice of parents, so the output holds no
    /// duplicates.
    fn backward_paths(&self, window: usize) -> Vec<Vec<NodeId>> {
        let Some(latest) = self.snapshots.len().checked_sub(1) else {
            return Vec::new();
        };
        if window == 0 {
            return Vec::new();
        }
        let oldest = (latest + 1).saturating_sub(window);

        // Chains are built newest id first and reversed at the end.
        let mut open: Vec<Vec<NodeId>> = self.snapshots[latest].keys().map(|&id| vec![id]).collect();
        let mut closed = Vec::new();

        for step in (oldest + 1..=latest).rev() {
            let snapshot = &self.snapshots[step];
            let mut next = Vec::with_capacity(open.len());
            for chain in open {
                let parents = chain
                    .last()
                    .and_then(|id| snapshot.get(id))
                    .map(RegionalNode::parents)
                    .filter(|p| !p.is_empty());
                let Some(parents) = parents else {
                    closed.push(chain);
                    continue;
                };
                for &parent in parents {
                    let mut longer = Vec::with_capacity(chain.len() + 1);
                    longer.extend_from_slice(&chain);
                    longer.push(parent);
                    next.push(longer);
                }
            }
            open = next;
        }

        closed.extend(open);
        for chain in &mut closed {
            chain.reverse();
        }
        closed.sort_unstable();
        closed
    }
}
