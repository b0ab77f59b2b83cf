//! One node's live links within a single region snapshot.

use std::collections::BTreeSet;

use crate::graph::{NodeId, RoadNetwork};

/// Live children and still-valid parents of a node at one update step.
///
/// `children` starts as every outgoing neighbor in the network and is only
/// ever narrowed afterwards; `parents` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionalNode {
    id: NodeId,
    children: BTreeSet<NodeId>,
    parents: BTreeSet<NodeId>,
}

impl RegionalNode {
    /// Builds the record for `id`.
    ///
    /// Parents are the incoming neighbors of `id` that are members of
    /// `valid_parents`; `None` means this is the first snapshot and no parents
    /// are recorded. The parent and child lookups run as a fork-join pair.
    pub fn new(network: &RoadNetwork, id: NodeId, valid_parents: Option<&BTreeSet<NodeId>>) -> Self {
        let (parents, children) = rayon::join(
            || match valid_parents {
                Some(valid) => network
                    .incoming(id)
                    .map(|(p, _)| p)
                    .filter(|p| valid.contains(p))
                    .collect(),
                None => BTreeSet::new(),
            },
            || network.outgoing(id).map(|(c, _)| c).collect(),
        );

        Self {
            id,
            children,
            parents,
        }
    }

    /// Node identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Live children.
    pub fn children(&self) -> &BTreeSet<NodeId> {
        &self.children
    }

    /// Valid parents in the previous snapshot.
    pub fn parents(&self) -> &BTreeSet<NodeId> {
        &self.parents
    }

    /// Narrows children to `survivors`; returns `true` if any child remains.
    pub(crate) fn retain_children(&mut self, survivors: &BTreeSet<NodeId>) -> bool {
        self.children.retain(|c| survivors.contains(c));
        !self.children.is_empty()
    }

    /// Drops `child`; returns `true` if no children remain.
    pub(crate) fn remove_child(&mut self, child: NodeId) -> bool {
        self.children.remove(&child);
        self.children.is_empty()
    }

    pub(crate) fn into_parents(self) -> BTreeSet<NodeId> {
        self.parents
    }
}
