//! The immutable road network: an arena of nodes and edges addressed by index.
//!
//! Nodes are stored in a dense `Vec<Option<Node>>` indexed by their compact
//! [`NodeId`]; edges live in a separate arena and adjacency is kept as sorted
//! `(neighbor, edge index)` lists, so no node owns another.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `node` | \(O(1)\) | Direct arena lookup |
//! | `outgoing` / `incoming` | \(O(1)\) | Iterator over a sorted slice |
//! | `has_edge` | \(O(\log d)\) | Binary search over out-neighbors |
//! | `nodes_within_range` | \(O(\sqrt{n} + k)\) | KD range over the bounding box |

use std::collections::HashMap;

use super::{Coordinate, NodeId, SpatialIndex};
use crate::error::NetworkError;

/// Index of an edge in the network's edge arena.
pub type EdgeIndex = usize;

/// A directed road segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// Start of the segment.
    pub source: NodeId,
    /// End of the segment.
    pub destination: NodeId,
    /// Traversal cost.
    pub cost: f64,
    /// Length in metres.
    pub distance: f64,
}

/// A road-graph node with its mirrored adjacency.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    location: Coordinate,
    outgoing: Vec<(NodeId, EdgeIndex)>,
    incoming: Vec<(NodeId, EdgeIndex)>,
}

impl Node {
    fn new(id: NodeId, location: Coordinate) -> Self {
        Self {
            id,
            location,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Compact identifier.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Geographic position.
    pub fn location(&self) -> Coordinate {
        self.location
    }

    /// Out-degree.
    pub fn out_degree(&self) -> usize {
        self.outgoing.len()
    }

    /// In-degree.
    pub fn in_degree(&self) -> usize {
        self.incoming.len()
    }
}

/// Read-only road network shared by every forest.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    nodes: Vec<Option<Node>>,
    edges: Vec<Edge>,
    index: SpatialIndex,
}

impl RoadNetwork {
    /// Starts a new network builder.
    pub fn builder() -> RoadNetworkBuilder {
        RoadNetworkBuilder::new()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up a node.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(usize::from(id)).and_then(Option::as_ref)
    }

    /// Returns `true` if `id` names a node of this network.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Looks up an edge by arena index.
    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index)
    }

    /// Outgoing `(neighbor, edge)` pairs of `id`, sorted by neighbor.
    /// Empty for unknown identifiers.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.outgoing.iter())
            .map(|&(nbr, e)| (nbr, &self.edges[e]))
    }

    /// Incoming `(neighbor, edge)` pairs of `id`, sorted by neighbor.
    /// Empty for unknown identifiers.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|n| n.incoming.iter())
            .map(|&(nbr, e)| (nbr, &self.edges[e]))
    }

    /// Outgoing and incoming adjacency of `id`, or `None` if unknown.
    pub fn neighbors(&self, id: NodeId) -> Option<(&[(NodeId, EdgeIndex)], &[(NodeId, EdgeIndex)])> {
        self.node(id).map(|n| (n.outgoing.as_slice(), n.incoming.as_slice()))
    }

    /// Checks whether the directed edge `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.node(from)
            .is_some_and(|n| n.outgoing.binary_search_by_key(&to, |&(v, _)| v).is_ok())
    }

    /// Every node whose coordinate falls in the bounding box of the circle of
    /// `radius_m` metres around `center`. The box over-approximates the circle.
    pub fn nodes_within_range(&self, center: Coordinate, radius_m: f64) -> Vec<NodeId> {
        self.index.range(&center.bounding_box(radius_m))
    }

    /// All node identifiers in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().flatten().map(Node::id)
    }
}

/// Incremental builder for [`RoadNetwork`].
///
/// Adding an edge registers it on both endpoints: `a -> b` appears in `a`'s
/// outgoing list and in `b`'s incoming list. Re-adding an existing pair is a no-op.
#[derive(Debug, Default)]
pub struct RoadNetworkBuilder {
    nodes: Vec<Option<Node>>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(NodeId, NodeId), EdgeIndex>,
}

impl RoadNetworkBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// # Errors
    /// [`NetworkError::DuplicateNode`] if `id` is already present.
    pub fn add_node(&mut self, id: NodeId, location: Coordinate) -> Result<&mut Self, NetworkError> {
        let slot = usize::from(id);
        if slot >= self.nodes.len() {
            self.nodes.resize_with(slot + 1, || None);
        }
        if self.nodes[slot].is_some() {
            return Err(NetworkError::DuplicateNode(id));
        }
        self.nodes[slot] = Some(Node::new(id, location));
        Ok(self)
    }

    /// Adds the directed edge `source -> destination`.
    ///
    /// # Errors
    /// - [`NetworkError::UnknownEndpoint`] if either endpoint was not added
    /// - [`NetworkError::InvalidWeight`] unless both weights are finite and positive
    pub fn add_edge(
        &mut self,
        source: NodeId,
        destination: NodeId,
        cost: f64,
        distance: f64,
    ) -> Result<&mut Self, NetworkError> {
        if !(cost.is_finite() && cost > 0.0 && distance.is_finite() && distance > 0.0) {
            return Err(NetworkError::InvalidWeight { cost, distance });
        }
        if !self.has_node(source) || !self.has_node(destination) {
            return Err(NetworkError::UnknownEndpoint {
                source,
                destination,
            });
        }
        if self.edge_lookup.contains_key(&(source, destination)) {
            return Ok(self);
        }

        let index = self.edges.len();
        self.edges.push(Edge {
            source,
            destination,
            cost,
            distance,
        });
        self.edge_lookup.insert((source, destination), index);

        if let Some(src) = self.nodes[usize::from(source)].as_mut() {
            src.outgoing.push((destination, index));
        }
        if let Some(dst) = self.nodes[usize::from(destination)].as_mut() {
            dst.incoming.push((source, index));
        }
        Ok(self)
    }

    /// Adds `a -> b` and `b -> a` with the same weights.
    ///
    /// # Errors
    /// Same as [`RoadNetworkBuilder::add_edge`].
    pub fn add_road(&mut self, a: NodeId, b: NodeId, cost: f64, distance: f64) -> Result<&mut Self, NetworkError> {
        self.add_edge(a, b, cost, distance)?;
        self.add_edge(b, a, cost, distance)
    }

    fn has_node(&self, id: NodeId) -> bool {
        self.nodes.get(usize::from(id)).is_some_and(Option::is_some)
    }

    /// Freezes the network and builds its spatial index.
    pub fn build(self) -> RoadNetwork {
        let mut nodes = self.nodes;
        for node in nodes.iter_mut().flatten() {
            node.outgoing.sort_unstable_by_key(|&(v, _)| v);
            node.incoming.sort_unstable_by_key(|&(v, _)| v);
        }

        let index = SpatialIndex::build(nodes.iter().flatten().map(|n| (n.id, n.location)));
        tracing::debug!(
            nodes = index.len(),
            edges = self.edges.len(),
            "road network built"
        );

        RoadNetwork {
            nodes,
            edges: self.edges,
            index,
        }
    }
}
