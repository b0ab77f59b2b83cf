//! Road-network collaborator: nodes, edges, coordinates and spatial lookup.
//!
//! The network is immutable once built and is shared by reference (`Arc`)
//! across every forest and expansion worker without locking.

mod coordinate;
mod id_map;
mod network;
mod spatial;

pub use coordinate::{BoundingBox, Coordinate, EARTH_RADIUS_KM};
pub use id_map::NodeIdMap;
pub use network::{Edge, EdgeIndex, Node, RoadNetwork, RoadNetworkBuilder};
pub use spatial::{SpatialIndex, DEFAULT_BUCKET};

/// Compact node identifier.
pub type NodeId = u16;

/// Identifier reserved for "no node"; used to pad fixed-length paths.
pub const PAD_NODE: NodeId = 0;

#[cfg(test)]
mod tests;
