//! Error types for network construction and forest maintenance.
//!
//! Empty spatial queries and unknown identifiers met during expansion are
//! *not* errors: the former is an expected state for objects leaving the
//! indexed area, the latter is counted on [`crate::diagnostics::Anomalies`].

use crate::graph::NodeId;

/// Errors raised while building a [`crate::graph::RoadNetwork`] or remapping ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetworkError {
    /// A node with this identifier was already added.
    DuplicateNode(NodeId),
    /// An edge references a node that was never added.
    UnknownEndpoint {
        /// Edge source.
        source: NodeId,
        /// Edge destination.
        destination: NodeId,
    },
    /// Edge cost and distance must be finite and strictly positive.
    InvalidWeight {
        /// Offending cost.
        cost: f64,
        /// Offending distance.
        distance: f64,
    },
    /// The compact identifier space (`u16`) has no free ids left.
    IdSpaceExhausted,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateNode(id) => write!(f, "node {id} was added twice"),
            Self::UnknownEndpoint {
                source,
                destination,
            } => write!(f, "edge {source}->{destination} references an unknown node"),
            Self::InvalidWeight { cost, distance } => {
                write!(f, "edge weights must be positive (cost={cost}, distance={distance})")
            }
            Self::IdSpaceExhausted => f.write_str("compact node id space exhausted"),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Errors raised by forest updates and forest configuration.
///
/// A forest that returned `MissingPredecessorRegion` is poisoned: every later
/// update on it returns [`ForestError::Aborted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestError {
    /// Update requested for `step > 0` but snapshot `step - 1` does not exist.
    MissingPredecessorRegion {
        /// The step being applied.
        step: usize,
    },
    /// The update stream was aborted by an earlier fatal error at `step`.
    Aborted {
        /// Step at which the stream failed.
        step: usize,
    },
    /// A configuration value is out of range.
    InvalidConfig(&'static str),
    /// The worker pool could not be created.
    WorkerPool(String),
}

impl core::fmt::Display for ForestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingPredecessorRegion { step } => {
                write!(f, "no region snapshot precedes step {step}")
            }
            Self::Aborted { step } => write!(f, "update stream aborted at step {step}"),
            Self::InvalidConfig(reason) => write!(f, "invalid forest configuration: {reason}"),
            Self::WorkerPool(reason) => write!(f, "failed to build worker pool: {reason}"),
        }
    }
}

impl std::error::Error for ForestError {}
