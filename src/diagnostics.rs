//! Countable anomalies observed during forest maintenance.
//!
//! The road network is assumed complete for every identifier it hands out, so
//! a miss is a data problem rather than a control-flow failure. Misses are
//! skipped where they occur and tallied here for observability.

use core::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::graph::NodeId;

/// Shared anomaly counters.
///
/// Counters are cache-padded because expansion workers bump them concurrently.
#[derive(Debug, Default)]
pub struct Anomalies {
    unknown_nodes: CachePadded<AtomicU64>,
}

impl Anomalies {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup of an identifier absent from the network.
    pub fn record_unknown_node(&self, id: NodeId) {
        self.unknown_nodes.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(node = id, "identifier not present in road network; skipped");
    }

    /// Number of unknown-identifier lookups so far.
    pub fn unknown_nodes(&self) -> u64 {
        self.unknown_nodes.load(Ordering::Relaxed)
    }
}
