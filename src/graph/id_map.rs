//! Remapping of long-form source identifiers into the compact [`NodeId`] space.

use std::collections::HashMap;

use super::{NodeId, PAD_NODE};
use crate::error::NetworkError;

/// Bidirectional table between raw (e.g. OSM) ids and compact node ids.
///
/// Compact id `0` is reserved as [`PAD_NODE`] and never assigned.
#[derive(Debug, Clone, Default)]
pub struct NodeIdMap {
    compact: HashMap<i64, NodeId>,
    raw: Vec<i64>,
}

impl NodeIdMap {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compact id for `raw`, assigning the next free one if needed.
    ///
    /// # Errors
    /// [`NetworkError::IdSpaceExhausted`] once every non-padding `u16` is taken.
    pub fn intern(&mut self, raw: i64) -> Result<NodeId, NetworkError> {
        if let Some(&id) = self.compact.get(&raw) {
            return Ok(id);
        }
        let next = NodeId::try_from(self.raw.len() + 1).map_err(|_| NetworkError::IdSpaceExhausted)?;
        debug_assert_ne!(next, PAD_NODE);
        self.compact.insert(raw, next);
        self.raw.push(raw);
        Ok(next)
    }

    /// Compact id previously assigned to `raw`.
    pub fn get(&self, raw: i64) -> Option<NodeId> {
        self.compact.get(&raw).copied()
    }

    /// Raw id behind a compact id.
    pub fn raw(&self, id: NodeId) -> Option<i64> {
        usize::from(id).checked_sub(1).and_then(|i| self.raw.get(i)).copied()
    }

    /// Number of interned ids.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl FromIterator<i64> for NodeIdMap {
    /// Interns ids in order, silently stopping once the id space is full.
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut map = Self::new();
        for raw in iter {
            if map.intern(raw).is_err() {
                break;
            }
        }
        map
    }
}
