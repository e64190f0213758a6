use std::collections::{BTreeMap, HashMap};

use crate::RouterId;
use crate::protocol::table::Cost;

/// One router's advertised view: destination to estimated cost.
pub type DistanceVector = BTreeMap<RouterId, Cost>;

/// Last advertisement received from each neighbor. An absent key means no
/// advertisement has arrived from that neighbor yet.
#[derive(Debug, Clone, Default)]
pub struct NeighborTables {
    tables: HashMap<RouterId, DistanceVector>,
}

impl NeighborTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached vector for a neighbor wholesale. Vectors are never
    /// merged; each advertisement carries the sender's full table.
    pub fn insert(&mut self, neighbor: RouterId, vector: DistanceVector) {
        self.tables.insert(neighbor, vector);
    }

    pub fn get(&self, neighbor: &RouterId) -> Option<&DistanceVector> {
        self.tables.get(neighbor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, &DistanceVector)> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
