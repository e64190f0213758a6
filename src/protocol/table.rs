use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::RouterId;

/// Link or path cost. Finite costs order below `Infinite`, so the derived
/// ordering is the one Bellman-Ford needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    Finite(u32),
    Infinite,
}

impl Cost {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Cost::Infinite)
    }

    /// Path concatenation: infinite absorbs, finite overflow saturates.
    pub fn saturating_add(self, other: Cost) -> Cost {
        match (self, other) {
            (Cost::Finite(a), Cost::Finite(b)) => Cost::Finite(a.saturating_add(b)),
            _ => Cost::Infinite,
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite(c) => write!(f, "{}", c),
            Cost::Infinite => write!(f, "infinity"),
        }
    }
}

impl FromStr for Cost {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "infinity" {
            Ok(Cost::Infinite)
        } else {
            Ok(Cost::Finite(s.parse()?))
        }
    }
}

/// Current best route to one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub next_hop: RouterId,
    pub cost: Cost,
}

/// Best route per destination, one entry for every node of the universe
/// including the origin router itself.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    origin: RouterId,
    entries: BTreeMap<RouterId, RouteEntry>,
}

impl RoutingTable {
    /// Build the initial table: self = (self, 0), each configured neighbor
    /// at its link cost, every other node unreachable.
    pub fn new(origin: RouterId, universe: &[RouterId], links: &[(RouterId, u32)]) -> Self {
        let mut entries: BTreeMap<RouterId, RouteEntry> = universe
            .iter()
            .map(|node| {
                (
                    node.clone(),
                    RouteEntry {
                        next_hop: node.clone(),
                        cost: Cost::Infinite,
                    },
                )
            })
            .collect();

        for (neighbor, cost) in links {
            entries.insert(
                neighbor.clone(),
                RouteEntry {
                    next_hop: neighbor.clone(),
                    cost: Cost::Finite(*cost),
                },
            );
        }

        entries.insert(
            origin.clone(),
            RouteEntry {
                next_hop: origin.clone(),
                cost: Cost::Finite(0),
            },
        );

        Self { origin, entries }
    }

    pub fn origin(&self) -> &RouterId {
        &self.origin
    }

    pub fn get(&self, dest: &RouterId) -> Option<&RouteEntry> {
        self.entries.get(dest)
    }

    /// Cost to a destination, `Infinite` for nodes outside the universe.
    pub fn cost(&self, dest: &RouterId) -> Cost {
        self.entries
            .get(dest)
            .map(|entry| entry.cost)
            .unwrap_or(Cost::Infinite)
    }

    pub fn set(&mut self, dest: RouterId, next_hop: RouterId, cost: Cost) {
        self.entries.insert(dest, RouteEntry { next_hop, cost });
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouterId, &RouteEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
