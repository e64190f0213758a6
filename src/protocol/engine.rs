use std::collections::BTreeMap;

use log::{debug, info};

use crate::RouterId;
use crate::protocol::FLOOD_BOUND;
use crate::protocol::neighbors::NeighborTables;
use crate::protocol::table::{Cost, RoutingTable};
use crate::protocol::wire::Advertisement;

/// Router lifecycle. The transport loop drives the transitions; `Shutdown`
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Advertising,
    Converged,
    Flooding,
    Shutdown,
}

/// Per-router protocol state: routing table, neighbor cache, and lifecycle.
/// Owns no sockets, so it can be driven directly from tests or from the
/// transport loop.
pub struct RouterCore {
    name: RouterId,
    links: BTreeMap<RouterId, u32>,
    table: RoutingTable,
    cache: NeighborTables,
    phase: Phase,
}

impl RouterCore {
    pub fn new(name: RouterId, universe: &[RouterId], links: Vec<(RouterId, u32)>) -> Self {
        let table = RoutingTable::new(name.clone(), universe, &links);
        Self {
            name,
            links: links.into_iter().collect(),
            table,
            cache: NeighborTables::new(),
            phase: Phase::Initializing,
        }
    }

    pub fn name(&self) -> &RouterId {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Snapshot of the current routing table.
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn has_converged(&self) -> bool {
        matches!(self.phase, Phase::Converged | Phase::Flooding)
    }

    pub fn neighbors(&self) -> impl Iterator<Item = &RouterId> {
        self.links.keys()
    }

    /// Entered when the initial table has been advertised.
    pub fn start_advertising(&mut self) {
        debug!("{}: phase -> Advertising", self.name);
        self.phase = Phase::Advertising;
    }

    pub fn mark_converged(&mut self) {
        debug!("{}: phase -> Converged", self.name);
        self.phase = Phase::Converged;
    }

    pub fn shutdown(&mut self) {
        debug!("{}: phase -> Shutdown", self.name);
        self.phase = Phase::Shutdown;
    }

    /// Full-table advertisement of the current local view.
    pub fn advertisement(&self) -> Advertisement {
        Advertisement {
            sender: self.name.clone(),
            distances: self
                .table
                .iter()
                .map(|(dest, entry)| (dest.clone(), entry.cost))
                .collect(),
        }
    }

    /// Cache a received advertisement and run one relaxation pass.
    /// Returns true when the routing table changed, in which case the
    /// caller must re-advertise (triggered update).
    pub fn apply_advertisement(&mut self, adv: Advertisement) -> bool {
        self.cache.insert(adv.sender, adv.distances);
        self.relax()
    }

    /// One Bellman-Ford pass over every cached neighbor vector. Event-driven:
    /// network-wide convergence emerges from repeated triggered updates, not
    /// from iterating to a fixpoint here. Deliberately no split-horizon or
    /// poison-reverse.
    fn relax(&mut self) -> bool {
        let mut changed = false;

        for (neighbor, vector) in self.cache.iter() {
            // Local cost to the neighbor itself; an unreachable sender
            // contributes nothing this pass.
            let Cost::Finite(link) = self.table.cost(neighbor) else {
                continue;
            };

            for (dest, &advertised) in vector {
                if dest == &self.name {
                    continue;
                }

                let candidate = Cost::Finite(link).saturating_add(advertised);
                let current = self.table.cost(dest);
                if candidate < current {
                    debug!(
                        "{}: route to {} improved {} -> {} via {}",
                        self.name, dest, current, candidate, neighbor
                    );
                    self.table.set(dest.clone(), neighbor.clone(), candidate);
                    changed = true;
                }
            }
        }

        if changed {
            info!("{}: routing table updated", self.name);
        }

        changed
    }

    /// True when every destination's route agrees with its next hop's
    /// advertised view: the hop is a configured neighbor with a cached
    /// vector, the hop sees us at our local cost to it, and hop cost plus
    /// the hop's estimate equals our estimate. Checked on receive-timeout
    /// rather than per update, to avoid false positives under transient
    /// skew.
    pub fn is_converged(&self) -> bool {
        for (dest, entry) in self.table.iter() {
            if dest == &self.name {
                continue;
            }

            let hop = &entry.next_hop;
            if !self.links.contains_key(hop) {
                return false;
            }
            let Some(vector) = self.cache.get(hop) else {
                return false;
            };

            let local_to_hop = self.table.cost(hop);
            let hop_to_self = vector.get(&self.name).copied().unwrap_or(Cost::Infinite);
            if hop_to_self != local_to_hop {
                return false;
            }

            let hop_to_dest = vector.get(dest).copied().unwrap_or(Cost::Infinite);
            if local_to_hop.saturating_add(hop_to_dest) != entry.cost {
                return false;
            }
        }

        true
    }

    /// Root-side start of the post-convergence counting broadcast.
    /// Returns the counter to put on the wire.
    pub fn initiate_flood(&mut self) -> u32 {
        debug!("{}: phase -> Flooding (root)", self.name);
        self.phase = Phase::Flooding;
        0
    }

    /// Receiver side of the counting broadcast: returns `Some(counter)` to
    /// re-flood with, or `None` when the outgoing counter would exceed the
    /// bound, in which case the router has entered `Shutdown` and must send
    /// nothing.
    pub fn relay_flood(&mut self, received: u32) -> Option<u32> {
        // Compare before incrementing: the counter comes off the wire as an
        // arbitrary u32, and `received + 1` could wrap.
        if received >= FLOOD_BOUND {
            info!(
                "{}: flood counter {} has reached bound {}, shutting down",
                self.name, received, FLOOD_BOUND
            );
            self.phase = Phase::Shutdown;
            None
        } else {
            debug!("{}: phase -> Flooding", self.name);
            self.phase = Phase::Flooding;
            Some(received + 1)
        }
    }
}
