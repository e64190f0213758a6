use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::RouterId;
use crate::config::{NetworkConfig, TopologyConfig};
use crate::protocol::wire::{format_flood, parse_flood_updates};
use crate::protocol::{Advertisement, BUFFER_SIZE, Phase, RouterCore, RoutingTable};
use crate::transport::Transport;

/// Pause before the root starts the flood, so slower peers can pass their
/// own convergence check first.
const FLOOD_SETTLE_DELAY: Duration = Duration::from_secs(5);

enum Event {
    Datagram(usize, SocketAddr),
    Timeout,
    RecvError(anyhow::Error),
    Interrupt,
}

/// One router process: protocol core plus the UDP transport loop that
/// drives it. Single-threaded; processing order is strictly datagram
/// arrival order.
pub struct Router {
    core: RouterCore,
    transport: Transport,
    net: NetworkConfig,
    port: u16,
}

impl Router {
    pub async fn bind(
        name: RouterId,
        topology: TopologyConfig,
        net: NetworkConfig,
        port: u16,
    ) -> Result<Self> {
        let host = net
            .address_of(&name)
            .with_context(|| format!("router {:?} is not in the configured universe", name))?;

        info!("configuration set for router {} at {}:{}", name, host, port);
        for (neighbor, cost) in &topology.links {
            let addr = net
                .address_of(neighbor)
                .with_context(|| format!("neighbor {:?} is not in the configured universe", neighbor))?;
            info!("neighbor {} at {}:{} has link cost {}", neighbor, addr, port, cost);
        }

        let transport = Transport::bind(
            SocketAddr::from((host, port)),
            Duration::from_secs(net.recv_timeout_secs),
        )
        .await?;

        let core = RouterCore::new(name, &net.universe(), topology.links.clone());

        Ok(Self {
            core,
            transport,
            net,
            port,
        })
    }

    /// Snapshot of the current routing table.
    pub fn table(&self) -> &RoutingTable {
        self.core.table()
    }

    pub fn has_converged(&self) -> bool {
        self.core.has_converged()
    }

    pub fn phase(&self) -> Phase {
        self.core.phase()
    }

    /// Run until shutdown: advertise the initial table, then serve the
    /// receive loop. The receive timeout is the only heartbeat and is what
    /// drives convergence re-checks.
    pub async fn run(&mut self) -> Result<()> {
        self.broadcast_table().await;
        self.core.start_advertising();

        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut interrupt = Box::pin(tokio::signal::ctrl_c());

        while self.core.phase() != Phase::Shutdown {
            let event = tokio::select! {
                received = self.transport.recv_timeout(&mut buf) => {
                    match received {
                        Ok(Some((len, from))) => Event::Datagram(len, from),
                        Ok(None) => Event::Timeout,
                        Err(e) => Event::RecvError(e),
                    }
                }
                _ = &mut interrupt => Event::Interrupt,
            };

            self.handle_event(event, &buf).await;
        }

        info!("closing connection");
        Ok(())
    }

    async fn handle_event(&mut self, event: Event, buf: &[u8]) {
        match event {
            Event::Datagram(len, from) => {
                let text = String::from_utf8_lossy(&buf[..len]).into_owned();
                self.on_datagram(&text, from).await;
            }
            Event::Timeout => self.on_timeout().await,
            // Same posture as a failed send: the datagram is lost, the
            // loop is not.
            Event::RecvError(e) => warn!("receive failed: {:#}", e),
            Event::Interrupt => {
                info!("interrupt received, shutting down");
                self.core.shutdown();
            }
        }
    }

    /// Before convergence every datagram is a distance-vector
    /// advertisement; afterwards, a flood message.
    async fn on_datagram(&mut self, text: &str, from: SocketAddr) {
        match self.core.phase() {
            Phase::Initializing | Phase::Advertising => {
                debug!("received update from {}", from);
                match Advertisement::decode(text) {
                    Ok(adv) => {
                        if self.core.apply_advertisement(adv) {
                            self.broadcast_table().await;
                        } else {
                            debug!("no updates were made to the routing table");
                        }
                    }
                    Err(e) => warn!("dropping malformed advertisement from {}: {:#}", from, e),
                }
            }
            Phase::Converged | Phase::Flooding => self.on_flood(text, from).await,
            Phase::Shutdown => {}
        }
    }

    /// Timeout heartbeat: re-check convergence while still advertising.
    async fn on_timeout(&mut self) {
        if self.core.phase() != Phase::Advertising || !self.core.is_converged() {
            return;
        }

        self.core.mark_converged();
        info!("convergence reached");
        self.log_table();

        if self.core.name() == &self.net.flood_root {
            tokio::time::sleep(FLOOD_SETTLE_DELAY).await;
            let counter = self.core.initiate_flood();
            self.flood(counter).await;
        }
    }

    async fn on_flood(&mut self, text: &str, from: SocketAddr) {
        match parse_flood_updates(text) {
            Ok(received) => {
                info!("flood message from {} with counter {}", from, received);
                if let Some(outgoing) = self.core.relay_flood(received) {
                    self.flood(outgoing).await;
                }
            }
            Err(e) => warn!("dropping malformed flood message from {}: {:#}", from, e),
        }
    }

    /// Triggered update: the full local table to every configured neighbor.
    /// A failed send drops that neighbor's copy for this round only.
    async fn broadcast_table(&self) {
        let text = self.core.advertisement().encode();
        for (neighbor, addr) in self.neighbor_addrs() {
            if let Err(e) = self.transport.send_to(text.as_bytes(), addr).await {
                warn!("advertisement to {} failed: {:#}", neighbor, e);
            }
        }
    }

    async fn flood(&self, updates: u32) {
        let local = match self.transport.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!("cannot stamp flood message: {:#}", e);
                return;
            }
        };
        let text = format_flood(self.core.name(), local, updates);
        for (neighbor, addr) in self.neighbor_addrs() {
            if let Err(e) = self.transport.send_to(text.as_bytes(), addr).await {
                warn!("flood to {} failed: {:#}", neighbor, e);
            }
        }
    }

    fn neighbor_addrs(&self) -> Vec<(RouterId, SocketAddr)> {
        self.core
            .neighbors()
            .filter_map(|neighbor| {
                match self.net.address_of(neighbor) {
                    Some(host) => Some((neighbor.clone(), SocketAddr::from((host, self.port)))),
                    None => {
                        warn!("neighbor {} has no configured address", neighbor);
                        None
                    }
                }
            })
            .collect()
    }

    fn log_table(&self) {
        info!("----- current routing table -----");
        for (dest, entry) in self.core.table().iter() {
            info!(
                "destination {} via {} cost {}",
                dest, entry.next_hop, entry.cost
            );
        }
    }
}
