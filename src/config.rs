use std::collections::BTreeMap;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::RouterId;

/// Directly connected links for the local router, from the plain-text
/// topology file: one `name,cost` line per neighbor.
#[derive(Debug, Clone, Default)]
pub struct TopologyConfig {
    pub links: Vec<(RouterId, u32)>,
}

impl TopologyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading topology file {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut links = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, cost) = line
                .split_once(',')
                .with_context(|| format!("topology line {:?} has no comma", line))?;
            let name = name.trim();
            if name.is_empty() {
                bail!("topology line {:?} has an empty neighbor name", line);
            }
            let cost: u32 = cost
                .trim()
                .parse()
                .with_context(|| format!("bad link cost in topology line {:?}", line))?;
            links.push((name.to_string(), cost));
        }
        Ok(Self { links })
    }
}

/// Shared network-wide configuration, identical across every router
/// process: the node universe with its loopback addresses, the designated
/// flood root, and the receive timeout that doubles as the scheduling
/// heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub addresses: BTreeMap<RouterId, Ipv4Addr>,
    pub flood_root: RouterId,
    pub recv_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let addresses = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), Ipv4Addr::new(127, 0, 0, i as u8 + 1)))
            .collect();
        Self {
            addresses,
            flood_root: "A".to_string(),
            recv_timeout_secs: 10,
        }
    }
}

impl NetworkConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading network config {}", path.display()))?;
        let config: NetworkConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing network config {}", path.display()))?;
        Ok(config)
    }

    pub fn address_of(&self, id: &RouterId) -> Option<Ipv4Addr> {
        self.addresses.get(id).copied()
    }

    /// Every node id of the static universe, in stable order.
    pub fn universe(&self) -> Vec<RouterId> {
        self.addresses.keys().cloned().collect()
    }
}
