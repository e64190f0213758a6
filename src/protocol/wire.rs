use std::fmt::Write as _;
use std::net::SocketAddr;

use anyhow::{Context, Result, bail};

use crate::RouterId;
use crate::protocol::neighbors::DistanceVector;
use crate::protocol::table::Cost;

/// One full-table distance-vector advertisement.
///
/// Wire form: the sender id on the first line, then one `destination,cost`
/// line per known destination (self included, at cost 0). Costs are decimal
/// non-negative integers or the literal `infinity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub sender: RouterId,
    pub distances: DistanceVector,
}

impl Advertisement {
    pub fn encode(&self) -> String {
        let mut text = String::new();
        text.push_str(&self.sender);
        text.push('\n');
        for (dest, cost) in &self.distances {
            let _ = writeln!(text, "{},{}", dest, cost);
        }
        text
    }

    /// Parse an advertisement. All-or-nothing: any malformed line rejects
    /// the whole message so a neighbor-cache replacement is never partial.
    pub fn decode(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let sender = lines.next().context("empty advertisement")?.trim();
        if sender.is_empty() {
            bail!("advertisement has a blank sender line");
        }

        let mut distances = DistanceVector::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (dest, cost) = line
                .split_once(',')
                .with_context(|| format!("route line {:?} has no comma", line))?;
            let cost: Cost = cost
                .trim()
                .parse()
                .with_context(|| format!("bad cost in route line {:?}", line))?;
            distances.insert(dest.trim().to_string(), cost);
        }

        Ok(Self {
            sender: sender.to_string(),
            distances,
        })
    }
}

// The counting broadcast is free text by contract; only the fourth line,
// `Total number of updates: <n>`, is machine-read.
const FLOOD_COUNTER_LINE: usize = 3;
const FLOOD_COUNTER_PREFIX: &str = "Total number of updates:";

/// Render a flood message carrying `updates`, stamped with the sender's
/// identity and a payload-size trailer.
pub fn format_flood(sender: &RouterId, local_addr: SocketAddr, updates: u32) -> String {
    let body = format!(
        "Message from router {}, at {}, on port no. {}\n\
         Post-convergence reachability check\n\
         {}\n\
         {} {}",
        sender,
        local_addr.ip(),
        local_addr.port(),
        chrono::Local::now(),
        FLOOD_COUNTER_PREFIX,
        updates,
    );
    let size = body.len();
    format!("{}\npayload size: {} bytes", body, size)
}

/// Extract the update counter from a flood message.
pub fn parse_flood_updates(text: &str) -> Result<u32> {
    let line = text
        .lines()
        .nth(FLOOD_COUNTER_LINE)
        .context("flood message has fewer than four lines")?;
    let (_, count) = line
        .rsplit_once(':')
        .with_context(|| format!("flood counter line {:?} has no colon", line))?;
    count
        .trim()
        .parse()
        .with_context(|| format!("bad update counter in line {:?}", line))
}
