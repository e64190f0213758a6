use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::runtime::Builder;

use dv_router::config::{NetworkConfig, TopologyConfig};
use dv_router::router::Router;

#[derive(Parser)]
#[command(name = "dv-router")]
struct Cli {
    /// Path to the topology file: one `neighbor,cost` line per link
    topology: PathBuf,

    /// UDP port shared by every router in the network
    port: u16,

    /// This router's node id (e.g. A)
    name: String,

    /// Optional JSON network config (address map, flood root, timeout);
    /// defaults to the six-node loopback universe
    #[arg(long)]
    network: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // One router is one single-threaded event loop; parallelism lives
    // between processes, not inside one.
    let rt = Builder::new_current_thread().enable_all().build()?;

    rt.block_on(async {
        let net = match &cli.network {
            Some(path) => NetworkConfig::load(path)?,
            None => NetworkConfig::default(),
        };
        let topology = TopologyConfig::load(&cli.topology)?;

        let mut router = Router::bind(cli.name, topology, net, cli.port).await?;
        router.run().await
    })
}
