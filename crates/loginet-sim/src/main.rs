//! Loginet network runner
//!
//! Loads a network description from a JSON or TOML file, wires it, runs it
//! for a number of ticks and reports per-node statistics.

use anyhow::{Context, Result, bail};
use clap::Parser;
use loginet_core::data_loader::{load_network_json, load_network_toml};
use loginet_core::network::Network;
use loginet_core::node::NodeKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "loginet-sim")]
#[command(about = "Run a production and logistics network", long_about = None)]
struct Args {
    /// Network description (`.json` or `.toml`)
    network: PathBuf,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "100")]
    ticks: u64,

    /// Log filter, e.g. `info` or `loginet_core=debug` (RUST_LOG overrides)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log a progress line every N ticks (0 disables)
    #[arg(long, default_value = "0")]
    report_every: u64,
}

fn load(path: &Path) -> Result<Network> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let network = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_network_json(&source),
        Some("toml") => load_network_toml(&source),
        other => bail!(
            "unsupported network file extension {:?} (expected .json or .toml)",
            other.unwrap_or("")
        ),
    }
    .with_context(|| format!("loading {}", path.display()))?;
    Ok(network)
}

fn run(network: &mut Network, ticks: u64, report_every: u64) -> Result<()> {
    let mut produced = 0u64;
    let mut shipped = 0u64;
    for _ in 0..ticks {
        let result = network.tick()?;
        produced += result.produced;
        shipped += result.shipped;
        if report_every > 0 && result.tick % report_every == 0 {
            info!(
                tick = result.tick,
                produced,
                shipped,
                hash = %format!("{:016x}", network.state_hash()),
                "progress"
            );
        }
    }
    info!(ticks, produced, shipped, "simulation finished");
    Ok(())
}

fn report(network: &Network) {
    let registry = network.registry();
    println!("tick {}", network.sim_state.tick);
    for snapshot in network.snapshot_all() {
        let Some(node) = network.node(snapshot.id) else {
            continue;
        };
        let tallies: Vec<String> = snapshot
            .storage
            .iter()
            .map(|(good, qty)| format!("{}={}", registry.name(*good), qty))
            .collect();
        match snapshot.kind {
            NodeKind::CustomerPoint => println!(
                "  {}: received {}, in transit {}",
                node.display(registry),
                snapshot.stored_total(),
                snapshot.in_transit,
            ),
            _ => println!(
                "  {}: produced {}, backlog {}, stock [{}]",
                node.display(registry),
                snapshot.total_produced,
                snapshot.output_backlog,
                tallies.join(", "),
            ),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let mut network = load(&args.network)?;
    info!(
        file = %args.network.display(),
        nodes = network.node_count(),
        goods = network.registry().len(),
        "network loaded"
    );
    debug!(order = ?network.tick_order(), "tick order");

    run(&mut network, args.ticks, args.report_every)?;
    report(&network);
    Ok(())
}
