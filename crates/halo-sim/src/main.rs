//! halo-sim — run a handful of relay nodes against an in-memory medium
//! and watch observations flood across it.

mod air;
mod display;
mod radio;

use std::time::Duration;

use clap::Parser;

use halo_protocol::{
    DisplaySink, NullDisplay, RelayConfig, RelayEvent, RelayHandle, RelayRuntime, Role,
    RuntimeChannels,
};

use air::Air;
use display::TermDisplay;
use radio::SimRadio;

#[derive(Parser)]
#[command(name = "halo-sim", about = "In-memory multi-node relay simulation")]
struct Cli {
    /// Number of simulated nodes.
    #[arg(long, default_value = "3")]
    nodes: usize,

    /// Listen window in ms.
    #[arg(long, default_value = "500")]
    listen_ms: u64,

    /// Broadcast window in ms.
    #[arg(long, default_value = "500")]
    broadcast_ms: u64,

    /// Total simulation time in seconds.
    #[arg(long, default_value = "10")]
    duration: u64,

    /// Index of one node that beacons distress instead of reports.
    #[arg(long)]
    distress: Option<usize>,

    /// Suppress per-observation display lines.
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.nodes >= 1, "need at least one node");
    if let Some(index) = cli.distress {
        anyhow::ensure!(index < cli.nodes, "--distress index out of range");
    }

    let air = Air::new();
    let mut handles: Vec<(String, RelayHandle)> = Vec::with_capacity(cli.nodes);

    for i in 0..cli.nodes {
        // Locally administered addresses, one per node.
        let address = [0x02, 0x00, 0x00, 0x00, 0x00, i as u8];
        let name = format!("node-{i:02}");

        let config = RelayConfig {
            node_name: name.clone(),
            listen_duration: Duration::from_millis(cli.listen_ms),
            broadcast_duration: Duration::from_millis(cli.broadcast_ms),
            distress: cli.distress == Some(i),
            ..RelayConfig::default()
        };

        let sink: Box<dyn DisplaySink> = if cli.quiet {
            Box::new(NullDisplay)
        } else {
            Box::new(TermDisplay::new(name.clone()))
        };

        let RuntimeChannels { handle, mut events } =
            RelayRuntime::spawn(SimRadio::new(address, air.clone()), sink, config);

        let event_node = name.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                report(&event_node, event);
            }
        });

        handles.push((name, handle));
    }

    eprintln!(
        "halo-sim v{}: {} nodes, {}ms listen / {}ms broadcast, running {}s",
        env!("CARGO_PKG_VERSION"),
        cli.nodes,
        cli.listen_ms,
        cli.broadcast_ms,
        cli.duration,
    );

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(cli.duration)) => {}
        _ = tokio::signal::ctrl_c() => eprintln!("\nCtrl+C received, shutting down..."),
    }

    for (name, handle) in &handles {
        let peers = handle.peer_count().await;
        eprintln!("{name}: {peers} peer(s) in the open window");
        handle.shutdown().await;
    }

    Ok(())
}

fn report(node: &str, event: RelayEvent) {
    match event {
        RelayEvent::RoleChanged { role } => {
            let role = match role {
                Role::Listening => "listening",
                Role::Broadcasting => "broadcasting",
            };
            tracing::info!(node, role, "role changed");
        }
        RelayEvent::PeerObserved { address, rssi_dbm } => {
            tracing::debug!(node, %address, rssi_dbm, "peer observed");
        }
        RelayEvent::FloodReceived {
            originator,
            name,
            relayed,
        } => {
            tracing::info!(node, originator, name = %name, relayed, "flood received");
        }
        RelayEvent::DistressReceived { originator } => {
            tracing::warn!(node, originator, "distress received");
        }
        RelayEvent::DuplicateDropped { originator } => {
            tracing::debug!(node, originator, "duplicate dropped");
        }
        RelayEvent::BroadcastStarted { power, payload_len } => {
            tracing::info!(node, ?power, payload_len, "broadcast started");
        }
        RelayEvent::Error { description } => {
            tracing::warn!(node, %description, "runtime error");
        }
    }
}
