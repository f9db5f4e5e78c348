use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use split_relay::error::{categorize_error, ErrorCategory};
use split_relay::{logging, relay, RelayError, RouteConfig};

#[derive(Parser)]
#[command(name = "split-relay")]
#[command(
    about = "Relay run snapshots to a remote split timer over WebSocket",
    version
)]
#[command(after_help = "Snapshot feed:
   One JSON object per line, e.g.
   {\"started\": true, \"timer_active\": true, \"elapsed_file_time\": 5000, \"previous_splits\": [1]}

Commands sent to the timer:
   start, split, reset, togglepause, undo, skip,
   initgametime, setgametime <seconds>, pausegametime, resumegametime")]
struct Cli {
    /// Route file (TOML) describing segments, feed and server settings
    route: Option<PathBuf>,

    /// Interface to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Also log game-time sync commands
    #[arg(short, long)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let category = categorize_error(&err);
        eprintln!("{} {:#}", "✗".red(), err);
        std::process::exit(category.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Usage errors must surface before any socket is opened
    let route_path = cli.route.ok_or(RelayError::MissingRoute)?;
    let mut route = RouteConfig::load(&route_path)?;

    if let Some(host) = cli.host {
        route.server.host = host;
    }
    if let Some(port) = cli.port {
        route.server.port = port;
    }
    route.server.debug |= cli.debug;
    if cli.log_file.is_some() {
        route.server.log_file = cli.log_file;
    }

    let _guard = logging::init(route.server.debug, route.server.log_file.as_deref())?;

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} {}", "✗".red(), RelayError::Interrupted);
            std::process::exit(ErrorCategory::Interrupt.exit_code());
        }
    });

    relay::run(route).await?;
    Ok(())
}
