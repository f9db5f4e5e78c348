//! Relay bootstrap: serve the timer endpoint, wait for a client, then drive
//! the diff engine from the snapshot feed until it runs dry.

use std::time::Duration;

use anyhow::Result;
use colored::*;
use tokio::io::AsyncBufRead;
use tracing::info;

use crate::client::TimerClient;
use crate::config::RouteConfig;
use crate::engine::SplitEngine;
use crate::feed::SnapshotFeed;
use crate::server::{self, TimerConnection};

/// Summary of one relay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: usize,
    pub skipped: usize,
}

pub async fn run(route: RouteConfig) -> Result<RunStats> {
    // A bad feed path fails before the operator connects a timer
    match route.feed_path() {
        Some(path) => {
            let feed = SnapshotFeed::open(path).await?;
            serve(&route, feed).await
        }
        None => serve(&route, SnapshotFeed::stdin()).await,
    }
}

async fn serve<R: AsyncBufRead + Unpin>(
    route: &RouteConfig,
    feed: SnapshotFeed<R>,
) -> Result<RunStats> {
    let connection = server::start(&route.server.host, route.server.port).await?;

    println!(
        "{} Route: {} ({} segment{})",
        "→".bright_blue(),
        route.display_name().bright_yellow(),
        route.segment_count(),
        if route.segment_count() == 1 { "" } else { "s" }
    );
    println!("{} Waiting for timer client...", "→".bright_blue());
    connection.wait_connected().await?;

    let stats = drive(&connection, route, feed).await;
    connection.shutdown().await;
    let stats = stats?;
    info!(
        "snapshot feed finished after {} ticks ({} skipped)",
        stats.ticks, stats.skipped
    );
    Ok(stats)
}

/// Feed every snapshot to a fresh engine bound to `connection`.
pub async fn drive<R: AsyncBufRead + Unpin>(
    connection: &TimerConnection,
    route: &RouteConfig,
    mut feed: SnapshotFeed<R>,
) -> Result<RunStats> {
    let client = TimerClient::new(connection.clone(), route.server.debug);
    let mut engine = SplitEngine::new(client);
    let pacing = Duration::from_millis(route.tick_interval_ms);
    let mut ticks = 0;

    while let Some(snapshot) = feed.next_snapshot().await? {
        engine.observe(&snapshot);
        ticks += 1;
        if !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    }

    Ok(RunStats {
        ticks,
        skipped: feed.skipped(),
    })
}
