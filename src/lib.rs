//! # split-relay
//!
//! Drives a remote split timer (LiveSplit One style WebSocket client) from a
//! stream of run snapshots.
//!
//! - **Connection**: one WebSocket client at a time, last handshake wins,
//!   fire-and-forget text commands
//! - **Diff engine**: edge-triggered translation of snapshots into `start`,
//!   `split` and game-time commands
//! - **Feed**: newline-delimited JSON snapshots from a file or stdin
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use split_relay::{Snapshot, SplitEngine, TimerClient, TimerConnection};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connection = TimerConnection::listen("localhost", 8000).await?;
//!     connection.wait_connected().await?;
//!
//!     let mut engine = SplitEngine::new(TimerClient::new(connection.clone(), false));
//!     engine.observe(&Snapshot {
//!         started: true,
//!         timer_active: true,
//!         elapsed_file_time: 0,
//!         previous_splits: vec![0],
//!     });
//!
//!     connection.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod logging;
pub mod protocol;
pub mod relay;
pub mod server;

// Re-export main types for library consumers
pub use client::TimerClient;
pub use config::{RouteConfig, ServerConfig};
pub use engine::{CommandSink, EngineState, Snapshot, SplitEngine};
pub use error::{ConnectionError, ErrorCategory, RelayError};
pub use protocol::TimerCommand;
pub use server::{PeerInfo, TimerConnection};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
