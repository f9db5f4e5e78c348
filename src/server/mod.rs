pub mod connection;

use colored::*;

use crate::error::RelayError;

pub use connection::{PeerInfo, TimerConnection};

/// Start the timer endpoint and announce where clients should connect.
pub async fn start(host: &str, port: u16) -> Result<TimerConnection, RelayError> {
    let connection = TimerConnection::listen(host, port).await?;
    let port = connection.local_addr().map_or(port, |addr| addr.port());
    println!(
        "{} running at {}",
        "✓".green(),
        format!("ws://{}:{}", host, port).bright_blue()
    );
    Ok(connection)
}
