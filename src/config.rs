//! Route file loading
//!
//! A route file is TOML. Everything is optional so an empty file still runs
//! a relay on `localhost:8000` reading snapshots from stdin.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::RelayError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;

/// Feed path that means "read snapshots from standard input".
pub const STDIN_FEED: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub name: Option<String>,

    /// One entry per tracked segment.
    pub levels: Vec<String>,

    /// Snapshot feed, relative to the route file. `None` or `-` is stdin.
    pub feed: Option<PathBuf>,

    /// Pause between ticks when replaying a recorded feed.
    pub tick_interval_ms: u64,

    pub server: ServerConfig,
}

impl RouteConfig {
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let text = std::fs::read_to_string(path).map_err(|source| RelayError::RouteRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut route: RouteConfig =
            toml::from_str(&text).map_err(|source| RelayError::RouteParse {
                path: path.to_path_buf(),
                source,
            })?;

        if let (Some(feed), Some(dir)) = (&route.feed, path.parent()) {
            if feed.as_os_str() != STDIN_FEED && feed.is_relative() {
                route.feed = Some(dir.join(feed));
            }
        }
        Ok(route)
    }

    pub fn segment_count(&self) -> usize {
        self.levels.len().max(1)
    }

    /// The feed file to read, or `None` for stdin.
    pub fn feed_path(&self) -> Option<&Path> {
        self.feed
            .as_deref()
            .filter(|p| p.as_os_str() != STDIN_FEED)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed route")
    }
}
