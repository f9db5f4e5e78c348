//! Error types and their exit semantics
//!
//! [`ConnectionError`]s end one peer session and are logged inside the server.
//! Everything that reaches `main` is fatal and maps to an exit code through
//! [`ErrorCategory`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Categorized fatal errors, for picking the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Operator pressed Ctrl-C
    Interrupt,

    /// Missing or malformed command line
    Usage,

    /// Unreadable route file, feed or listen address
    Config,
}

impl ErrorCategory {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCategory::Interrupt => 130,
            ErrorCategory::Usage => 2,
            ErrorCategory::Config => 1,
        }
    }
}

/// Why a single peer session ended abnormally.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to read from timer socket: {0}")]
    Receive(#[source] axum::Error),

    #[error("failed to write to timer socket: {0}")]
    Send(#[source] axum::Error),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Please make sure to specify your route file as a command line argument!")]
    MissingRoute,

    #[error("failed to read route file {path}")]
    RouteRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid route file {path}")]
    RouteParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to listen on {host}:{port}")]
    Bind {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("interrupted by operator")]
    Interrupted,
}

impl RelayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::MissingRoute => ErrorCategory::Usage,
            RelayError::Interrupted => ErrorCategory::Interrupt,
            RelayError::RouteRead { .. }
            | RelayError::RouteParse { .. }
            | RelayError::Bind { .. } => ErrorCategory::Config,
        }
    }
}

/// Categorize an error bubbled up through `anyhow`
pub fn categorize_error(error: &anyhow::Error) -> ErrorCategory {
    if let Some(relay) = error.downcast_ref::<RelayError>() {
        relay.category()
    } else {
        ErrorCategory::Config
    }
}
