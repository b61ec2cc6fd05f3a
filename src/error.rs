//! Error types for configuration and the session driver.
//!
//! Overlay no-ops (duplicate votes, votes after close) are not errors; they
//! surface as outcome enums in `overlay`.

use thiserror::Error;

/// Rejected tuning values in [`crate::ChatConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("scroll threshold must be a finite, non-negative pixel distance")]
    InvalidScrollThreshold,
    #[error("base interval ({base_ms}ms) must not be below the minimum interval ({min_ms}ms)")]
    BaseBelowMinimum { base_ms: u64, min_ms: u64 },
}

/// Failure talking to a running chat session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("chat session has stopped")]
    Closed,
    #[error("chat session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
