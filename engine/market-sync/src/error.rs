//! Error types for cross-replica synchronization

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Round;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// A failed collective. Every replica waiting on the round receives the same error.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncError {
    #[error("round mismatch: open round is {expected}, replica {replica} sent {got}")]
    RoundMismatch { replica: u32, expected: Round, got: Round },

    #[error("length mismatch in {round}: expected {expected} values, replica {replica} sent {got}")]
    LengthMismatch { replica: u32, round: Round, expected: usize, got: usize },

    #[error("replica {replica} contributed twice to {round}")]
    DuplicateContribution { replica: u32, round: Round },

    #[error("unknown replica {replica} (cluster has {replicas})")]
    UnknownReplica { replica: u32, replicas: u32 },

    #[error("cluster size mismatch: expected {expected}, got {got}")]
    ClusterSize { expected: u32, got: u32 },

    #[error("transport error: {0}")]
    Transport(String),
}

impl SyncError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<bincode::Error> for SyncError {
    fn from(e: bincode::Error) -> Self {
        Self::Transport(format!("frame decode: {e}"))
    }
}
