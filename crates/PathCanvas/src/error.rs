//! # Errors
//!
//! Store mutations fail with contract errors (`DuplicateId`, `NotFound`,
//! `InvalidEndpoint`). The interaction layer treats them as defensive
//! assertions: they are logged, never propagated to the user.

use std::fmt;
use thiserror::Error;

/// Which kind of graph entity an error or sync request refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Path,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => write!(f, "node"),
            EntityKind::Path => write!(f, "path"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("{kind} id already exists: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("path {path} references missing node {node}")]
    InvalidEndpoint { path: String, node: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to sync {kind} {id}: {message}")]
    Network {
        kind: EntityKind,
        id: String,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EditorError>;
