//! Error types for the story-tree store and mutation protocol.

use crate::types::{NodeId, ProjectId};
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Serialization failure: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Wrap a backend failure with context.
    pub(crate) fn backend(context: &str, err: impl std::fmt::Display) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{}: {}", context, err),
        ))
    }
}

/// Which side of the link relation blocks a deletion.
///
/// Groups participate through their descendant stories; stories participate
/// directly. The caller-facing message only distinguishes group from story,
/// but the variant records the precise cause for logs and callers that want
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedNodeReason {
    /// A descendant story has outgoing checkpoints.
    GroupContainsOrigin,
    /// A descendant story is the destination of another story's checkpoint.
    GroupContainsDestination,
    /// The story has outgoing checkpoints.
    StoryIsOrigin,
    /// The story is the destination of another story's checkpoint.
    StoryIsDestination,
}

impl LinkedNodeReason {
    /// Message surfaced to end users for a refused deletion.
    pub fn message(&self, title: &str) -> String {
        match self {
            LinkedNodeReason::GroupContainsOrigin | LinkedNodeReason::GroupContainsDestination => {
                format!(
                    "The story group {} cannot be deleted as it contains links.",
                    title
                )
            }
            LinkedNodeReason::StoryIsOrigin | LinkedNodeReason::StoryIsDestination => {
                format!(
                    "The story {} cannot be deleted as it is linked to another story.",
                    title
                )
            }
        }
    }
}

/// Mutation-protocol errors surfaced to callers of the command service.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Group name already exists")]
    DuplicateName,

    #[error("{}", reason.message(title))]
    LinkedNode {
        id: NodeId,
        title: String,
        reason: LinkedNodeReason,
    },

    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}
