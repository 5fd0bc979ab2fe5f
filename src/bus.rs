//! In-process change notification for completed mutations.
//!
//! The command service emits one event per successful command; consumers
//! re-query the store after a notification. The core never pushes tree
//! contents.

use crate::types::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Kind of tree mutation that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    ProjectCreated,
    GroupInserted,
    StoryInserted,
    NodeRenamed,
    StoryUpdated,
    LinkAdded,
    LinkRemoved,
    NodeDeleted,
    NodeMoved,
}

/// Envelope describing one successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub project_id: ProjectId,
    pub kind: ChangeKind,
    /// Nodes the command touched (deleted descendants included).
    pub nodes: Vec<NodeId>,
}

#[derive(Clone)]
pub struct ChangeBus {
    sender: Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new_pair() -> (Self, Receiver<ChangeEvent>) {
        let (sender, receiver) = channel();
        (Self { sender }, receiver)
    }

    /// Emit a change event. Emission is best-effort: a dropped receiver
    /// means nobody is subscribed, which is not an error for the mutation
    /// that already committed.
    pub fn emit(&self, project_id: ProjectId, kind: ChangeKind, nodes: Vec<NodeId>) {
        let event = ChangeEvent {
            project_id,
            kind,
            nodes,
        };
        if self.sender.send(event).is_err() {
            tracing::trace!("change event dropped: no subscriber");
        }
    }
}
