//! Response garbage collection
//!
//! After a story or group deletion the tree core hands the candidate
//! event-id set to this collaborator, which removes every bot response no
//! longer referenced by any remaining story. The collector owns the
//! still-referenced decision; the tree core only supplies candidates.

use crate::error::StorageError;
use crate::store::DocumentStore;
use crate::types::ProjectId;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// External collaborator invoked after deletions.
pub trait ResponseGarbageCollector: Send + Sync {
    /// Delete responses among `candidates` that no remaining story in the
    /// project references. Returns the number removed. Must be idempotent:
    /// a second invocation with the same set removes nothing.
    fn collect(&self, candidates: &[String], project_id: &ProjectId)
        -> Result<usize, StorageError>;
}

/// Store-backed collector.
pub struct StoreResponseGc {
    store: Arc<dyn DocumentStore>,
}

impl StoreResponseGc {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

impl ResponseGarbageCollector for StoreResponseGc {
    fn collect(
        &self,
        candidates: &[String],
        project_id: &ProjectId,
    ) -> Result<usize, StorageError> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut referenced: HashSet<&str> = HashSet::new();
        let stories = self.store.list_stories(project_id)?;
        for story in &stories {
            for event in &story.events {
                referenced.insert(event.as_str());
            }
        }

        let orphans: Vec<String> = candidates
            .iter()
            .filter(|key| !referenced.contains(key.as_str()))
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        if orphans.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete_responses(project_id, &orphans)?;
        debug!(project = %project_id, removed, "garbage-collected orphaned responses");
        Ok(removed)
    }
}
