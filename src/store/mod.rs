//! Document Store
//!
//! Durable storage for the story-tree documents of a fabula database.
//! The command layer issues only the primitives below; no multi-document
//! transactional atomicity is assumed beyond per-document compare-and-set.

pub mod persistence;

pub use persistence::SledDocumentStore;

use crate::documents::{BotResponse, Project, Story, StoryGroup};
use crate::error::StorageError;
use crate::types::{NodeId, ProjectId};

/// Where to splice an id into an ordered child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPosition {
    /// Index 0 ("newest first").
    First,
    /// End of the list.
    Last,
    /// A specific index; clamped to the list length.
    At(usize),
}

/// Document store interface.
///
/// Implementations must serialize concurrent writers per document
/// (compare-and-set or equivalent) and enforce the `(project, group name)`
/// uniqueness constraint at insert and rename, reporting collisions as
/// [`StorageError::DuplicateKey`].
pub trait DocumentStore: Send + Sync {
    // Projects

    fn insert_project(&self, project: &Project) -> Result<(), StorageError>;
    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StorageError>;
    fn list_projects(&self) -> Result<Vec<Project>, StorageError>;

    /// Atomically splice a group id into the project's top-level order.
    fn push_project_group(
        &self,
        id: &ProjectId,
        group: &NodeId,
        position: OrderPosition,
    ) -> Result<(), StorageError>;

    /// Atomically remove a group id from the project's top-level order.
    /// Removing an absent id is a no-op.
    fn pull_project_group(&self, id: &ProjectId, group: &NodeId) -> Result<(), StorageError>;

    // Story groups

    /// Insert a group, claiming its `(project, name)` slot.
    fn insert_group(&self, group: &StoryGroup) -> Result<(), StorageError>;
    fn get_group(&self, id: &NodeId) -> Result<Option<StoryGroup>, StorageError>;
    fn list_groups(&self, project: &ProjectId) -> Result<Vec<StoryGroup>, StorageError>;

    /// Rename a group, re-claiming the `(project, name)` slot.
    fn rename_group(&self, id: &NodeId, name: &str) -> Result<(), StorageError>;

    /// Atomically splice a child id into a group's order.
    fn push_group_child(
        &self,
        id: &NodeId,
        child: &NodeId,
        position: OrderPosition,
    ) -> Result<(), StorageError>;

    /// Atomically remove a child id from a group's order.
    /// Removing an absent id is a no-op.
    fn pull_group_child(&self, id: &NodeId, child: &NodeId) -> Result<(), StorageError>;

    /// Bulk delete groups, releasing their name slots. Returns the number
    /// of documents actually removed; absent ids are skipped.
    fn delete_groups(&self, ids: &[NodeId]) -> Result<usize, StorageError>;

    // Stories

    fn insert_story(&self, story: &Story) -> Result<(), StorageError>;
    fn get_story(&self, id: &NodeId) -> Result<Option<Story>, StorageError>;
    fn list_stories(&self, project: &ProjectId) -> Result<Vec<Story>, StorageError>;
    fn list_stories_in_group(&self, group: &NodeId) -> Result<Vec<Story>, StorageError>;

    /// Atomic whole-document replace for an existing story.
    fn put_story(&self, story: &Story) -> Result<(), StorageError>;

    /// Bulk delete stories. Returns the number actually removed; absent
    /// ids are skipped, so a retried cascade is a no-op.
    fn delete_stories(&self, ids: &[NodeId]) -> Result<usize, StorageError>;

    // Bot responses

    fn upsert_response(&self, response: &BotResponse) -> Result<(), StorageError>;
    fn get_response(
        &self,
        project: &ProjectId,
        key: &str,
    ) -> Result<Option<BotResponse>, StorageError>;
    fn list_responses(&self, project: &ProjectId) -> Result<Vec<BotResponse>, StorageError>;

    /// Delete the responses for the given keys. Absent keys are skipped.
    fn delete_responses(&self, project: &ProjectId, keys: &[String]) -> Result<usize, StorageError>;

    /// Flush pending writes to durable storage.
    fn flush(&self) -> Result<(), StorageError>;
}
