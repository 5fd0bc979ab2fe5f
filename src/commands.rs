//! Mutation Protocol
//!
//! Single entry point for every tree mutation: insert, rename, update,
//! link, delete, move. Each command re-validates against current store
//! state before writing (deletability is never cached), emits a change
//! event on success, and returns a definite success/failure signal.

use crate::bus::{ChangeBus, ChangeKind};
use crate::documents::{Checkpoint, Node, Project, Story, StoryGroup};
use crate::error::{CommandError, StorageError};
use crate::gc::ResponseGarbageCollector;
use crate::store::{DocumentStore, OrderPosition};
use crate::tree::{GroupParent, TreeReader};
use crate::types::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a completed deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub stories_removed: usize,
    pub groups_removed: usize,
}

/// Command service: owns the mutation protocol over one document store.
pub struct CommandService {
    store: Arc<dyn DocumentStore>,
    gc: Arc<dyn ResponseGarbageCollector>,
    bus: ChangeBus,
}

/// Map a storage-level uniqueness collision to the caller-facing error.
fn map_name_collision(e: StorageError) -> CommandError {
    match e {
        StorageError::DuplicateKey(_) => CommandError::DuplicateName,
        other => CommandError::Storage(other),
    }
}

impl CommandService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        gc: Arc<dyn ResponseGarbageCollector>,
        bus: ChangeBus,
    ) -> Self {
        Self { store, gc, bus }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn reader<'a>(&'a self, project_id: &ProjectId) -> TreeReader<'a> {
        TreeReader::new(self.store.as_ref(), project_id.clone())
    }

    fn require_project(&self, id: &ProjectId) -> Result<Project, CommandError> {
        self.store
            .get_project(id)?
            .ok_or_else(|| CommandError::ProjectNotFound(id.clone()))
    }

    fn require_story(&self, id: &NodeId) -> Result<Story, CommandError> {
        self.store
            .get_story(id)?
            .ok_or_else(|| CommandError::NotFound(id.clone()))
    }

    /// Create an empty project.
    pub fn create_project(&self, name: &str) -> Result<ProjectId, CommandError> {
        let project = Project::new(name);
        self.store.insert_project(&project)?;
        info!(project = %project.id, name, "project created");
        self.bus
            .emit(project.id.clone(), ChangeKind::ProjectCreated, vec![]);
        Ok(project.id)
    }

    /// Insert a story group at the top of the project's order.
    ///
    /// Fails with `DuplicateName` when a sibling group with the same name
    /// already exists in the project.
    pub fn insert_group(&self, project_id: &ProjectId, name: &str) -> Result<NodeId, CommandError> {
        self.require_project(project_id)?;
        let group = StoryGroup::new(project_id.clone(), name);
        self.store.insert_group(&group).map_err(map_name_collision)?;
        self.store
            .push_project_group(project_id, &group.id, OrderPosition::First)?;
        info!(project = %project_id, group = %group.id, name, "group inserted");
        self.bus.emit(
            project_id.clone(),
            ChangeKind::GroupInserted,
            vec![group.id.clone()],
        );
        Ok(group.id)
    }

    /// Insert a story at the end of a group's child order. Titles are not
    /// required to be unique.
    pub fn insert_story(
        &self,
        project_id: &ProjectId,
        group_id: &NodeId,
        title: &str,
        body: &str,
    ) -> Result<NodeId, CommandError> {
        let group = self
            .store
            .get_group(group_id)?
            .filter(|g| &g.project_id == project_id)
            .ok_or_else(|| CommandError::NotFound(group_id.clone()))?;
        let story = Story::new(project_id.clone(), group.id.clone(), title, body);
        self.store.insert_story(&story)?;
        self.store
            .push_group_child(group_id, &story.id, OrderPosition::Last)?;
        info!(project = %project_id, story = %story.id, title, "story inserted");
        self.bus.emit(
            project_id.clone(),
            ChangeKind::StoryInserted,
            vec![story.id.clone()],
        );
        Ok(story.id)
    }

    /// Rename a group or story. A trimmed-empty new name is a silently
    /// accepted no-op. Group renames re-validate sibling uniqueness.
    pub fn rename_node(&self, id: &NodeId, new_name: &str) -> Result<(), CommandError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            debug!(node = %id, "empty rename ignored");
            return Ok(());
        }
        let node = self.resolve(id)?;
        match &node {
            Node::Group(group) => {
                self.store
                    .rename_group(&group.id, trimmed)
                    .map_err(map_name_collision)?;
            }
            Node::Story(story) => {
                let mut updated = story.clone();
                updated.title = trimmed.to_string();
                self.store.put_story(&updated)?;
            }
        }
        info!(node = %id, name = trimmed, "node renamed");
        self.bus.emit(
            node.project_id().clone(),
            ChangeKind::NodeRenamed,
            vec![id.clone()],
        );
        Ok(())
    }

    /// Replace a story's dialogue body and response-key set.
    pub fn update_story(
        &self,
        id: &NodeId,
        body: &str,
        events: Vec<String>,
    ) -> Result<(), CommandError> {
        let mut story = self.require_story(id)?;
        story.body = body.to_string();
        story.events = events;
        self.store.put_story(&story)?;
        self.bus.emit(
            story.project_id.clone(),
            ChangeKind::StoryUpdated,
            vec![id.clone()],
        );
        Ok(())
    }

    /// Append a checkpoint from `origin` to `destination`. Rejects
    /// self-loops and destinations outside the origin's project. Adding an
    /// existing link is a no-op.
    pub fn add_checkpoint(
        &self,
        origin: &NodeId,
        destination: &NodeId,
    ) -> Result<(), CommandError> {
        if origin == destination {
            return Err(CommandError::InvalidLink(
                "a story cannot link to itself".to_string(),
            ));
        }
        let mut origin_story = self.require_story(origin)?;
        let destination_story = self.require_story(destination)?;
        if origin_story.project_id != destination_story.project_id {
            return Err(CommandError::InvalidLink(
                "stories belong to different projects".to_string(),
            ));
        }
        if origin_story.links_to(destination) {
            return Ok(());
        }
        origin_story.checkpoints.push(Checkpoint {
            destination: destination.clone(),
        });
        self.store.put_story(&origin_story)?;
        info!(origin = %origin, destination = %destination, "checkpoint added");
        self.bus.emit(
            origin_story.project_id,
            ChangeKind::LinkAdded,
            vec![origin.clone(), destination.clone()],
        );
        Ok(())
    }

    /// Remove every checkpoint from `origin` naming `destination`.
    /// Removing an absent link is a no-op.
    pub fn remove_checkpoint(
        &self,
        origin: &NodeId,
        destination: &NodeId,
    ) -> Result<(), CommandError> {
        let mut origin_story = self.require_story(origin)?;
        let before = origin_story.checkpoints.len();
        origin_story
            .checkpoints
            .retain(|c| &c.destination != destination);
        if origin_story.checkpoints.len() == before {
            return Ok(());
        }
        self.store.put_story(&origin_story)?;
        info!(origin = %origin, destination = %destination, "checkpoint removed");
        self.bus.emit(
            origin_story.project_id,
            ChangeKind::LinkRemoved,
            vec![origin.clone(), destination.clone()],
        );
        Ok(())
    }

    /// Delete a group or story.
    ///
    /// Deletability is computed against current state before any write: a
    /// node participating in the link relation (for a group, via any
    /// descendant story) is refused with `LinkedNodeError`. A successful
    /// group delete cascades to all descendants and hands the candidate
    /// event-id set to the response garbage collector. Deletion is
    /// terminal; a repeat call reports `NotFound`.
    pub fn delete_node(&self, id: &NodeId) -> Result<DeleteOutcome, CommandError> {
        let node = self.resolve(id)?;
        let project_id = node.project_id().clone();
        let reader = self.reader(&project_id);

        if let Some(reason) = reader.linked_reason(&node)? {
            debug!(node = %id, ?reason, "deletion refused");
            return Err(CommandError::LinkedNode {
                id: id.clone(),
                title: node.title().to_string(),
                reason,
            });
        }

        let outcome = match &node {
            Node::Story(story) => {
                // Pull first so a partial failure leaves a retryable tree.
                self.pull_story_from_group(story)?;
                let stories_removed = self.store.delete_stories(&[story.id.clone()])?;
                self.gc.collect(&story.events, &project_id)?;
                DeleteOutcome {
                    stories_removed,
                    groups_removed: 0,
                }
            }
            Node::Group(group) => {
                let parent = reader.find_group_parent(&group.id)?;
                let stories = reader.descendant_stories(&group.id)?;
                let sub_groups = reader.descendant_groups(&group.id)?;

                match parent {
                    GroupParent::Project => {
                        self.store.pull_project_group(&project_id, &group.id)?;
                    }
                    GroupParent::Group(parent_id) => {
                        self.store.pull_group_child(&parent_id, &group.id)?;
                    }
                }

                let story_ids: Vec<NodeId> = stories.iter().map(|s| s.id.clone()).collect();
                let stories_removed = self.store.delete_stories(&story_ids)?;

                let mut group_ids: Vec<NodeId> =
                    sub_groups.iter().map(|g| g.id.clone()).collect();
                group_ids.push(group.id.clone());
                let groups_removed = self.store.delete_groups(&group_ids)?;

                let mut seen = HashSet::new();
                let events: Vec<String> = stories
                    .iter()
                    .flat_map(|s| s.events.iter().cloned())
                    .filter(|e| seen.insert(e.clone()))
                    .collect();
                self.gc.collect(&events, &project_id)?;

                DeleteOutcome {
                    stories_removed,
                    groups_removed,
                }
            }
        };

        info!(
            node = %id,
            stories = outcome.stories_removed,
            groups = outcome.groups_removed,
            "node deleted"
        );
        self.bus
            .emit(project_id, ChangeKind::NodeDeleted, vec![id.clone()]);
        Ok(outcome)
    }

    /// Move a node to a new parent and index.
    ///
    /// `new_parent` is a group id, or `None` for the project's top level
    /// (groups only). Fails with `InvalidMove` when the target parent is
    /// not a group, belongs to another project, or lies inside the moved
    /// group's own subtree.
    pub fn move_node(
        &self,
        id: &NodeId,
        new_parent: Option<&NodeId>,
        new_index: usize,
    ) -> Result<(), CommandError> {
        let node = self.resolve(id)?;
        let project_id = node.project_id().clone();
        let reader = self.reader(&project_id);

        let parent_group = match new_parent {
            Some(parent_id) => Some(self.require_parent_group(parent_id, &project_id)?),
            None => None,
        };

        match (&node, &parent_group) {
            (Node::Story(_), None) => {
                return Err(CommandError::InvalidMove(
                    "a story cannot be placed at the project root".to_string(),
                ));
            }
            (Node::Story(story), Some(target)) => {
                self.pull_story_from_group(story)?;
                self.store
                    .push_group_child(&target.id, id, OrderPosition::At(new_index))?;
                let mut updated = story.clone();
                updated.story_group_id = target.id.clone();
                self.store.put_story(&updated)?;
            }
            (Node::Group(group), target) => {
                if let Some(target) = target {
                    if target.id == group.id {
                        return Err(CommandError::InvalidMove(
                            "cannot move a group into itself".to_string(),
                        ));
                    }
                    if reader.is_descendant_of(&target.id, &group.id)? {
                        return Err(CommandError::InvalidMove(
                            "target parent is inside the moved group".to_string(),
                        ));
                    }
                }
                match reader.find_group_parent(&group.id)? {
                    GroupParent::Project => {
                        self.store.pull_project_group(&project_id, &group.id)?;
                    }
                    GroupParent::Group(old_parent) => {
                        self.store.pull_group_child(&old_parent, &group.id)?;
                    }
                }
                match target {
                    Some(target) => {
                        self.store.push_group_child(
                            &target.id,
                            id,
                            OrderPosition::At(new_index),
                        )?;
                    }
                    None => {
                        self.store.push_project_group(
                            &project_id,
                            id,
                            OrderPosition::At(new_index),
                        )?;
                    }
                }
            }
        }

        info!(node = %id, index = new_index, "node moved");
        self.bus
            .emit(project_id, ChangeKind::NodeMoved, vec![id.clone()]);
        Ok(())
    }

    fn resolve(&self, id: &NodeId) -> Result<Node, CommandError> {
        if let Some(group) = self.store.get_group(id)? {
            return Ok(Node::Group(group));
        }
        if let Some(story) = self.store.get_story(id)? {
            return Ok(Node::Story(story));
        }
        Err(CommandError::NotFound(id.clone()))
    }

    /// Resolve a move target: must exist, be a group, and live in the
    /// same project as the moved node.
    fn require_parent_group(
        &self,
        parent_id: &NodeId,
        project_id: &ProjectId,
    ) -> Result<StoryGroup, CommandError> {
        match self.store.get_group(parent_id)? {
            Some(group) if &group.project_id == project_id => Ok(group),
            Some(_) => Err(CommandError::InvalidMove(
                "nodes belong to different projects".to_string(),
            )),
            None => {
                if self.store.get_story(parent_id)?.is_some() {
                    Err(CommandError::InvalidMove(
                        "target parent is not a story group".to_string(),
                    ))
                } else {
                    Err(CommandError::NotFound(parent_id.clone()))
                }
            }
        }
    }

    /// Remove a story from its parent's order. A missing parent document
    /// (already cascaded away) is tolerated so retried deletes stay
    /// idempotent.
    fn pull_story_from_group(&self, story: &Story) -> Result<(), CommandError> {
        match self
            .store
            .pull_group_child(&story.story_group_id, &story.id)
        {
            Ok(()) => Ok(()),
            Err(StorageError::DocumentNotFound(_)) => {
                debug!(story = %story.id, "parent group already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
