//! Tree Store query surface
//!
//! Read-only structural queries over the containment forest and link graph
//! of one project. State comes from the persistence collaborator on every
//! call; nothing is cached, so deletability checks always see current
//! links (a concurrent edit can at worst cause a stricter-than-necessary
//! refusal, never a silently orphaned link).

use crate::documents::{Node, Story, StoryGroup};
use crate::error::{CommandError, LinkedNodeReason, StorageError};
use crate::store::DocumentStore;
use crate::types::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Parent of a group in the containment forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupParent {
    /// Top-level group, ordered in the project document.
    Project,
    /// Nested under another group.
    Group(NodeId),
}

/// Query surface over one project's tree.
pub struct TreeReader<'a> {
    store: &'a dyn DocumentStore,
    project_id: ProjectId,
}

impl<'a> TreeReader<'a> {
    pub fn new(store: &'a dyn DocumentStore, project_id: ProjectId) -> Self {
        TreeReader { store, project_id }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Resolve a node by id: group first, then story.
    pub fn get_node(&self, id: &NodeId) -> Result<Node, CommandError> {
        if let Some(group) = self.store.get_group(id)? {
            return Ok(Node::Group(group));
        }
        if let Some(story) = self.store.get_story(id)? {
            return Ok(Node::Story(story));
        }
        Err(CommandError::NotFound(id.clone()))
    }

    /// Direct children of a group, in stored order. Ids in the order that
    /// no longer resolve (a concurrent delete) are skipped.
    pub fn children(&self, group_id: &NodeId) -> Result<Vec<Node>, CommandError> {
        let group = self
            .store
            .get_group(group_id)?
            .ok_or_else(|| CommandError::NotFound(group_id.clone()))?;
        let mut nodes = Vec::with_capacity(group.children.len());
        for child in &group.children {
            match self.get_node(child) {
                Ok(node) => nodes.push(node),
                Err(CommandError::NotFound(_)) => {
                    tracing::debug!(child = %child, group = %group_id, "skipping stale child id");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(nodes)
    }

    /// Top-level groups of the project, in stored order.
    pub fn top_level_groups(&self) -> Result<Vec<StoryGroup>, CommandError> {
        let project = self
            .store
            .get_project(&self.project_id)?
            .ok_or_else(|| CommandError::ProjectNotFound(self.project_id.clone()))?;
        let mut groups = Vec::with_capacity(project.story_groups.len());
        for id in &project.story_groups {
            match self.store.get_group(id)? {
                Some(group) => groups.push(group),
                None => {
                    tracing::debug!(group = %id, "skipping stale top-level group id");
                }
            }
        }
        Ok(groups)
    }

    /// All stories under a group, recursing through nested sub-groups.
    pub fn descendant_stories(&self, group_id: &NodeId) -> Result<Vec<Story>, CommandError> {
        let group = self
            .store
            .get_group(group_id)?
            .ok_or_else(|| CommandError::NotFound(group_id.clone()))?;
        let mut stories = Vec::new();
        self.collect_descendant_stories(&group, &mut stories)?;
        Ok(stories)
    }

    fn collect_descendant_stories(
        &self,
        group: &StoryGroup,
        out: &mut Vec<Story>,
    ) -> Result<(), CommandError> {
        for child in &group.children {
            if let Some(story) = self.store.get_story(child)? {
                out.push(story);
            } else if let Some(sub) = self.store.get_group(child)? {
                self.collect_descendant_stories(&sub, out)?;
            }
        }
        Ok(())
    }

    /// All sub-groups under a group (the group itself excluded), recursive.
    pub fn descendant_groups(&self, group_id: &NodeId) -> Result<Vec<StoryGroup>, CommandError> {
        let group = self
            .store
            .get_group(group_id)?
            .ok_or_else(|| CommandError::NotFound(group_id.clone()))?;
        let mut groups = Vec::new();
        self.collect_descendant_groups(&group, &mut groups)?;
        Ok(groups)
    }

    fn collect_descendant_groups(
        &self,
        group: &StoryGroup,
        out: &mut Vec<StoryGroup>,
    ) -> Result<(), CommandError> {
        for child in &group.children {
            if let Some(sub) = self.store.get_group(child)? {
                self.collect_descendant_groups(&sub, out)?;
                out.push(sub);
            }
        }
        Ok(())
    }

    /// True iff the story's checkpoint list is non-empty.
    pub fn is_link_origin(&self, story_id: &NodeId) -> Result<bool, CommandError> {
        let story = self
            .store
            .get_story(story_id)?
            .ok_or_else(|| CommandError::NotFound(story_id.clone()))?;
        Ok(story.is_link_origin())
    }

    /// True iff any story in the project has a checkpoint naming this id.
    ///
    /// Recomputed scan over the project's stories; no reverse index is
    /// maintained.
    pub fn is_link_destination(&self, story_id: &NodeId) -> Result<bool, CommandError> {
        let stories = self.store.list_stories(&self.project_id)?;
        Ok(stories.iter().any(|s| s.links_to(story_id)))
    }

    /// Disjunction of the two link queries for a story; for a group, true
    /// iff any descendant story (recursive) satisfies it.
    pub fn is_link_origin_or_destination(&self, node: &Node) -> Result<bool, CommandError> {
        Ok(self.linked_reason(node)?.is_some())
    }

    /// The reason a node participates in the link relation, if any.
    /// Origins are reported before destinations.
    pub fn linked_reason(&self, node: &Node) -> Result<Option<LinkedNodeReason>, CommandError> {
        match node {
            Node::Story(story) => {
                if story.is_link_origin() {
                    return Ok(Some(LinkedNodeReason::StoryIsOrigin));
                }
                if self.is_link_destination(&story.id)? {
                    return Ok(Some(LinkedNodeReason::StoryIsDestination));
                }
                Ok(None)
            }
            Node::Group(group) => {
                let descendants = self.descendant_stories(&group.id)?;
                if descendants.iter().any(|s| s.is_link_origin()) {
                    return Ok(Some(LinkedNodeReason::GroupContainsOrigin));
                }
                let descendant_ids: HashSet<&NodeId> =
                    descendants.iter().map(|s| &s.id).collect();
                let all = self.store.list_stories(&self.project_id)?;
                let contains_destination = all.iter().any(|s| {
                    s.checkpoints
                        .iter()
                        .any(|c| descendant_ids.contains(&c.destination))
                });
                if contains_destination {
                    return Ok(Some(LinkedNodeReason::GroupContainsDestination));
                }
                Ok(None)
            }
        }
    }

    /// Locate a group's parent: the project order or a containing group.
    pub fn find_group_parent(&self, group_id: &NodeId) -> Result<GroupParent, CommandError> {
        let project = self
            .store
            .get_project(&self.project_id)?
            .ok_or_else(|| CommandError::ProjectNotFound(self.project_id.clone()))?;
        if project.story_groups.contains(group_id) {
            return Ok(GroupParent::Project);
        }
        for group in self.store.list_groups(&self.project_id)? {
            if group.children.contains(group_id) {
                return Ok(GroupParent::Group(group.id));
            }
        }
        // Not referenced by any order; treat as top-level so a pull is a
        // harmless no-op and a retried delete stays idempotent.
        Ok(GroupParent::Project)
    }

    /// True iff `candidate` lies in the subtree rooted at `ancestor`
    /// (the root itself excluded).
    pub fn is_descendant_of(
        &self,
        candidate: &NodeId,
        ancestor: &NodeId,
    ) -> Result<bool, CommandError> {
        let groups = self.descendant_groups(ancestor)?;
        if groups.iter().any(|g| &g.id == candidate) {
            return Ok(true);
        }
        let stories = self.descendant_stories(ancestor)?;
        Ok(stories.iter().any(|s| &s.id == candidate))
    }
}

/// Kind discriminator for tree projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Story,
}

/// One node in a read-only tree projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNodeView {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    /// Outgoing checkpoint destinations (stories only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkpoints: Vec<NodeId>,
    /// Child nodes in display order (groups only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNodeView>,
}

/// Read-only projection of a project's full tree, refreshed by querying
/// after a command completes. Display layers hold this instead of live
/// store handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeView {
    pub project_id: ProjectId,
    pub project_name: String,
    pub groups: Vec<TreeNodeView>,
}

impl<'a> TreeReader<'a> {
    /// Build the full projection for this project.
    pub fn project_view(&self) -> Result<TreeView, CommandError> {
        let project = self
            .store
            .get_project(&self.project_id)?
            .ok_or_else(|| CommandError::ProjectNotFound(self.project_id.clone()))?;
        let mut groups = Vec::new();
        for group in self.top_level_groups()? {
            groups.push(self.group_view(&group)?);
        }
        Ok(TreeView {
            project_id: project.id,
            project_name: project.name,
            groups,
        })
    }

    fn group_view(&self, group: &StoryGroup) -> Result<TreeNodeView, CommandError> {
        let mut children = Vec::new();
        for child in self.children(&group.id)? {
            match child {
                Node::Group(sub) => children.push(self.group_view(&sub)?),
                Node::Story(story) => children.push(TreeNodeView {
                    id: story.id.clone(),
                    title: story.title.clone(),
                    kind: NodeKind::Story,
                    checkpoints: story
                        .checkpoints
                        .iter()
                        .map(|c| c.destination.clone())
                        .collect(),
                    children: Vec::new(),
                }),
            }
        }
        Ok(TreeNodeView {
            id: group.id.clone(),
            title: group.name.clone(),
            kind: NodeKind::Group,
            checkpoints: Vec::new(),
            children,
        })
    }
}

/// Convenience wrapper: resolve a node when only the store is at hand and
/// the project is not yet known.
pub fn resolve_node(store: &dyn DocumentStore, id: &NodeId) -> Result<Node, StorageError> {
    if let Some(group) = store.get_group(id)? {
        return Ok(Node::Group(group));
    }
    if let Some(story) = store.get_story(id)? {
        return Ok(Node::Story(story));
    }
    Err(StorageError::DocumentNotFound(id.to_string()))
}
