//! Persisted document types: the containment forest and its collaborators.
//!
//! A project owns an ordered list of top-level story groups. Groups contain
//! stories and, when nested, other groups. Stories carry the checkpoint
//! (link) graph as outgoing destination references.

use crate::types::{NodeId, ProjectId};
use serde::{Deserialize, Serialize};

/// Project document: scope for all tree operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Ordered top-level group ids, newest first.
    pub story_groups: Vec<NodeId>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            id: ProjectId::generate(),
            name: name.into(),
            story_groups: Vec::new(),
        }
    }
}

/// A container node: stories and/or sub-groups in display order.
///
/// Group names are unique among siblings within a project; the store
/// enforces this with a uniqueness constraint at insert and rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryGroup {
    pub id: NodeId,
    pub project_id: ProjectId,
    pub name: String,
    pub children: Vec<NodeId>,
}

impl StoryGroup {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        StoryGroup {
            id: NodeId::generate(),
            project_id,
            name: name.into(),
            children: Vec::new(),
        }
    }
}

/// A directed continuation link from one story to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Destination story id. Never the owning story itself.
    pub destination: NodeId,
}

/// A single dialogue flow; a leaf in the containment forest.
///
/// Titles are not required to be unique. A story with non-empty
/// `checkpoints` is a link origin; a story named by another story's
/// checkpoints is a link destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: NodeId,
    pub project_id: ProjectId,
    /// Parent group; stories are never root-level.
    pub story_group_id: NodeId,
    pub title: String,
    /// Dialogue source text. May be empty for a freshly created story.
    pub body: String,
    /// Response keys referenced by this story (all `utter_*`). Used to
    /// compute the orphan-candidate set when the story is deleted.
    pub events: Vec<String>,
    /// Outgoing links, in insertion order.
    pub checkpoints: Vec<Checkpoint>,
}

impl Story {
    pub fn new(
        project_id: ProjectId,
        story_group_id: NodeId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Story {
            id: NodeId::generate(),
            project_id,
            story_group_id,
            title: title.into(),
            body: body.into(),
            events: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    /// True iff this story has at least one outgoing checkpoint.
    pub fn is_link_origin(&self) -> bool {
        !self.checkpoints.is_empty()
    }

    /// True iff this story links to `destination`.
    pub fn links_to(&self, destination: &NodeId) -> bool {
        self.checkpoints.iter().any(|c| &c.destination == destination)
    }
}

/// Bot response template. Keys match `^utter_` and are unique per
/// `(project, key)`; the payload is opaque to the tree core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotResponse {
    pub id: NodeId,
    pub project_id: ProjectId,
    pub key: String,
    /// Serialized template payload; never interpreted here.
    pub values: String,
}

impl BotResponse {
    pub fn new(project_id: ProjectId, key: impl Into<String>, values: impl Into<String>) -> Self {
        BotResponse {
            id: NodeId::generate(),
            project_id,
            key: key.into(),
            values: values.into(),
        }
    }
}

/// A resolved tree node: group or story.
#[derive(Debug, Clone)]
pub enum Node {
    Group(StoryGroup),
    Story(Story),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Group(g) => &g.id,
            Node::Story(s) => &s.id,
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        match self {
            Node::Group(g) => &g.project_id,
            Node::Story(s) => &s.project_id,
        }
    }

    /// Display title: a group's name or a story's title.
    pub fn title(&self) -> &str {
        match self {
            Node::Group(g) => &g.name,
            Node::Story(s) => &s.title,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }
}
