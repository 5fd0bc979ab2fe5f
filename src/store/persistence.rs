//! Persistence layer for the Document Store
//!
//! Sled-backed implementation. Documents are bincode values under
//! kind-prefixed keys; the sibling-name uniqueness constraint is a
//! separate index key claimed with `compare_and_swap`, so exactly one of
//! two concurrent inserts for the same `(project, name)` wins. Ordered
//! child lists are updated through compare-and-set retry loops, which is
//! the only per-document serialization the mutation protocol relies on.

use crate::documents::{BotResponse, Project, Story, StoryGroup};
use crate::error::StorageError;
use crate::store::{DocumentStore, OrderPosition};
use crate::types::{NodeId, ProjectId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

fn project_key(id: &ProjectId) -> Vec<u8> {
    format!("project/{}", id).into_bytes()
}

fn group_key(id: &NodeId) -> Vec<u8> {
    format!("group/{}", id).into_bytes()
}

fn story_key(id: &NodeId) -> Vec<u8> {
    format!("story/{}", id).into_bytes()
}

fn response_key(project: &ProjectId, key: &str) -> Vec<u8> {
    format!("response/{}/{}", project, key).into_bytes()
}

/// Uniqueness index for sibling group names. The value is the owning
/// group's id, so release on delete can verify ownership.
fn group_name_key(project: &ProjectId, name: &str) -> Vec<u8> {
    format!("group_name/{}/{}", project, name).into_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Splice `id` into `list` at `position`, clamping out-of-range indices.
fn splice(list: &mut Vec<NodeId>, id: &NodeId, position: OrderPosition) {
    let index = match position {
        OrderPosition::First => 0,
        OrderPosition::Last => list.len(),
        OrderPosition::At(i) => i.min(list.len()),
    };
    list.insert(index, id.clone());
}

/// Sled-based implementation of [`DocumentStore`].
pub struct SledDocumentStore {
    db: sled::Db,
}

impl SledDocumentStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| StorageError::backend("Failed to open store", e))?;
        Ok(Self { db })
    }

    fn get_doc<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StorageError> {
        match self
            .db
            .get(key)
            .map_err(|e| StorageError::backend("Failed to read document", e))?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_docs<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>, StorageError> {
        let mut docs = Vec::new();
        for item in self.db.scan_prefix(prefix) {
            let (_, value) =
                item.map_err(|e| StorageError::backend("Failed to iterate store", e))?;
            docs.push(decode(&value)?);
        }
        Ok(docs)
    }

    /// Compare-and-set read-modify-write on one document. Retries until
    /// the swap applies against an unchanged current value, so concurrent
    /// writers to the same document serialize without an in-process lock.
    fn update_doc<T, F>(&self, key: &[u8], id: &str, mutate: F) -> Result<T, StorageError>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&mut T),
    {
        loop {
            let current = self
                .db
                .get(key)
                .map_err(|e| StorageError::backend("Failed to read document", e))?
                .ok_or_else(|| StorageError::DocumentNotFound(id.to_string()))?;
            let mut doc: T = decode(&current)?;
            mutate(&mut doc);
            let next = encode(&doc)?;
            let swap = self
                .db
                .compare_and_swap(key, Some(current), Some(next))
                .map_err(|e| StorageError::backend("Failed to update document", e))?;
            if swap.is_ok() {
                return Ok(doc);
            }
            // Lost the race; re-read and retry against current state.
        }
    }

    /// Claim a `(project, name)` slot for `owner`: a single compare-and-set
    /// from vacant, so of two concurrent claimants exactly one wins. Fails
    /// with `DuplicateKey` when another group holds the slot.
    fn claim_name(
        &self,
        project: &ProjectId,
        name: &str,
        owner: &NodeId,
    ) -> Result<(), StorageError> {
        let key = group_name_key(project, name);
        let claim = self
            .db
            .compare_and_swap(
                key,
                None as Option<&[u8]>,
                Some(owner.as_str().as_bytes()),
            )
            .map_err(|e| StorageError::backend("Failed to claim name slot", e))?;
        match claim {
            Ok(()) => Ok(()),
            // A re-claim by the current owner is not a collision.
            Err(conflict) if conflict.current.as_deref() == Some(owner.as_str().as_bytes()) => {
                Ok(())
            }
            Err(_) => Err(StorageError::DuplicateKey(format!(
                "group name '{}' in project {}",
                name, project
            ))),
        }
    }

    /// Release a name slot if it is still held by `owner`.
    fn release_name(
        &self,
        project: &ProjectId,
        name: &str,
        owner: &NodeId,
    ) -> Result<(), StorageError> {
        let key = group_name_key(project, name);
        let _ = self
            .db
            .compare_and_swap(
                key,
                Some(owner.as_str().as_bytes()),
                None as Option<&[u8]>,
            )
            .map_err(|e| StorageError::backend("Failed to release name slot", e))?;
        Ok(())
    }
}

impl DocumentStore for SledDocumentStore {
    fn insert_project(&self, project: &Project) -> Result<(), StorageError> {
        self.db
            .insert(project_key(&project.id), encode(project)?)
            .map_err(|e| StorageError::backend("Failed to insert project", e))?;
        Ok(())
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StorageError> {
        self.get_doc(&project_key(id))
    }

    fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        self.scan_docs(b"project/")
    }

    fn push_project_group(
        &self,
        id: &ProjectId,
        group: &NodeId,
        position: OrderPosition,
    ) -> Result<(), StorageError> {
        self.update_doc::<Project, _>(&project_key(id), id.as_str(), |project| {
            splice(&mut project.story_groups, group, position);
        })?;
        Ok(())
    }

    fn pull_project_group(&self, id: &ProjectId, group: &NodeId) -> Result<(), StorageError> {
        self.update_doc::<Project, _>(&project_key(id), id.as_str(), |project| {
            project.story_groups.retain(|g| g != group);
        })?;
        Ok(())
    }

    fn insert_group(&self, group: &StoryGroup) -> Result<(), StorageError> {
        self.claim_name(&group.project_id, &group.name, &group.id)?;
        self.db
            .insert(group_key(&group.id), encode(group)?)
            .map_err(|e| StorageError::backend("Failed to insert group", e))?;
        Ok(())
    }

    fn get_group(&self, id: &NodeId) -> Result<Option<StoryGroup>, StorageError> {
        self.get_doc(&group_key(id))
    }

    fn list_groups(&self, project: &ProjectId) -> Result<Vec<StoryGroup>, StorageError> {
        let groups: Vec<StoryGroup> = self.scan_docs(b"group/")?;
        Ok(groups
            .into_iter()
            .filter(|g| &g.project_id == project)
            .collect())
    }

    fn rename_group(&self, id: &NodeId, name: &str) -> Result<(), StorageError> {
        let group = self
            .get_group(id)?
            .ok_or_else(|| StorageError::DocumentNotFound(id.to_string()))?;
        if group.name == name {
            return Ok(());
        }
        self.claim_name(&group.project_id, name, id)?;
        let owned = name.to_string();
        let updated = self.update_doc::<StoryGroup, _>(&group_key(id), id.as_str(), |g| {
            g.name = owned.clone();
        });
        if let Err(e) = updated {
            // The document vanished under us; give the claimed slot back.
            self.release_name(&group.project_id, name, id)?;
            return Err(e);
        }
        self.release_name(&group.project_id, &group.name, id)?;
        Ok(())
    }

    fn push_group_child(
        &self,
        id: &NodeId,
        child: &NodeId,
        position: OrderPosition,
    ) -> Result<(), StorageError> {
        self.update_doc::<StoryGroup, _>(&group_key(id), id.as_str(), |group| {
            splice(&mut group.children, child, position);
        })?;
        Ok(())
    }

    fn pull_group_child(&self, id: &NodeId, child: &NodeId) -> Result<(), StorageError> {
        self.update_doc::<StoryGroup, _>(&group_key(id), id.as_str(), |group| {
            group.children.retain(|c| c != child);
        })?;
        Ok(())
    }

    fn delete_groups(&self, ids: &[NodeId]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for id in ids {
            let Some(group) = self.get_group(id)? else {
                continue;
            };
            // Remove the document before releasing its name slot: a crash
            // in between leaves a stale slot (recovered on the next claim)
            // rather than a window where two groups share the name.
            let prior = self
                .db
                .remove(group_key(id))
                .map_err(|e| StorageError::backend("Failed to delete group", e))?;
            if prior.is_some() {
                removed += 1;
            }
            self.release_name(&group.project_id, &group.name, id)?;
        }
        Ok(removed)
    }

    fn insert_story(&self, story: &Story) -> Result<(), StorageError> {
        self.db
            .insert(story_key(&story.id), encode(story)?)
            .map_err(|e| StorageError::backend("Failed to insert story", e))?;
        Ok(())
    }

    fn get_story(&self, id: &NodeId) -> Result<Option<Story>, StorageError> {
        self.get_doc(&story_key(id))
    }

    fn list_stories(&self, project: &ProjectId) -> Result<Vec<Story>, StorageError> {
        let stories: Vec<Story> = self.scan_docs(b"story/")?;
        Ok(stories
            .into_iter()
            .filter(|s| &s.project_id == project)
            .collect())
    }

    fn list_stories_in_group(&self, group: &NodeId) -> Result<Vec<Story>, StorageError> {
        let stories: Vec<Story> = self.scan_docs(b"story/")?;
        Ok(stories
            .into_iter()
            .filter(|s| &s.story_group_id == group)
            .collect())
    }

    fn put_story(&self, story: &Story) -> Result<(), StorageError> {
        if self.get_story(&story.id)?.is_none() {
            return Err(StorageError::DocumentNotFound(story.id.to_string()));
        }
        self.db
            .insert(story_key(&story.id), encode(story)?)
            .map_err(|e| StorageError::backend("Failed to update story", e))?;
        Ok(())
    }

    fn delete_stories(&self, ids: &[NodeId]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for id in ids {
            let prior = self
                .db
                .remove(story_key(id))
                .map_err(|e| StorageError::backend("Failed to delete story", e))?;
            if prior.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn upsert_response(&self, response: &BotResponse) -> Result<(), StorageError> {
        self.db
            .insert(
                response_key(&response.project_id, &response.key),
                encode(response)?,
            )
            .map_err(|e| StorageError::backend("Failed to upsert response", e))?;
        Ok(())
    }

    fn get_response(
        &self,
        project: &ProjectId,
        key: &str,
    ) -> Result<Option<BotResponse>, StorageError> {
        self.get_doc(&response_key(project, key))
    }

    fn list_responses(&self, project: &ProjectId) -> Result<Vec<BotResponse>, StorageError> {
        self.scan_docs(format!("response/{}/", project).as_bytes())
    }

    fn delete_responses(&self, project: &ProjectId, keys: &[String]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in keys {
            let prior = self
                .db
                .remove(response_key(project, key))
                .map_err(|e| StorageError::backend("Failed to delete response", e))?;
            if prior.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| StorageError::backend("Failed to flush store", e))?;
        Ok(())
    }
}
