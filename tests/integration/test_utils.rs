//! Shared test utilities for integration tests
//!
//! Builds a full command stack (sled store in a temp dir, store-backed
//! garbage collector, change bus) around a fresh project.

use fabula::bus::{ChangeBus, ChangeEvent};
use fabula::commands::CommandService;
use fabula::gc::StoreResponseGc;
use fabula::store::{DocumentStore, SledDocumentStore};
use fabula::types::{NodeId, ProjectId};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestHarness {
    pub service: CommandService,
    pub store: Arc<dyn DocumentStore>,
    pub project_id: ProjectId,
    pub events: Receiver<ChangeEvent>,
    _dir: TempDir,
}

/// Fresh store + command service + one empty project.
pub fn harness() -> TestHarness {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::open(dir.path()).unwrap());
    let gc = Arc::new(StoreResponseGc::new(store.clone()));
    let (bus, events) = ChangeBus::new_pair();
    let service = CommandService::new(store.clone(), gc, bus);
    let project_id = service.create_project("My Project").unwrap();
    TestHarness {
        service,
        store,
        project_id,
        events,
        _dir: dir,
    }
}

impl TestHarness {
    /// Group + one story inside it; returns (group, story).
    pub fn group_with_story(&self, group_name: &str, story_title: &str) -> (NodeId, NodeId) {
        let group = self
            .service
            .insert_group(&self.project_id, group_name)
            .unwrap();
        let story = self
            .service
            .insert_story(&self.project_id, &group, story_title, "")
            .unwrap();
        (group, story)
    }
}
