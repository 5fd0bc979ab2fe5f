//! Property: after any sequence of insert/rename/delete operations, at
//! most one active group per (project, name) exists, and the store's live
//! names match a simple set model.

use fabula::bus::ChangeBus;
use fabula::commands::CommandService;
use fabula::error::CommandError;
use fabula::gc::StoreResponseGc;
use fabula::store::{DocumentStore, SledDocumentStore};
use fabula::types::ProjectId;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Op {
    Insert(u8),
    DeleteByName(u8),
    Rename(u8, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..5).prop_map(Op::Insert),
        (0u8..5).prop_map(Op::DeleteByName),
        ((0u8..5), (0u8..5)).prop_map(|(from, to)| Op::Rename(from, to)),
    ]
}

fn name(index: u8) -> String {
    format!("group-{}", index)
}

fn build_service() -> (CommandService, Arc<dyn DocumentStore>, ProjectId, TempDir) {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::open(dir.path()).unwrap());
    let gc = Arc::new(StoreResponseGc::new(store.clone()));
    let (bus, _receiver) = ChangeBus::new_pair();
    let service = CommandService::new(store.clone(), gc, bus);
    let project_id = service.create_project("p").unwrap();
    (service, store, project_id, dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_at_most_one_group_per_name(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        let (service, store, project_id, _dir) = build_service();
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                Op::Insert(i) => {
                    let result = service.insert_group(&project_id, &name(i));
                    if model.contains(&name(i)) {
                        prop_assert!(matches!(result, Err(CommandError::DuplicateName)));
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(name(i));
                    }
                }
                Op::DeleteByName(i) => {
                    let target = store
                        .list_groups(&project_id)
                        .unwrap()
                        .into_iter()
                        .find(|g| g.name == name(i));
                    if let Some(group) = target {
                        service.delete_node(&group.id).unwrap();
                        model.remove(&name(i));
                    }
                }
                Op::Rename(from, to) => {
                    let target = store
                        .list_groups(&project_id)
                        .unwrap()
                        .into_iter()
                        .find(|g| g.name == name(from));
                    let Some(group) = target else { continue };
                    let result = service.rename_node(&group.id, &name(to));
                    if from == to {
                        prop_assert!(result.is_ok());
                    } else if model.contains(&name(to)) {
                        prop_assert!(matches!(result, Err(CommandError::DuplicateName)));
                    } else {
                        prop_assert!(result.is_ok());
                        model.remove(&name(from));
                        model.insert(name(to));
                    }
                }
            }

            // Invariant: live names match the model, each exactly once.
            let mut live: Vec<String> = store
                .list_groups(&project_id)
                .unwrap()
                .into_iter()
                .map(|g| g.name)
                .collect();
            live.sort();
            let mut expected: Vec<String> = model.iter().cloned().collect();
            expected.sort();
            prop_assert_eq!(live, expected);
        }
    }
}
