//! Integration tests for group insert and rename: ordering, sibling-name
//! uniqueness, and the empty-rename no-op.

use crate::integration::test_utils::harness;
use fabula::error::CommandError;
use fabula::types::ProjectId;

#[test]
fn test_insert_group_prepends_to_project_order() {
    let h = harness();
    let first = h.service.insert_group(&h.project_id, "first").unwrap();
    let second = h.service.insert_group(&h.project_id, "second").unwrap();
    let third = h.service.insert_group(&h.project_id, "third").unwrap();

    let project = h.store.get_project(&h.project_id).unwrap().unwrap();
    assert_eq!(project.story_groups, vec![third, second, first]);
}

#[test]
fn test_duplicate_group_name_is_rejected() {
    let h = harness();
    h.service.insert_group(&h.project_id, "Groupo").unwrap();
    let err = h.service.insert_group(&h.project_id, "Groupo").unwrap_err();
    assert!(matches!(err, CommandError::DuplicateName));
    assert_eq!(err.to_string(), "Group name already exists");

    // Only the first insert landed in the order.
    let project = h.store.get_project(&h.project_id).unwrap().unwrap();
    assert_eq!(project.story_groups.len(), 1);
}

#[test]
fn test_same_name_in_another_project_is_allowed() {
    let h = harness();
    h.service.insert_group(&h.project_id, "Groupo").unwrap();

    let other = h.service.create_project("Other Project").unwrap();
    h.service.insert_group(&other, "Groupo").unwrap();
}

#[test]
fn test_insert_group_into_unknown_project_fails() {
    let h = harness();
    let err = h
        .service
        .insert_group(&ProjectId::from("missing"), "Groupo")
        .unwrap_err();
    assert!(matches!(err, CommandError::ProjectNotFound(_)));
}

#[test]
fn test_rename_group() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "HALLO").unwrap();
    h.service.rename_node(&group, "BYE").unwrap();
    assert_eq!(h.store.get_group(&group).unwrap().unwrap().name, "BYE");

    // The old name is free for a new sibling.
    h.service.insert_group(&h.project_id, "HALLO").unwrap();
}

#[test]
fn test_rename_group_to_existing_sibling_name_fails() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "first").unwrap();
    h.service.insert_group(&h.project_id, "second").unwrap();

    let err = h.service.rename_node(&group, "second").unwrap_err();
    assert!(matches!(err, CommandError::DuplicateName));
    assert_eq!(h.store.get_group(&group).unwrap().unwrap().name, "first");
}

#[test]
fn test_empty_rename_is_a_noop() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "Keep me").unwrap();
    h.service.rename_node(&group, "").unwrap();
    h.service.rename_node(&group, "   ").unwrap();
    assert_eq!(h.store.get_group(&group).unwrap().unwrap().name, "Keep me");
}

#[test]
fn test_rename_trims_whitespace() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "old").unwrap();
    h.service.rename_node(&group, "  new  ").unwrap();
    assert_eq!(h.store.get_group(&group).unwrap().unwrap().name, "new");
}
