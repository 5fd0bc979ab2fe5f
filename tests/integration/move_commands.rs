//! Integration tests for node moves: reparenting, ordering, and cycle
//! refusal.

use crate::integration::test_utils::harness;
use fabula::error::CommandError;
use fabula::types::NodeId;

#[test]
fn test_move_story_between_groups() {
    let h = harness();
    let (source, story) = h.group_with_story("source", "wanderer");
    let target = h.service.insert_group(&h.project_id, "target").unwrap();
    let anchor = h
        .service
        .insert_story(&h.project_id, &target, "anchor", "")
        .unwrap();

    h.service.move_node(&story, Some(&target), 0).unwrap();

    let source_group = h.store.get_group(&source).unwrap().unwrap();
    assert!(source_group.children.is_empty());
    let target_group = h.store.get_group(&target).unwrap().unwrap();
    assert_eq!(target_group.children, vec![story.clone(), anchor]);
    let moved = h.store.get_story(&story).unwrap().unwrap();
    assert_eq!(moved.story_group_id, target);
}

#[test]
fn test_move_story_to_index_inside_order() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "g").unwrap();
    let a = h.service.insert_story(&h.project_id, &group, "a", "").unwrap();
    let b = h.service.insert_story(&h.project_id, &group, "b", "").unwrap();
    let c = h.service.insert_story(&h.project_id, &group, "c", "").unwrap();

    h.service.move_node(&c, Some(&group), 1).unwrap();

    let loaded = h.store.get_group(&group).unwrap().unwrap();
    assert_eq!(loaded.children, vec![a, c, b]);
}

#[test]
fn test_move_story_to_project_root_is_invalid() {
    let h = harness();
    let (_, story) = h.group_with_story("g", "s");
    let err = h.service.move_node(&story, None, 0).unwrap_err();
    assert!(matches!(err, CommandError::InvalidMove(_)));
}

#[test]
fn test_move_story_under_a_story_is_invalid() {
    let h = harness();
    let (_, story) = h.group_with_story("g", "s");
    let (_, other) = h.group_with_story("h", "t");
    let err = h.service.move_node(&story, Some(&other), 0).unwrap_err();
    assert!(matches!(err, CommandError::InvalidMove(_)));
}

#[test]
fn test_nest_group_and_move_back_to_root() {
    let h = harness();
    let outer = h.service.insert_group(&h.project_id, "outer").unwrap();
    let inner = h.service.insert_group(&h.project_id, "inner").unwrap();

    h.service.move_node(&inner, Some(&outer), 0).unwrap();
    let project = h.store.get_project(&h.project_id).unwrap().unwrap();
    assert_eq!(project.story_groups, vec![outer.clone()]);
    assert_eq!(
        h.store.get_group(&outer).unwrap().unwrap().children,
        vec![inner.clone()]
    );

    h.service.move_node(&inner, None, 1).unwrap();
    let project = h.store.get_project(&h.project_id).unwrap().unwrap();
    assert_eq!(project.story_groups, vec![outer.clone(), inner.clone()]);
    assert!(h.store.get_group(&outer).unwrap().unwrap().children.is_empty());
}

#[test]
fn test_move_group_into_its_own_subtree_is_invalid() {
    let h = harness();
    let outer = h.service.insert_group(&h.project_id, "outer").unwrap();
    let inner = h.service.insert_group(&h.project_id, "inner").unwrap();
    h.service.move_node(&inner, Some(&outer), 0).unwrap();

    let err = h.service.move_node(&outer, Some(&inner), 0).unwrap_err();
    assert!(matches!(err, CommandError::InvalidMove(_)));
    // Tree unchanged: inner still nested under outer.
    assert_eq!(
        h.store.get_group(&outer).unwrap().unwrap().children,
        vec![inner.clone()]
    );

    let err = h.service.move_node(&outer, Some(&outer), 0).unwrap_err();
    assert!(matches!(err, CommandError::InvalidMove(_)));
}

#[test]
fn test_move_across_projects_is_invalid() {
    let h = harness();
    let (_, story) = h.group_with_story("g", "s");
    let other = h.service.create_project("Other").unwrap();
    let foreign = h.service.insert_group(&other, "g").unwrap();

    let err = h.service.move_node(&story, Some(&foreign), 0).unwrap_err();
    assert!(matches!(err, CommandError::InvalidMove(_)));
}

#[test]
fn test_move_to_unknown_parent_reports_not_found() {
    let h = harness();
    let (_, story) = h.group_with_story("g", "s");
    let err = h
        .service
        .move_node(&story, Some(&NodeId::from("missing")), 0)
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}
