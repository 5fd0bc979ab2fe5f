//! Integration tests for deletion safety: link-integrity refusals, cascade
//! correctness, and idempotent re-deletion.

use crate::integration::test_utils::{harness, TestHarness};
use fabula::error::{CommandError, LinkedNodeReason};
use fabula::types::NodeId;

/// The console scenario: "Default stories" holds "Greetings" and
/// "Farewells"; "Groupo" holds "Groupo (1)" which links to "Greetings".
struct LinkedFixture {
    h: TestHarness,
    default_group: NodeId,
    groupo: NodeId,
    origin_story: NodeId,
    destination_story: NodeId,
}

fn linked_fixture() -> LinkedFixture {
    let h = harness();
    let default_group = h.service.insert_group(&h.project_id, "Default stories").unwrap();
    let destination_story = h
        .service
        .insert_story(&h.project_id, &default_group, "Greetings", "")
        .unwrap();
    h.service
        .insert_story(&h.project_id, &default_group, "Farewells", "")
        .unwrap();

    let groupo = h.service.insert_group(&h.project_id, "Groupo").unwrap();
    let origin_story = h
        .service
        .insert_story(&h.project_id, &groupo, "Groupo (1)", "")
        .unwrap();
    h.service
        .add_checkpoint(&origin_story, &destination_story)
        .unwrap();

    LinkedFixture {
        h,
        default_group,
        groupo,
        origin_story,
        destination_story,
    }
}

fn expect_linked(err: CommandError, expected: LinkedNodeReason) {
    match err {
        CommandError::LinkedNode { reason, .. } => assert_eq!(reason, expected),
        other => panic!("expected LinkedNode, got {:?}", other),
    }
}

#[test]
fn test_delete_refused_on_all_four_link_sides() {
    let f = linked_fixture();

    // Origin group.
    let err = f.h.service.delete_node(&f.groupo).unwrap_err();
    assert!(err.to_string().contains("contains links"));
    expect_linked(err, LinkedNodeReason::GroupContainsOrigin);

    // Origin story.
    let err = f.h.service.delete_node(&f.origin_story).unwrap_err();
    assert!(err.to_string().contains("linked to another story"));
    expect_linked(err, LinkedNodeReason::StoryIsOrigin);

    // Destination group.
    let err = f.h.service.delete_node(&f.default_group).unwrap_err();
    assert!(err.to_string().contains("contains links"));
    expect_linked(err, LinkedNodeReason::GroupContainsDestination);

    // Destination story.
    let err = f.h.service.delete_node(&f.destination_story).unwrap_err();
    assert!(err.to_string().contains("linked to another story"));
    expect_linked(err, LinkedNodeReason::StoryIsDestination);
}

#[test]
fn test_refused_delete_leaves_tree_unchanged() {
    let f = linked_fixture();
    f.h.service.delete_node(&f.groupo).unwrap_err();

    let project = f.h.store.get_project(&f.h.project_id).unwrap().unwrap();
    assert!(project.story_groups.contains(&f.groupo));
    assert!(f.h.store.get_group(&f.groupo).unwrap().is_some());
    assert!(f.h.store.get_story(&f.origin_story).unwrap().is_some());
}

#[test]
fn test_unlink_then_delete_succeeds() {
    let f = linked_fixture();
    f.h.service
        .remove_checkpoint(&f.origin_story, &f.destination_story)
        .unwrap();

    let outcome = f.h.service.delete_node(&f.destination_story).unwrap();
    assert_eq!(outcome.stories_removed, 1);
    assert!(f.h.store.get_story(&f.destination_story).unwrap().is_none());

    // And the previously blocked groups go too.
    f.h.service.delete_node(&f.groupo).unwrap();
    f.h.service.delete_node(&f.default_group).unwrap();
}

#[test]
fn test_group_cascade_removes_descendants_and_order_entries() {
    let h = harness();
    let outer = h.service.insert_group(&h.project_id, "outer").unwrap();
    let s1 = h
        .service
        .insert_story(&h.project_id, &outer, "one", "")
        .unwrap();
    let inner = h.service.insert_group(&h.project_id, "inner").unwrap();
    h.service.move_node(&inner, Some(&outer), 1).unwrap();
    let s2 = h
        .service
        .insert_story(&h.project_id, &inner, "two", "")
        .unwrap();
    let bystander = h.service.insert_group(&h.project_id, "bystander").unwrap();

    let outcome = h.service.delete_node(&outer).unwrap();
    assert_eq!(outcome.stories_removed, 2);
    assert_eq!(outcome.groups_removed, 2);

    assert!(h.store.get_group(&outer).unwrap().is_none());
    assert!(h.store.get_group(&inner).unwrap().is_none());
    assert!(h.store.get_story(&s1).unwrap().is_none());
    assert!(h.store.get_story(&s2).unwrap().is_none());

    // No remaining order contains the removed ids.
    let project = h.store.get_project(&h.project_id).unwrap().unwrap();
    assert_eq!(project.story_groups, vec![bystander.clone()]);
    for group in h.store.list_groups(&h.project_id).unwrap() {
        assert!(!group.children.contains(&outer));
        assert!(!group.children.contains(&inner));
        assert!(!group.children.contains(&s1));
        assert!(!group.children.contains(&s2));
    }

    // The cascaded names are free again.
    h.service.insert_group(&h.project_id, "outer").unwrap();
    h.service.insert_group(&h.project_id, "inner").unwrap();
}

#[test]
fn test_nested_links_block_the_outer_group() {
    let h = harness();
    let outer = h.service.insert_group(&h.project_id, "outer").unwrap();
    let inner = h.service.insert_group(&h.project_id, "inner").unwrap();
    h.service.move_node(&inner, Some(&outer), 0).unwrap();
    let nested = h
        .service
        .insert_story(&h.project_id, &inner, "nested", "")
        .unwrap();
    let (_, other) = h.group_with_story("elsewhere", "other");
    h.service.add_checkpoint(&nested, &other).unwrap();

    // The link sits two levels down, yet the outer group is refused.
    let err = h.service.delete_node(&outer).unwrap_err();
    expect_linked(err, LinkedNodeReason::GroupContainsOrigin);
}

#[test]
fn test_second_delete_reports_not_found_and_preserves_siblings() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "Groupo").unwrap();
    let a = h
        .service
        .insert_story(&h.project_id, &group, "a", "")
        .unwrap();
    let b = h
        .service
        .insert_story(&h.project_id, &group, "b", "")
        .unwrap();
    let c = h
        .service
        .insert_story(&h.project_id, &group, "c", "")
        .unwrap();

    h.service.delete_node(&b).unwrap();
    let err = h.service.delete_node(&b).unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));

    let loaded = h.store.get_group(&group).unwrap().unwrap();
    assert_eq!(loaded.children, vec![a, c]);
}

#[test]
fn test_delete_unknown_id_reports_not_found() {
    let h = harness();
    let err = h.service.delete_node(&NodeId::from("missing")).unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}
