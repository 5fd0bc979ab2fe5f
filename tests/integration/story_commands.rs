//! Integration tests for story insert, update, rename, and checkpoints.

use crate::integration::test_utils::harness;
use fabula::error::CommandError;
use fabula::types::NodeId;

#[test]
fn test_insert_story_appends_to_group_order() {
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

    let loaded = h.store.get_group(&group).unwrap().unwrap();
    assert_eq!(loaded.children, vec![a, b]);
}

#[test]
fn test_story_titles_need_not_be_unique() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "Groupo").unwrap();
    h.service
        .insert_story(&h.project_id, &group, "same title", "")
        .unwrap();
    h.service
        .insert_story(&h.project_id, &group, "same title", "")
        .unwrap();
    assert_eq!(h.store.get_group(&group).unwrap().unwrap().children.len(), 2);
}

#[test]
fn test_insert_story_into_unknown_group_fails() {
    let h = harness();
    let err = h
        .service
        .insert_story(&h.project_id, &NodeId::from("missing"), "t", "")
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}

#[test]
fn test_rename_story() {
    let h = harness();
    let (_, story) = h.group_with_story("Groupo", "HALLO (3)");
    h.service.rename_node(&story, "BYE").unwrap();
    assert_eq!(h.store.get_story(&story).unwrap().unwrap().title, "BYE");
}

#[test]
fn test_update_story_replaces_body_and_events() {
    let h = harness();
    let (_, story) = h.group_with_story("Groupo", "Greetings");
    h.service
        .update_story(
            &story,
            "* chitchat.greet\n    - utter_hi",
            vec!["utter_hi".to_string()],
        )
        .unwrap();

    let loaded = h.store.get_story(&story).unwrap().unwrap();
    assert_eq!(loaded.body, "* chitchat.greet\n    - utter_hi");
    assert_eq!(loaded.events, vec!["utter_hi".to_string()]);
}

#[test]
fn test_link_and_unlink_stories() {
    let h = harness();
    let group = h.service.insert_group(&h.project_id, "Groupo").unwrap();
    let origin = h
        .service
        .insert_story(&h.project_id, &group, "origin", "")
        .unwrap();
    let destination = h
        .service
        .insert_story(&h.project_id, &group, "destination", "")
        .unwrap();

    h.service.add_checkpoint(&origin, &destination).unwrap();
    // Re-adding the same link is a no-op, not a duplicate.
    h.service.add_checkpoint(&origin, &destination).unwrap();
    let loaded = h.store.get_story(&origin).unwrap().unwrap();
    assert_eq!(loaded.checkpoints.len(), 1);

    h.service.remove_checkpoint(&origin, &destination).unwrap();
    // Removing an absent link is a no-op.
    h.service.remove_checkpoint(&origin, &destination).unwrap();
    let loaded = h.store.get_story(&origin).unwrap().unwrap();
    assert!(loaded.checkpoints.is_empty());
}

#[test]
fn test_self_loop_checkpoint_is_rejected() {
    let h = harness();
    let (_, story) = h.group_with_story("Groupo", "loop");
    let err = h.service.add_checkpoint(&story, &story).unwrap_err();
    assert!(matches!(err, CommandError::InvalidLink(_)));
}

#[test]
fn test_cross_project_checkpoint_is_rejected() {
    let h = harness();
    let (_, origin) = h.group_with_story("Groupo", "origin");

    let other = h.service.create_project("Other").unwrap();
    let other_group = h.service.insert_group(&other, "Groupo").unwrap();
    let foreign = h
        .service
        .insert_story(&other, &other_group, "foreign", "")
        .unwrap();

    let err = h.service.add_checkpoint(&origin, &foreign).unwrap_err();
    assert!(matches!(err, CommandError::InvalidLink(_)));
}

#[test]
fn test_link_to_unknown_story_fails() {
    let h = harness();
    let (_, origin) = h.group_with_story("Groupo", "origin");
    let err = h
        .service
        .add_checkpoint(&origin, &NodeId::from("missing"))
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
}
