//! Default content for fresh projects.
//!
//! Mirrors the console's bootstrap: an "Intro stories" group with a
//! get-started story, and a "Default stories" group with greeting and
//! farewell stories, each with a placeholder response template for its
//! event keys.

use crate::commands::CommandService;
use crate::documents::BotResponse;
use crate::error::CommandError;
use crate::types::{NodeId, ProjectId};
use tracing::info;

const PLACEHOLDER_VALUES: &str = r#"{"sequence":[{"content":"text: \"\""}]}"#;

fn seed_story(
    service: &CommandService,
    project_id: &ProjectId,
    group_id: &NodeId,
    title: &str,
    body: &str,
    events: &[&str],
) -> Result<NodeId, CommandError> {
    let story_id = service.insert_story(project_id, group_id, title, body)?;
    service.update_story(
        &story_id,
        body,
        events.iter().map(|e| e.to_string()).collect(),
    )?;
    for event in events {
        service
            .store()
            .upsert_response(&BotResponse::new(project_id.clone(), *event, PLACEHOLDER_VALUES))?;
    }
    Ok(story_id)
}

/// Seed the "Intro stories" group.
pub fn create_intro_story_group(
    service: &CommandService,
    project_id: &ProjectId,
) -> Result<NodeId, CommandError> {
    let group_id = service.insert_group(project_id, "Intro stories")?;
    seed_story(
        service,
        project_id,
        &group_id,
        "Get started",
        "* get_started\n    - utter_get_started",
        &["utter_get_started"],
    )?;
    info!(project = %project_id, "intro story group seeded");
    Ok(group_id)
}

/// Seed the "Default stories" group.
pub fn create_default_story_group(
    service: &CommandService,
    project_id: &ProjectId,
) -> Result<NodeId, CommandError> {
    let group_id = service.insert_group(project_id, "Default stories")?;
    seed_story(
        service,
        project_id,
        &group_id,
        "Greetings",
        "* chitchat.greet\n    - utter_hi",
        &["utter_hi"],
    )?;
    seed_story(
        service,
        project_id,
        &group_id,
        "Farewells",
        "* chitchat.bye\n    - utter_bye",
        &["utter_bye"],
    )?;
    info!(project = %project_id, "default story group seeded");
    Ok(group_id)
}

/// Seed both default groups for a fresh project. The intro group is
/// created last so it lands first in the "newest first" order.
pub fn seed_project_defaults(
    service: &CommandService,
    project_id: &ProjectId,
) -> Result<(), CommandError> {
    create_default_story_group(service, project_id)?;
    create_intro_story_group(service, project_id)?;
    Ok(())
}
