//! CLI presentation: formatting of command results for terminal output.
//! Text by default, JSON behind `--format json`.

use crate::commands::DeleteOutcome;
use crate::documents::{Node, Project, Story};
use crate::error::{CommandError, StorageError};
use crate::tree::{NodeKind, TreeNodeView, TreeView};
use crate::types::NodeId;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::collections::HashMap;

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CommandError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::Storage(StorageError::Serialization(e.to_string())))
}

/// Render a project tree as indented text or JSON.
pub fn format_tree(view: &TreeView, format: &str) -> Result<String, CommandError> {
    if format == "json" {
        return to_json(view);
    }

    // Resolve checkpoint destinations to titles for the text rendering.
    let mut titles: HashMap<NodeId, String> = HashMap::new();
    fn index_titles(node: &TreeNodeView, titles: &mut HashMap<NodeId, String>) {
        titles.insert(node.id.clone(), node.title.clone());
        for child in &node.children {
            index_titles(child, titles);
        }
    }
    for group in &view.groups {
        index_titles(group, &mut titles);
    }

    let mut lines = vec![format!(
        "{} ({} groups)",
        view.project_name.bold(),
        view.groups.len()
    )];
    fn render(node: &TreeNodeView, depth: usize, titles: &HashMap<NodeId, String>, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        match node.kind {
            NodeKind::Group => {
                lines.push(format!("{}{}", indent, node.title.bold()));
                for child in &node.children {
                    render(child, depth + 1, titles, lines);
                }
            }
            NodeKind::Story => {
                let mut line = format!("{}{}", indent, node.title);
                for destination in &node.checkpoints {
                    let target = titles
                        .get(destination)
                        .cloned()
                        .unwrap_or_else(|| destination.to_string());
                    line.push_str(&format!(" {}", format!("-> {}", target).dimmed()));
                }
                lines.push(line);
            }
        }
    }
    for group in &view.groups {
        render(group, 1, &titles, &mut lines);
    }
    Ok(lines.join("\n"))
}

/// Render the project list as a table or JSON.
pub fn format_project_list(projects: &[Project], format: &str) -> Result<String, CommandError> {
    if format == "json" {
        return to_json(&projects);
    }
    if projects.is_empty() {
        return Ok("No projects".to_string());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Project ID", "Groups"]);
    for project in projects {
        table.add_row(vec![
            project.name.clone(),
            project.id.to_string(),
            project.story_groups.len().to_string(),
        ]);
    }
    Ok(table.to_string())
}

/// Render one story.
pub fn format_story(story: &Story, format: &str) -> Result<String, CommandError> {
    if format == "json" {
        return to_json(story);
    }
    let mut lines = vec![
        format!("{} ({})", story.title.bold(), story.id),
        format!("group: {}", story.story_group_id),
    ];
    if !story.events.is_empty() {
        lines.push(format!("events: {}", story.events.join(", ")));
    }
    for checkpoint in &story.checkpoints {
        lines.push(format!("-> {}", checkpoint.destination));
    }
    if !story.body.is_empty() {
        lines.push(String::new());
        lines.push(story.body.clone());
    }
    Ok(lines.join("\n"))
}

/// Confirmation prompt shown before a deletion.
pub fn deletion_prompt(node: &Node) -> String {
    match node {
        Node::Group(group) => format!(
            "The story group {} and all its stories in it will be deleted. This action cannot be undone.",
            group.name
        ),
        Node::Story(story) => format!(
            "The story {} will be deleted. This action cannot be undone.",
            story.title
        ),
    }
}

/// One-line result of a completed deletion.
pub fn format_delete_outcome(outcome: &DeleteOutcome) -> String {
    format!(
        "Deleted {} stories and {} groups",
        outcome.stories_removed, outcome.groups_removed
    )
}
