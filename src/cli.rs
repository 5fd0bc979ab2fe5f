//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to the command service.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, GroupCommands, ProjectCommands, StoryCommands};
pub use presentation::{
    deletion_prompt, format_delete_outcome, format_project_list, format_story, format_tree,
};
pub use route::RunContext;
