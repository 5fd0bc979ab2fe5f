//! CLI parse: clap types for Fabula. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fabula CLI - story-tree authoring backend
#[derive(Parser)]
#[command(name = "fabula")]
#[command(about = "Story-tree authoring backend for conversational agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config discovery)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store directory (overrides configuration)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter workspace config file
    Init,
    /// Project commands (create, list)
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Story group commands
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Story commands
    Story {
        #[command(subcommand)]
        command: StoryCommands,
    },
    /// Print a project's story tree
    Tree {
        /// Project id
        project: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Create a project
    Create {
        name: String,
        /// Seed the default story groups
        #[arg(long)]
        seed: bool,
    },
    /// List projects
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Insert a story group at the top of the project order
    Add {
        /// Project id
        project: String,
        /// Group name (unique among siblings)
        name: String,
    },
    /// Rename a story group
    Rename {
        /// Group id
        id: String,
        /// New name
        name: String,
    },
    /// Delete a story group and all its stories
    Delete {
        /// Group id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Move a group under a new parent group (top level when omitted)
    Move {
        /// Group id
        id: String,
        /// New parent group id
        #[arg(long)]
        parent: Option<String>,
        /// Insertion index in the new parent's order
        #[arg(long, default_value = "0")]
        index: usize,
    },
}

#[derive(Subcommand)]
pub enum StoryCommands {
    /// Insert a story at the end of a group's order
    Add {
        /// Project id
        project: String,
        /// Parent group id
        group: String,
        /// Story title (not required unique)
        title: String,
        /// Initial dialogue body
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Rename a story
    Rename {
        /// Story id
        id: String,
        /// New title
        name: String,
    },
    /// Replace a story's body and response-key set
    Update {
        /// Story id
        id: String,
        /// Dialogue body
        #[arg(long, default_value = "")]
        body: String,
        /// Response key referenced by the story (repeatable)
        #[arg(long)]
        event: Vec<String>,
    },
    /// Delete a story
    Delete {
        /// Story id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Move a story into a group at an index
    Move {
        /// Story id
        id: String,
        /// New parent group id
        #[arg(long)]
        parent: String,
        /// Insertion index in the new parent's order
        #[arg(long, default_value = "0")]
        index: usize,
    },
    /// Link a story to a continuation story
    Link {
        /// Origin story id
        origin: String,
        /// Destination story id
        destination: String,
    },
    /// Remove a link between two stories
    Unlink {
        /// Origin story id
        origin: String,
        /// Destination story id
        destination: String,
    },
    /// Show one story
    Show {
        /// Story id
        id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
