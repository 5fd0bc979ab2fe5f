//! CLI route: builds the runtime context and dispatches parsed commands
//! to the command service.

use crate::bus::ChangeBus;
use crate::cli::parse::{Commands, GroupCommands, ProjectCommands, StoryCommands};
use crate::cli::presentation;
use crate::commands::CommandService;
use crate::config::ConfigLoader;
use crate::documents::Node;
use crate::error::{CommandError, StorageError};
use crate::gc::StoreResponseGc;
use crate::seed;
use crate::store::{DocumentStore, SledDocumentStore};
use crate::tree::{resolve_node, TreeReader};
use crate::types::{NodeId, ProjectId};
use std::path::PathBuf;
use std::sync::Arc;

/// Runtime context for one CLI invocation: config, store, command service.
pub struct RunContext {
    service: CommandService,
    workspace_root: PathBuf,
}

impl RunContext {
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, CommandError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let data_dir =
            data_dir.unwrap_or_else(|| config.storage.resolve_data_dir(&workspace_root));

        let store: Arc<dyn DocumentStore> = Arc::new(SledDocumentStore::open(&data_dir)?);
        let gc = Arc::new(StoreResponseGc::new(store.clone()));
        // One-shot process: results are re-queried through exit status and
        // follow-up commands, so no subscriber holds the receiver.
        let (bus, _receiver) = ChangeBus::new_pair();
        let service = CommandService::new(store, gc, bus);

        Ok(Self {
            service,
            workspace_root,
        })
    }

    pub fn service(&self) -> &CommandService {
        &self.service
    }

    /// Execute one parsed command and return its terminal output.
    pub fn execute(&self, command: &Commands) -> Result<String, CommandError> {
        match command {
            Commands::Init => {
                let path = ConfigLoader::write_default(&self.workspace_root)?;
                Ok(format!("Wrote {}", path.display()))
            }
            Commands::Project { command } => self.execute_project(command),
            Commands::Group { command } => self.execute_group(command),
            Commands::Story { command } => self.execute_story(command),
            Commands::Tree { project, format } => {
                let project_id = ProjectId::from(project.as_str());
                let reader = TreeReader::new(self.service.store().as_ref(), project_id);
                let view = reader.project_view()?;
                presentation::format_tree(&view, format)
            }
        }
    }

    fn execute_project(&self, command: &ProjectCommands) -> Result<String, CommandError> {
        match command {
            ProjectCommands::Create { name, seed: with_seed } => {
                let project_id = self.service.create_project(name)?;
                if *with_seed {
                    seed::seed_project_defaults(&self.service, &project_id)?;
                }
                Ok(format!("Created project {}", project_id))
            }
            ProjectCommands::List { format } => {
                let projects = self.service.store().list_projects()?;
                presentation::format_project_list(&projects, format)
            }
        }
    }

    fn execute_group(&self, command: &GroupCommands) -> Result<String, CommandError> {
        match command {
            GroupCommands::Add { project, name } => {
                let project_id = ProjectId::from(project.as_str());
                let group_id = self.service.insert_group(&project_id, name)?;
                Ok(format!("Created group {}", group_id))
            }
            GroupCommands::Rename { id, name } => {
                self.service.rename_node(&NodeId::from(id.as_str()), name)?;
                Ok("Renamed".to_string())
            }
            GroupCommands::Delete { id, force } => {
                self.delete_with_confirmation(&NodeId::from(id.as_str()), *force)
            }
            GroupCommands::Move { id, parent, index } => {
                let parent_id = parent.as_ref().map(|p| NodeId::from(p.as_str()));
                self.service
                    .move_node(&NodeId::from(id.as_str()), parent_id.as_ref(), *index)?;
                Ok("Moved".to_string())
            }
        }
    }

    fn execute_story(&self, command: &StoryCommands) -> Result<String, CommandError> {
        match command {
            StoryCommands::Add {
                project,
                group,
                title,
                body,
            } => {
                let story_id = self.service.insert_story(
                    &ProjectId::from(project.as_str()),
                    &NodeId::from(group.as_str()),
                    title,
                    body,
                )?;
                Ok(format!("Created story {}", story_id))
            }
            StoryCommands::Rename { id, name } => {
                self.service.rename_node(&NodeId::from(id.as_str()), name)?;
                Ok("Renamed".to_string())
            }
            StoryCommands::Update { id, body, event } => {
                self.service
                    .update_story(&NodeId::from(id.as_str()), body, event.clone())?;
                Ok("Updated".to_string())
            }
            StoryCommands::Delete { id, force } => {
                self.delete_with_confirmation(&NodeId::from(id.as_str()), *force)
            }
            StoryCommands::Move { id, parent, index } => {
                self.service.move_node(
                    &NodeId::from(id.as_str()),
                    Some(&NodeId::from(parent.as_str())),
                    *index,
                )?;
                Ok("Moved".to_string())
            }
            StoryCommands::Link {
                origin,
                destination,
            } => {
                self.service.add_checkpoint(
                    &NodeId::from(origin.as_str()),
                    &NodeId::from(destination.as_str()),
                )?;
                Ok("Linked".to_string())
            }
            StoryCommands::Unlink {
                origin,
                destination,
            } => {
                self.service.remove_checkpoint(
                    &NodeId::from(origin.as_str()),
                    &NodeId::from(destination.as_str()),
                )?;
                Ok("Unlinked".to_string())
            }
            StoryCommands::Show { id, format } => {
                let story_id = NodeId::from(id.as_str());
                let story = self
                    .service
                    .store()
                    .get_story(&story_id)?
                    .ok_or(CommandError::NotFound(story_id))?;
                presentation::format_story(&story, format)
            }
        }
    }

    /// Resolve the node for the prompt, confirm unless `--force`, then
    /// delete. The service re-checks deletability against current state.
    fn delete_with_confirmation(&self, id: &NodeId, force: bool) -> Result<String, CommandError> {
        let node = self.resolve(id)?;
        if !force {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!("{} Proceed?", presentation::deletion_prompt(&node)))
                .interact()
                .map_err(|e| CommandError::Config(format!("Failed to get user input: {}", e)))?;
            if !confirmed {
                return Ok("Deletion cancelled".to_string());
            }
        }
        let outcome = self.service.delete_node(id)?;
        Ok(presentation::format_delete_outcome(&outcome))
    }

    fn resolve(&self, id: &NodeId) -> Result<Node, CommandError> {
        resolve_node(self.service.store().as_ref(), id).map_err(|e| match e {
            StorageError::DocumentNotFound(_) => CommandError::NotFound(id.clone()),
            other => CommandError::Storage(other),
        })
    }
}
