//! Command handlers for all CLI operations
//!
//! Routes each parsed command to the handler owning its concern, keeping
//! CLI parsing separate from store and script logic.

pub mod config;
pub mod scripts;
pub mod traits;

use super::args::DocumentInput;
use super::{CliContext, Commands};
use anyhow::Result;
use config::ConfigHandler;
use scripts::ScriptsHandler;
use traits::HandlerBuilder;
use tracing::debug;

/// Coordinates all command handling operations with dependency injection via CliContext
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    /// Create a new command handler instance with the provided context
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub fn handle_command(&self, command: Commands) -> Result<()> {
        debug!(?command, "Dispatching command");
        let builder = HandlerBuilder::new(&self.context);

        match command {
            Commands::Show { json } => builder
                .create_with_context::<ConfigHandler>()
                .handle_show(json),
            Commands::Raw => builder.create_with_context::<ConfigHandler>().handle_raw(),
            Commands::Check { file } => builder
                .create_with_context::<ConfigHandler>()
                .handle_check(DocumentInput::from_options(file, None)),
            Commands::Save {
                file,
                content,
                strict,
            } => builder
                .create_with_context::<ConfigHandler>()
                .handle_save(DocumentInput::from_options(file, content), strict),
            Commands::Format => builder.create_with_context::<ConfigHandler>().handle_format(),
            Commands::Upload { source, name } => builder
                .create_with_context::<ScriptsHandler>()
                .handle_upload(&source, name.as_deref()),
            Commands::Scripts { json } => builder
                .create_with_context::<ScriptsHandler>()
                .handle_list(json),
        }
    }
}
