//! CLI module providing command-line interface functionality
//!
//! This module handles argument parsing, location resolution, logging setup
//! and routing to the appropriate handlers.

pub mod args;
pub mod commands;
pub mod context;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

pub use commands::{Cli, Commands};
pub use context::CliContext;
pub use handlers::CommandHandler;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let context = CliContext::new(&cli)?;

        // Held until the command finishes so the audit log is flushed.
        let _log_guard = context.init_logging()?;

        let handler = CommandHandler::new(context);

        // Summarize the hooks when called without subcommand
        let command = cli.command.unwrap_or(Commands::Show { json: false });

        handler.handle_command(command)
    }
}
