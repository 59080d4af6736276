//! Command definitions and structures for the CLI
//!
//! This module contains the clap-based command line definitions: the global
//! location flags and one subcommand per store or script operation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "webhook-admin")]
#[command(about = "Edit webhook hook definitions and manage uploaded scripts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Hook definition file to operate on
    #[arg(long, global = true, env = "HOOKS")]
    pub hooks_file: Option<PathBuf>,

    /// Directory uploaded scripts are placed in
    #[arg(long, global = true, env = "UPLOAD_DEST_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/webhook-admin/settings.toml)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Summarize every configured hook (default when no subcommand is given)
    Show {
        /// Print the hooks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the hook file exactly as stored
    Raw,

    /// Check a document's YAML syntax and lint its hooks
    Check {
        /// Document to check (reads stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Replace the hook file with a new document
    Save {
        /// Read the new document from this file
        #[arg(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Use this text as the new document
        #[arg(short, long)]
        content: Option<String>,

        /// Refuse to save when the linter reports errors
        #[arg(long)]
        strict: bool,
    },

    /// Print the canonical serialization of the current hook file
    Format,

    /// Place a script in the upload directory
    Upload {
        /// File to place
        source: PathBuf,

        /// Name to store it under (defaults to the source's file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List the upload directory
    Scripts {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
}
