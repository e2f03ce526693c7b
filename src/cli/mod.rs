//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// projdash - track projects, owners, budgets and deadlines
#[derive(Parser, Debug)]
#[command(name = "pd", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the snapshot (default: ~/.projdash/data)
    #[arg(long, global = true, env = "PD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Output only the project ID (for scripting)
    #[arg(long, global = true)]
    pub silent: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the data directory with an empty snapshot
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show dashboard statistics
    Status,

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Project Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create(ProjectCreateArgs),

    /// List projects, newest first
    List {
        /// Filter by status (active, paused, completed)
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum projects to return
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show project details
    Show {
        /// Project ID
        id: i64,
    },

    /// Update a project
    Update(ProjectUpdateArgs),

    /// Delete a project
    Delete {
        /// Project ID
        id: i64,
    },

    /// Export all projects as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    /// Project name
    pub name: String,

    /// Person responsible
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Budget (non-negative)
    #[arg(short, long)]
    pub budget: Option<f64>,

    /// Start date (YYYY-MM-DD or "today")
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD or "today")
    #[arg(long)]
    pub end: Option<String>,

    /// Status (active, paused, completed)
    #[arg(short, long, default_value = "active")]
    pub status: String,
}

#[derive(Args, Debug)]
pub struct ProjectUpdateArgs {
    /// Project ID
    pub id: i64,

    /// New project name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New owner
    #[arg(short, long, conflicts_with = "clear_owner")]
    pub owner: Option<String>,

    /// New budget
    #[arg(short, long, conflicts_with = "clear_budget")]
    pub budget: Option<f64>,

    /// New start date (YYYY-MM-DD or "today")
    #[arg(long, conflicts_with = "clear_dates")]
    pub start: Option<String>,

    /// New end date (YYYY-MM-DD or "today")
    #[arg(long, conflicts_with = "clear_dates")]
    pub end: Option<String>,

    /// New status
    #[arg(short, long)]
    pub status: Option<String>,

    /// Remove the owner
    #[arg(long)]
    pub clear_owner: bool,

    /// Remove the budget
    #[arg(long)]
    pub clear_budget: bool,

    /// Remove both start and end dates
    #[arg(long)]
    pub clear_dates: bool,
}
