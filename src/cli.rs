//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the VDOS dashboard.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// VDOS Dashboard - control panel for the VDOS simulation service
///
/// Polls the simulation manager, shows run-state, personas, plans, metrics
/// and events, and sends simulation control commands.
#[derive(Parser, Debug)]
#[command(name = "vdos-dashboard")]
#[command(
    author,
    version,
    about = "VDOS Dashboard - control panel for the VDOS simulation service",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, env = "VDOS_CONFIG", global = true)]
    pub config: Option<String>,

    /// Override the simulation server base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the dashboard
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive dashboard (polls and reads commands from stdin)
    Run,

    /// Refresh once and print every view
    Status {
        /// Number of most recent events to print
        #[arg(long)]
        events: Option<usize>,
    },

    /// Start the simulation with the configured defaults
    Start(StartArgs),

    /// Stop the simulation
    Stop,

    /// Reset the simulation state, keeping personas
    Reset,

    /// Reset the simulation and delete every persona
    FullReset {
        /// Confirm that personas should be deleted
        #[arg(long)]
        yes: bool,
    },

    /// Advance the simulation manually
    Advance {
        /// Ticks to advance (default 1)
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Reason recorded with the advance (default "manual")
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Control automatic ticking
    Ticks {
        #[command(subcommand)]
        subcommand: TicksSubcommand,
    },

    /// Persona authoring
    Persona {
        #[command(subcommand)]
        subcommand: PersonaSubcommand,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Overrides for the start payload
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Project name (used when no projects are composed)
    #[arg(long)]
    pub project_name: Option<String>,

    /// Project summary
    #[arg(long)]
    pub project_summary: Option<String>,

    /// Project duration in weeks
    #[arg(long)]
    pub duration_weeks: Option<u32>,

    /// Seed for reproducible events
    #[arg(long)]
    pub seed: Option<u64>,

    /// Planner model override
    #[arg(long)]
    pub model_hint: Option<String>,
}

/// Automatic ticking subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicksSubcommand {
    /// Enable automatic ticking
    Start,
    /// Disable automatic ticking
    Stop,
}

/// Persona subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PersonaSubcommand {
    /// Create a persona from a TOML form file
    Create {
        /// Path to the persona form
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Draft a persona from a prompt
    Generate {
        /// Description of the persona
        #[arg(short, long)]
        prompt: String,

        /// Planner model override
        #[arg(long)]
        model_hint: Option<String>,

        /// Save the drafted form to this file for editing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate,
}
