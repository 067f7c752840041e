//! Command-Line Interface

use crate::series::Condition;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Jumplab - segment and time-normalize force-plate jump trials
#[derive(Parser, Debug)]
#[command(name = "jumplab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full batch over all configured participants and conditions
    Run {
        /// Directory with one sub-directory of trial CSVs per participant
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output directory for tables, normalized series, and charts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Participants to process (overrides the configured list)
        #[arg(short, long, value_delimiter = ',')]
        participants: Vec<String>,

        /// Process participants sequentially instead of on a worker pool
        #[arg(long)]
        serial: bool,

        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },

    /// Segment one trial CSV and print (optionally persist) its jump table
    Segment {
        /// Trial CSV to segment
        input: PathBuf,

        /// Condition label of the trial (e.g. REAL_1)
        #[arg(short = 'l', long)]
        condition: Condition,

        /// Participant the trial belongs to
        #[arg(short, long)]
        participant: String,

        /// Persist the jump table into this directory
        #[arg(short, long)]
        tables_dir: Option<PathBuf>,
    },

    /// Normalize one trial's jumps against a persisted jump table
    Normalize {
        /// Trial CSV to normalize
        input: PathBuf,

        /// Condition label of the trial (e.g. REAL_1)
        #[arg(short = 'l', long)]
        condition: Condition,

        /// Participant the trial belongs to
        #[arg(short, long)]
        participant: String,

        /// Directory holding the persisted jump tables
        #[arg(short, long)]
        tables_dir: PathBuf,

        /// Output CSV path (defaults next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
