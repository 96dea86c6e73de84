//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "retriage",
    version,
    about = "Duplicate-detection engine for crowdsourced vulnerability reports",
    long_about = "Retriage ranks previously indexed vulnerability reports against a newly \
                  submitted one and decides whether the new report is a re-submission. The \
                  corpus is rebuilt from a JSONL export of the system of record on every run."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/retriage/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank indexed reports against one query report
    Detect {
        /// Id of the query report (must appear in the reports file)
        id: String,

        /// JSONL file of raw reports, one object per line
        #[arg(short, long, value_name = "FILE")]
        reports: PathBuf,

        /// Only consider candidates from this program
        #[arg(short, long)]
        program: Option<String>,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Run detection for several report ids, skipping ids that fail
    Batch {
        /// Ids of the query reports
        #[arg(required = true)]
        ids: Vec<String>,

        /// JSONL file of raw reports, one object per line
        #[arg(short, long, value_name = "FILE")]
        reports: PathBuf,

        /// Only consider candidates from this program
        #[arg(short, long)]
        program: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Discover duplicate clusters across the whole corpus
    Clusters {
        /// JSONL file of raw reports, one object per line
        #[arg(short, long, value_name = "FILE")]
        reports: PathBuf,

        /// Restrict clustering to this program
        #[arg(short, long)]
        program: Option<String>,

        /// Clustering cut-off (defaults to the configured value)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show corpus statistics for a reports file
    Stats {
        /// JSONL file of raw reports, one object per line
        #[arg(short, long, value_name = "FILE")]
        reports: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the standard location)
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
