use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Concord - Committee hash consensus for oracle reports
#[derive(Parser)]
#[command(name = "concord")]
#[command(about = "Concord hash consensus engine and utilities")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new configuration with a fresh committee
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,

        /// Number of committee members to generate
        #[arg(short, long, default_value = "3")]
        members: usize,
    },

    /// Show the frame at a point in time
    Frame {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Unix timestamp, defaults to now
        #[arg(long)]
        at: Option<u64>,
    },

    /// Replay a scenario file against an in-process engine and oracle
    Simulate {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Scenario JSON file
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Compute the report hash of a JSON payload
    Hash {
        /// Payload JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Log frame transitions against the system clock
    Watch {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,

        /// Stop after this many polls
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}
