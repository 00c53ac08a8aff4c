use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use concord_consensus::FrameSchedule;
use concord_core::{report_hash, Clock, SystemClock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;

use cli::{Cli, Commands};
use concord_node::{generate_sample_config, run_scenario, NodeConfig, OracleNode, Scenario};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output, members } => {
            init_config(output, members)?;
        }
        Commands::Frame { config, at } => {
            show_frame(&config, at)?;
        }
        Commands::Simulate { config, scenario } => {
            simulate(&config, &scenario)?;
        }
        Commands::Hash { file } => {
            hash_payload(&file)?;
        }
        Commands::Watch {
            config,
            interval_ms,
            max_ticks,
        } => {
            watch(&config, interval_ms, max_ticks).await?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<NodeConfig> {
    if !path.exists() {
        error!(
            "Configuration file not found: {:?}. Run 'concord init' to create one.",
            path
        );
        return Err(anyhow::anyhow!("Configuration file not found"));
    }
    info!("Loading configuration from {:?}", path);
    NodeConfig::load(path)
}

/// Initialize a new configuration file
fn init_config(output: PathBuf, members: usize) -> Result<()> {
    info!("Generating sample configuration with {} members", members);

    let config = generate_sample_config(members);
    config.save(&output)?;

    info!("Configuration saved to {:?}", output);
    for (index, member) in config.members.iter().enumerate() {
        info!("  member {}: {}", index, member);
    }
    info!("  quorum: {}", config.quorum);

    Ok(())
}

/// Print the frame containing `at` (or now)
fn show_frame(config_path: &Path, at: Option<u64>) -> Result<()> {
    let config = load_config(config_path)?;
    let chain = config.to_chain_config()?;
    let mut schedule = FrameSchedule::new(
        chain,
        config.epochs_per_frame,
        config.fast_lane_length_slots,
    )?;

    let timestamp = at.unwrap_or_else(|| SystemClock.now());
    let initial_epoch = config
        .initial_epoch
        .ok_or_else(|| anyhow::anyhow!("No initial epoch configured"))?;
    schedule.set_initial_epoch(timestamp, initial_epoch)?;

    let frame = schedule.frame_at(timestamp)?;
    let output = serde_json::json!({
        "timestamp": timestamp,
        "slot": chain.slot_at(timestamp),
        "epoch": chain.epoch_at(timestamp),
        "frame": frame,
        "processing_deadline_time": schedule.deadline_timestamp(&frame),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Replay a scenario and print the resulting state
fn simulate(config_path: &Path, scenario_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let scenario = Scenario::load(scenario_path)?;
    info!(
        "Replaying {} steps from {:?}",
        scenario.steps.len(),
        scenario_path
    );

    let report = run_scenario(&config, &scenario)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Print the report hash of a JSON payload
fn hash_payload(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)?;
    let payload: serde_json::Value = serde_json::from_str(&content)?;
    let hash = report_hash(&payload)?;
    println!("{}", hash);
    Ok(())
}

/// Follow frames on the wall clock
async fn watch(config_path: &Path, interval_ms: u64, max_ticks: Option<u64>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut node = OracleNode::new(&config, SystemClock)?;
    node.drain_events();

    let frames = node
        .watch(Duration::from_millis(interval_ms), max_ticks)
        .await?;
    info!("Observed {} frames", frames.len());

    Ok(())
}
