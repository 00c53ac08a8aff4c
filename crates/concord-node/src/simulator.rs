//! Deterministic replay of scripted scenarios against an in-process node

use std::path::Path;

use anyhow::Result;
use concord_consensus::ConsensusState;
use concord_core::serialize::from_json;
use concord_core::{Address, Clock, Hash, ManualClock};
use concord_oracle::ConsensusReportStatus;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::node::{NodeError, NodeEvent, OracleNode};

/// One scripted action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    SetTime {
        time: u64,
    },
    AdvanceTime {
        seconds: u64,
    },
    AdvanceSlots {
        slots: u64,
    },
    /// Vote as `member`; the ref slot and version default to the current ones
    SubmitReport {
        member: Address,
        hash: Hash,
        #[serde(default)]
        ref_slot: Option<u64>,
        #[serde(default)]
        consensus_version: Option<u64>,
    },
    AddMember {
        member: Address,
        quorum: u64,
    },
    RemoveMember {
        member: Address,
        quorum: u64,
    },
    SetQuorum {
        quorum: u64,
    },
    DisableConsensus,
    SetFrameConfig {
        epochs_per_frame: u64,
        fast_lane_length_slots: u64,
    },
    StartProcessing,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::SetTime { .. } => "set_time",
            Step::AdvanceTime { .. } => "advance_time",
            Step::AdvanceSlots { .. } => "advance_slots",
            Step::SubmitReport { .. } => "submit_report",
            Step::AddMember { .. } => "add_member",
            Step::RemoveMember { .. } => "remove_member",
            Step::SetQuorum { .. } => "set_quorum",
            Step::DisableConsensus => "disable_consensus",
            Step::SetFrameConfig { .. } => "set_frame_config",
            Step::StartProcessing => "start_processing",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock at the first step; defaults to the start of the initial epoch
    #[serde(default)]
    pub start_time: Option<u64>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(from_json(&content)?)
    }
}

/// A step the node refused
#[derive(Debug, Clone, Serialize)]
pub struct RejectedStep {
    pub index: usize,
    pub action: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub final_time: u64,
    /// `None` when the scenario ends before the initial epoch
    pub consensus_state: Option<ConsensusState>,
    pub oracle_report: ConsensusReportStatus,
    pub events: Vec<NodeEvent>,
    pub rejected: Vec<RejectedStep>,
}

/// Replay `scenario` against a fresh node built from `config`
///
/// Rejected steps are logged and recorded; they leave the node untouched and
/// the replay carries on with the next step.
pub fn run_scenario(config: &NodeConfig, scenario: &Scenario) -> Result<SimulationReport, NodeError> {
    let start_time = scenario.start_time.unwrap_or_else(|| {
        config
            .chain
            .timestamp_at_epoch(config.initial_epoch.unwrap_or(0))
    });
    let clock = ManualClock::new(start_time);
    let mut node = OracleNode::new(config, clock.clone())?;

    let mut events = node.drain_events();
    let mut rejected = Vec::new();

    for (index, step) in scenario.steps.iter().enumerate() {
        if let Err(err) = apply_step(&mut node, &clock, step) {
            warn!("Step {} ({}) rejected: {}", index, step.name(), err);
            rejected.push(RejectedStep {
                index,
                action: step.name(),
                error: err.to_string(),
            });
        }
        events.extend(node.drain_events());
    }

    let consensus_state = node.consensus().consensus_state().ok();
    info!(
        "Scenario finished: {} steps, {} rejected, {} events",
        scenario.steps.len(),
        rejected.len(),
        events.len()
    );

    Ok(SimulationReport {
        final_time: clock.now(),
        consensus_state,
        oracle_report: node.oracle().consensus_report(),
        events,
        rejected,
    })
}

fn apply_step(
    node: &mut OracleNode<ManualClock>,
    clock: &ManualClock,
    step: &Step,
) -> Result<(), NodeError> {
    let admin = *node.admin();
    let seconds_per_slot = node.consensus().chain_config().seconds_per_slot;
    let consensus = node.consensus_mut();

    match step {
        Step::SetTime { time } => clock.set(*time),
        Step::AdvanceTime { seconds } => clock.advance(*seconds),
        Step::AdvanceSlots { slots } => clock.advance(slots.saturating_mul(seconds_per_slot)),
        Step::SubmitReport {
            member,
            hash,
            ref_slot,
            consensus_version,
        } => {
            let ref_slot = match ref_slot {
                Some(slot) => *slot,
                None => consensus.current_frame()?.ref_slot,
            };
            let version = consensus_version.unwrap_or_else(|| consensus.consensus_version());
            consensus.submit_report(member, ref_slot, *hash, version)?;
        }
        Step::AddMember { member, quorum } => consensus.add_member(&admin, *member, *quorum)?,
        Step::RemoveMember { member, quorum } => {
            consensus.remove_member(&admin, member, *quorum)?
        }
        Step::SetQuorum { quorum } => consensus.set_quorum(&admin, *quorum)?,
        Step::DisableConsensus => consensus.disable_consensus(&admin)?,
        Step::SetFrameConfig {
            epochs_per_frame,
            fast_lane_length_slots,
        } => consensus.set_frame_config(&admin, *epochs_per_frame, *fast_lane_length_slots)?,
        Step::StartProcessing => {
            node.start_processing()?;
        }
    }
    Ok(())
}
