use concord_core::{Address, Hash, Role};
use serde::Serialize;

/// Notifications emitted by the report processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OracleEvent {
    ConsensusHashContractSet {
        addr: Address,
        prev_addr: Address,
    },
    ConsensusVersionSet {
        version: u64,
        prev_version: u64,
    },
    ReportSubmitted {
        ref_slot: u64,
        hash: Hash,
        processing_deadline_time: u64,
    },
    ReportDiscarded {
        ref_slot: u64,
        hash: Hash,
    },
    ProcessingStarted {
        ref_slot: u64,
        hash: Hash,
    },
    /// A report was replaced before its processing ever started
    WarnProcessingMissed {
        ref_slot: u64,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
}

impl OracleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OracleEvent::ConsensusHashContractSet { .. } => "ConsensusHashContractSet",
            OracleEvent::ConsensusVersionSet { .. } => "ConsensusVersionSet",
            OracleEvent::ReportSubmitted { .. } => "ReportSubmitted",
            OracleEvent::ReportDiscarded { .. } => "ReportDiscarded",
            OracleEvent::ProcessingStarted { .. } => "ProcessingStarted",
            OracleEvent::WarnProcessingMissed { .. } => "WarnProcessingMissed",
            OracleEvent::RoleGranted { .. } => "RoleGranted",
            OracleEvent::RoleRevoked { .. } => "RoleRevoked",
        }
    }
}
