use concord_core::Hash;
use serde::{Deserialize, Serialize};

/// The latest report hash handed over by the consensus engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusReport {
    /// Zero when nothing is pending for `ref_slot`
    pub hash: Hash,
    pub ref_slot: u64,
    /// Unix time after which the report may no longer be processed
    pub processing_deadline_time: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusReportStatus {
    pub hash: Hash,
    pub ref_slot: u64,
    pub processing_deadline_time: u64,
    pub processing_started: bool,
}
