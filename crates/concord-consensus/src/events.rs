use concord_core::{Address, Hash, Role};
use serde::Serialize;

/// Notifications emitted by the consensus engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ConsensusEvent {
    FrameConfigSet {
        new_initial_epoch: u64,
        new_epochs_per_frame: u64,
    },
    FastLaneConfigSet {
        fast_lane_length_slots: u64,
    },
    MemberAdded {
        addr: Address,
        new_total_members: u64,
        new_quorum: u64,
    },
    MemberRemoved {
        addr: Address,
        new_total_members: u64,
        new_quorum: u64,
    },
    QuorumSet {
        new_quorum: u64,
        total_members: u64,
        prev_quorum: u64,
    },
    ReportReceived {
        ref_slot: u64,
        member: Address,
        report: Hash,
    },
    ConsensusReached {
        ref_slot: u64,
        report: Hash,
        support: u64,
    },
    ConsensusLost {
        ref_slot: u64,
    },
    ReportProcessorSet {
        processor: Address,
        prev_processor: Address,
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

impl ConsensusEvent {
    /// Short event name, used as the log label
    pub fn name(&self) -> &'static str {
        match self {
            ConsensusEvent::FrameConfigSet { .. } => "FrameConfigSet",
            ConsensusEvent::FastLaneConfigSet { .. } => "FastLaneConfigSet",
            ConsensusEvent::MemberAdded { .. } => "MemberAdded",
            ConsensusEvent::MemberRemoved { .. } => "MemberRemoved",
            ConsensusEvent::QuorumSet { .. } => "QuorumSet",
            ConsensusEvent::ReportReceived { .. } => "ReportReceived",
            ConsensusEvent::ConsensusReached { .. } => "ConsensusReached",
            ConsensusEvent::ConsensusLost { .. } => "ConsensusLost",
            ConsensusEvent::ReportProcessorSet { .. } => "ReportProcessorSet",
            ConsensusEvent::RoleGranted { .. } => "RoleGranted",
            ConsensusEvent::RoleRevoked { .. } => "RoleRevoked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ConsensusEvent::ConsensusReached {
            ref_slot: 31,
            report: Hash::repeat_byte(0xab),
            support: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ConsensusReached");
        assert_eq!(json["data"]["ref_slot"], 31);
        assert_eq!(json["data"]["report"], format!("0x{}", "ab".repeat(32)));
        assert_eq!(event.name(), "ConsensusReached");
    }
}
