use concord_core::{Address, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("Epochs per frame cannot be zero")]
    EpochsPerFrameCannotBeZero,

    #[error("Fast lane period cannot be longer than the frame")]
    FastLanePeriodCannotBeLongerThanFrame,

    #[error("Initial epoch is yet to arrive")]
    InitialEpochIsYetToArrive,

    #[error("Initial epoch already arrived")]
    InitialEpochAlreadyArrived,

    #[error("Initial epoch cannot be zero")]
    InitialEpochCannotBeZero,

    #[error("Initial epoch ref slot cannot be earlier than the processing slot")]
    InitialEpochRefSlotCannotBeEarlierThanProcessingSlot,

    #[error("Quorum too small: need at least {min_quorum}, got {received}")]
    QuorumTooSmall { min_quorum: u64, received: u64 },

    #[error("Address cannot be zero")]
    AddressCannotBeZero,

    #[error("Duplicate member: {0}")]
    DuplicateMember(Address),

    #[error("Not a member: {0}")]
    NonMember(Address),

    #[error("Invalid slot: expected {expected}, got {ref_slot}")]
    InvalidSlot { ref_slot: u64, expected: u64 },

    #[error("Report is stale: frame deadline slot {deadline_slot} has passed")]
    StaleReport { deadline_slot: u64 },

    #[error("Non fast lane member cannot report within the fast lane interval")]
    NonFastLaneMemberCannotReportWithinFastLaneInterval,

    #[error("Empty report")]
    EmptyReport,

    #[error("Duplicate report")]
    DuplicateReport,

    #[error("Consensus report is already being processed")]
    ConsensusReportAlreadyProcessing,

    #[error("Unexpected consensus version: expected {expected}, got {received}")]
    UnexpectedConsensusVersion { expected: u64, received: u64 },

    #[error("Report processor cannot be zero")]
    ReportProcessorCannotBeZero,

    #[error("New report processor cannot be the same as the current one")]
    NewProcessorCannotBeTheSame,

    #[error("Report processor error: {0}")]
    Processor(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl ConsensusError {
    pub(crate) fn processor<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConsensusError::Processor(Box::new(err))
    }

    /// Downcast a processor error to its concrete type
    pub fn processor_error<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            ConsensusError::Processor(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}
