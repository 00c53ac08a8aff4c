use concord_core::{CoreError, Hash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Sender is not the consensus contract")]
    SenderIsNotTheConsensusContract,

    #[error("Hash cannot be zero")]
    HashCannotBeZero,

    #[error("Ref slot cannot decrease: got {ref_slot}, previous {prev_ref_slot}")]
    RefSlotCannotDecrease { ref_slot: u64, prev_ref_slot: u64 },

    #[error("Ref slot {ref_slot} must be greater than processing ref slot {processing_ref_slot}")]
    RefSlotMustBeGreaterThanProcessingOne {
        ref_slot: u64,
        processing_ref_slot: u64,
    },

    #[error("Ref slot is already processing")]
    RefSlotAlreadyProcessing,

    #[error("Processing deadline missed: {deadline}")]
    ProcessingDeadlineMissed { deadline: u64 },

    #[error("No consensus report to process")]
    NoConsensusReportToProcess,

    #[error("Unexpected ref slot: consensus has {consensus_ref_slot}, data has {data_ref_slot}")]
    UnexpectedRefSlot {
        consensus_ref_slot: u64,
        data_ref_slot: u64,
    },

    #[error("Unexpected consensus version: expected {expected}, got {received}")]
    UnexpectedConsensusVersion { expected: u64, received: u64 },

    #[error("Unexpected data hash: consensus has {consensus_hash}, data has {data_hash}")]
    UnexpectedDataHash { consensus_hash: Hash, data_hash: Hash },

    #[error("Address cannot be zero")]
    AddressCannotBeZero,

    #[error("Address cannot be the same")]
    AddressCannotBeSame,

    #[error("Consensus contract chain config does not match")]
    UnexpectedChainConfig,

    #[error("Initial ref slot {initial_ref_slot} is less than processing ref slot {processing_ref_slot}")]
    InitialRefSlotCannotBeLessThanProcessingOne {
        initial_ref_slot: u64,
        processing_ref_slot: u64,
    },

    #[error("Version cannot be the same")]
    VersionCannotBeSame,

    #[error("Report handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl OracleError {
    pub(crate) fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        OracleError::Handler(Box::new(err))
    }
}
