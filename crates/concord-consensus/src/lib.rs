//! Concord Consensus - Hash consensus over time-windowed frames
//!
//! This crate provides frame scheduling, committee membership and quorum
//! management, per-frame hash tallying and the push handshake that hands an
//! agreed report hash to a downstream report processor.

pub mod consensus;
pub mod error;
pub mod events;
pub mod frame;
pub mod members;
pub mod sink;
pub mod tally;

pub use consensus::{ConsensusState, HashConsensus, HashConsensusConfig, MemberConsensusState};
pub use error::ConsensusError;
pub use events::ConsensusEvent;
pub use frame::{ConsensusFrame, FrameConfig, FrameSchedule};
pub use members::{min_quorum, MemberSet, MemberState, UNREACHABLE_QUORUM};
pub use sink::ReportSink;
pub use tally::{ReportTally, ReportVariant};
