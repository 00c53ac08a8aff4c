//! Concord Oracle - Consumer side of the consensus handshake
//!
//! [`BaseOracle`] receives agreed report hashes from a hash consensus engine,
//! tracks which reference slot is pending and which is being processed, and
//! enforces processing deadlines. The actual report handling is delegated to
//! a [`ReportHandler`].

pub mod base_oracle;
pub mod error;
pub mod events;
pub mod handler;
pub mod report;

pub use base_oracle::{BaseOracle, BaseOracleConfig};
pub use error::OracleError;
pub use events::OracleEvent;
pub use handler::{ReportHandler, ReportLog};
pub use report::{ConsensusReport, ConsensusReportStatus};
