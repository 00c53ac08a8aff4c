use std::convert::Infallible;

use tracing::info;

use crate::report::ConsensusReport;

/// Consumer of reports whose processing has started
///
/// Both hooks run inside the oracle transition that triggers them; an error
/// aborts that transition.
pub trait ReportHandler {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called from `start_processing` before the report is marked processing
    fn handle_consensus_report(
        &mut self,
        report: &ConsensusReport,
        prev_processing_ref_slot: u64,
    ) -> Result<(), Self::Error>;

    /// Called when a pending report is withdrawn by the consensus engine
    fn handle_consensus_report_discarded(
        &mut self,
        report: &ConsensusReport,
    ) -> Result<(), Self::Error>;
}

/// Handler that logs and keeps every report it sees
#[derive(Debug, Clone, Default)]
pub struct ReportLog {
    handled: Vec<ConsensusReport>,
    discarded: Vec<ConsensusReport>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handled(&self) -> &[ConsensusReport] {
        &self.handled
    }

    pub fn discarded(&self) -> &[ConsensusReport] {
        &self.discarded
    }
}

impl ReportHandler for ReportLog {
    type Error = Infallible;

    fn handle_consensus_report(
        &mut self,
        report: &ConsensusReport,
        prev_processing_ref_slot: u64,
    ) -> Result<(), Infallible> {
        info!(
            "Handling report {} for ref slot {} (previous processing ref slot {})",
            report.hash, report.ref_slot, prev_processing_ref_slot
        );
        self.handled.push(*report);
        Ok(())
    }

    fn handle_consensus_report_discarded(
        &mut self,
        report: &ConsensusReport,
    ) -> Result<(), Infallible> {
        info!(
            "Report {} for ref slot {} discarded",
            report.hash, report.ref_slot
        );
        self.discarded.push(*report);
        Ok(())
    }
}
