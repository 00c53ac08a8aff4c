use concord_core::{Address, Hash};

/// Downstream consumer of agreed report hashes
///
/// The consensus engine pushes a hash once a variant reaches quorum and
/// withdraws it if support later drops below quorum. Implementations reject
/// calls whose `sender` is not the consensus engine they are bound to.
pub trait ReportSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn address(&self) -> Address;

    /// Version members must quote when reporting
    fn consensus_version(&self) -> u64;

    /// Highest ref slot whose processing has started
    fn last_processing_ref_slot(&self) -> u64;

    /// Whether processing for `ref_slot` (or a later one) has started
    fn is_processing(&self, ref_slot: u64) -> bool {
        self.last_processing_ref_slot() >= ref_slot
    }

    fn submit_consensus_report(
        &mut self,
        sender: &Address,
        report: Hash,
        ref_slot: u64,
        deadline: u64,
    ) -> Result<(), Self::Error>;

    fn discard_consensus_report(&mut self, sender: &Address, ref_slot: u64)
        -> Result<(), Self::Error>;
}
