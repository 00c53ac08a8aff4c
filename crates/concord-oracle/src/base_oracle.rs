use concord_consensus::ReportSink;
use concord_core::{AccessControl, Address, ChainConfig, Clock, Hash, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::OracleError;
use crate::events::OracleEvent;
use crate::handler::ReportHandler;
use crate::report::{ConsensusReport, ConsensusReportStatus};

/// Construction parameters for [`BaseOracle`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseOracleConfig {
    pub address: Address,
    /// The only identity allowed to submit and discard reports
    pub consensus_contract: Address,
    pub chain: ChainConfig,
    pub consensus_version: u64,
    pub last_processing_ref_slot: u64,
    pub admin: Address,
}

/// Report processor driven by a hash consensus engine
///
/// Holds at most one report. A report moves from pending (submitted, hash
/// set) to processing (`start_processing`), and a pending report may be
/// withdrawn by the consensus engine until processing starts.
#[derive(Debug)]
pub struct BaseOracle<H: ReportHandler, C: Clock> {
    address: Address,
    consensus_contract: Address,
    chain: ChainConfig,
    consensus_version: u64,
    last_processing_ref_slot: u64,
    report: ConsensusReport,
    access: AccessControl,
    handler: H,
    clock: C,
    events: Vec<OracleEvent>,
}

impl<H: ReportHandler, C: Clock> BaseOracle<H, C> {
    pub fn new(config: BaseOracleConfig, handler: H, clock: C) -> Result<Self, OracleError> {
        if config.address.is_zero() || config.consensus_contract.is_zero() || config.admin.is_zero() {
            return Err(OracleError::AddressCannotBeZero);
        }
        config.chain.validate()?;

        info!(
            "Oracle {} bound to consensus {} (version {})",
            config.address, config.consensus_contract, config.consensus_version
        );

        let mut oracle = BaseOracle {
            address: config.address,
            consensus_contract: config.consensus_contract,
            chain: config.chain,
            consensus_version: config.consensus_version,
            last_processing_ref_slot: config.last_processing_ref_slot,
            report: ConsensusReport {
                hash: Hash::ZERO,
                ref_slot: config.last_processing_ref_slot,
                processing_deadline_time: 0,
            },
            access: AccessControl::new(config.admin),
            handler,
            clock,
            events: Vec::new(),
        };
        oracle.emit(OracleEvent::ConsensusHashContractSet {
            addr: config.consensus_contract,
            prev_addr: Address::ZERO,
        });
        oracle.emit(OracleEvent::ConsensusVersionSet {
            version: config.consensus_version,
            prev_version: 0,
        });
        Ok(oracle)
    }

    // ---- consensus engine handshake ----

    /// Accept a freshly agreed report hash for `ref_slot`
    pub fn submit_consensus_report(
        &mut self,
        sender: &Address,
        report: Hash,
        ref_slot: u64,
        deadline: u64,
    ) -> Result<(), OracleError> {
        self.check_sender(sender)?;
        if report.is_zero() {
            return Err(OracleError::HashCannotBeZero);
        }

        let prev_submitted_ref_slot = self.report.ref_slot;
        if ref_slot < prev_submitted_ref_slot {
            return Err(OracleError::RefSlotCannotDecrease {
                ref_slot,
                prev_ref_slot: prev_submitted_ref_slot,
            });
        }
        let prev_processing_ref_slot = self.last_processing_ref_slot;
        if ref_slot <= prev_processing_ref_slot {
            return Err(OracleError::RefSlotMustBeGreaterThanProcessingOne {
                ref_slot,
                processing_ref_slot: prev_processing_ref_slot,
            });
        }
        self.check_deadline(deadline)?;

        if ref_slot != prev_submitted_ref_slot && prev_processing_ref_slot != prev_submitted_ref_slot {
            warn!(
                "Report for ref slot {} was never processed",
                prev_submitted_ref_slot
            );
            self.emit(OracleEvent::WarnProcessingMissed {
                ref_slot: prev_submitted_ref_slot,
            });
        }

        self.report = ConsensusReport {
            hash: report,
            ref_slot,
            processing_deadline_time: deadline,
        };
        info!(
            "Report {} submitted for ref slot {}, deadline {}",
            report, ref_slot, deadline
        );
        self.emit(OracleEvent::ReportSubmitted {
            ref_slot,
            hash: report,
            processing_deadline_time: deadline,
        });
        Ok(())
    }

    /// Withdraw the pending report for `ref_slot`, if there is one
    pub fn discard_consensus_report(
        &mut self,
        sender: &Address,
        ref_slot: u64,
    ) -> Result<(), OracleError> {
        self.check_sender(sender)?;

        let report = self.report;
        if ref_slot < report.ref_slot {
            return Err(OracleError::RefSlotCannotDecrease {
                ref_slot,
                prev_ref_slot: report.ref_slot,
            });
        }
        if ref_slot > report.ref_slot {
            debug!("Nothing to discard for future ref slot {}", ref_slot);
            return Ok(());
        }
        if ref_slot <= self.last_processing_ref_slot {
            return Err(OracleError::RefSlotAlreadyProcessing);
        }
        if report.hash.is_zero() {
            return Ok(());
        }

        self.handler
            .handle_consensus_report_discarded(&report)
            .map_err(OracleError::handler)?;
        self.report.hash = Hash::ZERO;

        info!("Report {} for ref slot {} discarded", report.hash, ref_slot);
        self.emit(OracleEvent::ReportDiscarded {
            ref_slot,
            hash: report.hash,
        });
        Ok(())
    }

    // ---- processing ----

    /// Hand the pending report to the handler and mark it processing.
    /// Returns the previously processing ref slot.
    pub fn start_processing(&mut self) -> Result<u64, OracleError> {
        let report = self.report;
        if report.hash.is_zero() {
            return Err(OracleError::NoConsensusReportToProcess);
        }
        let prev_processing_ref_slot = self.last_processing_ref_slot;
        if report.ref_slot == prev_processing_ref_slot {
            return Err(OracleError::RefSlotAlreadyProcessing);
        }
        self.check_deadline(report.processing_deadline_time)?;

        self.handler
            .handle_consensus_report(&report, prev_processing_ref_slot)
            .map_err(OracleError::handler)?;
        self.last_processing_ref_slot = report.ref_slot;

        info!(
            "Processing started for ref slot {} ({})",
            report.ref_slot, report.hash
        );
        self.emit(OracleEvent::ProcessingStarted {
            ref_slot: report.ref_slot,
            hash: report.hash,
        });
        Ok(prev_processing_ref_slot)
    }

    /// Verify that full report data matches the agreed report
    pub fn check_consensus_data(
        &self,
        ref_slot: u64,
        consensus_version: u64,
        data_hash: Hash,
    ) -> Result<(), OracleError> {
        if ref_slot != self.report.ref_slot {
            return Err(OracleError::UnexpectedRefSlot {
                consensus_ref_slot: self.report.ref_slot,
                data_ref_slot: ref_slot,
            });
        }
        if consensus_version != self.consensus_version {
            return Err(OracleError::UnexpectedConsensusVersion {
                expected: self.consensus_version,
                received: consensus_version,
            });
        }
        if data_hash != self.report.hash {
            return Err(OracleError::UnexpectedDataHash {
                consensus_hash: self.report.hash,
                data_hash,
            });
        }
        Ok(())
    }

    /// Fails once the pending report's deadline has passed
    pub fn check_processing_deadline(&self) -> Result<(), OracleError> {
        self.check_deadline(self.report.processing_deadline_time)
    }

    // ---- administration ----

    pub fn set_consensus_contract(
        &mut self,
        caller: &Address,
        addr: Address,
        chain: ChainConfig,
        initial_ref_slot: u64,
    ) -> Result<(), OracleError> {
        self.access.check_role(Role::ManageConsensusContract, caller)?;
        if addr.is_zero() {
            return Err(OracleError::AddressCannotBeZero);
        }
        if addr == self.consensus_contract {
            return Err(OracleError::AddressCannotBeSame);
        }
        if chain != self.chain {
            return Err(OracleError::UnexpectedChainConfig);
        }
        if initial_ref_slot < self.last_processing_ref_slot {
            return Err(OracleError::InitialRefSlotCannotBeLessThanProcessingOne {
                initial_ref_slot,
                processing_ref_slot: self.last_processing_ref_slot,
            });
        }

        let prev_addr = std::mem::replace(&mut self.consensus_contract, addr);
        info!("Consensus contract set to {} (was {})", addr, prev_addr);
        self.emit(OracleEvent::ConsensusHashContractSet { addr, prev_addr });
        Ok(())
    }

    pub fn set_consensus_version(&mut self, caller: &Address, version: u64) -> Result<(), OracleError> {
        self.access.check_role(Role::ManageConsensusVersion, caller)?;
        if version == self.consensus_version {
            return Err(OracleError::VersionCannotBeSame);
        }
        let prev_version = std::mem::replace(&mut self.consensus_version, version);
        info!("Consensus version set to {} (was {})", version, prev_version);
        self.emit(OracleEvent::ConsensusVersionSet {
            version,
            prev_version,
        });
        Ok(())
    }

    pub fn grant_role(&mut self, caller: &Address, role: Role, account: Address) -> Result<(), OracleError> {
        if self.access.grant_role(caller, role, account)? {
            self.emit(OracleEvent::RoleGranted {
                role,
                account,
                sender: *caller,
            });
        }
        Ok(())
    }

    pub fn revoke_role(&mut self, caller: &Address, role: Role, account: &Address) -> Result<(), OracleError> {
        if self.access.revoke_role(caller, role, account)? {
            self.emit(OracleEvent::RoleRevoked {
                role,
                account: *account,
                sender: *caller,
            });
        }
        Ok(())
    }

    // ---- queries ----

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn consensus_contract(&self) -> &Address {
        &self.consensus_contract
    }

    pub fn consensus_version(&self) -> u64 {
        self.consensus_version
    }

    pub fn last_processing_ref_slot(&self) -> u64 {
        self.last_processing_ref_slot
    }

    pub fn consensus_report(&self) -> ConsensusReportStatus {
        ConsensusReportStatus {
            hash: self.report.hash,
            ref_slot: self.report.ref_slot,
            processing_deadline_time: self.report.processing_deadline_time,
            processing_started: !self.report.hash.is_zero()
                && self.report.ref_slot == self.last_processing_ref_slot,
        }
    }

    pub fn chain_config(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.access.has_role(role, account)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn events(&self) -> &[OracleEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<OracleEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: OracleEvent) {
        self.events.push(event);
    }

    fn check_sender(&self, sender: &Address) -> Result<(), OracleError> {
        if *sender != self.consensus_contract {
            return Err(OracleError::SenderIsNotTheConsensusContract);
        }
        Ok(())
    }

    /// A deadline holds until the end of the slot it falls in
    fn check_deadline(&self, deadline: u64) -> Result<(), OracleError> {
        if self.chain.slot_at(self.clock.now()) > self.chain.slot_at(deadline) {
            return Err(OracleError::ProcessingDeadlineMissed { deadline });
        }
        Ok(())
    }
}

impl<H: ReportHandler, C: Clock> ReportSink for BaseOracle<H, C> {
    type Error = OracleError;

    fn address(&self) -> Address {
        self.address
    }

    fn consensus_version(&self) -> u64 {
        self.consensus_version
    }

    fn last_processing_ref_slot(&self) -> u64 {
        self.last_processing_ref_slot
    }

    fn submit_consensus_report(
        &mut self,
        sender: &Address,
        report: Hash,
        ref_slot: u64,
        deadline: u64,
    ) -> Result<(), OracleError> {
        BaseOracle::submit_consensus_report(self, sender, report, ref_slot, deadline)
    }

    fn discard_consensus_report(&mut self, sender: &Address, ref_slot: u64) -> Result<(), OracleError> {
        BaseOracle::discard_consensus_report(self, sender, ref_slot)
    }
}
