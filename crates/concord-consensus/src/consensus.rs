use concord_core::{AccessControl, Address, ChainConfig, Clock, Hash, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConsensusError;
use crate::events::ConsensusEvent;
use crate::frame::{ConsensusFrame, FrameConfig, FrameSchedule};
use crate::members::{validate_quorum, MemberSet, UNREACHABLE_QUORUM};
use crate::sink::ReportSink;
use crate::tally::{ReportTally, ReportVariant};

/// Construction parameters for [`HashConsensus`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashConsensusConfig {
    /// Identity the engine presents to its report processor
    pub address: Address,
    pub chain: ChainConfig,
    pub epochs_per_frame: u64,
    pub fast_lane_length_slots: u64,
    /// Initial holder of the default admin role
    pub admin: Address,
}

/// Consensus status of the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusState {
    pub ref_slot: u64,
    /// Zero when no variant has reached quorum
    pub consensus_report: Hash,
    pub is_report_processing: bool,
}

/// Current frame as seen by one (possibly non-) member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConsensusState {
    pub current_frame_ref_slot: u64,
    pub current_frame_consensus_report: Hash,
    pub is_member: bool,
    pub is_fast_lane: bool,
    pub can_report: bool,
    pub last_member_report_ref_slot: u64,
    pub current_frame_member_report: Hash,
}

#[derive(Clone)]
struct Snapshot {
    schedule: FrameSchedule,
    members: MemberSet,
    quorum: u64,
    tally: ReportTally,
    access: AccessControl,
    events_len: usize,
}

/// Committee hash consensus engine
///
/// Members submit a hash of their report for the current frame's reference
/// slot. When one hash gathers `quorum` matching votes it is pushed to the
/// report processor `P`; if its support later falls below quorum before
/// processing starts the push is withdrawn.
///
/// Every mutating call is atomic: on error the engine's state and event log
/// are left as they were before the call.
pub struct HashConsensus<P: ReportSink, C: Clock> {
    address: Address,
    schedule: FrameSchedule,
    members: MemberSet,
    quorum: u64,
    tally: ReportTally,
    access: AccessControl,
    processor: P,
    clock: C,
    events: Vec<ConsensusEvent>,
}

impl<P: ReportSink, C: Clock> HashConsensus<P, C> {
    pub fn new(config: HashConsensusConfig, processor: P, clock: C) -> Result<Self, ConsensusError> {
        if config.address.is_zero() || config.admin.is_zero() {
            return Err(ConsensusError::AddressCannotBeZero);
        }
        if processor.address().is_zero() {
            return Err(ConsensusError::ReportProcessorCannotBeZero);
        }
        let schedule = FrameSchedule::new(
            config.chain,
            config.epochs_per_frame,
            config.fast_lane_length_slots,
        )?;

        info!(
            "Hash consensus {} created: {} epochs per frame, processor {}",
            config.address,
            config.epochs_per_frame,
            processor.address()
        );

        let mut consensus = HashConsensus {
            address: config.address,
            schedule,
            members: MemberSet::new(),
            quorum: 0,
            tally: ReportTally::new(),
            access: AccessControl::new(config.admin),
            processor,
            clock,
            events: Vec::new(),
        };

        let frame_config = *consensus.schedule.config();
        consensus.emit(ConsensusEvent::FrameConfigSet {
            new_initial_epoch: frame_config.initial_epoch,
            new_epochs_per_frame: frame_config.epochs_per_frame,
        });
        if frame_config.fast_lane_length_slots != 0 {
            consensus.emit(ConsensusEvent::FastLaneConfigSet {
                fast_lane_length_slots: frame_config.fast_lane_length_slots,
            });
        }
        let processor_address = consensus.processor.address();
        consensus.emit(ConsensusEvent::ReportProcessorSet {
            processor: processor_address,
            prev_processor: Address::ZERO,
        });

        Ok(consensus)
    }

    // ---- access control ----

    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<(), ConsensusError> {
        if self.access.grant_role(caller, role, account)? {
            info!("Granted {} to {}", role, account);
            self.emit(ConsensusEvent::RoleGranted {
                role,
                account,
                sender: *caller,
            });
        }
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: &Address,
    ) -> Result<(), ConsensusError> {
        if self.access.revoke_role(caller, role, account)? {
            info!("Revoked {} from {}", role, account);
            self.emit(ConsensusEvent::RoleRevoked {
                role,
                account: *account,
                sender: *caller,
            });
        }
        Ok(())
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.access.has_role(role, account)
    }

    pub fn role_members(&self, role: Role) -> Vec<Address> {
        self.access.role_members(role)
    }

    // ---- frame schedule ----

    pub fn update_initial_epoch(
        &mut self,
        caller: &Address,
        initial_epoch: u64,
    ) -> Result<(), ConsensusError> {
        self.access.check_role(Role::DefaultAdmin, caller)?;
        self.transact(|this| {
            let now = this.clock.now();
            let changed = this.schedule.set_initial_epoch(now, initial_epoch)?;
            if this.schedule.initial_frame().ref_slot < this.processor.last_processing_ref_slot() {
                return Err(ConsensusError::InitialEpochRefSlotCannotBeEarlierThanProcessingSlot);
            }
            if changed {
                this.emit_frame_config_set();
            }
            Ok(())
        })
    }

    pub fn set_frame_config(
        &mut self,
        caller: &Address,
        epochs_per_frame: u64,
        fast_lane_length_slots: u64,
    ) -> Result<(), ConsensusError> {
        self.access.check_role(Role::ManageFrameConfig, caller)?;
        self.transact(|this| {
            let now = this.clock.now();
            let change = this
                .schedule
                .reconfigure(now, epochs_per_frame, fast_lane_length_slots)?;
            if change.frame_config_changed {
                this.emit_frame_config_set();
            }
            if change.fast_lane_changed {
                this.emit(ConsensusEvent::FastLaneConfigSet {
                    fast_lane_length_slots,
                });
            }
            Ok(())
        })
    }

    pub fn set_fast_lane_length_slots(
        &mut self,
        caller: &Address,
        fast_lane_length_slots: u64,
    ) -> Result<(), ConsensusError> {
        self.access.check_role(Role::ManageFastLaneConfig, caller)?;
        if self
            .schedule
            .set_fast_lane_length_slots(fast_lane_length_slots)?
        {
            self.emit(ConsensusEvent::FastLaneConfigSet {
                fast_lane_length_slots,
            });
        }
        Ok(())
    }

    fn emit_frame_config_set(&mut self) {
        let config = *self.schedule.config();
        info!(
            "Frame config set: initial epoch {}, {} epochs per frame",
            config.initial_epoch, config.epochs_per_frame
        );
        self.emit(ConsensusEvent::FrameConfigSet {
            new_initial_epoch: config.initial_epoch,
            new_epochs_per_frame: config.epochs_per_frame,
        });
    }

    // ---- membership & quorum ----

    pub fn add_member(
        &mut self,
        caller: &Address,
        member: Address,
        quorum: u64,
    ) -> Result<(), ConsensusError> {
        self.access.check_role(Role::ManageMembersAndQuorum, caller)?;
        self.transact(|this| {
            this.members.insert(member)?;
            let total = this.members.len() as u64;
            info!("Member {} added, {} members", member, total);
            this.emit(ConsensusEvent::MemberAdded {
                addr: member,
                new_total_members: total,
                new_quorum: quorum,
            });
            this.apply_quorum(caller, quorum)
        })
    }

    pub fn remove_member(
        &mut self,
        caller: &Address,
        member: &Address,
        quorum: u64,
    ) -> Result<(), ConsensusError> {
        self.access.check_role(Role::ManageMembersAndQuorum, caller)?;
        self.transact(|this| {
            this.members.remove(member)?;
            let total = this.members.len() as u64;
            info!("Member {} removed, {} members", member, total);
            this.emit(ConsensusEvent::MemberRemoved {
                addr: *member,
                new_total_members: total,
                new_quorum: quorum,
            });
            this.apply_quorum(caller, quorum)
        })
    }

    /// Set the quorum. Raising it to [`UNREACHABLE_QUORUM`] requires the
    /// disable-consensus role; any other change requires the membership role.
    pub fn set_quorum(&mut self, caller: &Address, quorum: u64) -> Result<(), ConsensusError> {
        self.transact(|this| this.apply_quorum(caller, quorum))
    }

    pub fn disable_consensus(&mut self, caller: &Address) -> Result<(), ConsensusError> {
        self.set_quorum(caller, UNREACHABLE_QUORUM)
    }

    fn apply_quorum(&mut self, caller: &Address, quorum: u64) -> Result<(), ConsensusError> {
        let total = self.members.len();
        validate_quorum(quorum, total)?;

        let prev_quorum = self.quorum;
        if quorum != prev_quorum {
            let role = if quorum == UNREACHABLE_QUORUM {
                Role::DisableConsensus
            } else {
                Role::ManageMembersAndQuorum
            };
            self.access.check_role(role, caller)?;
            self.quorum = quorum;
            info!("Quorum set to {} (was {})", quorum, prev_quorum);
            self.emit(ConsensusEvent::QuorumSet {
                new_quorum: quorum,
                total_members: total as u64,
                prev_quorum,
            });
        }

        if self.schedule.is_active(self.clock.now()) {
            self.check_consensus()?;
        }
        Ok(())
    }

    // ---- reporting ----

    /// Record `sender`'s vote for `report` at `ref_slot`
    pub fn submit_report(
        &mut self,
        sender: &Address,
        ref_slot: u64,
        report: Hash,
        consensus_version: u64,
    ) -> Result<(), ConsensusError> {
        self.transact(|this| this.submit_report_inner(sender, ref_slot, report, consensus_version))
    }

    fn submit_report_inner(
        &mut self,
        sender: &Address,
        ref_slot: u64,
        report: Hash,
        consensus_version: u64,
    ) -> Result<(), ConsensusError> {
        let index = self
            .members
            .index_of(sender)
            .ok_or(ConsensusError::NonMember(*sender))?;

        let now = self.clock.now();
        let frame = self.schedule.frame_at(now)?;

        let expected_version = self.processor.consensus_version();
        if consensus_version != expected_version {
            return Err(ConsensusError::UnexpectedConsensusVersion {
                expected: expected_version,
                received: consensus_version,
            });
        }
        if ref_slot != frame.ref_slot {
            return Err(ConsensusError::InvalidSlot {
                ref_slot,
                expected: frame.ref_slot,
            });
        }

        let current_slot = self.schedule.chain().slot_at(now);
        if current_slot > frame.report_processing_deadline_slot {
            return Err(ConsensusError::StaleReport {
                deadline_slot: frame.report_processing_deadline_slot,
            });
        }
        if self.schedule.in_fast_lane_window(&frame, current_slot)
            && !self.members.is_fast_lane(index, frame.index, self.quorum)
        {
            return Err(ConsensusError::NonFastLaneMemberCannotReportWithinFastLaneInterval);
        }
        if report.is_zero() {
            return Err(ConsensusError::EmptyReport);
        }

        let prev = *self.members.state_at(index);

        if self.processor.is_processing(ref_slot) {
            // Late votes are still recorded but can no longer move consensus
            if prev.last_report_ref_slot == ref_slot {
                return Err(ConsensusError::ConsensusReportAlreadyProcessing);
            }
            self.record_report(index, sender, ref_slot, report);
            return Ok(());
        }

        if prev.last_report_ref_slot == ref_slot && prev.last_report_hash == report {
            return Err(ConsensusError::DuplicateReport);
        }

        self.record_report(index, sender, ref_slot, report);
        self.check_consensus()
    }

    fn record_report(&mut self, index: usize, member: &Address, ref_slot: u64, report: Hash) {
        self.members.record_report(index, ref_slot, report);
        self.tally.record(ref_slot, report);
        debug!("Report {} from {} for ref slot {}", report, member, ref_slot);
        self.emit(ConsensusEvent::ReportReceived {
            ref_slot,
            member: *member,
            report,
        });
    }

    /// Recompute the winner for the current frame and push or withdraw it
    fn check_consensus(&mut self) -> Result<(), ConsensusError> {
        let now = self.clock.now();
        let frame = self.schedule.frame_at(now)?;

        // Past the deadline slot the processor would refuse the report anyway
        if self.schedule.chain().slot_at(now) > frame.report_processing_deadline_slot {
            debug!("Ref slot {} is past its deadline", frame.ref_slot);
            return Ok(());
        }
        if self.processor.is_processing(frame.ref_slot) {
            debug!("Ref slot {} is already processing", frame.ref_slot);
            return Ok(());
        }

        let winner = self.tally.winner(frame.ref_slot, self.quorum, &self.members);
        let prev = self.tally.consensus_for(frame.ref_slot);
        if winner.map(|variant| variant.hash) == prev {
            return Ok(());
        }

        if prev.is_some() {
            self.processor
                .discard_consensus_report(&self.address, frame.ref_slot)
                .map_err(ConsensusError::processor)?;
        }

        match winner {
            Some(variant) => {
                let deadline = self.schedule.deadline_timestamp(&frame);
                self.processor
                    .submit_consensus_report(&self.address, variant.hash, frame.ref_slot, deadline)
                    .map_err(ConsensusError::processor)?;
                self.tally.set_consensus(frame.ref_slot, Some(variant.hash));
                info!(
                    "Consensus reached for ref slot {}: {} with support {}",
                    frame.ref_slot, variant.hash, variant.support
                );
                self.emit(ConsensusEvent::ConsensusReached {
                    ref_slot: frame.ref_slot,
                    report: variant.hash,
                    support: variant.support,
                });
            }
            None => {
                self.tally.set_consensus(frame.ref_slot, None);
                info!("Consensus lost for ref slot {}", frame.ref_slot);
                self.emit(ConsensusEvent::ConsensusLost {
                    ref_slot: frame.ref_slot,
                });
            }
        }
        Ok(())
    }

    // ---- report processor ----

    /// Swap the report processor, returning the previous one.
    ///
    /// A consensus already reached for the current frame is handed to the new
    /// processor unless either processor has started processing it.
    pub fn set_report_processor(&mut self, caller: &Address, processor: P) -> Result<P, ConsensusError> {
        self.access.check_role(Role::ManageReportProcessor, caller)?;

        let new_address = processor.address();
        if new_address.is_zero() {
            return Err(ConsensusError::ReportProcessorCannotBeZero);
        }
        let prev_address = self.processor.address();
        if new_address == prev_address {
            return Err(ConsensusError::NewProcessorCannotBeTheSame);
        }

        let prev_processing = self.processor.last_processing_ref_slot();
        let events_len = self.events.len();
        let prev = std::mem::replace(&mut self.processor, processor);

        info!("Report processor set to {} (was {})", new_address, prev_address);
        self.emit(ConsensusEvent::ReportProcessorSet {
            processor: new_address,
            prev_processor: prev_address,
        });

        if let Err(err) = self.resubmit_consensus(prev_processing) {
            self.processor = prev;
            self.events.truncate(events_len);
            return Err(err);
        }
        Ok(prev)
    }

    fn resubmit_consensus(&mut self, prev_processing: u64) -> Result<(), ConsensusError> {
        let now = self.clock.now();
        if !self.schedule.is_active(now) {
            return Ok(());
        }
        let frame = self.schedule.frame_at(now)?;
        let Some(report) = self.tally.consensus_for(frame.ref_slot) else {
            return Ok(());
        };
        if prev_processing >= frame.ref_slot || self.processor.is_processing(frame.ref_slot) {
            return Ok(());
        }
        if self.schedule.chain().slot_at(now) > frame.report_processing_deadline_slot {
            return Ok(());
        }
        let deadline = self.schedule.deadline_timestamp(&frame);

        self.processor
            .submit_consensus_report(&self.address, report, frame.ref_slot, deadline)
            .map_err(ConsensusError::processor)?;
        info!(
            "Resubmitted consensus {} for ref slot {} to new processor",
            report, frame.ref_slot
        );
        Ok(())
    }

    // ---- queries ----

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn chain_config(&self) -> &ChainConfig {
        self.schedule.chain()
    }

    pub fn frame_config(&self) -> &FrameConfig {
        self.schedule.config()
    }

    pub fn current_frame(&self) -> Result<ConsensusFrame, ConsensusError> {
        self.schedule.frame_at(self.clock.now())
    }

    /// Reference slot of the first frame; available before activation
    pub fn initial_ref_slot(&self) -> u64 {
        self.schedule.initial_frame().ref_slot
    }

    pub fn quorum(&self) -> u64 {
        self.quorum
    }

    pub fn members(&self) -> &MemberSet {
        &self.members
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    pub fn fast_lane_members(&self) -> Result<Vec<Address>, ConsensusError> {
        let frame = self.current_frame()?;
        Ok(self.members.fast_lane_members(frame.index, self.quorum))
    }

    pub fn is_fast_lane_member(&self, address: &Address) -> Result<bool, ConsensusError> {
        let frame = self.current_frame()?;
        Ok(self
            .members
            .index_of(address)
            .map(|index| self.members.is_fast_lane(index, frame.index, self.quorum))
            .unwrap_or(false))
    }

    pub fn consensus_version(&self) -> u64 {
        self.processor.consensus_version()
    }

    pub fn consensus_state(&self) -> Result<ConsensusState, ConsensusError> {
        let frame = self.current_frame()?;
        Ok(ConsensusState {
            ref_slot: frame.ref_slot,
            consensus_report: self.current_winner(&frame),
            is_report_processing: self.processor.is_processing(frame.ref_slot),
        })
    }

    pub fn consensus_state_for_member(
        &self,
        member: &Address,
    ) -> Result<MemberConsensusState, ConsensusError> {
        let now = self.clock.now();
        let frame = self.schedule.frame_at(now)?;
        let mut state = MemberConsensusState {
            current_frame_ref_slot: frame.ref_slot,
            current_frame_consensus_report: self.current_winner(&frame),
            is_member: false,
            is_fast_lane: false,
            can_report: false,
            last_member_report_ref_slot: 0,
            current_frame_member_report: Hash::ZERO,
        };

        let Some(index) = self.members.index_of(member) else {
            return Ok(state);
        };
        let member_state = self.members.state_at(index);
        let slot = self.schedule.chain().slot_at(now);

        state.is_member = true;
        state.is_fast_lane = self.members.is_fast_lane(index, frame.index, self.quorum);
        state.last_member_report_ref_slot = member_state.last_report_ref_slot;
        if member_state.last_report_ref_slot == frame.ref_slot {
            state.current_frame_member_report = member_state.last_report_hash;
        }
        state.can_report = slot <= frame.report_processing_deadline_slot
            && !self.processor.is_processing(frame.ref_slot)
            && (state.is_fast_lane || !self.schedule.in_fast_lane_window(&frame, slot));
        Ok(state)
    }

    pub fn report_variants(&self) -> Result<Vec<ReportVariant>, ConsensusError> {
        let frame = self.current_frame()?;
        Ok(self.tally.variants(frame.ref_slot, &self.members))
    }

    fn current_winner(&self, frame: &ConsensusFrame) -> Hash {
        self.tally
            .winner(frame.ref_slot, self.quorum, &self.members)
            .map(|variant| variant.hash)
            .unwrap_or(Hash::ZERO)
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ---- events ----

    pub fn events(&self) -> &[ConsensusEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ConsensusEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: ConsensusEvent) {
        self.events.push(event);
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            schedule: self.schedule.clone(),
            members: self.members.clone(),
            quorum: self.quorum,
            tally: self.tally.clone(),
            access: self.access.clone(),
            events_len: self.events.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.schedule = snapshot.schedule;
        self.members = snapshot.members;
        self.quorum = snapshot.quorum;
        self.tally = snapshot.tally;
        self.access = snapshot.access;
        self.events.truncate(snapshot.events_len);
    }

    /// Run `op`, rolling back engine state if it fails
    fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, ConsensusError>,
    ) -> Result<T, ConsensusError> {
        let snapshot = self.snapshot();
        let result = op(self);
        if result.is_err() {
            debug!("Rolling back failed consensus operation");
            self.restore(snapshot);
        }
        result
    }
}
