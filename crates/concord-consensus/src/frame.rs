use concord_core::ChainConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConsensusError;

/// Frame layout parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub initial_epoch: u64,
    pub epochs_per_frame: u64,
    pub fast_lane_length_slots: u64,
}

/// A reporting frame
///
/// Members report the state as of `ref_slot`, the last slot before the frame
/// starts. Reports are accepted until `report_processing_deadline_slot`, the
/// last slot of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusFrame {
    pub index: u64,
    pub ref_slot: u64,
    pub report_processing_deadline_slot: u64,
}

/// What a frame reconfiguration actually changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameConfigChange {
    pub frame_config_changed: bool,
    pub fast_lane_changed: bool,
}

/// Maps wall-clock time to frames
#[derive(Debug, Clone)]
pub struct FrameSchedule {
    chain: ChainConfig,
    config: FrameConfig,
}

impl FrameSchedule {
    /// Create a schedule whose initial epoch lies in the far future
    pub fn new(
        chain: ChainConfig,
        epochs_per_frame: u64,
        fast_lane_length_slots: u64,
    ) -> Result<Self, ConsensusError> {
        chain.validate()?;
        validate_frame_config(&chain, epochs_per_frame, fast_lane_length_slots)?;
        Ok(FrameSchedule {
            config: FrameConfig {
                initial_epoch: chain.far_future_epoch(),
                epochs_per_frame,
                fast_lane_length_slots,
            },
            chain,
        })
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn slots_per_frame(&self) -> u64 {
        self.config
            .epochs_per_frame
            .saturating_mul(self.chain.slots_per_epoch)
    }

    /// Whether the initial epoch has arrived at `timestamp`
    pub fn is_active(&self, timestamp: u64) -> bool {
        self.chain.epoch_at(timestamp) >= self.config.initial_epoch
    }

    pub fn frame_at(&self, timestamp: u64) -> Result<ConsensusFrame, ConsensusError> {
        let index = self.frame_index_at(timestamp)?;
        Ok(self.frame_at_index(index))
    }

    pub fn frame_index_at(&self, timestamp: u64) -> Result<u64, ConsensusError> {
        let epoch = self.chain.epoch_at(timestamp);
        if epoch < self.config.initial_epoch {
            return Err(ConsensusError::InitialEpochIsYetToArrive);
        }
        Ok((epoch - self.config.initial_epoch) / self.config.epochs_per_frame)
    }

    pub fn frame_at_index(&self, index: u64) -> ConsensusFrame {
        let start_epoch = self.frame_start_epoch(index);
        let start_slot = self.chain.epoch_first_slot(start_epoch);
        let next_start_slot = start_slot.saturating_add(self.slots_per_frame());
        ConsensusFrame {
            index,
            ref_slot: start_slot.saturating_sub(1),
            report_processing_deadline_slot: next_start_slot.saturating_sub(1),
        }
    }

    /// The frame starting at the initial epoch
    pub fn initial_frame(&self) -> ConsensusFrame {
        self.frame_at_index(0)
    }

    fn frame_start_epoch(&self, index: u64) -> u64 {
        self.config
            .initial_epoch
            .saturating_add(index.saturating_mul(self.config.epochs_per_frame))
    }

    /// Wall-clock time of the frame's deadline slot
    pub fn deadline_timestamp(&self, frame: &ConsensusFrame) -> u64 {
        self.chain
            .timestamp_at_slot(frame.report_processing_deadline_slot)
    }

    /// Whether `slot` falls in the frame's fast lane window
    pub fn in_fast_lane_window(&self, frame: &ConsensusFrame, slot: u64) -> bool {
        slot <= frame
            .ref_slot
            .saturating_add(self.config.fast_lane_length_slots)
    }

    /// Move a not yet arrived initial epoch. Returns whether it changed.
    ///
    /// The new epoch may already be in the past, which activates the
    /// schedule immediately.
    pub fn set_initial_epoch(
        &mut self,
        timestamp: u64,
        initial_epoch: u64,
    ) -> Result<bool, ConsensusError> {
        if initial_epoch == 0 {
            return Err(ConsensusError::InitialEpochCannotBeZero);
        }
        let current_epoch = self.chain.epoch_at(timestamp);
        if current_epoch >= self.config.initial_epoch {
            return Err(ConsensusError::InitialEpochAlreadyArrived);
        }
        let changed = initial_epoch != self.config.initial_epoch;
        self.config.initial_epoch = initial_epoch;
        Ok(changed)
    }

    /// Change the frame size and fast lane length.
    ///
    /// The new layout is anchored at the start epoch of the frame current
    /// under the old layout, so the ongoing frame keeps its reference slot.
    pub fn reconfigure(
        &mut self,
        timestamp: u64,
        epochs_per_frame: u64,
        fast_lane_length_slots: u64,
    ) -> Result<FrameConfigChange, ConsensusError> {
        validate_frame_config(&self.chain, epochs_per_frame, fast_lane_length_slots)?;
        let index = self.frame_index_at(timestamp)?;
        let initial_epoch = self.frame_start_epoch(index);

        let change = FrameConfigChange {
            frame_config_changed: initial_epoch != self.config.initial_epoch
                || epochs_per_frame != self.config.epochs_per_frame,
            fast_lane_changed: fast_lane_length_slots != self.config.fast_lane_length_slots,
        };
        self.config = FrameConfig {
            initial_epoch,
            epochs_per_frame,
            fast_lane_length_slots,
        };
        Ok(change)
    }

    /// Returns whether the fast lane length changed
    pub fn set_fast_lane_length_slots(
        &mut self,
        fast_lane_length_slots: u64,
    ) -> Result<bool, ConsensusError> {
        validate_frame_config(
            &self.chain,
            self.config.epochs_per_frame,
            fast_lane_length_slots,
        )?;
        let changed = fast_lane_length_slots != self.config.fast_lane_length_slots;
        self.config.fast_lane_length_slots = fast_lane_length_slots;
        Ok(changed)
    }
}

fn validate_frame_config(
    chain: &ChainConfig,
    epochs_per_frame: u64,
    fast_lane_length_slots: u64,
) -> Result<(), ConsensusError> {
    if epochs_per_frame == 0 {
        return Err(ConsensusError::EpochsPerFrameCannotBeZero);
    }
    if fast_lane_length_slots > epochs_per_frame.saturating_mul(chain.slots_per_epoch) {
        return Err(ConsensusError::FastLanePeriodCannotBeLongerThanFrame);
    }
    Ok(())
}
