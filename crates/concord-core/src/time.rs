use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Beacon chain time grid
///
/// Pure conversion between wall-clock seconds and (epoch, slot). Times before
/// genesis map to slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    pub genesis_time: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            slots_per_epoch: 32,
            seconds_per_slot: 12,
            genesis_time: 1_606_824_023, // mainnet beacon chain genesis
        }
    }
}

impl ChainConfig {
    pub fn new(
        slots_per_epoch: u64,
        seconds_per_slot: u64,
        genesis_time: u64,
    ) -> Result<Self, CoreError> {
        let config = ChainConfig {
            slots_per_epoch,
            seconds_per_slot,
            genesis_time,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.slots_per_epoch == 0 {
            return Err(CoreError::InvalidChainConfig(
                "slots per epoch cannot be zero".into(),
            ));
        }
        if self.seconds_per_slot == 0 {
            return Err(CoreError::InvalidChainConfig(
                "seconds per slot cannot be zero".into(),
            ));
        }
        Ok(())
    }

    pub fn slot_at(&self, timestamp: u64) -> u64 {
        timestamp.saturating_sub(self.genesis_time) / self.seconds_per_slot
    }

    pub fn epoch_at(&self, timestamp: u64) -> u64 {
        self.slot_at(timestamp) / self.slots_per_epoch
    }

    pub fn epoch_first_slot(&self, epoch: u64) -> u64 {
        epoch.saturating_mul(self.slots_per_epoch)
    }

    pub fn timestamp_at_slot(&self, slot: u64) -> u64 {
        self.genesis_time
            .saturating_add(slot.saturating_mul(self.seconds_per_slot))
    }

    pub fn timestamp_at_epoch(&self, epoch: u64) -> u64 {
        self.timestamp_at_slot(self.epoch_first_slot(epoch))
    }

    /// The last epoch representable by a `u64` timestamp
    pub fn far_future_epoch(&self) -> u64 {
        self.epoch_at(u64::MAX)
    }
}
