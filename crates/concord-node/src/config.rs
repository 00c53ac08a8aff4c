use std::path::Path;

use anyhow::Result;
use concord_core::serialize::{from_json, to_json_pretty};
use concord_core::{Address, ChainConfig};
use serde::{Deserialize, Serialize};

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Beacon chain time grid
    pub chain: ChainConfig,

    /// Frame length in epochs
    pub epochs_per_frame: u64,

    /// Slots after the ref slot reserved for fast lane members
    pub fast_lane_length_slots: u64,

    /// Epoch the first frame starts at; the engine stays inert when unset
    pub initial_epoch: Option<u64>,

    /// Version members must quote with their reports
    pub consensus_version: u64,

    /// Holder of every administrative role
    pub admin: Address,

    /// Identity of the consensus engine
    pub consensus_address: Address,

    /// Identity of the report processor
    pub oracle_address: Address,

    /// Initial committee, in roster order
    pub members: Vec<Address>,

    pub quorum: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            chain: ChainConfig::default(),
            epochs_per_frame: 225,
            fast_lane_length_slots: 0,
            initial_epoch: None,
            consensus_version: 1,
            admin: Address::from_low_u8(1),
            consensus_address: Address::from_low_u8(2),
            oracle_address: Address::from_low_u8(3),
            members: Vec::new(),
            quorum: 1,
        }
    }
}

impl NodeConfig {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NodeConfig = from_json(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = to_json_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validated chain config
    pub fn to_chain_config(&self) -> Result<ChainConfig> {
        self.chain.validate()?;
        Ok(self.chain)
    }
}

/// Generate a sample configuration with a fresh committee
pub fn generate_sample_config(member_count: usize) -> NodeConfig {
    let members: Vec<Address> = (0..member_count).map(|_| Address::random()).collect();
    NodeConfig {
        initial_epoch: Some(1),
        admin: Address::random(),
        consensus_address: Address::random(),
        oracle_address: Address::random(),
        quorum: member_count as u64 / 2 + 1,
        members,
        ..NodeConfig::default()
    }
}
