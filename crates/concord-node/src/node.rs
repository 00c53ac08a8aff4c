use std::time::Duration;

use concord_consensus::{
    ConsensusError, ConsensusEvent, ConsensusFrame, HashConsensus, HashConsensusConfig,
};
use concord_core::{Address, Clock, CoreError, Role};
use concord_oracle::{BaseOracle, BaseOracleConfig, OracleError, OracleEvent, ReportLog};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::NodeConfig;

/// Consensus engine wired to a logging oracle
pub type Engine<C> = HashConsensus<BaseOracle<ReportLog, C>, C>;

const ENGINE_ROLES: [Role; 5] = [
    Role::ManageMembersAndQuorum,
    Role::DisableConsensus,
    Role::ManageFrameConfig,
    Role::ManageFastLaneConfig,
    Role::ManageReportProcessor,
];

const ORACLE_ROLES: [Role; 2] = [Role::ManageConsensusContract, Role::ManageConsensusVersion];

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

/// An event from either side of the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "event", rename_all = "snake_case")]
pub enum NodeEvent {
    Consensus(ConsensusEvent),
    Oracle(OracleEvent),
}

impl NodeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NodeEvent::Consensus(event) => event.name(),
            NodeEvent::Oracle(event) => event.name(),
        }
    }
}

/// In-process hash consensus engine and oracle sharing one clock
pub struct OracleNode<C: Clock + Clone> {
    admin: Address,
    consensus: Engine<C>,
}

impl<C: Clock + Clone> OracleNode<C> {
    /// Build the engine and oracle, grant every role to the admin, seat the
    /// committee and set the initial epoch when one is configured
    pub fn new(config: &NodeConfig, clock: C) -> Result<Self, NodeError> {
        config.chain.validate()?;

        let oracle = BaseOracle::new(
            BaseOracleConfig {
                address: config.oracle_address,
                consensus_contract: config.consensus_address,
                chain: config.chain,
                consensus_version: config.consensus_version,
                last_processing_ref_slot: 0,
                admin: config.admin,
            },
            ReportLog::new(),
            clock.clone(),
        )?;

        let mut consensus = HashConsensus::new(
            HashConsensusConfig {
                address: config.consensus_address,
                chain: config.chain,
                epochs_per_frame: config.epochs_per_frame,
                fast_lane_length_slots: config.fast_lane_length_slots,
                admin: config.admin,
            },
            oracle,
            clock,
        )?;

        let admin = config.admin;
        for role in ENGINE_ROLES {
            consensus.grant_role(&admin, role, admin)?;
        }
        for role in ORACLE_ROLES {
            consensus.processor_mut().grant_role(&admin, role, admin)?;
        }
        for member in &config.members {
            consensus.add_member(&admin, *member, config.quorum)?;
        }
        if let Some(epoch) = config.initial_epoch {
            consensus.update_initial_epoch(&admin, epoch)?;
        }

        info!(
            "Node ready: {} members, quorum {}, consensus version {}",
            consensus.members().len(),
            consensus.quorum(),
            consensus.consensus_version()
        );

        Ok(OracleNode { admin, consensus })
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn consensus(&self) -> &Engine<C> {
        &self.consensus
    }

    pub fn consensus_mut(&mut self) -> &mut Engine<C> {
        &mut self.consensus
    }

    pub fn oracle(&self) -> &BaseOracle<ReportLog, C> {
        self.consensus.processor()
    }

    /// Begin processing the oracle's pending report
    pub fn start_processing(&mut self) -> Result<u64, NodeError> {
        Ok(self.consensus.processor_mut().start_processing()?)
    }

    /// The current frame, or `None` before the initial epoch
    pub fn current_frame(&self) -> Option<ConsensusFrame> {
        self.consensus.current_frame().ok()
    }

    /// Take and log every event emitted since the last call, engine first
    pub fn drain_events(&mut self) -> Vec<NodeEvent> {
        let mut events: Vec<NodeEvent> = self
            .consensus
            .drain_events()
            .into_iter()
            .map(NodeEvent::Consensus)
            .collect();
        events.extend(
            self.consensus
                .processor_mut()
                .drain_events()
                .into_iter()
                .map(NodeEvent::Oracle),
        );

        for event in &events {
            match event {
                NodeEvent::Oracle(OracleEvent::WarnProcessingMissed { ref_slot }) => {
                    warn!("Report for ref slot {} was never processed", ref_slot);
                }
                _ => info!("Event {}", event.name()),
            }
        }
        events
    }

    /// Poll the clock every `interval` and log frame transitions
    ///
    /// Stops after `max_ticks` ticks when given, or on ctrl-c. Returns the
    /// frames observed, in order.
    pub async fn watch(
        &mut self,
        interval: Duration,
        max_ticks: Option<u64>,
    ) -> Result<Vec<ConsensusFrame>, NodeError> {
        let mut ticker = tokio::time::interval(interval);
        let mut observed: Vec<ConsensusFrame> = Vec::new();
        let mut ticks = 0u64;

        info!("Watching frames every {:?}", interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping watch");
                    break;
                }
            }

            match self.current_frame() {
                Some(frame) if observed.last() != Some(&frame) => {
                    let state = self.consensus.consensus_state()?;
                    info!(
                        "Frame {}: ref slot {}, processing deadline slot {}, consensus {}",
                        frame.index,
                        frame.ref_slot,
                        frame.report_processing_deadline_slot,
                        state.consensus_report
                    );
                    observed.push(frame);
                }
                Some(_) => {}
                None if ticks == 0 => info!("Initial epoch has not arrived yet"),
                None => {}
            }
            self.drain_events();

            ticks += 1;
            if max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
        }

        Ok(observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_core::{ChainConfig, ManualClock};

    fn test_config() -> NodeConfig {
        NodeConfig {
            chain: ChainConfig::new(32, 12, 100).unwrap(),
            epochs_per_frame: 1,
            initial_epoch: Some(1),
            members: vec![
                Address::from_low_u8(11),
                Address::from_low_u8(12),
                Address::from_low_u8(13),
            ],
            quorum: 2,
            ..NodeConfig::default()
        }
    }

    #[test]
    fn test_node_from_config() {
        let clock = ManualClock::new(100 + 384);
        let node = OracleNode::new(&test_config(), clock).unwrap();

        let consensus = node.consensus();
        assert_eq!(consensus.members().len(), 3);
        assert_eq!(consensus.quorum(), 2);
        assert_eq!(consensus.frame_config().initial_epoch, 1);
        assert_eq!(
            consensus.role_members(Role::DisableConsensus),
            vec![*node.admin()]
        );
        assert!(node
            .oracle()
            .has_role(Role::ManageConsensusVersion, node.admin()));
        assert_eq!(node.current_frame().unwrap().ref_slot, 31);
    }

    #[test]
    fn test_node_without_initial_epoch_is_inert() {
        let config = NodeConfig {
            initial_epoch: None,
            ..test_config()
        };
        let node = OracleNode::new(&config, ManualClock::new(100 + 384)).unwrap();
        assert!(node.current_frame().is_none());
    }

    #[test]
    fn test_quorum_below_majority_rejected() {
        let config = NodeConfig {
            quorum: 1,
            ..test_config()
        };
        let result = OracleNode::new(&config, ManualClock::new(100 + 384));
        assert!(matches!(
            result,
            Err(NodeError::Consensus(ConsensusError::QuorumTooSmall { .. }))
        ));
    }

    #[test]
    fn test_drain_events_orders_engine_first() {
        let mut node = OracleNode::new(&test_config(), ManualClock::new(100 + 384)).unwrap();
        let events = node.drain_events();

        let first_oracle = events
            .iter()
            .position(|event| matches!(event, NodeEvent::Oracle(_)))
            .unwrap();
        assert!(events[..first_oracle]
            .iter()
            .all(|event| matches!(event, NodeEvent::Consensus(_))));
        assert_eq!(events[0].name(), "FrameConfigSet");
        assert!(node.drain_events().is_empty());
    }
}
