//! Concord Node - Configuration, scenario replay and frame watching
//!
//! Wires a [`concord_consensus::HashConsensus`] to a
//! [`concord_oracle::BaseOracle`] in one process, driven either by a manual
//! clock (scenario replay) or the system clock (watch).

pub mod config;
pub mod node;
pub mod simulator;

pub use config::{generate_sample_config, NodeConfig};
pub use node::{Engine, NodeError, NodeEvent, OracleNode};
pub use simulator::{run_scenario, RejectedStep, Scenario, SimulationReport, Step};
