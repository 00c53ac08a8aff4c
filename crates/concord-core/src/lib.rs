//! Concord Core - Primitive types, time grid and serialization
//!
//! This crate provides the foundational types shared by the hash consensus
//! engine and the report processor: fixed-size hashes and addresses, the
//! beacon-chain time grid, injectable clocks and role-based access control.

pub mod access;
pub mod clock;
pub mod error;
pub mod serialize;
pub mod time;
pub mod types;

pub use access::{AccessControl, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CoreError;
pub use time::ChainConfig;
pub use types::{hash_blake3, report_hash, Address, Hash};
