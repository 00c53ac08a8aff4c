use thiserror::Error;

use crate::access::Role;
use crate::types::Address;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid address")]
    InvalidAddress,

    #[error("Invalid hash length")]
    InvalidHashLength,

    #[error("Invalid chain config: {0}")]
    InvalidChainConfig(String),

    #[error("Account {account} is missing role {role}")]
    MissingRole { account: Address, role: Role },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
