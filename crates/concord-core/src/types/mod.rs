pub mod address;
pub mod hash;

pub use address::Address;
pub use hash::{hash_blake3, report_hash, Hash};

/// Strip an optional `0x` prefix from a hex string
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
