//! Hashlock primitives for HTLC escrows
//!
//! A hashlock is a SHA-256 commitment to a secret preimage chosen by the
//! maker. Both escrows of a swap share the same hashlock; revealing the
//! preimage on either chain unlocks both.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 commitment to a secret preimage
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hashlock(pub [u8; 32]);

impl Hashlock {
    /// Commit to a secret preimage
    pub fn commit(secret: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret);
        Hashlock(hasher.finalize().into())
    }

    /// Check whether a preimage opens this hashlock
    pub fn verify(&self, secret: &[u8]) -> bool {
        Hashlock::commit(secret) == *self
    }

    /// Parse from a 64-character hex string
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Hashlock(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for Hashlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hashlock({})", self.to_hex())
    }
}

impl std::fmt::Display for Hashlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
