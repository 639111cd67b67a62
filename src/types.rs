//! Shared primitive types
//!
//! The coordinator is chain-agnostic: chains are opaque numeric ids and
//! accounts are opaque chain-local address strings. Nothing in the core
//! interprets their contents.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Numeric chain identifier
pub type ChainId = u64;

/// Chain-local account or contract address, treated as opaque text
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(pub String);

impl Account {
    pub fn new(s: impl Into<String>) -> Self {
        Account(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Account({})", self.0)
    }
}

impl From<&str> for Account {
    fn from(s: &str) -> Self {
        Account(s.to_string())
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
