//! Cross-chain identity map
//!
//! Bidirectional lookup between a user's account on the home chain and
//! their account on a foreign chain. Consumed by resolver tooling to route
//! payouts; the swap core itself only surfaces `IdentityNotFound` when a
//! lookup misses.

use crate::error::{SwapError, SwapResult};
use crate::types::{unix_now, Account, ChainId};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One registered account pairing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBinding {
    pub home_account: Account,
    pub foreign_chain: ChainId,
    pub foreign_account: Account,
    pub registered_at: u64,
}

/// In-memory bidirectional registry, keyed both ways. Registration is
/// last-write-wins per direction; re-registering replaces the old binding
/// on both indexes.
#[derive(Default)]
pub struct IdentityMap {
    by_home: DashMap<(Account, ChainId), IdentityBinding>,
    by_foreign: DashMap<(ChainId, Account), IdentityBinding>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        home_account: Account,
        foreign_chain: ChainId,
        foreign_account: Account,
    ) -> IdentityBinding {
        let binding = IdentityBinding {
            home_account: home_account.clone(),
            foreign_chain,
            foreign_account: foreign_account.clone(),
            registered_at: unix_now(),
        };

        // Drop stale reverse entries before inserting the new pair
        if let Some((_, old)) = self.by_home.remove(&(home_account.clone(), foreign_chain)) {
            self.by_foreign.remove(&(foreign_chain, old.foreign_account));
        }
        if let Some((_, old)) = self.by_foreign.remove(&(foreign_chain, foreign_account.clone())) {
            self.by_home.remove(&(old.home_account, foreign_chain));
        }

        info!(
            home = %home_account,
            chain = foreign_chain,
            foreign = %foreign_account,
            "identity registered"
        );
        self.by_home
            .insert((home_account, foreign_chain), binding.clone());
        self.by_foreign
            .insert((foreign_chain, foreign_account), binding.clone());
        binding
    }

    /// Foreign-chain account for a home account
    pub fn resolve(&self, home_account: &Account, foreign_chain: ChainId) -> SwapResult<Account> {
        self.by_home
            .get(&(home_account.clone(), foreign_chain))
            .map(|b| b.foreign_account.clone())
            .ok_or(SwapError::IdentityNotFound {
                id: format!("{}@chain{}", home_account, foreign_chain),
            })
    }

    /// Home account for a foreign-chain account
    pub fn resolve_reverse(
        &self,
        foreign_chain: ChainId,
        foreign_account: &Account,
    ) -> SwapResult<Account> {
        self.by_foreign
            .get(&(foreign_chain, foreign_account.clone()))
            .map(|b| b.home_account.clone())
            .ok_or(SwapError::IdentityNotFound {
                id: format!("chain{}:{}", foreign_chain, foreign_account),
            })
    }

    pub fn len(&self) -> usize {
        self.by_home.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_home.is_empty()
    }
}
