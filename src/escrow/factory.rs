//! Escrow factory with deterministic identities
//!
//! The factory's load-bearing guarantee: identical [`Immutables`] always
//! yield the identical escrow identity, computed by anyone, before the
//! escrow exists. A maker can therefore pre-approve the transfer target and
//! the resolver can pre-verify what will be deployed. The identity is the
//! keccak-256 digest of the canonical immutable encoding (timelock stage
//! offsets included, deployment anchor excluded).

use super::timelocks::{validate_cross_chain_ordering, Timelocks};
use super::{Escrow, EscrowSide, EscrowStatus, Payout};
use crate::error::{SwapError, SwapResult};
use crate::hashlock::Hashlock;
use crate::ledger::{IntentVerifier, SignedIntent, TokenLedger};
use crate::types::{Account, ChainId};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Deterministic escrow identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EscrowId(pub [u8; 32]);

impl EscrowId {
    /// Pure function of the immutables; stable across callers and chains.
    pub fn compute(immutables: &Immutables) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(immutables.order_hash);
        hasher.update(immutables.hashlock.0);
        hasher.update(immutables.maker.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(immutables.taker.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(immutables.chain_id.to_le_bytes());
        hasher.update(immutables.token.as_bytes());
        hasher.update([0u8]);
        hasher.update(immutables.amount.to_le_bytes());
        hasher.update(immutables.safety_deposit.to_le_bytes());
        for offset in immutables.timelocks.offsets() {
            hasher.update(offset.to_le_bytes());
        }
        hasher.update([match immutables.side {
            EscrowSide::Source => 0u8,
            EscrowSide::Destination => 1u8,
        }]);
        EscrowId(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x")).ok()?;
        bytes.try_into().ok().map(EscrowId)
    }

    /// Chain-local account the escrow's funds live under
    pub fn account(&self) -> Account {
        Account(format!("escrow:{}", self.to_hex()))
    }
}

impl std::fmt::Debug for EscrowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Display for EscrowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Write-once parameter set an escrow is instantiated from. Any mutation
/// would break the deterministic-identity guarantee, so fields are set once
/// at agreement time and never touched again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Immutables {
    pub order_hash: [u8; 32],
    pub hashlock: Hashlock,
    pub maker: Account,
    /// The resolver bound to this swap
    pub taker: Account,
    pub chain_id: ChainId,
    pub token: String,
    pub amount: u128,
    pub safety_deposit: u128,
    pub timelocks: Timelocks,
    pub side: EscrowSide,
}

/// Per-chain escrow factory and registry
///
/// Each chain's runtime serializes calls against its own state, so one
/// factory guards one chain's escrows behind a single async lock.
pub struct EscrowFactory {
    chain_id: ChainId,
    escrows: RwLock<HashMap<EscrowId, Escrow>>,
    ledger: Arc<dyn TokenLedger>,
    verifier: Arc<dyn IntentVerifier>,
}

impl EscrowFactory {
    pub fn new(
        chain_id: ChainId,
        ledger: Arc<dyn TokenLedger>,
        verifier: Arc<dyn IntentVerifier>,
    ) -> Self {
        Self {
            chain_id,
            escrows: RwLock::new(HashMap::new()),
            ledger,
            verifier,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Compute the future identity of an escrow without deploying it
    pub fn compute_escrow_identity(immutables: &Immutables) -> EscrowId {
        EscrowId::compute(immutables)
    }

    /// Create the source-side escrow: verify the maker's signed intent,
    /// pull the maker's funds and the resolver's safety deposit to the
    /// pre-computed identity, then instantiate the escrow there.
    pub async fn create_src_escrow(
        &self,
        immutables: Immutables,
        intent: &SignedIntent,
        now: u64,
    ) -> SwapResult<EscrowId> {
        self.validate_immutables(&immutables, EscrowSide::Source)?;

        if !self.verifier.verify(intent, &immutables.maker).await? {
            return Err(SwapError::SignatureInvalid {
                maker: immutables.maker.to_string(),
            });
        }

        let id = EscrowId::compute(&immutables);
        // Lock held across check, transfer, and insert so a concurrent
        // replay cannot double-fund the same identity
        let mut escrows = self.escrows.write().await;
        if escrows.contains_key(&id) {
            // Idempotent re-creation at the same identity
            return Ok(id);
        }

        // Maker funds the amount, the resolver posts the deposit. The
        // deposit moves first: if the maker's transfer then fails it is
        // unwound, so no funds are ever left at an account no escrow
        // governs.
        self.ledger
            .transfer(
                self.chain_id,
                &immutables.token,
                &immutables.taker,
                &id.account(),
                immutables.safety_deposit,
            )
            .await?;
        if let Err(e) = self
            .ledger
            .transfer(
                self.chain_id,
                &immutables.token,
                &immutables.maker,
                &id.account(),
                immutables.amount,
            )
            .await
        {
            if let Err(refund) = self
                .ledger
                .transfer(
                    self.chain_id,
                    &immutables.token,
                    &id.account(),
                    &immutables.taker,
                    immutables.safety_deposit,
                )
                .await
            {
                warn!(escrow_id = %id, "deposit unwind failed: {}", refund);
            }
            return Err(e);
        }

        let mut immutables = immutables;
        immutables.timelocks = immutables.timelocks.anchored_at(now);
        self.instantiate(&mut escrows, id, immutables, now)
    }

    /// Create the destination-side escrow: the resolver supplies both the
    /// amount and the safety deposit. Rejected outright if this escrow's
    /// cancellation stage would resolve at or after the source side's
    /// cancellation deadline - the resolver's side must always unwind first.
    pub async fn create_dst_escrow(
        &self,
        immutables: Immutables,
        src_cancellation_deadline: u64,
        now: u64,
    ) -> SwapResult<EscrowId> {
        self.validate_immutables(&immutables, EscrowSide::Destination)?;

        let anchored = immutables.timelocks.anchored_at(now);
        validate_cross_chain_ordering(&anchored, src_cancellation_deadline)?;

        let id = EscrowId::compute(&immutables);
        let mut escrows = self.escrows.write().await;
        if escrows.contains_key(&id) {
            return Ok(id);
        }

        let total = immutables
            .amount
            .checked_add(immutables.safety_deposit)
            .ok_or_else(|| {
                SwapError::InvalidAmount("amount plus safety deposit overflows".into())
            })?;
        self.ledger
            .transfer(
                self.chain_id,
                &immutables.token,
                &immutables.taker,
                &id.account(),
                total,
            )
            .await?;

        let mut immutables = immutables;
        immutables.timelocks = anchored;
        self.instantiate(&mut escrows, id, immutables, now)
    }

    fn instantiate(
        &self,
        escrows: &mut HashMap<EscrowId, Escrow>,
        id: EscrowId,
        immutables: Immutables,
        now: u64,
    ) -> SwapResult<EscrowId> {
        // Re-derive from what is actually being deployed. Divergence here
        // means the immutables were altered between identity computation and
        // deployment; fatal, never coerced.
        let deployed = EscrowId::compute(&immutables);
        if deployed != id {
            return Err(SwapError::IdentityMismatch {
                computed: id.to_hex(),
                deployed: deployed.to_hex(),
            });
        }

        let escrow = Escrow::new(id, immutables, now);
        info!(
            escrow_id = %id,
            chain_id = self.chain_id,
            side = escrow.immutables.side.name(),
            "escrow instantiated"
        );
        escrows.insert(id, escrow);
        Ok(id)
    }

    fn validate_immutables(&self, immutables: &Immutables, side: EscrowSide) -> SwapResult<()> {
        if immutables.chain_id != self.chain_id {
            return Err(SwapError::Config(format!(
                "immutables target chain {} but factory serves chain {}",
                immutables.chain_id, self.chain_id
            )));
        }
        if immutables.side != side {
            return Err(SwapError::Config(format!(
                "expected {} escrow immutables, got {}",
                side.name(),
                immutables.side.name()
            )));
        }
        if immutables.amount == 0 {
            return Err(SwapError::InvalidAmount("escrow amount must be non-zero".into()));
        }
        if immutables.safety_deposit == 0 {
            return Err(SwapError::InvalidAmount(
                "safety deposit must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Withdraw with the secret. State is committed only after the payout
    /// transfers succeed; a failed transfer leaves the escrow untouched.
    pub async fn withdraw(
        &self,
        escrow_id: EscrowId,
        caller: &Account,
        secret: &[u8],
        now: u64,
    ) -> SwapResult<Payout> {
        self.resolve(escrow_id, |escrow| escrow.withdraw(caller, secret, now))
            .await
    }

    /// Permissionless withdrawal once the public window opens
    pub async fn public_withdraw(
        &self,
        escrow_id: EscrowId,
        caller: &Account,
        secret: &[u8],
        now: u64,
    ) -> SwapResult<Payout> {
        self.resolve(escrow_id, |escrow| escrow.public_withdraw(caller, secret, now))
            .await
    }

    /// Cancel and return funds to the depositor
    pub async fn cancel(
        &self,
        escrow_id: EscrowId,
        caller: &Account,
        now: u64,
    ) -> SwapResult<Payout> {
        self.resolve(escrow_id, |escrow| escrow.cancel(caller, now)).await
    }

    /// Run a terminal transition on a working copy, execute its payouts,
    /// then commit. The registry lock is held throughout so concurrent
    /// callers observe either the old state or the committed one.
    async fn resolve<F>(&self, escrow_id: EscrowId, op: F) -> SwapResult<Payout>
    where
        F: FnOnce(&mut Escrow) -> SwapResult<Payout>,
    {
        let mut escrows = self.escrows.write().await;
        let escrow = escrows
            .get(&escrow_id)
            .ok_or(SwapError::EscrowNotFound {
                escrow_id: escrow_id.to_hex(),
            })?;

        let mut working = escrow.clone();
        let mut payout = op(&mut working)?;

        let source = escrow_id.account();
        self.ledger
            .transfer(
                self.chain_id,
                &payout.token,
                &source,
                &payout.amount_to,
                payout.amount,
            )
            .await?;
        if let Err(e) = self
            .ledger
            .transfer(
                self.chain_id,
                &payout.token,
                &source,
                &payout.deposit_to,
                payout.safety_deposit,
            )
            .await
        {
            // The amount already moved; surface the deposit failure in the
            // payout instead of rolling the escrow back into a
            // double-spendable state. The deposit stays at the escrow
            // account until the caller retries.
            warn!(escrow_id = %escrow_id, "safety deposit payout failed: {}", e);
            payout.deposit_paid = false;
        }

        info!(
            escrow_id = %escrow_id,
            status = working.status.name(),
            caller = %payout.deposit_to,
            "escrow resolved"
        );
        escrows.insert(escrow_id, working);
        Ok(payout)
    }

    pub async fn get_escrow(&self, escrow_id: EscrowId) -> Option<Escrow> {
        self.escrows.read().await.get(&escrow_id).cloned()
    }

    pub async fn list_escrows(&self) -> Vec<Escrow> {
        self.escrows.read().await.values().cloned().collect()
    }

    pub async fn active_count(&self) -> usize {
        self.escrows
            .read()
            .await
            .values()
            .filter(|e| e.status == EscrowStatus::Active)
            .count()
    }

    /// Restore a persisted escrow into the registry on startup
    pub async fn restore(&self, escrow: Escrow) {
        self.escrows.write().await.insert(escrow.id, escrow);
    }
}
