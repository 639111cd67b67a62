//! Escrow state machine
//!
//! An escrow is a single-purpose, chain-local lock over one side's funds.
//! It releases them exactly once, to exactly one party, gated by knowledge
//! of the hashlock preimage and by the current timelock stage. The state
//! machine here is pure: callers pass the current time explicitly and get
//! back a [`Payout`] describing the transfers to execute, so the ledger
//! capability stays at the factory seam.

pub mod factory;
pub mod timelocks;

pub use factory::{EscrowFactory, EscrowId, Immutables};
pub use timelocks::{Stage, TimelockStatus, Timelocks};

use crate::error::{SwapError, SwapResult};
use crate::types::{Account, ChainId};
use serde::{Deserialize, Serialize};

/// Which leg of the swap this escrow locks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowSide {
    Source,
    Destination,
}

impl EscrowSide {
    pub fn name(&self) -> &'static str {
        match self {
            EscrowSide::Source => "source",
            EscrowSide::Destination => "destination",
        }
    }
}

/// Escrow lifecycle - exactly one terminal state is reachable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowStatus {
    Active,
    Withdrawn,
    PublicWithdrawn,
    Cancelled,
}

impl EscrowStatus {
    pub fn name(&self) -> &'static str {
        match self {
            EscrowStatus::Active => "active",
            EscrowStatus::Withdrawn => "withdrawn",
            EscrowStatus::PublicWithdrawn => "public_withdrawn",
            EscrowStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != EscrowStatus::Active
    }
}

/// Transfers owed after a successful terminal transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub chain_id: ChainId,
    pub token: String,
    pub amount: u128,
    pub amount_to: Account,
    pub safety_deposit: u128,
    pub deposit_to: Account,
    /// False when the deposit leg failed to execute; the deposit then
    /// remains claimable at the escrow account and the caller may retry.
    #[serde(default = "default_deposit_paid")]
    pub deposit_paid: bool,
}

fn default_deposit_paid() -> bool {
    true
}

/// Chain-local runtime escrow instantiated from [`Immutables`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Escrow {
    pub id: EscrowId,
    pub immutables: Immutables,
    pub status: EscrowStatus,
    /// Who triggered the terminal transition, for audit
    pub resolved_by: Option<Account>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Escrow {
    pub(crate) fn new(id: EscrowId, immutables: Immutables, now: u64) -> Self {
        Self {
            id,
            immutables,
            status: EscrowStatus::Active,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The party whose funds are locked here: maker on the source leg,
    /// resolver on the destination leg.
    pub fn depositor(&self) -> &Account {
        match self.immutables.side {
            EscrowSide::Source => &self.immutables.maker,
            EscrowSide::Destination => &self.immutables.taker,
        }
    }

    /// The party entitled to withdraw with the secret: resolver on the
    /// source leg, maker on the destination leg.
    pub fn claimant(&self) -> &Account {
        match self.immutables.side {
            EscrowSide::Source => &self.immutables.taker,
            EscrowSide::Destination => &self.immutables.maker,
        }
    }

    /// Current timelock stage
    pub fn stage_at(&self, now: u64) -> Stage {
        self.immutables.timelocks.stage_at(now)
    }

    /// Stage and remaining time, for status queries
    pub fn timelock_status(&self, now: u64) -> TimelockStatus {
        self.immutables.timelocks.status(now)
    }

    /// Withdraw by the designated claimant during the withdrawal windows.
    ///
    /// Transfers the locked amount to the claimant and returns the safety
    /// deposit to the caller as their completion reward.
    pub fn withdraw(&mut self, caller: &Account, secret: &[u8], now: u64) -> SwapResult<Payout> {
        self.ensure_active()?;
        if caller != self.claimant() {
            return Err(SwapError::Unauthorized {
                caller: caller.to_string(),
                role: "claimant".to_string(),
            });
        }
        self.check_withdraw_window(now, Stage::Withdrawal)?;
        self.check_secret(secret)?;

        self.finish(EscrowStatus::Withdrawn, caller, now);
        Ok(self.payout(self.claimant().clone(), caller.clone()))
    }

    /// Withdraw by any caller once the public window opens. The safety
    /// deposit becomes the caller's reward for completing an abandoned swap.
    pub fn public_withdraw(
        &mut self,
        caller: &Account,
        secret: &[u8],
        now: u64,
    ) -> SwapResult<Payout> {
        self.ensure_active()?;
        self.check_withdraw_window(now, Stage::PublicWithdrawal)?;
        self.check_secret(secret)?;

        self.finish(EscrowStatus::PublicWithdrawn, caller, now);
        Ok(self.payout(self.claimant().clone(), caller.clone()))
    }

    /// Cancel after the cancellation stage opens: depositor-only at first,
    /// anyone once the public cancellation window starts. The locked amount
    /// returns to the depositor; the safety deposit rewards the caller.
    pub fn cancel(&mut self, caller: &Account, now: u64) -> SwapResult<Payout> {
        self.ensure_active()?;
        match self.stage_at(now) {
            Stage::PublicCancellation => {}
            Stage::Cancellation => {
                if caller != self.depositor() {
                    return Err(SwapError::Unauthorized {
                        caller: caller.to_string(),
                        role: "depositor".to_string(),
                    });
                }
            }
            _ => {
                return Err(SwapError::StageNotReached {
                    stage: Stage::Cancellation.name().to_string(),
                    opens_at: self.immutables.timelocks.cancellation_at(),
                    now,
                });
            }
        }

        self.finish(EscrowStatus::Cancelled, caller, now);
        Ok(self.payout(self.depositor().clone(), caller.clone()))
    }

    fn ensure_active(&self) -> SwapResult<()> {
        if self.status.is_terminal() {
            return Err(SwapError::EscrowTerminal {
                escrow_id: self.id.to_string(),
                status: self.status.name().to_string(),
            });
        }
        Ok(())
    }

    /// Withdrawals are valid in `[earliest_stage, cancellation)`
    fn check_withdraw_window(&self, now: u64, earliest: Stage) -> SwapResult<()> {
        let opens_at = match earliest {
            Stage::Withdrawal => self.immutables.timelocks.withdrawal_at(),
            Stage::PublicWithdrawal => self.immutables.timelocks.public_withdrawal_at(),
            _ => unreachable!("withdraw windows start at withdrawal stages"),
        };
        if now < opens_at {
            return Err(SwapError::StageNotReached {
                stage: earliest.name().to_string(),
                opens_at,
                now,
            });
        }
        if now >= self.immutables.timelocks.cancellation_at() {
            return Err(SwapError::StageNotReached {
                stage: "withdrawal window closed, cancellation".to_string(),
                opens_at: self.immutables.timelocks.cancellation_at(),
                now,
            });
        }
        Ok(())
    }

    fn check_secret(&self, secret: &[u8]) -> SwapResult<()> {
        if !self.immutables.hashlock.verify(secret) {
            return Err(SwapError::InvalidSecret);
        }
        Ok(())
    }

    fn finish(&mut self, status: EscrowStatus, caller: &Account, now: u64) {
        self.status = status;
        self.resolved_by = Some(caller.clone());
        self.updated_at = now;
    }

    fn payout(&self, amount_to: Account, deposit_to: Account) -> Payout {
        Payout {
            chain_id: self.immutables.chain_id,
            token: self.immutables.token.clone(),
            amount: self.immutables.amount,
            amount_to,
            safety_deposit: self.immutables.safety_deposit,
            deposit_to,
            deposit_paid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashlock::Hashlock;

    const DEPLOYED: u64 = 1_000;

    fn immutables(side: EscrowSide) -> Immutables {
        Immutables {
            order_hash: [7u8; 32],
            hashlock: Hashlock::commit(b"s3cr3t"),
            maker: Account::from("maker-1"),
            taker: Account::from("resolver-1"),
            chain_id: 10,
            token: "token-a".to_string(),
            amount: 1_000_000,
            safety_deposit: 5_000,
            timelocks: Timelocks::new(DEPLOYED, 0, 60, 120, 1800, 3600).unwrap(),
            side,
        }
    }

    fn escrow(side: EscrowSide) -> Escrow {
        let imm = immutables(side);
        let id = EscrowId::compute(&imm);
        Escrow::new(id, imm, DEPLOYED)
    }

    #[test]
    fn roles_follow_side() {
        let src = escrow(EscrowSide::Source);
        assert_eq!(src.depositor(), &Account::from("maker-1"));
        assert_eq!(src.claimant(), &Account::from("resolver-1"));

        let dst = escrow(EscrowSide::Destination);
        assert_eq!(dst.depositor(), &Account::from("resolver-1"));
        assert_eq!(dst.claimant(), &Account::from("maker-1"));
    }

    #[test]
    fn withdraw_happy_path() {
        let mut e = escrow(EscrowSide::Source);
        let payout = e
            .withdraw(&Account::from("resolver-1"), b"s3cr3t", DEPLOYED + 60)
            .unwrap();
        assert_eq!(e.status, EscrowStatus::Withdrawn);
        assert_eq!(payout.amount, 1_000_000);
        assert_eq!(payout.amount_to, Account::from("resolver-1"));
        assert_eq!(payout.deposit_to, Account::from("resolver-1"));
        assert!(payout.deposit_paid);
    }

    #[test]
    fn withdraw_rejects_wrong_secret() {
        let mut e = escrow(EscrowSide::Source);
        let err = e
            .withdraw(&Account::from("resolver-1"), b"wrong", DEPLOYED + 60)
            .unwrap_err();
        assert!(matches!(err, SwapError::InvalidSecret));
        assert_eq!(e.status, EscrowStatus::Active);
    }

    #[test]
    fn withdraw_rejects_wrong_caller() {
        let mut e = escrow(EscrowSide::Source);
        let err = e
            .withdraw(&Account::from("somebody"), b"s3cr3t", DEPLOYED + 60)
            .unwrap_err();
        assert!(matches!(err, SwapError::Unauthorized { .. }));
    }

    #[test]
    fn withdraw_respects_stage_boundaries() {
        let mut e = escrow(EscrowSide::Source);
        // Finality lock still in effect one second before the boundary
        let err = e
            .withdraw(&Account::from("resolver-1"), b"s3cr3t", DEPLOYED + 59)
            .unwrap_err();
        assert!(matches!(err, SwapError::StageNotReached { .. }));

        // Window closes at the cancellation boundary
        let err = e
            .withdraw(&Account::from("resolver-1"), b"s3cr3t", DEPLOYED + 1800)
            .unwrap_err();
        assert!(matches!(err, SwapError::StageNotReached { .. }));

        // Exactly at the withdrawal boundary is allowed
        assert!(e
            .withdraw(&Account::from("resolver-1"), b"s3cr3t", DEPLOYED + 60)
            .is_ok());
    }

    #[test]
    fn public_withdraw_allows_any_caller_and_rewards_them() {
        let mut e = escrow(EscrowSide::Destination);
        let payout = e
            .public_withdraw(&Account::from("good-samaritan"), b"s3cr3t", DEPLOYED + 120)
            .unwrap();
        assert_eq!(e.status, EscrowStatus::PublicWithdrawn);
        // Funds still reach the claimant; only the deposit goes to the caller
        assert_eq!(payout.amount_to, Account::from("maker-1"));
        assert_eq!(payout.deposit_to, Account::from("good-samaritan"));
    }

    #[test]
    fn public_withdraw_before_its_window_fails() {
        let mut e = escrow(EscrowSide::Source);
        let err = e
            .public_withdraw(&Account::from("anyone"), b"s3cr3t", DEPLOYED + 61)
            .unwrap_err();
        assert!(matches!(err, SwapError::StageNotReached { .. }));
    }

    #[test]
    fn cancel_is_depositor_only_until_public_window() {
        let mut e = escrow(EscrowSide::Source);
        let err = e
            .cancel(&Account::from("resolver-1"), DEPLOYED + 1800)
            .unwrap_err();
        assert!(matches!(err, SwapError::Unauthorized { .. }));

        let payout = e.cancel(&Account::from("maker-1"), DEPLOYED + 1800).unwrap();
        assert_eq!(e.status, EscrowStatus::Cancelled);
        assert_eq!(payout.amount_to, Account::from("maker-1"));
        assert_eq!(payout.deposit_to, Account::from("maker-1"));
    }

    #[test]
    fn public_cancel_rewards_any_caller() {
        let mut e = escrow(EscrowSide::Destination);
        let payout = e.cancel(&Account::from("sweeper"), DEPLOYED + 3600).unwrap();
        // Destination depositor is the resolver; it gets its funds back
        assert_eq!(payout.amount_to, Account::from("resolver-1"));
        assert_eq!(payout.deposit_to, Account::from("sweeper"));
    }

    #[test]
    fn cancel_before_window_fails() {
        let mut e = escrow(EscrowSide::Source);
        let err = e.cancel(&Account::from("maker-1"), DEPLOYED + 100).unwrap_err();
        assert!(matches!(err, SwapError::StageNotReached { .. }));
    }

    #[test]
    fn terminal_state_rejects_everything() {
        let mut e = escrow(EscrowSide::Source);
        e.withdraw(&Account::from("resolver-1"), b"s3cr3t", DEPLOYED + 60)
            .unwrap();

        let err = e
            .withdraw(&Account::from("resolver-1"), b"s3cr3t", DEPLOYED + 61)
            .unwrap_err();
        assert!(matches!(err, SwapError::EscrowTerminal { .. }));

        let err = e.cancel(&Account::from("maker-1"), DEPLOYED + 5000).unwrap_err();
        assert!(matches!(err, SwapError::EscrowTerminal { .. }));
    }
}
