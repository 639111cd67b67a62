//! Timelock stages for HTLC escrows
//!
//! Every escrow moves through a fixed sequence of time windows measured from
//! its deployment timestamp:
//!
//! ```text
//! deployed_at .. withdrawal        : finality lock, no action possible
//! withdrawal .. public_withdrawal  : designated taker may withdraw
//! public_withdrawal .. cancellation: anyone may withdraw for the reward
//! cancellation .. public_cancel    : depositor may cancel
//! public_cancel ..                 : anyone may cancel for the reward
//! ```
//!
//! All windows are half-open `[start, next_start)`; an action attempted
//! exactly at a stage boundary belongs to the later stage.

use crate::error::{SwapError, SwapResult};
use serde::{Deserialize, Serialize};

/// Stage offsets in seconds from the escrow deployment timestamp.
///
/// Construction enforces `withdrawal < public_withdrawal < cancellation <
/// public_cancellation` and that the finality buffer fits inside the
/// pre-withdrawal window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timelocks {
    deployed_at: u64,
    finality_lock: u32,
    withdrawal: u32,
    public_withdrawal: u32,
    cancellation: u32,
    public_cancellation: u32,
}

/// The window an escrow is currently in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    FinalityLock,
    Withdrawal,
    PublicWithdrawal,
    Cancellation,
    PublicCancellation,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::FinalityLock => "finality_lock",
            Stage::Withdrawal => "withdrawal",
            Stage::PublicWithdrawal => "public_withdrawal",
            Stage::Cancellation => "cancellation",
            Stage::PublicCancellation => "public_cancellation",
        }
    }
}

/// Stage plus time remaining, for status queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimelockStatus {
    pub stage: &'static str,
    /// Seconds until the next stage opens; `None` in the final stage
    pub remaining: Option<u64>,
}

impl Timelocks {
    pub fn new(
        deployed_at: u64,
        finality_lock: u32,
        withdrawal: u32,
        public_withdrawal: u32,
        cancellation: u32,
        public_cancellation: u32,
    ) -> SwapResult<Self> {
        if !(withdrawal < public_withdrawal
            && public_withdrawal < cancellation
            && cancellation < public_cancellation)
        {
            return Err(SwapError::InvalidTimelocks(format!(
                "stage offsets must be strictly increasing: {} < {} < {} < {} violated",
                withdrawal, public_withdrawal, cancellation, public_cancellation
            )));
        }
        if finality_lock > withdrawal {
            return Err(SwapError::InvalidTimelocks(format!(
                "finality lock {} exceeds withdrawal offset {}",
                finality_lock, withdrawal
            )));
        }
        Ok(Self {
            deployed_at,
            finality_lock,
            withdrawal,
            public_withdrawal,
            cancellation,
            public_cancellation,
        })
    }

    /// Re-anchor the same offsets at a different deployment timestamp.
    /// Used when the factory instantiates an escrow whose parameters were
    /// agreed before deployment.
    pub fn anchored_at(&self, deployed_at: u64) -> Self {
        Self { deployed_at, ..*self }
    }

    pub fn deployed_at(&self) -> u64 {
        self.deployed_at
    }

    /// Raw stage offsets in declaration order, excluding the deployment
    /// anchor. This is what the deterministic escrow identity hashes over:
    /// the anchor is only fixed at deployment and must not perturb the
    /// identity both parties pre-computed.
    pub fn offsets(&self) -> [u32; 5] {
        [
            self.finality_lock,
            self.withdrawal,
            self.public_withdrawal,
            self.cancellation,
            self.public_cancellation,
        ]
    }

    pub fn withdrawal_at(&self) -> u64 {
        self.deployed_at + self.withdrawal as u64
    }

    pub fn public_withdrawal_at(&self) -> u64 {
        self.deployed_at + self.public_withdrawal as u64
    }

    pub fn cancellation_at(&self) -> u64 {
        self.deployed_at + self.cancellation as u64
    }

    pub fn public_cancellation_at(&self) -> u64 {
        self.deployed_at + self.public_cancellation as u64
    }

    /// Determine the active stage at `now` (half-open windows)
    pub fn stage_at(&self, now: u64) -> Stage {
        if now >= self.public_cancellation_at() {
            Stage::PublicCancellation
        } else if now >= self.cancellation_at() {
            Stage::Cancellation
        } else if now >= self.public_withdrawal_at() {
            Stage::PublicWithdrawal
        } else if now >= self.withdrawal_at() {
            Stage::Withdrawal
        } else {
            Stage::FinalityLock
        }
    }

    /// Stage and remaining time, for monitoring
    pub fn status(&self, now: u64) -> TimelockStatus {
        let stage = self.stage_at(now);
        let next_start = match stage {
            Stage::FinalityLock => Some(self.withdrawal_at()),
            Stage::Withdrawal => Some(self.public_withdrawal_at()),
            Stage::PublicWithdrawal => Some(self.cancellation_at()),
            Stage::Cancellation => Some(self.public_cancellation_at()),
            Stage::PublicCancellation => None,
        };
        TimelockStatus {
            stage: stage.name(),
            remaining: next_start.map(|s| s.saturating_sub(now)),
        }
    }
}

/// The single most important cross-chain safety check: the destination
/// escrow must become cancellable strictly before the source side does, so
/// the resolver's funds always unwind first.
pub fn validate_cross_chain_ordering(
    dst: &Timelocks,
    src_cancellation_deadline: u64,
) -> SwapResult<()> {
    if dst.cancellation_at() >= src_cancellation_deadline {
        return Err(SwapError::InvalidCreationTime {
            dst_cancellation: dst.cancellation_at(),
            src_deadline: src_cancellation_deadline,
        });
    }
    Ok(())
}
