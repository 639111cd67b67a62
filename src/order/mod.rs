//! Order model and lifecycle rules
//!
//! An order is a maker's intent to exchange `making_amount` of an asset on
//! one chain for `taking_amount` of an asset on another. The coordinator
//! owns the canonical copy; escrows reference it by `order_hash`. Orders
//! are never deleted, terminal orders are retained for audit and stats.

pub mod coordinator;

pub use coordinator::{Coordinator, CoordinatorStats};

use crate::auction::AuctionParams;
use crate::escrow::EscrowId;
use crate::hashlock::Hashlock;
use crate::types::{Account, ChainId};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use uuid::Uuid;

pub type OrderId = Uuid;

/// A chain-qualified token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub chain_id: ChainId,
    pub token: String,
}

/// A maker's account on each side of the swap
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerIdentity {
    pub src_account: Account,
    pub dst_account: Account,
}

/// Which way funds flow relative to the coordinator's home chain. The home
/// chain is the one whose runtime hosts the coordinator; makers there are
/// already authenticated callers and need no separate signed intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Maker's asset is native to the home chain
    Outbound,
    /// Maker's asset lives on a foreign chain; a signed intent must
    /// authorize moving the maker's funds there
    Inbound,
}

impl SwapDirection {
    pub fn name(&self) -> &'static str {
        match self {
            SwapDirection::Outbound => "outbound",
            SwapDirection::Inbound => "inbound",
        }
    }

    /// A signed intent is mandatory exactly when the maker's funds sit on a
    /// chain where the maker is not the coordinator's direct caller.
    pub fn requires_signed_intent(&self) -> bool {
        matches!(self, SwapDirection::Inbound)
    }
}

/// Pure function of the asset chains. Never stored on the order, so the
/// direction and the escrow-creator roles derived from it cannot drift
/// apart.
pub fn direction_of(maker_asset_chain: ChainId, home_chain: ChainId) -> SwapDirection {
    if maker_asset_chain == home_chain {
        SwapDirection::Outbound
    } else {
        SwapDirection::Inbound
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    EscrowsReady,
    Completed,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub fn name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::EscrowsReady => "escrows_ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => OrderStatus::Pending,
            "accepted" => OrderStatus::Accepted,
            "escrows_ready" => OrderStatus::EscrowsReady,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            "failed" => OrderStatus::Failed,
            _ => return None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// Monotone transition table. Terminal states are absorbing and no
    /// state is ever re-entered.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Accepted)
                | (Accepted, EscrowsReady)
                | (EscrowsReady, Completed)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
                | (EscrowsReady, Cancelled)
                | (Accepted, Failed)
                | (EscrowsReady, Failed)
        )
    }
}

/// The coordinator's canonical record of one swap
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub maker: MakerIdentity,
    /// Bound when a resolver accepts; never rebound
    pub resolver: Option<Account>,
    pub maker_asset: Asset,
    pub taker_asset: Asset,
    pub making_amount: u128,
    pub taking_amount: u128,
    pub hashlock: Hashlock,
    pub auction: AuctionParams,
    pub status: OrderStatus,
    pub src_escrow: Option<EscrowId>,
    pub dst_escrow: Option<EscrowId>,
    /// Rate locked in at acceptance, from the auction curve
    pub accepted_rate: Option<u128>,
    /// Hex-encoded preimage, kept after reveal for audit
    pub revealed_secret: Option<String>,
    pub created_at: u64,
    pub expires_at: u64,
    pub updated_at: u64,
}

impl Order {
    /// Keccak digest binding the escrows' immutables to this order
    pub fn order_hash(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(self.id.as_bytes());
        hasher.update(self.maker.src_account.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.maker.dst_account.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.maker_asset.chain_id.to_le_bytes());
        hasher.update(self.maker_asset.token.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.taker_asset.chain_id.to_le_bytes());
        hasher.update(self.taker_asset.token.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.making_amount.to_le_bytes());
        hasher.update(self.taking_amount.to_le_bytes());
        hasher.update(self.hashlock.0);
        hasher.finalize().into()
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Both escrow-created notifications recorded
    pub fn escrows_reported(&self) -> bool {
        self.src_escrow.is_some() && self.dst_escrow.is_some()
    }

    /// The chain the maker's funds leave from
    pub fn src_chain(&self) -> ChainId {
        self.maker_asset.chain_id
    }

    /// The chain the maker receives on
    pub fn dst_chain(&self) -> ChainId {
        self.taker_asset.chain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::RATE_SCALE;

    fn order() -> Order {
        Order {
            id: Uuid::new_v4(),
            maker: MakerIdentity {
                src_account: Account::from("maker-src"),
                dst_account: Account::from("maker-dst"),
            },
            resolver: None,
            maker_asset: Asset {
                chain_id: 1,
                token: "token-a".to_string(),
            },
            taker_asset: Asset {
                chain_id: 2,
                token: "token-b".to_string(),
            },
            making_amount: 1_000_000,
            taking_amount: 500_000,
            hashlock: Hashlock::commit(b"s3cr3t"),
            auction: AuctionParams::new(100, 300, 2 * RATE_SCALE, RATE_SCALE).unwrap(),
            status: OrderStatus::Pending,
            src_escrow: None,
            dst_escrow: None,
            accepted_rate: None,
            revealed_secret: None,
            created_at: 100,
            expires_at: 3700,
            updated_at: 100,
        }
    }

    #[test]
    fn transitions_are_monotone() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Accepted.can_transition_to(EscrowsReady));
        assert!(EscrowsReady.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));

        // No going back, no skipping forward
        assert!(!Accepted.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(EscrowsReady));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Failed));

        // Terminal states absorb
        for terminal in [Completed, Cancelled, Failed] {
            for to in [Pending, Accepted, EscrowsReady, Completed, Cancelled, Failed] {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }

    #[test]
    fn status_names_round_trip() {
        use OrderStatus::*;
        for s in [Pending, Accepted, EscrowsReady, Completed, Cancelled, Failed] {
            assert_eq!(OrderStatus::from_name(s.name()), Some(s));
        }
        assert_eq!(OrderStatus::from_name("bogus"), None);
    }

    #[test]
    fn direction_follows_maker_asset_chain() {
        assert_eq!(direction_of(1, 1), SwapDirection::Outbound);
        assert_eq!(direction_of(2, 1), SwapDirection::Inbound);
        assert!(!SwapDirection::Outbound.requires_signed_intent());
        assert!(SwapDirection::Inbound.requires_signed_intent());
    }

    #[test]
    fn order_hash_binds_amounts() {
        let a = order();
        let mut b = a.clone();
        assert_eq!(a.order_hash(), b.order_hash());
        b.making_amount += 1;
        assert_ne!(a.order_hash(), b.order_hash());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let o = order();
        assert!(!o.is_expired(3699));
        assert!(o.is_expired(3700));
    }
}
