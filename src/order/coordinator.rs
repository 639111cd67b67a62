//! Order coordinator
//!
//! The authoritative cross-chain state machine. It never custodies funds;
//! it records facts reported to it (resolver accepted, escrow created,
//! secret revealed) and gates the one strict ordering constraint in the
//! system: the secret is never certified public before both escrow-created
//! notifications are recorded. Every inbound notification is treated as an
//! at-least-once event and handled idempotently.

use super::{
    direction_of, Asset, MakerIdentity, Order, OrderId, OrderStatus, SwapDirection,
};
use crate::auction::{AuctionParams, RATE_SCALE};
use crate::error::{SwapError, SwapResult};
use crate::escrow::EscrowId;
use crate::events::{EventBus, SwapEvent};
use crate::hashlock::Hashlock;
use crate::ledger::{IntentVerifier, SignedIntent};
use crate::types::{Account, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Behavioral limits and defaults, from the `[coordinator]` config section
#[derive(Clone, Debug)]
pub struct OrderPolicy {
    pub home_chain: ChainId,
    pub max_active_orders: usize,
    pub max_expiration_secs: u64,
    /// Empty allowlist means open resolver competition
    pub resolver_allowlist: Vec<String>,
    /// Matched counter-orders are not supported; resolvers fill from
    /// private liquidity. The flag exists so the policy stays visible in
    /// configuration rather than hardcoded.
    pub require_counter_order: bool,
    pub auction_duration_secs: u64,
    /// Opening premium over the implied rate, in basis points
    pub auction_start_premium_bps: u32,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            home_chain: 1,
            max_active_orders: 1_000,
            max_expiration_secs: 7 * 24 * 3600,
            resolver_allowlist: Vec::new(),
            require_counter_order: false,
            auction_duration_secs: 300,
            auction_start_premium_bps: 500,
        }
    }
}

/// Maker submission, validated by [`Coordinator::create_order`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub maker: MakerIdentity,
    pub maker_asset: Asset,
    pub taker_asset: Asset,
    pub making_amount: u128,
    pub taking_amount: u128,
    pub hashlock: Hashlock,
    pub expires_at: u64,
    /// Explicit decay curve; derived from the implied rate when omitted
    pub auction: Option<AuctionParams>,
    /// Mandatory when the maker asset is foreign to the home chain
    pub signed_intent: Option<SignedIntent>,
}

/// Aggregate counters for the stats endpoint
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CoordinatorStats {
    pub total_orders: usize,
    pub pending: usize,
    pub accepted: usize,
    pub escrows_ready: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
}

pub struct Coordinator {
    policy: OrderPolicy,
    orders: RwLock<HashMap<OrderId, Order>>,
    verifier: Arc<dyn IntentVerifier>,
    events: EventBus,
}

impl Coordinator {
    pub fn new(policy: OrderPolicy, verifier: Arc<dyn IntentVerifier>, events: EventBus) -> Self {
        Self {
            policy,
            orders: RwLock::new(HashMap::new()),
            verifier,
            events,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn home_chain(&self) -> ChainId {
        self.policy.home_chain
    }

    /// Validate and register a maker's intent. Chain-foreign maker assets
    /// require a signed intent, since only the maker's signature authorizes
    /// moving the maker's own funds there.
    pub async fn create_order(&self, req: CreateOrderRequest, now: u64) -> SwapResult<OrderId> {
        if req.making_amount == 0 || req.taking_amount == 0 {
            return Err(SwapError::InvalidAmount(
                "making and taking amounts must be non-zero".into(),
            ));
        }
        if req.maker_asset.chain_id == req.taker_asset.chain_id {
            return Err(SwapError::SameChainAssets {
                chain_id: req.maker_asset.chain_id,
            });
        }
        if req.expires_at <= now || req.expires_at > now + self.policy.max_expiration_secs {
            return Err(SwapError::InvalidExpiration {
                expires_at: req.expires_at,
                now,
            });
        }

        let direction = direction_of(req.maker_asset.chain_id, self.policy.home_chain);
        if direction.requires_signed_intent() {
            let intent = req.signed_intent.as_ref().ok_or(SwapError::SignatureInvalid {
                maker: req.maker.src_account.to_string(),
            })?;
            if !self.verifier.verify(intent, &req.maker.src_account).await? {
                return Err(SwapError::SignatureInvalid {
                    maker: req.maker.src_account.to_string(),
                });
            }
        }

        let auction = match req.auction {
            Some(params) => params,
            None => self.default_auction(&req, now)?,
        };

        let mut orders = self.orders.write().await;
        let active = orders.values().filter(|o| !o.status.is_terminal()).count();
        if active >= self.policy.max_active_orders {
            return Err(SwapError::TooManyOrders {
                limit: self.policy.max_active_orders,
            });
        }

        let order = Order {
            id: Uuid::new_v4(),
            maker: req.maker,
            resolver: None,
            maker_asset: req.maker_asset,
            taker_asset: req.taker_asset,
            making_amount: req.making_amount,
            taking_amount: req.taking_amount,
            hashlock: req.hashlock,
            auction,
            status: OrderStatus::Pending,
            src_escrow: None,
            dst_escrow: None,
            accepted_rate: None,
            revealed_secret: None,
            created_at: now,
            expires_at: req.expires_at,
            updated_at: now,
        };
        let order_id = order.id;

        info!(
            order_id = %order_id,
            direction = direction.name(),
            making_amount = order.making_amount,
            taking_amount = order.taking_amount,
            "order created"
        );
        self.events.publish(SwapEvent::OrderCreated {
            order_id,
            direction: direction.name().to_string(),
            making_amount: order.making_amount,
            taking_amount: order.taking_amount,
        });
        orders.insert(order_id, order);
        Ok(order_id)
    }

    /// Opening curve derived from the order's implied rate when the maker
    /// did not specify one
    fn default_auction(&self, req: &CreateOrderRequest, now: u64) -> SwapResult<AuctionParams> {
        let overflow = || {
            SwapError::InvalidAmount(format!(
                "amounts {}/{} too large to derive an auction rate",
                req.taking_amount, req.making_amount
            ))
        };
        let implied = req
            .taking_amount
            .checked_mul(RATE_SCALE)
            .ok_or_else(overflow)?
            / req.making_amount;
        let premium = implied
            .checked_mul(self.policy.auction_start_premium_bps as u128)
            .ok_or_else(overflow)?
            / 10_000;
        let start = implied.checked_add(premium).ok_or_else(overflow)?;
        AuctionParams::new(now, self.policy.auction_duration_secs, start, implied)
    }

    /// Bind a resolver to a pending order at the current auction rate
    pub async fn accept_order(
        &self,
        order_id: OrderId,
        resolver: &Account,
        now: u64,
    ) -> SwapResult<u128> {
        if self.policy.require_counter_order {
            return Err(SwapError::Config(
                "counter-order matching is not supported; resolvers fill from private liquidity"
                    .into(),
            ));
        }
        if !self.policy.resolver_allowlist.is_empty()
            && !self
                .policy
                .resolver_allowlist
                .iter()
                .any(|r| r == resolver.as_str())
        {
            return Err(SwapError::ResolverNotAllowed {
                resolver: resolver.to_string(),
            });
        }

        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(SwapError::OrderNotFound { order_id })?;

        if order.status != OrderStatus::Pending {
            return Err(SwapError::OrderNotPending {
                order_id,
                status: order.status.name().to_string(),
            });
        }
        if order.is_expired(now) {
            return Err(SwapError::OrderExpired {
                order_id,
                expires_at: order.expires_at,
            });
        }

        let rate = order.auction.current_rate(now);
        order.status = OrderStatus::Accepted;
        order.resolver = Some(resolver.clone());
        order.accepted_rate = Some(rate);
        order.updated_at = now;

        info!(order_id = %order_id, resolver = %resolver, rate, "order accepted");
        self.events.publish(SwapEvent::OrderAccepted {
            order_id,
            resolver: resolver.clone(),
            rate,
        });
        Ok(rate)
    }

    /// Record that an escrow exists on one leg. At-least-once safe: a
    /// repeated report of the same identity is a no-op, a conflicting
    /// identity for an already-reported leg is rejected.
    pub async fn notify_escrow_created(
        &self,
        order_id: OrderId,
        chain_id: ChainId,
        escrow_id: EscrowId,
        now: u64,
    ) -> SwapResult<OrderStatus> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(SwapError::OrderNotFound { order_id })?;

        if !matches!(
            order.status,
            OrderStatus::Accepted | OrderStatus::EscrowsReady
        ) {
            return Err(SwapError::InvalidTransition {
                from: order.status.name().to_string(),
                to: OrderStatus::EscrowsReady.name().to_string(),
            });
        }

        let slot = if chain_id == order.src_chain() {
            &mut order.src_escrow
        } else if chain_id == order.dst_chain() {
            &mut order.dst_escrow
        } else {
            return Err(SwapError::Config(format!(
                "chain {} is not a leg of order {}",
                chain_id, order_id
            )));
        };

        match slot {
            Some(existing) if *existing == escrow_id => {
                debug!(order_id = %order_id, chain_id, "duplicate escrow report ignored");
            }
            Some(existing) => {
                return Err(SwapError::IdentityMismatch {
                    computed: existing.to_hex(),
                    deployed: escrow_id.to_hex(),
                });
            }
            None => {
                *slot = Some(escrow_id);
                order.updated_at = now;
                self.events.publish(SwapEvent::EscrowCreated {
                    order_id,
                    chain_id,
                    escrow_id,
                });
            }
        }

        if order.status == OrderStatus::Accepted && order.escrows_reported() {
            order.status = OrderStatus::EscrowsReady;
            order.updated_at = now;
            info!(order_id = %order_id, "both escrows reported, ready for reveal");
            self.events.publish(SwapEvent::EscrowsReady { order_id });
        }
        Ok(order.status)
    }

    /// Certify the secret public and complete the order. Moves no funds;
    /// each escrow still verifies the preimage independently on withdraw.
    pub async fn reveal_and_complete(&self, order_id: OrderId, secret: &[u8], now: u64) -> SwapResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(SwapError::OrderNotFound { order_id })?;

        if order.status != OrderStatus::EscrowsReady {
            return Err(SwapError::EscrowsNotReady { order_id });
        }
        if !order.hashlock.verify(secret) {
            return Err(SwapError::InvalidSecret);
        }

        order.revealed_secret = Some(hex::encode(secret));
        order.status = OrderStatus::Completed;
        order.updated_at = now;

        info!(order_id = %order_id, "secret revealed, order completed");
        self.events.publish(SwapEvent::SecretRevealed { order_id });
        self.events.publish(SwapEvent::OrderCompleted { order_id });
        Ok(())
    }

    /// Maker- or resolver-initiated cancellation of a non-completed order.
    /// Only bookkeeping; escrow funds come back via each escrow's own
    /// timelock-gated cancel.
    pub async fn cancel_order(&self, order_id: OrderId, caller: &Account, now: u64) -> SwapResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(SwapError::OrderNotFound { order_id })?;

        let is_maker =
            caller == &order.maker.src_account || caller == &order.maker.dst_account;
        let is_resolver = order.resolver.as_ref() == Some(caller);
        if !is_maker && !is_resolver {
            return Err(SwapError::Unauthorized {
                caller: caller.to_string(),
                role: "maker or accepted resolver".to_string(),
            });
        }

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(SwapError::InvalidTransition {
                from: order.status.name().to_string(),
                to: OrderStatus::Cancelled.name().to_string(),
            });
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        info!(order_id = %order_id, caller = %caller, "order cancelled");
        self.events.publish(SwapEvent::OrderCancelled {
            order_id,
            reason: format!("cancelled by {}", caller),
        });
        Ok(())
    }

    /// Mark an in-flight order failed after an irrecoverable error
    pub async fn fail_order(&self, order_id: OrderId, reason: &str, now: u64) -> SwapResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&order_id)
            .ok_or(SwapError::OrderNotFound { order_id })?;

        if !order.status.can_transition_to(OrderStatus::Failed) {
            return Err(SwapError::InvalidTransition {
                from: order.status.name().to_string(),
                to: OrderStatus::Failed.name().to_string(),
            });
        }
        order.status = OrderStatus::Failed;
        order.updated_at = now;
        warn!(order_id = %order_id, reason, "order failed");
        self.events.publish(SwapEvent::OrderFailed {
            order_id,
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Periodic sweep over expired orders. A pending order simply lapses;
    /// an accepted one failed mid-flight, so its escrows (if any) are left
    /// to their own timelocks.
    pub async fn handle_timeout(&self, now: u64) -> Vec<OrderId> {
        let mut swept = Vec::new();
        let mut orders = self.orders.write().await;
        for order in orders.values_mut() {
            if order.status.is_terminal() || !order.is_expired(now) {
                continue;
            }
            match order.status {
                OrderStatus::Pending => {
                    order.status = OrderStatus::Cancelled;
                    order.updated_at = now;
                    self.events.publish(SwapEvent::OrderCancelled {
                        order_id: order.id,
                        reason: "expired while pending".to_string(),
                    });
                    swept.push(order.id);
                }
                OrderStatus::Accepted => {
                    order.status = OrderStatus::Failed;
                    order.updated_at = now;
                    self.events.publish(SwapEvent::OrderFailed {
                        order_id: order.id,
                        reason: "expired before both escrows were created".to_string(),
                    });
                    swept.push(order.id);
                }
                // An order with both escrows up can still complete via
                // public withdrawal; the sweep leaves it alone.
                _ => {}
            }
        }
        if !swept.is_empty() {
            info!(count = swept.len(), "expired orders swept");
        }
        swept
    }

    pub async fn get_order(&self, order_id: OrderId) -> SwapResult<Order> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or(SwapError::OrderNotFound { order_id })
    }

    pub async fn orders_by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    pub async fn orders_by_direction(&self, direction: SwapDirection) -> Vec<Order> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| direction_of(o.maker_asset.chain_id, self.policy.home_chain) == direction)
            .cloned()
            .collect()
    }

    /// Accepted orders still missing at least one escrow report; this is
    /// the work queue resolver software polls.
    pub async fn orders_awaiting_escrows(&self) -> Vec<Order> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| o.status == OrderStatus::Accepted && !o.escrows_reported())
            .cloned()
            .collect()
    }

    /// Every order a maker submitted, matched on either of their accounts
    pub async fn orders_by_maker(&self, maker: &Account) -> Vec<Order> {
        self.orders
            .read()
            .await
            .values()
            .filter(|o| &o.maker.src_account == maker || &o.maker.dst_account == maker)
            .cloned()
            .collect()
    }

    pub async fn list_orders(&self) -> Vec<Order> {
        self.orders.read().await.values().cloned().collect()
    }

    pub async fn stats(&self) -> CoordinatorStats {
        let orders = self.orders.read().await;
        let mut stats = CoordinatorStats {
            total_orders: orders.len(),
            ..Default::default()
        };
        for order in orders.values() {
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Accepted => stats.accepted += 1,
                OrderStatus::EscrowsReady => stats.escrows_ready += 1,
                OrderStatus::Completed => stats.completed += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
                OrderStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Reload a persisted order on startup
    pub async fn restore(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PermissiveVerifier;

    const NOW: u64 = 100_000;
    const HOME: ChainId = 1;
    const FOREIGN: ChainId = 2;

    fn coordinator(policy: OrderPolicy) -> Coordinator {
        Coordinator::new(policy, Arc::new(PermissiveVerifier), EventBus::new())
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            maker: MakerIdentity {
                src_account: Account::from("maker-src"),
                dst_account: Account::from("maker-dst"),
            },
            maker_asset: Asset {
                chain_id: HOME,
                token: "token-a".to_string(),
            },
            taker_asset: Asset {
                chain_id: FOREIGN,
                token: "token-b".to_string(),
            },
            making_amount: 1_000_000,
            taking_amount: 500_000,
            hashlock: Hashlock::commit(b"s3cr3t"),
            expires_at: NOW + 3600,
            auction: None,
            signed_intent: None,
        }
    }

    fn escrow_id(byte: u8) -> EscrowId {
        EscrowId([byte; 32])
    }

    async fn accepted_order(c: &Coordinator) -> OrderId {
        let id = c.create_order(request(), NOW).await.unwrap();
        c.accept_order(id, &Account::from("resolver-1"), NOW + 10)
            .await
            .unwrap();
        id
    }

    async fn ready_order(c: &Coordinator) -> OrderId {
        let id = accepted_order(c).await;
        c.notify_escrow_created(id, HOME, escrow_id(1), NOW + 20)
            .await
            .unwrap();
        c.notify_escrow_created(id, FOREIGN, escrow_id(2), NOW + 30)
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn full_lifecycle_happy_path() {
        let c = coordinator(OrderPolicy::default());
        let id = c.create_order(request(), NOW).await.unwrap();
        assert_eq!(c.get_order(id).await.unwrap().status, OrderStatus::Pending);

        let rate = c
            .accept_order(id, &Account::from("resolver-1"), NOW + 10)
            .await
            .unwrap();
        assert!(rate > 0);
        let order = c.get_order(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.resolver, Some(Account::from("resolver-1")));
        assert_eq!(order.accepted_rate, Some(rate));

        let status = c
            .notify_escrow_created(id, HOME, escrow_id(1), NOW + 20)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Accepted);
        let status = c
            .notify_escrow_created(id, FOREIGN, escrow_id(2), NOW + 30)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::EscrowsReady);

        c.reveal_and_complete(id, b"s3cr3t", NOW + 40).await.unwrap();
        let order = c.get_order(id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.revealed_secret, Some(hex::encode(b"s3cr3t")));
    }

    #[tokio::test]
    async fn create_order_validates_input() {
        let c = coordinator(OrderPolicy::default());

        let mut req = request();
        req.making_amount = 0;
        assert!(matches!(
            c.create_order(req, NOW).await.unwrap_err(),
            SwapError::InvalidAmount(_)
        ));

        let mut req = request();
        req.taker_asset.chain_id = HOME;
        assert!(matches!(
            c.create_order(req, NOW).await.unwrap_err(),
            SwapError::SameChainAssets { chain_id: HOME }
        ));

        let mut req = request();
        req.expires_at = NOW;
        assert!(matches!(
            c.create_order(req, NOW).await.unwrap_err(),
            SwapError::InvalidExpiration { .. }
        ));

        let mut req = request();
        req.expires_at = NOW + 365 * 24 * 3600;
        assert!(matches!(
            c.create_order(req, NOW).await.unwrap_err(),
            SwapError::InvalidExpiration { .. }
        ));
    }

    #[tokio::test]
    async fn create_order_rejects_amounts_too_large_to_price() {
        let c = coordinator(OrderPolicy::default());
        let mut req = request();
        req.making_amount = 1;
        req.taking_amount = u128::MAX / 2;
        assert!(matches!(
            c.create_order(req, NOW).await.unwrap_err(),
            SwapError::InvalidAmount(_)
        ));
    }

    #[tokio::test]
    async fn foreign_maker_asset_requires_signed_intent() {
        let c = coordinator(OrderPolicy::default());
        let mut req = request();
        req.maker_asset.chain_id = FOREIGN;
        req.taker_asset.chain_id = HOME;

        // No intent at all
        assert!(matches!(
            c.create_order(req.clone(), NOW).await.unwrap_err(),
            SwapError::SignatureInvalid { .. }
        ));

        // Empty signature fails verification
        req.signed_intent = Some(SignedIntent {
            payload: b"intent".to_vec(),
            signature: String::new(),
            signer: Account::from("maker-src"),
        });
        assert!(matches!(
            c.create_order(req.clone(), NOW).await.unwrap_err(),
            SwapError::SignatureInvalid { .. }
        ));

        req.signed_intent = Some(SignedIntent {
            payload: b"intent".to_vec(),
            signature: "0xsig".to_string(),
            signer: Account::from("maker-src"),
        });
        assert!(c.create_order(req, NOW).await.is_ok());
    }

    #[tokio::test]
    async fn home_maker_asset_needs_no_intent() {
        let c = coordinator(OrderPolicy::default());
        assert!(c.create_order(request(), NOW).await.is_ok());
    }

    #[tokio::test]
    async fn active_order_cap_enforced() {
        let policy = OrderPolicy {
            max_active_orders: 2,
            ..Default::default()
        };
        let c = coordinator(policy);
        c.create_order(request(), NOW).await.unwrap();
        let second = c.create_order(request(), NOW).await.unwrap();
        assert!(matches!(
            c.create_order(request(), NOW).await.unwrap_err(),
            SwapError::TooManyOrders { limit: 2 }
        ));

        // Terminal orders free capacity
        c.cancel_order(second, &Account::from("maker-src"), NOW + 1)
            .await
            .unwrap();
        assert!(c.create_order(request(), NOW + 2).await.is_ok());
    }

    #[tokio::test]
    async fn accept_respects_allowlist() {
        let policy = OrderPolicy {
            resolver_allowlist: vec!["resolver-1".to_string()],
            ..Default::default()
        };
        let c = coordinator(policy);
        let id = c.create_order(request(), NOW).await.unwrap();

        assert!(matches!(
            c.accept_order(id, &Account::from("outsider"), NOW + 10)
                .await
                .unwrap_err(),
            SwapError::ResolverNotAllowed { .. }
        ));
        assert!(c
            .accept_order(id, &Account::from("resolver-1"), NOW + 10)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn accept_rejects_non_pending_and_expired() {
        let c = coordinator(OrderPolicy::default());
        let id = accepted_order(&c).await;
        assert!(matches!(
            c.accept_order(id, &Account::from("resolver-2"), NOW + 20)
                .await
                .unwrap_err(),
            SwapError::OrderNotPending { .. }
        ));

        let expired = c.create_order(request(), NOW).await.unwrap();
        assert!(matches!(
            c.accept_order(expired, &Account::from("resolver-1"), NOW + 3600)
                .await
                .unwrap_err(),
            SwapError::OrderExpired { .. }
        ));
    }

    #[tokio::test]
    async fn accept_locks_decaying_rate() {
        let c = coordinator(OrderPolicy::default());
        let a = c.create_order(request(), NOW).await.unwrap();
        let b = c.create_order(request(), NOW).await.unwrap();

        let early = c.accept_order(a, &Account::from("r1"), NOW).await.unwrap();
        let late = c
            .accept_order(b, &Account::from("r2"), NOW + 150)
            .await
            .unwrap();
        assert!(late < early);
        // Floor is the implied rate: 500_000 / 1_000_000
        assert!(late >= RATE_SCALE / 2);
    }

    #[tokio::test]
    async fn notify_is_idempotent() {
        let c = coordinator(OrderPolicy::default());
        let id = accepted_order(&c).await;

        c.notify_escrow_created(id, HOME, escrow_id(1), NOW + 20)
            .await
            .unwrap();
        // Same report again does not double-transition
        let status = c
            .notify_escrow_created(id, HOME, escrow_id(1), NOW + 21)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::Accepted);

        let status = c
            .notify_escrow_created(id, FOREIGN, escrow_id(2), NOW + 30)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::EscrowsReady);
        // Replays after readiness stay put too
        let status = c
            .notify_escrow_created(id, FOREIGN, escrow_id(2), NOW + 31)
            .await
            .unwrap();
        assert_eq!(status, OrderStatus::EscrowsReady);
    }

    #[tokio::test]
    async fn conflicting_escrow_report_rejected() {
        let c = coordinator(OrderPolicy::default());
        let id = accepted_order(&c).await;
        c.notify_escrow_created(id, HOME, escrow_id(1), NOW + 20)
            .await
            .unwrap();
        assert!(matches!(
            c.notify_escrow_created(id, HOME, escrow_id(9), NOW + 21)
                .await
                .unwrap_err(),
            SwapError::IdentityMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn notify_rejects_foreign_chain_and_pending_order() {
        let c = coordinator(OrderPolicy::default());
        let id = accepted_order(&c).await;
        assert!(matches!(
            c.notify_escrow_created(id, 99, escrow_id(1), NOW + 20)
                .await
                .unwrap_err(),
            SwapError::Config(_)
        ));

        let pending = c.create_order(request(), NOW).await.unwrap();
        assert!(matches!(
            c.notify_escrow_created(pending, HOME, escrow_id(1), NOW + 20)
                .await
                .unwrap_err(),
            SwapError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn reveal_gated_on_both_escrows() {
        let c = coordinator(OrderPolicy::default());
        let id = accepted_order(&c).await;
        c.notify_escrow_created(id, HOME, escrow_id(1), NOW + 20)
            .await
            .unwrap();

        // One escrow is not enough
        assert!(matches!(
            c.reveal_and_complete(id, b"s3cr3t", NOW + 25).await.unwrap_err(),
            SwapError::EscrowsNotReady { .. }
        ));

        c.notify_escrow_created(id, FOREIGN, escrow_id(2), NOW + 30)
            .await
            .unwrap();
        assert!(matches!(
            c.reveal_and_complete(id, b"wrong", NOW + 40).await.unwrap_err(),
            SwapError::InvalidSecret
        ));
        assert!(c.reveal_and_complete(id, b"s3cr3t", NOW + 40).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_restricted_to_parties() {
        let c = coordinator(OrderPolicy::default());
        let id = accepted_order(&c).await;

        assert!(matches!(
            c.cancel_order(id, &Account::from("stranger"), NOW + 50)
                .await
                .unwrap_err(),
            SwapError::Unauthorized { .. }
        ));
        assert!(c
            .cancel_order(id, &Account::from("resolver-1"), NOW + 50)
            .await
            .is_ok());

        // Completed orders cannot be cancelled
        let done = ready_order(&c).await;
        c.reveal_and_complete(done, b"s3cr3t", NOW + 40).await.unwrap();
        assert!(matches!(
            c.cancel_order(done, &Account::from("maker-src"), NOW + 50)
                .await
                .unwrap_err(),
            SwapError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn fail_order_only_from_in_flight_states() {
        let c = coordinator(OrderPolicy::default());
        let accepted = accepted_order(&c).await;
        c.fail_order(accepted, "destination escrow rejected", NOW + 50)
            .await
            .unwrap();
        assert_eq!(
            c.get_order(accepted).await.unwrap().status,
            OrderStatus::Failed
        );

        // A pending order lapses via cancellation, never failure
        let pending = c.create_order(request(), NOW).await.unwrap();
        assert!(matches!(
            c.fail_order(pending, "nope", NOW + 50).await.unwrap_err(),
            SwapError::InvalidTransition { .. }
        ));
    }

    #[tokio::test]
    async fn timeout_sweep_lapses_pending_and_fails_accepted() {
        let c = coordinator(OrderPolicy::default());
        let pending = c.create_order(request(), NOW).await.unwrap();
        let accepted = accepted_order(&c).await;
        let ready = ready_order(&c).await;

        let swept = c.handle_timeout(NOW + 3600).await;
        assert_eq!(swept.len(), 2);
        assert_eq!(
            c.get_order(pending).await.unwrap().status,
            OrderStatus::Cancelled
        );
        assert_eq!(
            c.get_order(accepted).await.unwrap().status,
            OrderStatus::Failed
        );
        // Ready orders can still complete via public withdrawal
        assert_eq!(
            c.get_order(ready).await.unwrap().status,
            OrderStatus::EscrowsReady
        );

        // Second sweep finds nothing
        assert!(c.handle_timeout(NOW + 3700).await.is_empty());
    }

    #[tokio::test]
    async fn query_surface() {
        let c = coordinator(OrderPolicy::default());
        let pending = c.create_order(request(), NOW).await.unwrap();
        let awaiting = accepted_order(&c).await;
        let done = ready_order(&c).await;
        c.reveal_and_complete(done, b"s3cr3t", NOW + 40).await.unwrap();

        let by_status = c.orders_by_status(OrderStatus::Pending).await;
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, pending);

        let work = c.orders_awaiting_escrows().await;
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].id, awaiting);

        assert_eq!(c.orders_by_direction(SwapDirection::Outbound).await.len(), 3);
        assert!(c.orders_by_direction(SwapDirection::Inbound).await.is_empty());

        // Either of the maker's accounts matches
        assert_eq!(c.orders_by_maker(&Account::from("maker-src")).await.len(), 3);
        assert_eq!(c.orders_by_maker(&Account::from("maker-dst")).await.len(), 3);
        assert!(c.orders_by_maker(&Account::from("nobody")).await.is_empty());

        let stats = c.stats().await;
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    async fn events_published_through_lifecycle() {
        let c = coordinator(OrderPolicy::default());
        let mut rx = c.events().subscribe();
        let id = ready_order(&c).await;
        c.reveal_and_complete(id, b"s3cr3t", NOW + 40).await.unwrap();

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec![
                "order_created",
                "order_accepted",
                "escrow_created",
                "escrow_created",
                "escrows_ready",
                "secret_revealed",
                "order_completed"
            ]
        );
    }
}
