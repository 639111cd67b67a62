//! HTTP API for order lifecycle, health checks, and monitoring

use crate::auction::{self, RATE_SCALE};
use crate::config::{ApiConfig, TimelockConfig};
use crate::error::{SwapError, SwapResult};
use crate::escrow::{Escrow, EscrowFactory, EscrowId, Immutables, Payout};
use crate::ledger::SignedIntent;
use crate::identity::IdentityMap;
use crate::metrics;
use crate::order::{Coordinator, Order, OrderId, OrderStatus, SwapDirection};
use crate::state::StateManager;
use crate::types::{unix_now, Account, ChainId};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub factories: Arc<HashMap<ChainId, Arc<EscrowFactory>>>,
    pub state_manager: Arc<StateManager>,
    pub identity: Arc<IdentityMap>,
    /// Advertised stage-offset defaults client tooling builds immutables from
    pub timelock_defaults: TimelockConfig,
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> SwapResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SwapError::Config(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| SwapError::Internal(e.to_string()))?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/status", get(get_status))
        .route("/stats", get(get_stats))
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/quote", get(quote_order))
        .route("/orders/:id/accept", post(accept_order))
        .route("/orders/:id/escrows", post(notify_escrow))
        .route("/orders/:id/reveal", post(reveal_secret))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/fail", post(fail_order))
        .route("/orders/:id/events", get(order_events))
        .route("/identities", post(register_identity))
        .route(
            "/identities/:home_account/chains/:chain_id",
            get(resolve_identity),
        )
        .route(
            "/chains/:chain_id/identities/:foreign_account",
            get(resolve_identity_reverse),
        )
        .route("/escrows/identity", post(preview_escrow_identity))
        .route("/chains/:chain_id/escrows/source", post(create_src_escrow))
        .route(
            "/chains/:chain_id/escrows/destination",
            post(create_dst_escrow),
        )
        .route("/chains/:chain_id/escrows", get(list_escrows))
        .route("/chains/:chain_id/escrows/:escrow_id", get(get_escrow))
        .route(
            "/chains/:chain_id/escrows/:escrow_id/withdraw",
            post(withdraw_escrow),
        )
        .route(
            "/chains/:chain_id/escrows/:escrow_id/cancel",
            post(cancel_escrow),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Map an error to its HTTP status, mirroring the error taxonomy:
/// validation 400, missing 404, authorization 403, wrong-state 409,
/// cross-chain consistency 422, everything external 500.
fn error_response(err: SwapError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &err {
        SwapError::InvalidAmount(_)
        | SwapError::InvalidExpiration { .. }
        | SwapError::InvalidHashlock(_)
        | SwapError::InvalidTimelocks(_)
        | SwapError::SignatureInvalid { .. }
        | SwapError::SameChainAssets { .. }
        | SwapError::Config(_) => StatusCode::BAD_REQUEST,
        SwapError::OrderNotFound { .. }
        | SwapError::EscrowNotFound { .. }
        | SwapError::IdentityNotFound { .. } => StatusCode::NOT_FOUND,
        SwapError::Unauthorized { .. } | SwapError::ResolverNotAllowed { .. } => {
            StatusCode::FORBIDDEN
        }
        SwapError::OrderNotPending { .. }
        | SwapError::OrderExpired { .. }
        | SwapError::InvalidTransition { .. }
        | SwapError::EscrowsNotReady { .. }
        | SwapError::EscrowTerminal { .. }
        | SwapError::StageNotReached { .. }
        | SwapError::InvalidSecret
        | SwapError::TooManyOrders { .. } => StatusCode::CONFLICT,
        SwapError::InvalidCreationTime { .. } | SwapError::IdentityMismatch { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SwapError::Database(_)
        | SwapError::Transfer(_)
        | SwapError::InsufficientFunds { .. }
        | SwapError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    metrics::record_error(status.as_str());
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Readiness check - verify all dependencies
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.state_manager.health_check().await.is_ok();
    if db_ok {
        metrics::record_health_check();
        (StatusCode::OK, Json(ReadinessResponse { ready: true, database: true }))
    } else {
        metrics::record_health_check_failure();
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                database: false,
            }),
        )
    }
}

/// Get coordinator status
async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let mut escrow_counts = Vec::new();
    for (chain_id, factory) in state.factories.iter() {
        escrow_counts.push(ChainEscrows {
            chain_id: *chain_id,
            active_escrows: factory.active_count().await,
        });
    }
    escrow_counts.sort_by_key(|c| c.chain_id);

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        home_chain: state.coordinator.home_chain(),
        chains: escrow_counts,
        registered_identities: state.identity.len(),
        event_subscribers: state.coordinator.events().subscriber_count(),
        timelock_defaults: state.timelock_defaults.clone(),
    })
}

/// Order statistics from the persistent ledger
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.state_manager.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<crate::order::coordinator::CreateOrderRequest>,
) -> impl IntoResponse {
    let now = unix_now();
    match state.coordinator.create_order(req, now).await {
        Ok(order_id) => match persist_order(&state, order_id).await {
            Ok(order) => (StatusCode::CREATED, Json(OrderResponse::from(order))).into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct AcceptRequest {
    resolver: Account,
}

async fn accept_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<AcceptRequest>,
) -> impl IntoResponse {
    let now = unix_now();
    match state.coordinator.accept_order(order_id, &req.resolver, now).await {
        Ok(rate) => {
            metrics::record_accepted_rate(rate, RATE_SCALE);
            match persist_order(&state, order_id).await {
                Ok(order) => {
                    metrics::record_time_to_accept(now.saturating_sub(order.created_at));
                    (StatusCode::OK, Json(AcceptResponse { order, rate })).into_response()
                }
                Err(e) => error_response(e).into_response(),
            }
        }
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct EscrowNotification {
    chain_id: ChainId,
    escrow_id: String,
}

async fn notify_escrow(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<EscrowNotification>,
) -> impl IntoResponse {
    let Some(escrow_id) = EscrowId::from_hex(&req.escrow_id) else {
        return error_response(SwapError::Config(format!(
            "malformed escrow id {}",
            req.escrow_id
        )))
        .into_response();
    };

    let now = unix_now();
    match state
        .coordinator
        .notify_escrow_created(order_id, req.chain_id, escrow_id, now)
        .await
    {
        Ok(status) => match persist_order(&state, order_id).await {
            Ok(_) => (
                StatusCode::OK,
                Json(NotifyResponse {
                    order_id,
                    status: status.name().to_string(),
                }),
            )
                .into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct RevealRequest {
    /// Hex-encoded preimage
    secret: String,
}

async fn reveal_secret(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<RevealRequest>,
) -> impl IntoResponse {
    let Ok(secret) = hex::decode(req.secret.trim_start_matches("0x")) else {
        return error_response(SwapError::InvalidSecret).into_response();
    };

    let now = unix_now();
    match state.coordinator.reveal_and_complete(order_id, &secret, now).await {
        Ok(()) => match persist_order(&state, order_id).await {
            Ok(order) => (StatusCode::OK, Json(OrderResponse::from(order))).into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct CancelRequest {
    caller: Account,
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<CancelRequest>,
) -> impl IntoResponse {
    let now = unix_now();
    match state.coordinator.cancel_order(order_id, &req.caller, now).await {
        Ok(()) => match persist_order(&state, order_id).await {
            Ok(order) => (StatusCode::OK, Json(OrderResponse::from(order))).into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct FailRequest {
    reason: String,
}

/// Operator escape hatch for an order stuck on an irrecoverable error
async fn fail_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(req): Json<FailRequest>,
) -> impl IntoResponse {
    let now = unix_now();
    match state.coordinator.fail_order(order_id, &req.reason, now).await {
        Ok(()) => match persist_order(&state, order_id).await {
            Ok(order) => (StatusCode::OK, Json(OrderResponse::from(order))).into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct OrderFilter {
    status: Option<String>,
    direction: Option<String>,
    /// Either of a maker's accounts
    maker: Option<String>,
    /// `awaiting_escrows` narrows to the resolver work queue
    awaiting_escrows: Option<bool>,
}

async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> impl IntoResponse {
    if filter.awaiting_escrows.unwrap_or(false) {
        let orders = state.coordinator.orders_awaiting_escrows().await;
        return Json(OrderListResponse { orders }).into_response();
    }
    if let Some(maker) = filter.maker {
        let orders = state.coordinator.orders_by_maker(&Account::new(maker)).await;
        return Json(OrderListResponse { orders }).into_response();
    }
    if let Some(name) = filter.direction.as_deref() {
        let direction = match name {
            "outbound" => SwapDirection::Outbound,
            "inbound" => SwapDirection::Inbound,
            _ => {
                return error_response(SwapError::Config(format!("unknown direction {}", name)))
                    .into_response()
            }
        };
        let orders = state.coordinator.orders_by_direction(direction).await;
        return Json(OrderListResponse { orders }).into_response();
    }
    let orders = match filter.status.as_deref() {
        Some(name) => match OrderStatus::from_name(name) {
            Some(status) => state.coordinator.orders_by_status(status).await,
            None => {
                return error_response(SwapError::Config(format!("unknown status {}", name)))
                    .into_response()
            }
        },
        None => state.coordinator.list_orders().await,
    };
    Json(OrderListResponse { orders }).into_response()
}

async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> impl IntoResponse {
    match state.coordinator.get_order(order_id).await {
        Ok(order) => (StatusCode::OK, Json(OrderResponse::from(order))).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct QuoteQuery {
    /// Resolver's own minimum acceptable rate, scaled like the quote
    min_rate: Option<u64>,
}

/// Current auction quote for a pending order. Resolvers poll this to decide
/// when the decaying rate clears their own minimum.
async fn quote_order(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Query(query): Query<QuoteQuery>,
) -> impl IntoResponse {
    let order = match state.coordinator.get_order(order_id).await {
        Ok(order) => order,
        Err(e) => return error_response(e).into_response(),
    };
    let rate = order.auction.current_rate(unix_now());
    let taking_amount = match auction::taking_amount_at(order.making_amount, rate) {
        Ok(amount) => amount,
        Err(e) => return error_response(e).into_response(),
    };
    Json(QuoteResponse {
        order_id,
        rate,
        rate_scale: RATE_SCALE,
        taking_amount,
        profitable: query
            .min_rate
            .map(|min| auction::is_profitable(rate, min as u128)),
    })
    .into_response()
}

/// Audit trail for one order
async fn order_events(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> impl IntoResponse {
    match state.state_manager.events_for_order(order_id).await {
        Ok(events) => (StatusCode::OK, Json(EventsResponse { events })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct RegisterIdentityRequest {
    home_account: Account,
    foreign_chain: ChainId,
    foreign_account: Account,
}

async fn register_identity(
    State(state): State<AppState>,
    Json(req): Json<RegisterIdentityRequest>,
) -> impl IntoResponse {
    let binding = state
        .identity
        .register(req.home_account, req.foreign_chain, req.foreign_account);
    (StatusCode::CREATED, Json(binding))
}

async fn resolve_identity(
    State(state): State<AppState>,
    Path((home_account, chain_id)): Path<(String, ChainId)>,
) -> impl IntoResponse {
    match state.identity.resolve(&Account::new(home_account), chain_id) {
        Ok(account) => (StatusCode::OK, Json(AccountResponse { account })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn resolve_identity_reverse(
    State(state): State<AppState>,
    Path((chain_id, foreign_account)): Path<(ChainId, String)>,
) -> impl IntoResponse {
    match state
        .identity
        .resolve_reverse(chain_id, &Account::new(foreign_account))
    {
        Ok(account) => (StatusCode::OK, Json(AccountResponse { account })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct PreviewIdentityRequest {
    immutables: Immutables,
}

/// Compute the deterministic escrow identity without deploying, so both
/// parties can agree on the address their funds will sit at.
async fn preview_escrow_identity(
    Json(req): Json<PreviewIdentityRequest>,
) -> impl IntoResponse {
    let escrow_id = EscrowFactory::compute_escrow_identity(&req.immutables);
    Json(IdentityPreviewResponse {
        account: escrow_id.account(),
        escrow_id: escrow_id.to_hex(),
    })
}

fn factory_for(state: &AppState, chain_id: ChainId) -> SwapResult<Arc<EscrowFactory>> {
    state
        .factories
        .get(&chain_id)
        .cloned()
        .ok_or(SwapError::Config(format!("chain {} is not served", chain_id)))
}

#[derive(Deserialize)]
struct CreateSrcEscrowRequest {
    immutables: Immutables,
    intent: SignedIntent,
}

async fn create_src_escrow(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
    Json(req): Json<CreateSrcEscrowRequest>,
) -> impl IntoResponse {
    let factory = match factory_for(&state, chain_id) {
        Ok(f) => f,
        Err(e) => return error_response(e).into_response(),
    };
    let now = unix_now();
    match factory.create_src_escrow(req.immutables, &req.intent, now).await {
        Ok(escrow_id) => match persist_escrow(&state, &factory, escrow_id).await {
            Ok(escrow) => (StatusCode::CREATED, Json(EscrowResponse { escrow })).into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct CreateDstEscrowRequest {
    immutables: Immutables,
    src_cancellation_deadline: u64,
}

async fn create_dst_escrow(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
    Json(req): Json<CreateDstEscrowRequest>,
) -> impl IntoResponse {
    let factory = match factory_for(&state, chain_id) {
        Ok(f) => f,
        Err(e) => return error_response(e).into_response(),
    };
    let now = unix_now();
    match factory
        .create_dst_escrow(req.immutables, req.src_cancellation_deadline, now)
        .await
    {
        Ok(escrow_id) => match persist_escrow(&state, &factory, escrow_id).await {
            Ok(escrow) => (StatusCode::CREATED, Json(EscrowResponse { escrow })).into_response(),
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_escrows(
    State(state): State<AppState>,
    Path(chain_id): Path<ChainId>,
) -> impl IntoResponse {
    let factory = match factory_for(&state, chain_id) {
        Ok(f) => f,
        Err(e) => return error_response(e).into_response(),
    };
    let escrows = factory.list_escrows().await;
    Json(EscrowListResponse { escrows }).into_response()
}

async fn get_escrow(
    State(state): State<AppState>,
    Path((chain_id, escrow_id)): Path<(ChainId, String)>,
) -> impl IntoResponse {
    let (factory, escrow_id) = match escrow_target(&state, chain_id, &escrow_id) {
        Ok(t) => t,
        Err(e) => return error_response(e).into_response(),
    };
    match factory.get_escrow(escrow_id).await {
        Some(escrow) => {
            let timelocks = escrow.timelock_status(unix_now());
            (StatusCode::OK, Json(EscrowStatusResponse { escrow, timelocks })).into_response()
        }
        None => error_response(SwapError::EscrowNotFound {
            escrow_id: escrow_id.to_hex(),
        })
        .into_response(),
    }
}

#[derive(Deserialize)]
struct WithdrawRequest {
    caller: Account,
    /// Hex-encoded preimage
    secret: String,
    /// Use the permissionless window instead of the designated one
    #[serde(default)]
    public: bool,
}

async fn withdraw_escrow(
    State(state): State<AppState>,
    Path((chain_id, escrow_id)): Path<(ChainId, String)>,
    Json(req): Json<WithdrawRequest>,
) -> impl IntoResponse {
    let (factory, escrow_id) = match escrow_target(&state, chain_id, &escrow_id) {
        Ok(t) => t,
        Err(e) => return error_response(e).into_response(),
    };
    let Ok(secret) = hex::decode(req.secret.trim_start_matches("0x")) else {
        return error_response(SwapError::InvalidSecret).into_response();
    };

    let now = unix_now();
    let result = if req.public {
        factory.public_withdraw(escrow_id, &req.caller, &secret, now).await
    } else {
        factory.withdraw(escrow_id, &req.caller, &secret, now).await
    };
    finish_escrow_op(&state, &factory, escrow_id, result).await
}

#[derive(Deserialize)]
struct EscrowCancelRequest {
    caller: Account,
}

async fn cancel_escrow(
    State(state): State<AppState>,
    Path((chain_id, escrow_id)): Path<(ChainId, String)>,
    Json(req): Json<EscrowCancelRequest>,
) -> impl IntoResponse {
    let (factory, escrow_id) = match escrow_target(&state, chain_id, &escrow_id) {
        Ok(t) => t,
        Err(e) => return error_response(e).into_response(),
    };
    let result = factory.cancel(escrow_id, &req.caller, unix_now()).await;
    finish_escrow_op(&state, &factory, escrow_id, result).await
}

fn escrow_target(
    state: &AppState,
    chain_id: ChainId,
    escrow_id: &str,
) -> SwapResult<(Arc<EscrowFactory>, EscrowId)> {
    let factory = factory_for(state, chain_id)?;
    let escrow_id = EscrowId::from_hex(escrow_id)
        .ok_or_else(|| SwapError::Config(format!("malformed escrow id {}", escrow_id)))?;
    Ok((factory, escrow_id))
}

/// Persist the post-transition escrow and report the payout
async fn finish_escrow_op(
    state: &AppState,
    factory: &EscrowFactory,
    escrow_id: EscrowId,
    result: SwapResult<Payout>,
) -> axum::response::Response {
    match result {
        Ok(payout) => match persist_escrow(state, factory, escrow_id).await {
            Ok(escrow) => {
                metrics::record_escrow_resolved(
                    escrow.immutables.chain_id,
                    escrow.status.name(),
                );
                (StatusCode::OK, Json(PayoutResponse { escrow, payout })).into_response()
            }
            Err(e) => error_response(e).into_response(),
        },
        Err(e) => error_response(e).into_response(),
    }
}

async fn persist_escrow(
    state: &AppState,
    factory: &EscrowFactory,
    escrow_id: EscrowId,
) -> SwapResult<Escrow> {
    let escrow = factory
        .get_escrow(escrow_id)
        .await
        .ok_or(SwapError::EscrowNotFound {
            escrow_id: escrow_id.to_hex(),
        })?;
    state.state_manager.upsert_escrow(&escrow).await?;
    Ok(escrow)
}

/// Re-read the order after a mutation and write it through to Postgres
async fn persist_order(state: &AppState, order_id: OrderId) -> SwapResult<Order> {
    let order = state.coordinator.get_order(order_id).await?;
    state.state_manager.upsert_order(&order).await?;
    Ok(order)
}

// Response types

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    timestamp: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    database: bool,
}

#[derive(Serialize)]
struct ChainEscrows {
    chain_id: u64,
    active_escrows: usize,
}

#[derive(Serialize)]
struct StatusResponse {
    version: String,
    home_chain: u64,
    chains: Vec<ChainEscrows>,
    registered_identities: usize,
    event_subscribers: usize,
    timelock_defaults: TimelockConfig,
}

#[derive(Serialize)]
struct OrderResponse {
    order: Order,
    /// Keccak digest escrow immutables must bind to
    order_hash: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_hash: hex::encode(order.order_hash()),
            order,
        }
    }
}

#[derive(Serialize)]
struct AcceptResponse {
    order: Order,
    rate: u128,
}

#[derive(Serialize)]
struct QuoteResponse {
    order_id: OrderId,
    rate: u128,
    rate_scale: u128,
    taking_amount: u128,
    profitable: Option<bool>,
}

#[derive(Serialize)]
struct NotifyResponse {
    order_id: OrderId,
    status: String,
}

#[derive(Serialize)]
struct OrderListResponse {
    orders: Vec<Order>,
}

#[derive(Serialize)]
struct EventsResponse {
    events: Vec<crate::events::SwapEvent>,
}

#[derive(Serialize)]
struct AccountResponse {
    account: Account,
}

#[derive(Serialize)]
struct IdentityPreviewResponse {
    account: Account,
    escrow_id: String,
}

#[derive(Serialize)]
struct EscrowResponse {
    escrow: Escrow,
}

#[derive(Serialize)]
struct EscrowListResponse {
    escrows: Vec<Escrow>,
}

#[derive(Serialize)]
struct EscrowStatusResponse {
    escrow: Escrow,
    timelocks: crate::escrow::TimelockStatus,
}

#[derive(Serialize)]
struct PayoutResponse {
    escrow: Escrow,
    payout: Payout,
}
