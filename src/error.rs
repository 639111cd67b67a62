//! Error types for the Crosslock coordinator

use thiserror::Error;
use uuid::Uuid;

/// Main error type for swap coordination
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Validation errors - rejected at the call boundary, never partially applied
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid expiration {expires_at}, must be after {now}")]
    InvalidExpiration { expires_at: u64, now: u64 },

    #[error("Invalid hashlock: {0}")]
    InvalidHashlock(String),

    #[error("Invalid timelocks: {0}")]
    InvalidTimelocks(String),

    #[error("Intent signature invalid for maker {maker}")]
    SignatureInvalid { maker: String },

    #[error("Assets must live on different chains (both on chain {chain_id})")]
    SameChainAssets { chain_id: u64 },

    // State errors - wrong status for the requested transition
    #[error("Order {order_id} not found")]
    OrderNotFound { order_id: Uuid },

    #[error("Order {order_id} is {status}, expected Pending")]
    OrderNotPending { order_id: Uuid, status: String },

    #[error("Order {order_id} expired at {expires_at}")]
    OrderExpired { order_id: Uuid, expires_at: u64 },

    #[error("Invalid order transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order {order_id} is not awaiting secret reveal")]
    EscrowsNotReady { order_id: Uuid },

    #[error("Escrow {escrow_id} not found")]
    EscrowNotFound { escrow_id: String },

    #[error("Escrow {escrow_id} is {status}, no further action possible")]
    EscrowTerminal { escrow_id: String, status: String },

    #[error("Stage {stage} not reached, opens at {opens_at} (now {now})")]
    StageNotReached {
        stage: String,
        opens_at: u64,
        now: u64,
    },

    #[error("Secret does not match hashlock")]
    InvalidSecret,

    // Authorization errors - wrong caller for a role-gated operation
    #[error("Caller {caller} is not the {role} for this operation")]
    Unauthorized { caller: String, role: String },

    #[error("Resolver {resolver} is not on the allowlist")]
    ResolverNotAllowed { resolver: String },

    // Cross-chain consistency errors - fatal for the creation attempt
    #[error(
        "Destination cancellation {dst_cancellation} would outlive source cancellation deadline {src_deadline}"
    )]
    InvalidCreationTime {
        dst_cancellation: u64,
        src_deadline: u64,
    },

    #[error("Computed escrow identity {computed} does not match deployed {deployed}")]
    IdentityMismatch { computed: String, deployed: String },

    // External dependency errors - surfaced to the caller, never retried here
    #[error("Identity not found: {id}")]
    IdentityNotFound { id: String },

    #[error("Token transfer failed: {0}")]
    Transfer(String),

    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u128, need: u128 },

    // Resource limits
    #[error("Too many active orders (limit {limit})")]
    TooManyOrders { limit: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SwapError {
    /// Check if the caller may reasonably retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, SwapError::Database(_) | SwapError::Transfer(_))
    }

    /// Cross-chain consistency violations are fatal for the escrow creation
    /// attempt and must never be coerced into a success path.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SwapError::IdentityMismatch { .. } | SwapError::InvalidCreationTime { .. }
        )
    }
}

/// Result type for swap operations
pub type SwapResult<T> = Result<T, SwapError>;
