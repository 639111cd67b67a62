//! PostgreSQL state manager
//!
//! The order ledger and escrow records are the only state that must
//! survive restarts: every order and every escrow's terminal state has to
//! be reconstructible. Rows carry the full serialized record as JSONB plus
//! the few columns worth indexing; the in-memory maps are rebuilt from
//! here on startup.

use crate::config::DatabaseConfig;
use crate::error::{SwapError, SwapResult};
use crate::escrow::Escrow;
use crate::events::SwapEvent;
use crate::order::{Order, OrderId};
use crate::types::ChainId;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info};

/// State manager for PostgreSQL persistence
pub struct StateManager {
    pool: PgPool,
}

impl StateManager {
    /// Create a new state manager
    pub async fn new(config: &DatabaseConfig) -> SwapResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await
            .map_err(SwapError::Database)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> SwapResult<()> {
        // In production, use sqlx::migrate!
        // For now, create tables inline

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                order_id UUID PRIMARY KEY,
                status VARCHAR(20) NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_orders_status
            ON orders (status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS escrows (
                escrow_id VARCHAR(64) PRIMARY KEY,
                chain_id BIGINT NOT NULL,
                status VARCHAR(20) NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_escrows_chain
            ON escrows (chain_id, status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS swap_events (
                id BIGSERIAL PRIMARY KEY,
                order_id UUID NOT NULL,
                event_type VARCHAR(50) NOT NULL,
                event_data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_events_order
            ON swap_events (order_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> SwapResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(SwapError::Database)?;
        Ok(())
    }

    /// Write an order's current state, inserting or replacing
    pub async fn upsert_order(&self, order: &Order) -> SwapResult<()> {
        let data = serde_json::to_value(order)
            .map_err(|e| SwapError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, status, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id)
            DO UPDATE SET status = $2, data = $3, updated_at = NOW()
            "#,
        )
        .bind(order.id)
        .bind(order.status.name())
        .bind(data)
        .execute(&self.pool)
        .await?;

        debug!("Persisted order {} ({})", order.id, order.status.name());
        Ok(())
    }

    /// Load every persisted order. Orders are never deleted; terminal ones
    /// are kept for audit and statistics.
    pub async fn load_orders(&self) -> SwapResult<Vec<Order>> {
        let rows = sqlx::query("SELECT data FROM orders")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.get("data");
                serde_json::from_value(data).map_err(|e| SwapError::Internal(e.to_string()))
            })
            .collect()
    }

    /// Write an escrow's current state, inserting or replacing
    pub async fn upsert_escrow(&self, escrow: &Escrow) -> SwapResult<()> {
        let data = serde_json::to_value(escrow)
            .map_err(|e| SwapError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO escrows (escrow_id, chain_id, status, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (escrow_id)
            DO UPDATE SET status = $3, data = $4, updated_at = NOW()
            "#,
        )
        .bind(escrow.id.to_hex())
        .bind(escrow.immutables.chain_id as i64)
        .bind(escrow.status.name())
        .bind(data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load all escrows for one chain's factory
    pub async fn load_escrows(&self, chain_id: ChainId) -> SwapResult<Vec<Escrow>> {
        let rows = sqlx::query("SELECT data FROM escrows WHERE chain_id = $1")
            .bind(chain_id as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.get("data");
                serde_json::from_value(data).map_err(|e| SwapError::Internal(e.to_string()))
            })
            .collect()
    }

    /// Append a lifecycle event to the audit trail
    pub async fn store_event(&self, event: &SwapEvent) -> SwapResult<()> {
        let event_data = serde_json::to_value(event)
            .map_err(|e| SwapError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO swap_events (order_id, event_type, event_data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(event.order_id())
        .bind(event.name())
        .bind(event_data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Audit trail for one order, oldest first
    pub async fn events_for_order(&self, order_id: OrderId) -> SwapResult<Vec<SwapEvent>> {
        let rows = sqlx::query(
            "SELECT event_data FROM swap_events WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let data: serde_json::Value = row.get("event_data");
                serde_json::from_value(data).map_err(|e| SwapError::Internal(e.to_string()))
            })
            .collect()
    }

    /// Get order statistics
    pub async fn get_stats(&self) -> SwapResult<OrderStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(*) FILTER (WHERE status = 'pending') as pending,
                COUNT(*) FILTER (WHERE status = 'accepted') as accepted,
                COUNT(*) FILTER (WHERE status = 'escrows_ready') as escrows_ready,
                COUNT(*) FILTER (WHERE status = 'completed') as completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') as cancelled,
                COUNT(*) FILTER (WHERE status = 'failed') as failed
            FROM orders
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderStats {
            total: row.get::<i64, _>("total") as u64,
            pending: row.get::<i64, _>("pending") as u64,
            accepted: row.get::<i64, _>("accepted") as u64,
            escrows_ready: row.get::<i64, _>("escrows_ready") as u64,
            completed: row.get::<i64, _>("completed") as u64,
            cancelled: row.get::<i64, _>("cancelled") as u64,
            failed: row.get::<i64, _>("failed") as u64,
        })
    }
}

/// Order statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderStats {
    pub total: u64,
    pub pending: u64,
    pub accepted: u64,
    pub escrows_ready: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failed: u64,
}
