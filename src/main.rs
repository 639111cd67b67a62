//! Crosslock Coordinator - cross-chain atomic swap coordination
//!
//! Coordinates HTLC-based swaps between independent chains: deterministic
//! escrow factories on each chain, a Dutch-auction pricer for resolver
//! competition, and a central orderbook that tracks swap lifecycle without
//! ever holding custody itself.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod api;
mod auction;
mod config;
mod error;
mod escrow;
mod events;
mod hashlock;
mod identity;
mod ledger;
mod metrics;
mod order;
mod state;
mod types;

use config::Settings;
use escrow::EscrowFactory;
use events::EventBus;
use identity::IdentityMap;
use ledger::{InMemoryLedger, PermissiveVerifier};
use metrics::MetricsServer;
use order::Coordinator;
use state::StateManager;
use types::{unix_now, ChainId};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Crosslock Coordinator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        instance = settings.coordinator.instance_id.as_str(),
        "Loaded configuration for {} chains",
        settings.enabled_chains().len()
    );

    // Initialize database connection
    let state_manager = Arc::new(StateManager::new(&settings.database).await?);
    info!("Database connection established");

    // Run migrations
    state_manager.run_migrations().await?;

    // Initialize metrics server
    let metrics_server = if settings.metrics.enabled {
        Some(MetricsServer::new(settings.metrics.port))
    } else {
        None
    };

    // Chain adapters. The in-memory ledger and presence-only verifier are
    // the dev-mode capability set; production deployments swap these for
    // real chain adapters behind the same traits.
    let token_ledger = Arc::new(InMemoryLedger::new());
    let intent_verifier = Arc::new(PermissiveVerifier);

    // One escrow factory per enabled chain, reloaded from Postgres
    let mut factories: HashMap<ChainId, Arc<EscrowFactory>> = HashMap::new();
    for (name, chain) in settings.enabled_chains() {
        let factory = Arc::new(EscrowFactory::new(
            chain.chain_id,
            token_ledger.clone(),
            intent_verifier.clone(),
        ));
        let escrows = state_manager.load_escrows(chain.chain_id).await?;
        let count = escrows.len();
        for escrow in escrows {
            factory.restore(escrow).await;
        }
        info!(
            chain = name.as_str(),
            chain_id = chain.chain_id,
            restored = count,
            "escrow factory ready"
        );
        factories.insert(chain.chain_id, factory);
    }
    let factories = Arc::new(factories);

    // Coordinator, reloaded from Postgres
    let event_bus = EventBus::new();
    let coordinator = Arc::new(Coordinator::new(
        settings.coordinator.order_policy(),
        intent_verifier.clone(),
        event_bus.clone(),
    ));
    let orders = state_manager.load_orders().await?;
    info!(restored = orders.len(), "order ledger reloaded");
    for order in orders {
        coordinator.restore(order).await;
    }

    let identity = Arc::new(IdentityMap::new());

    // Persist and meter every lifecycle event
    let event_handle = tokio::spawn({
        let state_manager = state_manager.clone();
        let mut rx = event_bus.subscribe();
        async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        metrics::record_event(&event);
                        let mut result = state_manager.store_event(&event).await;
                        if result.as_ref().is_err_and(|e| e.is_retryable()) {
                            result = state_manager.store_event(&event).await;
                        }
                        if let Err(e) = result {
                            warn!("Failed to persist {} event: {}", event.name(), e);
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Event subscriber lagged, {} events dropped", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });

    // Start API server
    let api_handle = tokio::spawn({
        let settings = settings.clone();
        let app_state = api::AppState {
            coordinator: coordinator.clone(),
            factories: factories.clone(),
            state_manager: state_manager.clone(),
            identity: identity.clone(),
            timelock_defaults: settings.timelocks.clone(),
        };
        async move {
            if let Err(e) = api::run_server(settings.api, app_state).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Start metrics server
    let metrics_handle = metrics_server.map(|server| {
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        })
    });

    // Expired-order sweep
    let sweep_handle = tokio::spawn({
        let coordinator = coordinator.clone();
        let state_manager = state_manager.clone();
        let interval = settings.coordinator.sweep_interval_ms;
        async move {
            let mut ticker =
                tokio::time::interval(tokio::time::Duration::from_millis(interval));
            loop {
                ticker.tick().await;
                let swept = coordinator.handle_timeout(unix_now()).await;

                let stats = coordinator.stats().await;
                metrics::record_active_orders("pending", stats.pending);
                metrics::record_active_orders("accepted", stats.accepted);
                metrics::record_active_orders("escrows_ready", stats.escrows_ready);

                if swept.is_empty() {
                    continue;
                }
                metrics::record_sweep(swept.len());
                for order_id in swept {
                    match coordinator.get_order(order_id).await {
                        Ok(order) => {
                            if let Err(e) = state_manager.upsert_order(&order).await {
                                warn!("Failed to persist swept order {}: {}", order_id, e);
                            }
                        }
                        Err(e) => warn!("Swept order {} vanished: {}", order_id, e),
                    }
                }
            }
        }
    });

    info!("Crosslock Coordinator is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    // Abort background tasks
    api_handle.abort();
    sweep_handle.abort();
    event_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Crosslock Coordinator stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,crosslock_coordinator=debug,sqlx=warn,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
