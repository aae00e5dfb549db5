//! # prov-api server entry point
//!
//! Wires the store backend (PostgreSQL when `DATABASE_URL` is set,
//! in-memory otherwise), runs the one-shot chain bootstrap, and serves
//! the application router.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use prov_api::state::{AppConfig, AppState};
use prov_chain::BootstrapState;
use prov_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let (store, store_backend): (Arc<dyn Store>, &'static str) =
        match prov_store::postgres::init_pool().await? {
            Some(pool) => (Arc::new(PgStore::new(pool)), "postgres"),
            None => (Arc::new(MemoryStore::new()), "memory"),
        };

    let chain = BootstrapState::initialize().await;
    match &chain {
        BootstrapState::Ready(_) => tracing::info!("chain integration ready"),
        BootstrapState::Degraded { reason } => {
            tracing::warn!(reason = %reason, "continuing without chain integration")
        }
        BootstrapState::Uninitialized => unreachable!("initialize always resolves"),
    }

    let state = AppState::with_parts(store, store_backend, chain, config.clone());
    let app = prov_api::app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
