//! # Application State
//!
//! Shared state passed to every route handler: the document store, the
//! chain bootstrap outcome, and static configuration. All of it is
//! cheap to clone — the store and chain context are behind `Arc`.

use std::sync::Arc;

use prov_chain::BootstrapState;
use prov_store::{MemoryStore, Store};

/// Static configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the server binds.
    pub port: u16,
    /// Network label surfaced on the health endpoint.
    pub network: String,
}

impl AppConfig {
    /// Read configuration from the environment, with defaults suitable
    /// for local development.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self {
            port,
            network: "sepolia".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            network: "sepolia".to_string(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Label of the active store backend ("memory" or "postgres").
    pub store_backend: &'static str,
    /// Chain bootstrap outcome, fixed for the process lifetime.
    pub chain: BootstrapState,
    pub config: AppConfig,
}

impl AppState {
    /// In-memory store, no chain integration. The default for tests.
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            store_backend: "memory",
            chain: BootstrapState::Degraded {
                reason: "chain integration not configured".to_string(),
            },
            config: AppConfig::default(),
        }
    }

    /// Full constructor used by the binary and by tests that script the
    /// chain.
    pub fn with_parts(
        store: Arc<dyn Store>,
        store_backend: &'static str,
        chain: BootstrapState,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            store_backend,
            chain,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
