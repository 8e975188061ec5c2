//! # Card Server Library
//!
//! Shared types and functionality for the Cardpost server.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

pub mod error;
pub mod export;
pub mod health;
pub mod metrics;
pub mod records;
pub mod routes;
pub mod storage;
pub mod tokens;
pub mod validation;

pub use error::{ServiceError, ServiceResult};
pub use records::{CardFacesRecord, CardId, CardRecord, CardStore, DeliveryRecord, MemoryCardStore};
pub use storage::{HttpObjectStore, MemoryObjectStore, ObjectStore, StorageError};

/// Server configuration derived from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL used to build share links, e.g. `https://cards.example.com`.
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:2273".to_string(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Object storage for assets and exported face bitmaps.
    pub objects: Arc<dyn ObjectStore>,
    /// Row storage for cards, designs, face lookups, and deliveries.
    pub cards: Arc<dyn CardStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State backed by in-memory stores (tests and development).
    #[must_use]
    pub fn in_memory(config: ServerConfig) -> Self {
        Self {
            objects: Arc::new(MemoryObjectStore::new()),
            cards: Arc::new(MemoryCardStore::new()),
            config: Arc::new(config),
        }
    }
}

/// Build the API router. The `/metrics` route is attached separately by
/// the binary, which owns the Prometheus handle.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route(
            "/api/cards",
            post(routes::create_card).get(routes::list_cards),
        )
        .route(
            "/api/cards/{card_id}/design",
            get(routes::get_design).put(routes::put_design),
        )
        .route("/api/cards/{card_id}/assets", post(routes::upload_asset))
        .route("/api/cards/{card_id}/export", post(routes::export_card))
        .route("/api/cards/{card_id}/deliver", post(routes::deliver_card))
        .route("/api/viewer/{token}", get(routes::view_card))
        .with_state(state)
}
