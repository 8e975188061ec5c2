//! Health check endpoints for Kubernetes probes.
//!
//! Provides liveness and readiness probes for container orchestration:
//! - `/health/live` - Liveness probe (restart if fails)
//! - `/health/ready` - Readiness probe (remove from LB if fails)
//! - `/health` - Combined check for backward compatibility

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{AppState, CardId};

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Individual component checks
    pub checks: HealthChecks,
}

/// Individual health checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Row store accessible
    pub card_store: bool,
}

/// Liveness probe - is the server running?
///
/// Returns 200 OK if the process is alive.
/// Kubernetes will restart the pod if this fails.
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - is the server ready to accept traffic?
///
/// Checks that the row store answers queries.
/// Kubernetes will remove the pod from the load balancer if this fails.
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    // A lookup for a card that cannot exist still exercises the store.
    let store_ok = state.cards.get_card(CardId::new()).await.is_ok();

    let status = HealthStatus {
        status: if store_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        checks: HealthChecks {
            card_store: store_ok,
        },
    };

    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
