//! # Cardpost Server
//!
//! JSON API for the greeting-card designer and delivery experience.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use card_server::{
    metrics, AppState, HttpObjectStore, MemoryCardStore, MemoryObjectStore, ObjectStore,
    ServerConfig,
};

/// Default port for the card server.
const DEFAULT_PORT: u16 = 2273; // "CARD" on phone keypad

/// Build a CORS layer that only allows localhost origins.
///
/// The server is designed to sit behind a gateway; direct browser access
/// is expected only from local development hosts.
fn build_cors_layer(port: u16) -> CorsLayer {
    let localhost_origins = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Common development ports for web dev servers
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ];

    let origins: Vec<HeaderValue> = localhost_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,card_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output (recommended for production).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,card_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Pick the object store from the environment: a remote storage endpoint
/// when `CARD_STORAGE_URL`/`CARD_STORAGE_KEY` are set, in-memory otherwise.
fn build_object_store() -> anyhow::Result<Arc<dyn ObjectStore>> {
    match (
        std::env::var("CARD_STORAGE_URL"),
        std::env::var("CARD_STORAGE_KEY"),
    ) {
        (Ok(url), Ok(key)) => {
            tracing::info!("Using remote object storage at {url}");
            let store = HttpObjectStore::new(&url, key)
                .map_err(|e| anyhow::anyhow!("object store configuration: {e}"))?;
            Ok(Arc::new(store))
        }
        _ => {
            tracing::warn!("CARD_STORAGE_URL not set; using in-memory object storage");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let metrics_handle = metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize Prometheus metrics: {}", e))?;
    tracing::info!("Prometheus metrics initialized");

    let port = std::env::var("CARD_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let config = ServerConfig {
        public_base_url: std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}")),
    };

    let state = AppState {
        objects: build_object_store()?,
        cards: Arc::new(MemoryCardStore::new()),
        config: Arc::new(config),
    };

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = card_server::build_router(state)
        .merge(metrics_router)
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(build_cors_layer(port))
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Cardpost server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
