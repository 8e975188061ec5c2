//! Prometheus metrics for card-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics`
//! endpoint.

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const CARDS_CREATED_TOTAL: &str = "card_cards_created_total";
const FACES_EXPORTED_TOTAL: &str = "card_faces_exported_total";
const EXPORT_FAILURES_TOTAL: &str = "card_export_failures_total";
const CARD_VIEWS_TOTAL: &str = "card_views_total";
const DELIVERIES_CREATED_TOTAL: &str = "card_deliveries_created_total";
const VALIDATION_FAILURES_TOTAL: &str = "card_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a newly created card.
pub fn record_card_created() {
    counter!(CARDS_CREATED_TOTAL).increment(1);
}

/// Record one successfully exported face bitmap.
///
/// # Arguments
///
/// * `face` - The exported face ("front", "inside_left", "inside_right")
pub fn record_face_exported(face: &str) {
    counter!(
        FACES_EXPORTED_TOTAL,
        "face" => face.to_string()
    )
    .increment(1);
}

/// Record an aborted export.
///
/// # Arguments
///
/// * `stage` - The stage that failed ("render", "upload", "record")
pub fn record_export_failure(stage: &str) {
    counter!(
        EXPORT_FAILURES_TOTAL,
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a delivery token creation.
pub fn record_delivery_created() {
    counter!(DELIVERIES_CREATED_TOTAL).increment(1);
}

/// Record a successful viewer resolution.
pub fn record_card_view() {
    counter!(CARD_VIEWS_TOTAL).increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (user_id, title, design, asset, ...)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
