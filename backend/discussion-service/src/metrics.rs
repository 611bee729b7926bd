//! Prometheus metrics for discussion-service.
//!
//! Exposes forum/event collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Discourse calls segmented by operation and outcome (ok, not_found, error).
    pub static ref FORUM_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discussion_forum_requests_total",
        "Discourse API calls segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register discussion_forum_requests_total");

    /// Latency of Discourse calls by operation.
    pub static ref FORUM_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "discussion_forum_request_duration_seconds",
        "Discourse API call duration segmented by operation",
        &["operation"]
    )
    .expect("failed to register discussion_forum_request_duration_seconds");

    /// Kafka events segmented by kind (moderation, notification) and result.
    pub static ref EVENTS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "discussion_events_published_total",
        "Events published to Kafka segmented by kind and result",
        &["kind", "result"]
    )
    .expect("failed to register discussion_events_published_total");

    /// Categories created lazily for assets.
    pub static ref CATEGORIES_CREATED_TOTAL: IntCounter = register_int_counter!(
        "discussion_categories_created_total",
        "Discourse categories created for assets"
    )
    .expect("failed to register discussion_categories_created_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
