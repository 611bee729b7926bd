//! Health, readiness and liveness probes.

use crate::services::DiscussionService;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

fn component(
    result: crate::error::Result<()>,
    started: Instant,
    ok: &str,
    failed: &str,
) -> ComponentCheck {
    let latency_ms = Some(started.elapsed().as_millis() as u64);
    match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: ok.to_string(),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("{}: {}", failed, e),
            latency_ms,
        },
    }
}

pub async fn health_summary(service: web::Data<DiscussionService>) -> HttpResponse {
    match service.categories().ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "discussion-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "discussion-service"
        })),
    }
}

pub async fn readiness_check(service: web::Data<DiscussionService>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let pg = service.categories().ping().await;
    checks.insert(
        "postgresql".to_string(),
        component(pg, start, "PostgreSQL connection successful", "PostgreSQL connection failed"),
    );

    let start = Instant::now();
    let forum = service.forum().health_check().await;
    checks.insert(
        "discourse".to_string(),
        component(forum, start, "Discourse reachable", "Discourse check failed"),
    );

    let ready = checks
        .values()
        .all(|c| c.status == ComponentStatus::Healthy);
    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        tracing::warn!("Readiness check failed");
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
