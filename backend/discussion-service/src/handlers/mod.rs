/// HTTP handlers for discussion endpoints
///
/// - `discussion`: asset discussions and category topic listings (public)
/// - `topics`: topic reads, creation, replies and deletion
/// - `posts`: post edition and moderation callbacks
/// - `health`: health, readiness and liveness probes
pub mod discussion;
pub mod health;
pub mod posts;
pub mod topics;

pub use discussion::{get_discussion, list_topics};
pub use health::{health_summary, liveness_check, readiness_check};
pub use posts::{edit_post, moderate_post};
pub use topics::{create_post, create_topic, delete_topic, get_topic, moderate_topic};

use crate::error::AppError;
use actix_web::web;

/// Register every discussion route plus JSON/path error handling.
///
/// Moderation routes are registered before their `/{id}` siblings so `moderate` is never read as
/// an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
    )
    .route("/api/v1/health", web::get().to(health_summary))
    .route("/api/v1/health/ready", web::get().to(readiness_check))
    .route("/api/v1/health/live", web::get().to(liveness_check))
    .route("/discussion/{asset_id}", web::get().to(get_discussion))
    .route("/topics/{slug}/{category}", web::get().to(list_topics))
    .route("/topic", web::post().to(create_topic))
    .route("/topic/moderate/{topic_id}", web::delete().to(moderate_topic))
    .service(
        web::resource("/topic/{topic_id}")
            .route(web::get().to(get_topic))
            .route(web::post().to(create_post))
            .route(web::delete().to(delete_topic)),
    )
    .route("/post/moderate/{post_id}", web::put().to(moderate_post))
    .route("/post/{post_id}", web::put().to(edit_post));
}
