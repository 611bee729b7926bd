/// Discussion Service Library
///
/// Gives every platform asset a forum discussion backed by Discourse: one category per asset,
/// topics and posts created on behalf of platform users, and moderation hand-off over Kafka.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `services`: discussion orchestration
/// - `clients`: Discourse, asset-management and auth HTTP clients
/// - `db`: PostgreSQL pool, migrations and the asset → category mapping
/// - `events`: moderation and notification events published to Kafka
/// - `middleware`: JWT authentication and request extractors
/// - `models`: Discourse payloads, API bodies and responses
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::DiscussionService;
