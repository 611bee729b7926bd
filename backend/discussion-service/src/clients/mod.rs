//! Outbound HTTP clients
//!
//! - `discourse`: the forum engine holding categories, topics and posts
//! - `asset`: asset-management lookups (owner and display name)
//! - `auth`: user profile lookups (e-mail addresses)

pub mod asset;
pub mod auth;
pub mod discourse;

pub use asset::{AssetClient, AssetDirectory, AssetSummary};
pub use auth::{AuthServiceClient, UserDirectory};
pub use discourse::{DiscourseClient, ForumClient};

use crate::error::{AppError, Result};
use std::time::Duration;

/// Plain JSON client shared by the platform service clients.
pub(crate) fn build_service_client(
    service: &'static str,
    timeout_ms: u64,
) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .connect_timeout(Duration::from_millis(timeout_ms.min(2_000)))
        .build()
        .map_err(|e| AppError::UpstreamService {
            service,
            message: format!("failed to build HTTP client: {}", e),
        })
}
