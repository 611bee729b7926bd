use super::build_service_client;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

const SERVICE: &str = "auth";

/// Resolves platform user ids to contact details.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn email_for_user(&self, user_id: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    data: ProfileData,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    profile: Profile,
}

#[derive(Debug, Deserialize)]
struct Profile {
    email: String,
}

#[derive(Clone)]
pub struct AuthServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl AuthServiceClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: build_service_client(SERVICE, timeout_ms)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserDirectory for AuthServiceClient {
    async fn email_for_user(&self, user_id: &str) -> Result<String> {
        let url = format!(
            "{}/profile/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        debug!(user_id, "Fetching user profile");

        let upstream = |message: String| AppError::UpstreamService {
            service: SERVICE,
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        if !response.status().is_success() {
            error!(user_id, status = response.status().as_u16(), "Profile lookup failed");
            return Err(upstream(format!(
                "profile lookup answered {}",
                response.status().as_u16()
            )));
        }

        let envelope: ProfileEnvelope = response
            .json()
            .await
            .map_err(|e| upstream(format!("malformed profile payload: {}", e)))?;

        Ok(envelope.data.profile.email)
    }
}
