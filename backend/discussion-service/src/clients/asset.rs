use super::build_service_client;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

const SERVICE: &str = "asset-management";

/// Owner and display name of a platform asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSummary {
    pub owner_id: String,
    pub name: String,
}

#[async_trait]
pub trait AssetDirectory: Send + Sync {
    async fn asset_summary(&self, asset_id: Uuid) -> Result<AssetSummary>;
}

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    data: AssetData,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    public: AssetPublic,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetPublic {
    desp_user_id: String,
    #[serde(default)]
    name: String,
}

/// asset-management REST client
#[derive(Clone)]
pub struct AssetClient {
    client: reqwest::Client,
    base_url: String,
}

impl AssetClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            client: build_service_client(SERVICE, timeout_ms)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AssetDirectory for AssetClient {
    async fn asset_summary(&self, asset_id: Uuid) -> Result<AssetSummary> {
        let url = format!("{}/{}", self.base_url, asset_id);
        debug!(asset_id = %asset_id, "Fetching asset from asset-management");

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

        let status = response.status();
        if !status.is_success() {
            error!(asset_id = %asset_id, status = status.as_u16(), "Asset lookup failed");
            return Err(upstream(format!("asset lookup answered {}", status.as_u16())));
        }

        let envelope: AssetEnvelope = response
            .json()
            .await
            .map_err(|e| upstream(format!("malformed asset payload: {}", e)))?;

        Ok(AssetSummary {
            owner_id: envelope.data.public.desp_user_id,
            name: envelope.data.public.name,
        })
    }
}
