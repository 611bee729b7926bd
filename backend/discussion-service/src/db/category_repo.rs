use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Persistent asset → Discourse category mapping
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn category_for_asset(&self, asset_id: Uuid) -> Result<Option<i64>>;

    /// Insert or replace the category bound to `asset_id`.
    async fn save_category(&self, asset_id: Uuid, category_id: i64) -> Result<()>;

    /// Bind `category_id` only if the asset has no mapping yet. Returns the bound category.
    async fn bind_category(&self, asset_id: Uuid, category_id: i64) -> Result<i64>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct PgCategoryStore {
    pool: PgPool,
}

impl PgCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn category_for_asset(&self, asset_id: Uuid) -> Result<Option<i64>> {
        let category_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT category_id
            FROM discourses
            WHERE asset_id = $1
            "#,
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(asset_id = %asset_id, ?category_id, "Category mapping lookup");
        Ok(category_id)
    }

    async fn save_category(&self, asset_id: Uuid, category_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO discourses (asset_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT (asset_id)
            DO UPDATE SET category_id = EXCLUDED.category_id, updated_at = NOW()
            "#,
        )
        .bind(asset_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;

        debug!(asset_id = %asset_id, category_id, "Category mapping saved");
        Ok(())
    }

    async fn bind_category(&self, asset_id: Uuid, category_id: i64) -> Result<i64> {
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO discourses (asset_id, category_id)
            VALUES ($1, $2)
            ON CONFLICT (asset_id) DO NOTHING
            RETURNING category_id
            "#,
        )
        .bind(asset_id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(bound) = inserted {
            debug!(asset_id = %asset_id, category_id = bound, "Category mapping bound");
            return Ok(bound);
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT category_id FROM discourses WHERE asset_id = $1",
        )
        .bind(asset_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(asset_id = %asset_id, category_id = existing, "Category mapping already bound");
        Ok(existing)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
