use std::sync::Arc;

use crate::domain::models::enterprise::Enterprise;
use crate::domain::ports::EnterpriseRepository;
use crate::error::AppError;
use crate::infra::baas::client::{decode_first, decode_rows, BaasClient};
use async_trait::async_trait;

const TABLE: &str = "enterprises";

pub struct BaasEnterpriseRepo {
    client: Arc<BaasClient>,
}

impl BaasEnterpriseRepo {
    pub fn new(client: Arc<BaasClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnterpriseRepository for BaasEnterpriseRepo {
    async fn create(&self, enterprise: &Enterprise) -> Result<Enterprise, AppError> {
        let row = serde_json::to_value(enterprise).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self.client.insert(TABLE, &row).await?;
        decode_first(rows)?.ok_or_else(|| AppError::InternalWithMsg("Enterprise insert returned no data".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Enterprise>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("id", format!("eq.{}", id))], None, Some(1))
            .await?;
        decode_first(rows)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Enterprise>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("email", format!("eq.{}", email))], None, Some(1))
            .await?;
        decode_first(rows)
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Enterprise>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("created_by", format!("eq.{}", user_id))], None, None)
            .await?;
        decode_rows(rows)
    }

    async fn update(&self, enterprise: &Enterprise) -> Result<Enterprise, AppError> {
        let patch = serde_json::to_value(enterprise).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self
            .client
            .update(TABLE, &[("id", format!("eq.{}", enterprise.id))], &patch)
            .await?;
        decode_first(rows)?.ok_or_else(|| AppError::NotFound("Enterprise not found".into()))
    }
}
