use std::sync::Arc;

use crate::domain::models::settings::{SettingsHistoryEntry, UserSettings};
use crate::domain::ports::SettingsRepository;
use crate::error::AppError;
use crate::infra::baas::client::{decode_first, decode_rows, BaasClient};
use async_trait::async_trait;

const TABLE: &str = "user_settings";
const HISTORY_TABLE: &str = "user_settings_history";

pub struct BaasSettingsRepo {
    client: Arc<BaasClient>,
}

impl BaasSettingsRepo {
    pub fn new(client: Arc<BaasClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SettingsRepository for BaasSettingsRepo {
    async fn get(&self, user_id: &str, settings_type: &str) -> Result<Option<UserSettings>, AppError> {
        let rows = self
            .client
            .select(
                TABLE,
                &[
                    ("user_id", format!("eq.{}", user_id)),
                    ("settings_type", format!("eq.{}", settings_type)),
                ],
                None,
                Some(1),
            )
            .await?;
        decode_first(rows)
    }

    async fn upsert(&self, settings: &UserSettings) -> Result<UserSettings, AppError> {
        let row = serde_json::to_value(settings).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self.client.upsert(TABLE, &row, "user_id,settings_type").await?;
        decode_first(rows)?.ok_or_else(|| AppError::InternalWithMsg("Settings upsert returned no data".into()))
    }

    async fn delete(&self, user_id: &str, settings_type: &str) -> Result<(), AppError> {
        self.client
            .delete(
                TABLE,
                &[
                    ("user_id", format!("eq.{}", user_id)),
                    ("settings_type", format!("eq.{}", settings_type)),
                ],
            )
            .await?;
        Ok(())
    }

    async fn append_history(&self, entry: &SettingsHistoryEntry) -> Result<(), AppError> {
        let row = serde_json::to_value(entry).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        self.client.insert(HISTORY_TABLE, &row).await?;
        Ok(())
    }

    async fn list_history(&self, user_id: &str, settings_type: &str, limit: usize) -> Result<Vec<SettingsHistoryEntry>, AppError> {
        let rows = self
            .client
            .select(
                HISTORY_TABLE,
                &[
                    ("user_id", format!("eq.{}", user_id)),
                    ("settings_type", format!("eq.{}", settings_type)),
                ],
                Some("created_at.desc"),
                Some(limit),
            )
            .await?;
        decode_rows(rows)
    }

    async fn list_history_for_users(
        &self,
        user_ids: &[String],
        settings_type: &str,
        limit: usize,
    ) -> Result<Vec<SettingsHistoryEntry>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .select(
                HISTORY_TABLE,
                &[
                    ("user_id", format!("in.({})", user_ids.join(","))),
                    ("settings_type", format!("eq.{}", settings_type)),
                ],
                Some("created_at.desc"),
                Some(limit),
            )
            .await?;
        decode_rows(rows)
    }

    async fn delete_history_record(&self, user_id: &str, record_id: &str) -> Result<bool, AppError> {
        let rows = self
            .client
            .delete(
                HISTORY_TABLE,
                &[
                    ("id", format!("eq.{}", record_id)),
                    ("user_id", format!("eq.{}", user_id)),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let rows = self
            .client
            .delete(TABLE, &[("user_id", format!("eq.{}", user_id))])
            .await?;
        Ok(rows.len() as u64)
    }

    async fn delete_history_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let rows = self
            .client
            .delete(HISTORY_TABLE, &[("user_id", format!("eq.{}", user_id))])
            .await?;
        Ok(rows.len() as u64)
    }
}
