use std::sync::Arc;

use crate::domain::models::invitation::Invitation;
use crate::domain::ports::InvitationRepository;
use crate::error::AppError;
use crate::infra::baas::client::{decode_first, decode_rows, BaasClient};
use async_trait::async_trait;

const TABLE: &str = "invitations";

pub struct BaasInvitationRepo {
    client: Arc<BaasClient>,
}

impl BaasInvitationRepo {
    pub fn new(client: Arc<BaasClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InvitationRepository for BaasInvitationRepo {
    async fn create(&self, invitation: &Invitation) -> Result<Invitation, AppError> {
        let row = serde_json::to_value(invitation).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self.client.insert(TABLE, &row).await?;
        decode_first(rows)?.ok_or_else(|| AppError::InternalWithMsg("Invitation insert returned no data".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invitation>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("id", format!("eq.{}", id))], None, Some(1))
            .await?;
        decode_first(rows)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("invitation_token", format!("eq.{}", token))], None, Some(1))
            .await?;
        decode_first(rows)
    }

    async fn list_by_enterprise(&self, enterprise_id: &str) -> Result<Vec<Invitation>, AppError> {
        let rows = self
            .client
            .select(
                TABLE,
                &[("enterprise_id", format!("eq.{}", enterprise_id))],
                Some("sent_at.desc"),
                None,
            )
            .await?;
        decode_rows(rows)
    }

    async fn find_pending(&self, enterprise_id: &str, email: &str) -> Result<Option<Invitation>, AppError> {
        let rows = self
            .client
            .select(
                TABLE,
                &[
                    ("enterprise_id", format!("eq.{}", enterprise_id)),
                    ("email", format!("eq.{}", email)),
                    ("status", "eq.pending".to_string()),
                ],
                None,
                Some(1),
            )
            .await?;
        decode_first(rows)
    }

    async fn list_pending_by_email(&self, email: &str) -> Result<Vec<Invitation>, AppError> {
        let rows = self
            .client
            .select(
                TABLE,
                &[
                    ("email", format!("eq.{}", email)),
                    ("status", "eq.pending".to_string()),
                ],
                None,
                None,
            )
            .await?;
        decode_rows(rows)
    }

    async fn update(&self, invitation: &Invitation) -> Result<Invitation, AppError> {
        let patch = serde_json::to_value(invitation).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self
            .client
            .update(TABLE, &[("id", format!("eq.{}", invitation.id))], &patch)
            .await?;
        decode_first(rows)?.ok_or_else(|| AppError::NotFound("Invitation not found".into()))
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, AppError> {
        let rows = self
            .client
            .delete(TABLE, &[("email", format!("eq.{}", email))])
            .await?;
        Ok(rows.len() as u64)
    }
}
