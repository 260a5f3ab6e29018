use std::sync::Arc;

use crate::domain::models::membership::OrganizationUser;
use crate::domain::ports::MembershipRepository;
use crate::error::AppError;
use crate::infra::baas::client::{decode_first, decode_rows, BaasClient};
use async_trait::async_trait;

const TABLE: &str = "organization_users";

pub struct BaasMembershipRepo {
    client: Arc<BaasClient>,
}

impl BaasMembershipRepo {
    pub fn new(client: Arc<BaasClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MembershipRepository for BaasMembershipRepo {
    async fn create(&self, membership: &OrganizationUser) -> Result<OrganizationUser, AppError> {
        let row = serde_json::to_value(membership).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self.client.insert(TABLE, &row).await?;
        decode_first(rows)?.ok_or_else(|| AppError::InternalWithMsg("Membership insert returned no data".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<OrganizationUser>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("id", format!("eq.{}", id))], None, Some(1))
            .await?;
        decode_first(rows)
    }

    async fn find_by_member(&self, enterprise_id: &str, user_id: &str) -> Result<Option<OrganizationUser>, AppError> {
        let rows = self
            .client
            .select(
                TABLE,
                &[
                    ("enterprise_id", format!("eq.{}", enterprise_id)),
                    ("user_id", format!("eq.{}", user_id)),
                ],
                None,
                Some(1),
            )
            .await?;
        decode_first(rows)
    }

    async fn list_by_enterprise(&self, enterprise_id: &str) -> Result<Vec<OrganizationUser>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("enterprise_id", format!("eq.{}", enterprise_id))], None, None)
            .await?;
        decode_rows(rows)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<OrganizationUser>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("user_id", format!("eq.{}", user_id))], None, None)
            .await?;
        decode_rows(rows)
    }

    async fn count_by_enterprise(&self, enterprise_id: &str) -> Result<i64, AppError> {
        self.client
            .count(TABLE, &[("enterprise_id", format!("eq.{}", enterprise_id))])
            .await
    }

    async fn update(&self, membership: &OrganizationUser) -> Result<OrganizationUser, AppError> {
        let patch = serde_json::to_value(membership).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self
            .client
            .update(
                TABLE,
                &[
                    ("id", format!("eq.{}", membership.id)),
                    ("enterprise_id", format!("eq.{}", membership.enterprise_id)),
                ],
                &patch,
            )
            .await?;
        decode_first(rows)?.ok_or_else(|| AppError::NotFound("User not found in organization".into()))
    }

    async fn delete(&self, enterprise_id: &str, id: &str) -> Result<(), AppError> {
        self.client
            .delete(
                TABLE,
                &[
                    ("id", format!("eq.{}", id)),
                    ("enterprise_id", format!("eq.{}", enterprise_id)),
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let rows = self
            .client
            .delete(TABLE, &[("user_id", format!("eq.{}", user_id))])
            .await?;
        Ok(rows.len() as u64)
    }
}
