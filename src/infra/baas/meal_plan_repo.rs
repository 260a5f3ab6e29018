use std::sync::Arc;

use crate::domain::models::meal_plan::MealPlan;
use crate::domain::ports::MealPlanRepository;
use crate::error::AppError;
use crate::infra::baas::client::{decode_first, decode_rows, BaasClient};
use async_trait::async_trait;

const TABLE: &str = "meal_plan_management";

pub struct BaasMealPlanRepo {
    client: Arc<BaasClient>,
}

impl BaasMealPlanRepo {
    pub fn new(client: Arc<BaasClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MealPlanRepository for BaasMealPlanRepo {
    async fn create(&self, plan: &MealPlan) -> Result<MealPlan, AppError> {
        let row = serde_json::to_value(plan).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self.client.insert(TABLE, &row).await?;
        decode_first(rows)?.ok_or_else(|| AppError::InternalWithMsg("Meal plan insert returned no data".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<MealPlan>, AppError> {
        let rows = self
            .client
            .select(TABLE, &[("id", format!("eq.{}", id))], None, Some(1))
            .await?;
        decode_first(rows)
    }

    async fn list_by_user(&self, user_id: &str, approved_only: bool) -> Result<Vec<MealPlan>, AppError> {
        let mut filters = vec![("user_id", format!("eq.{}", user_id))];
        if approved_only {
            filters.push(("is_approved", "eq.true".to_string()));
        }
        let rows = self
            .client
            .select(TABLE, &filters, Some("updated_at.desc"), None)
            .await?;
        decode_rows(rows)
    }

    async fn update(&self, plan: &MealPlan) -> Result<MealPlan, AppError> {
        let patch = serde_json::to_value(plan).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
        let rows = self
            .client
            .update(TABLE, &[("id", format!("eq.{}", plan.id))], &patch)
            .await?;
        decode_first(rows)?.ok_or_else(|| AppError::NotFound("Meal plan not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.client.delete(TABLE, &[("id", format!("eq.{}", id))]).await?;
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
