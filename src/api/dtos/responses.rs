use crate::domain::models::meal_plan::MealPlan;
use serde::Serialize;
use serde_json::Value;

/// Meal plan shape expected by the frontend (camelCase keys).
#[derive(Serialize)]
pub struct MealPlanView {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "mealPlan")]
    pub meal_plan: Value,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "hasSickness")]
    pub has_sickness: bool,
    #[serde(rename = "sicknessType")]
    pub sickness_type: String,
}

impl From<MealPlan> for MealPlanView {
    fn from(plan: MealPlan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            start_date: plan.start_date,
            end_date: plan.end_date,
            meal_plan: plan.meal_plan,
            created_at: plan.created_at.to_rfc3339(),
            updated_at: plan.updated_at.to_rfc3339(),
            has_sickness: plan.has_sickness,
            sickness_type: plan.sickness_type,
        }
    }
}
