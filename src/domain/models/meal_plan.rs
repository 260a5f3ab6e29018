use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MealPlan {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub meal_plan: Value,
    #[serde(default)]
    pub has_sickness: bool,
    #[serde(default)]
    pub sickness_type: String,
    #[serde(default)]
    pub health_assessment: Option<Value>,
    #[serde(default)]
    pub user_info: Option<Value>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MealPlan {
    pub fn new(user_id: String, is_approved: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            name: None,
            start_date: None,
            end_date: None,
            meal_plan: Value::Null,
            has_sickness: false,
            sickness_type: String::new(),
            health_assessment: None,
            user_info: None,
            is_approved,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creator attribution stored inside the user_info blob.
    pub fn creator_email(&self) -> Option<&str> {
        self.user_info.as_ref()?.get("creator_email")?.as_str()
    }

    pub fn is_created_by_user(&self) -> bool {
        self.user_info
            .as_ref()
            .and_then(|info| info.get("is_created_by_user"))
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }
}
