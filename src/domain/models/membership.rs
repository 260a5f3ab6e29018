use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrganizationUser {
    pub id: String,
    pub enterprise_id: String,
    pub user_id: String,
    pub role: String, // admin, doctor, nutritionist, patient, client
    pub status: String, // active, inactive
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl OrganizationUser {
    pub fn new(enterprise_id: String, user_id: String, role: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            enterprise_id,
            user_id,
            role,
            status: "active".to_string(),
            joined_at: Utc::now(),
            notes: None,
            metadata: serde_json::json!({}),
        }
    }
}
