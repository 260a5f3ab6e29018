use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const DEFAULT_SETTINGS_TYPE: &str = "health_profile";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserSettings {
    pub id: String,
    pub user_id: String,
    pub settings_type: String,
    pub settings_data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn new(user_id: String, settings_type: String, settings_data: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            settings_type,
            settings_data,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SettingsHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub settings_type: String,
    pub settings_data: Value,
    pub previous_settings_data: Value,
    pub changed_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl SettingsHistoryEntry {
    pub fn new(
        user_id: String,
        settings_type: String,
        settings_data: Value,
        previous_settings_data: Value,
        changed_fields: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_by: user_id.clone(),
            user_id,
            settings_type,
            settings_data,
            previous_settings_data,
            changed_fields,
            created_at: Utc::now(),
        }
    }
}
