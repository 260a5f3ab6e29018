use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde_json::Value;

fn default_max_users() -> i64 {
    100
}

fn default_settings() -> Value {
    serde_json::json!({})
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Enterprise {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub organization_type: String,
    pub created_by: String,
    #[serde(default = "default_max_users")]
    pub max_users: i64,
    #[serde(default = "default_settings")]
    pub settings: Value,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Enterprise {
    pub fn new(name: String, email: String, organization_type: String, created_by: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone: None,
            address: None,
            organization_type,
            created_by,
            max_users: default_max_users(),
            settings: default_settings(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// The nested time-restriction config, with defaults when unset.
    pub fn time_restrictions(&self) -> TimeRestrictions {
        self.settings
            .get("time_restrictions")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeRestrictions {
    pub enabled: bool,
    pub timezone: String,
    pub windows: Vec<Value>,
}

impl Default for TimeRestrictions {
    fn default() -> Self {
        Self {
            enabled: false,
            timezone: "UTC".to_string(),
            windows: Vec::new(),
        }
    }
}
