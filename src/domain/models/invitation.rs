use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};

pub const ALLOWED_ROLES: [&str; 4] = ["client", "patient", "doctor", "nutritionist"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Invitation {
    pub id: String,
    pub enterprise_id: String,
    pub email: String,
    pub invited_by: String,
    pub invitation_token: String,
    pub role: String,
    #[serde(default)]
    pub message: Option<String>,
    pub status: String, // pending, accepted, cancelled, expired
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accepted_by: Option<String>,
}

impl Invitation {
    pub fn new(enterprise_id: String, email: String, invited_by: String, role: String, message: Option<String>) -> Self {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            enterprise_id,
            email,
            invited_by,
            invitation_token: token,
            role,
            message,
            status: "pending".to_string(),
            sent_at: now,
            expires_at: now + Duration::days(30),
            accepted_at: None,
            accepted_by: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn mark_accepted(&mut self, user_id: &str) {
        self.status = "accepted".to_string();
        self.accepted_at = Some(Utc::now());
        self.accepted_by = Some(user_id.to_string());
    }
}
