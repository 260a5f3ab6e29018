use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A user account as known by the BaaS auth system.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub user_metadata: Value,
}

impl UserAccount {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key)?.as_str()
    }

    pub fn first_name(&self) -> &str {
        self.metadata_str("first_name").unwrap_or("")
    }

    pub fn last_name(&self) -> &str {
        self.metadata_str("last_name").unwrap_or("")
    }

    pub fn signup_type(&self) -> Option<&str> {
        self.metadata_str("signup_type")
    }

    /// "First Last", falling back to the email when no name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name(), self.last_name());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct NewUserAccount {
    pub email: String,
    pub password: String,
    pub email_confirm: bool,
    pub user_metadata: Value,
}
