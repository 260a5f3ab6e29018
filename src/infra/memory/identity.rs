use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::models::identity::{NewUserAccount, UserAccount};
use crate::domain::ports::IdentityProvider;
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// In-process identity provider for the memory backend. Accounts are
/// seeded (or admin-created) and tokens are opaque strings issued here.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    users: RwLock<HashMap<String, UserAccount>>,
    tokens: RwLock<HashMap<String, String>>, // token -> user id
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account and returns a bearer token for it.
    pub fn register_user(&self, account: UserAccount) -> String {
        let user_id = account.id.clone();
        self.users.write().unwrap().insert(user_id.clone(), account);
        self.issue_token(&user_id)
    }

    pub fn issue_token(&self, user_id: &str) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        self.tokens.write().unwrap().insert(token.clone(), user_id.to_string());
        token
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<UserAccount, AppError> {
        let user_id = self
            .tokens
            .read()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
        self.users
            .read()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, AppError> {
        Ok(self.users.read().unwrap().get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, account: &NewUserAccount) -> Result<UserAccount, AppError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&account.email)) {
            return Err(AppError::Conflict("User with this email already exists".to_string()));
        }
        let created = UserAccount {
            id: Uuid::new_v4().to_string(),
            email: account.email.clone(),
            user_metadata: account.user_metadata.clone(),
        };
        users.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.users.write().unwrap().remove(user_id);
        self.tokens.write().unwrap().retain(|_, uid| uid != user_id);
        Ok(())
    }
}
