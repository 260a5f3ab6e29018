use std::sync::Arc;

use crate::domain::models::identity::{NewUserAccount, UserAccount};
use crate::domain::ports::IdentityProvider;
use crate::error::AppError;
use crate::infra::baas::client::{check_status, classify_transport, BaasClient};
use crate::infra::baas::retry::retry_transient;
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

const ADMIN_LIST_PAGE_SIZE: usize = 200;
const ADMIN_LIST_MAX_PAGES: usize = 5;

/// Identity operations against the BaaS auth API. Bearer verification
/// uses the anon key; everything else goes through the admin endpoints
/// with the service-role key.
pub struct BaasIdentityProvider {
    client: Arc<BaasClient>,
    anon_key: String,
}

impl BaasIdentityProvider {
    pub fn new(client: Arc<BaasClient>, anon_key: String) -> Self {
        Self { client, anon_key }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.client.base_url(), path)
    }

    fn parse_user(value: Value) -> Result<UserAccount, AppError> {
        // Admin endpoints wrap the account in a "user" field, the
        // verification endpoint returns it bare.
        let user = match value.get("user") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => value,
        };
        serde_json::from_value(user).map_err(|e| AppError::InternalWithMsg(format!("Malformed auth user payload: {}", e)))
    }

    async fn find_in_profiles(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        let rows = self
            .client
            .select("profiles", &[("email", format!("ilike.{}", email))], None, Some(1))
            .await?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let Some(user_id) = row.get("id").and_then(|v| v.as_str()) else {
            return Ok(None);
        };

        // Prefer full auth details; the profile row is enough otherwise.
        if let Some(account) = self.get_user(user_id).await? {
            return Ok(Some(account));
        }
        Ok(Some(UserAccount {
            id: user_id.to_string(),
            email: email.to_string(),
            user_metadata: serde_json::json!({}),
        }))
    }

    async fn find_in_admin_listing(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        for page in 1..=ADMIN_LIST_MAX_PAGES {
            let url = self.auth_url("admin/users");
            let value: Value = retry_transient("admin list_users", || async {
                let res = self
                    .client
                    .http()
                    .get(&url)
                    .header("apikey", self.client.service_key())
                    .header(header::AUTHORIZATION, format!("Bearer {}", self.client.service_key()))
                    .query(&[("page", page.to_string()), ("per_page", ADMIN_LIST_PAGE_SIZE.to_string())])
                    .send()
                    .await
                    .map_err(classify_transport)?;
                let res = check_status(res).await?;
                res.json().await.map_err(classify_transport)
            })
            .await?;

            let users = value
                .get("users")
                .and_then(|u| u.as_array())
                .cloned()
                .unwrap_or_default();

            for user in &users {
                let candidate = user.get("email").and_then(|e| e.as_str()).unwrap_or_default();
                if candidate.eq_ignore_ascii_case(email) {
                    return Self::parse_user(user.clone()).map(Some);
                }
            }

            if users.len() < ADMIN_LIST_PAGE_SIZE {
                break;
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl IdentityProvider for BaasIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<UserAccount, AppError> {
        let url = self.auth_url("user");
        let value: Value = retry_transient("verify token", || async {
            let res = self
                .client
                .http()
                .get(&url)
                .header("apikey", &self.anon_key)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .send()
                .await
                .map_err(classify_transport)?;

            if res.status() == StatusCode::UNAUTHORIZED || res.status() == StatusCode::FORBIDDEN {
                return Err(AppError::Unauthorized("Invalid token".to_string()));
            }
            let res = check_status(res).await?;
            res.json().await.map_err(classify_transport)
        })
        .await?;

        Self::parse_user(value)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, AppError> {
        let url = self.auth_url(&format!("admin/users/{}", user_id));
        let value: Option<Value> = retry_transient("admin get_user", || async {
            let res = self
                .client
                .http()
                .get(&url)
                .header("apikey", self.client.service_key())
                .header(header::AUTHORIZATION, format!("Bearer {}", self.client.service_key()))
                .send()
                .await
                .map_err(classify_transport)?;

            if res.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let res = check_status(res).await?;
            res.json().await.map(Some).map_err(classify_transport)
        })
        .await?;

        value.map(Self::parse_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        // Profiles table first (one indexed query), then the paginated
        // admin listing as a last resort.
        match self.find_in_profiles(email).await {
            Ok(Some(account)) => return Ok(Some(account)),
            Ok(None) => {}
            Err(e) => warn!("Profiles lookup for {} failed: {}", email, e),
        }
        self.find_in_admin_listing(email).await
    }

    async fn create_user(&self, account: &NewUserAccount) -> Result<UserAccount, AppError> {
        let url = self.auth_url("admin/users");
        let value: Value = retry_transient("admin create_user", || async {
            let res = self
                .client
                .http()
                .post(&url)
                .header("apikey", self.client.service_key())
                .header(header::AUTHORIZATION, format!("Bearer {}", self.client.service_key()))
                .json(account)
                .send()
                .await
                .map_err(classify_transport)?;

            if res.status() == StatusCode::UNPROCESSABLE_ENTITY || res.status() == StatusCode::CONFLICT {
                let body = res.text().await.unwrap_or_default();
                return Err(AppError::Conflict(format!("User with this email already exists: {}", body)));
            }
            let res = check_status(res).await?;
            res.json().await.map_err(classify_transport)
        })
        .await?;

        let created = Self::parse_user(value)?;
        info!("Created auth user {}", created.id);
        Ok(created)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let url = self.auth_url(&format!("admin/users/{}", user_id));
        retry_transient("admin delete_user", || async {
            let res = self
                .client
                .http()
                .delete(&url)
                .header("apikey", self.client.service_key())
                .header(header::AUTHORIZATION, format!("Bearer {}", self.client.service_key()))
                .send()
                .await
                .map_err(classify_transport)?;
            check_status(res).await.map(|_| ())
        })
        .await
    }
}
