use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use crate::domain::models::identity::UserAccount;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::Span;

/// Resolves `Authorization: Bearer <token>` to a verified account via
/// the BaaS auth API.
pub struct AuthUser(pub UserAccount);

pub fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(|t| t.to_string())
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid authorization header".to_string()))?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let account = app_state.identity.verify_token(&token).await?;

        Span::current().record("user_id", account.id.as_str());

        Ok(AuthUser(account))
    }
}
