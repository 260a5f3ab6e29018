use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use crate::api::extractors::auth::bearer_token;
use crate::domain::models::identity::UserAccount;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::debug;

/// Like `AuthUser`, but a missing or invalid token resolves to an
/// anonymous caller instead of a 401.
pub struct MaybeAuthUser(pub Option<UserAccount>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(parts) {
            Some(token) => token,
            None => return Ok(MaybeAuthUser(None)),
        };

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        match app_state.identity.verify_token(&token).await {
            Ok(account) => Ok(MaybeAuthUser(Some(account))),
            Err(e) => {
                // Invalid token (expired, revoked) -> treat as guest
                debug!("MaybeAuth: token rejected: {}", e);
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
