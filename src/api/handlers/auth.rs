use axum::{extract::State, response::IntoResponse, Json};
use crate::api::extractors::auth::AuthUser;
use crate::api::handlers::invitation::finalize_acceptance;
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Post-login sync: returns the caller's identity and auto-accepts any
/// pending invitations matching their verified email.
pub async fn session_sync(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let email = user.email.trim().to_lowercase();
    let pending = state.invitation_repo.list_pending_by_email(&email).await?;

    let mut access = state.access();
    let mut accepted = Vec::new();

    for mut invitation in pending {
        if invitation.is_expired() {
            warn!("Invitation {} has expired, skipping auto-accept", invitation.id);
            continue;
        }

        let existing = state
            .membership_repo
            .find_by_member(&invitation.enterprise_id, &user.id)
            .await?;

        if existing.is_some() {
            // Already a member; just close out the invitation.
            invitation.mark_accepted(&user.id);
            match state.invitation_repo.update(&invitation).await {
                Ok(_) => accepted.push(invitation.id.clone()),
                Err(e) => error!("Failed to close invitation {}: {}", invitation.id, e),
            }
            continue;
        }

        match finalize_acceptance(&state, &mut access, &mut invitation, &user).await {
            Ok(_) => accepted.push(invitation.id.clone()),
            Err(e) => error!("Auto-accept of invitation {} failed: {}", invitation.id, e),
        }
    }

    if !accepted.is_empty() {
        info!("Auto-accepted {} invitation(s) for {}", accepted.len(), email);
    }

    Ok(Json(json!({
        "success": true,
        "user": {
            "id": user.id,
            "email": user.email,
            "user_metadata": user.user_metadata
        },
        "accepted_invitations": accepted
    })))
}
