use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{AcceptInvitationRequest, CompleteInvitationRequest, InviteUserRequest, VerifyInvitationQuery};
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::domain::models::{
    enterprise::Enterprise,
    identity::UserAccount,
    invitation::{Invitation, ALLOWED_ROLES},
    membership::OrganizationUser,
    notification::Notification,
};
use crate::domain::services::access::AccessContext;
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const EMAIL_SEND_WAIT: Duration = Duration::from_secs(10);

pub async fn invite_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
    Json(payload): Json<InviteUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if enterprise_id.is_empty() || enterprise_id == "undefined" || enterprise_id == "null" {
        return Err(AppError::Validation(
            "No organization selected. Please select an organization first.".into(),
        ));
    }

    let email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email address is required".into()))?;

    let mut role = payload
        .role
        .as_deref()
        .unwrap_or("patient")
        .trim()
        .to_lowercase();
    if role == "doctors" {
        role = "doctor".to_string();
    }
    if !ALLOWED_ROLES.contains(&role.as_str()) {
        return Err(AppError::Validation(format!(
            "Invalid role. Must be one of: {}",
            ALLOWED_ROLES.join(", ")
        )));
    }

    let mut access = state.access();
    let enterprise = access
        .enterprise(&enterprise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let current_count = state.membership_repo.count_by_enterprise(&enterprise_id).await?;
    if current_count >= enterprise.max_users {
        return Err(AppError::Validation(format!(
            "Maximum user limit ({}) reached",
            enterprise.max_users
        )));
    }

    // An existing account means the email cannot be invited; probe
    // failures are tolerated and duplicates caught by the insert below.
    match state.identity.find_user_by_email(&email).await {
        Ok(Some(existing)) => {
            if state
                .membership_repo
                .find_by_member(&enterprise_id, &existing.id)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict("User is already a member of this organization".into()));
            }
            return Err(AppError::Conflict(
                "This user already has an account with MealLens AI. They cannot be invited.".into(),
            ));
        }
        Ok(None) => {}
        Err(e) => warn!("Could not check if user exists: {}", e),
    }

    if state.invitation_repo.find_pending(&enterprise_id, &email).await?.is_some() {
        return Err(AppError::Conflict("User already has a pending invitation".into()));
    }

    let invitation = Invitation::new(
        enterprise_id.clone(),
        email.clone(),
        user.id.clone(),
        role,
        payload.message.clone(),
    );
    let invitation = state.invitation_repo.create(&invitation).await.map_err(|e| match e {
        AppError::Conflict(_) => AppError::Conflict("An invitation for this email already exists".into()),
        other => other,
    })?;

    info!("Invitation {} created for {} on enterprise {}", invitation.id, email, enterprise_id);

    let invitation_link = format!(
        "{}/accept-invitation?token={}",
        state.config.frontend_url, invitation.invitation_token
    );

    let inviter_name = match access.user(&user.id).await {
        Some(account) => account.email,
        None => "A team member".to_string(),
    };

    // The invitation row already exists; the response reports whether
    // the email made it out within the wait window.
    let (email_sent, email_error) =
        send_invitation_email(&state, &enterprise, &invitation, &inviter_name, &invitation_link).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Invitation created successfully",
            "invitation": invitation,
            "invitation_link": invitation_link,
            "email_sent": email_sent,
            "email_error": email_error
        })),
    ))
}

async fn send_invitation_email(
    state: &Arc<AppState>,
    enterprise: &Enterprise,
    invitation: &Invitation,
    inviter_name: &str,
    invitation_link: &str,
) -> (bool, Option<String>) {
    let mut context = tera::Context::new();
    context.insert("enterprise_name", &enterprise.name);
    context.insert("inviter_name", inviter_name);
    context.insert("role", &invitation.role);
    context.insert("custom_message", &invitation.message);
    context.insert("invitation_link", invitation_link);
    context.insert("expires_at", &invitation.expires_at.format("%Y-%m-%d").to_string());

    let html = match state.templates.render("invitation.html", &context) {
        Ok(html) => html,
        Err(e) => {
            warn!("Invitation template render failed: {:?}", e);
            return (false, Some("Failed to render invitation email.".to_string()));
        }
    };

    let subject = format!("You're invited to join {} on MealLens AI", enterprise.name);

    match timeout(EMAIL_SEND_WAIT, state.email_service.send(&invitation.email, &subject, &html)).await {
        Ok(Ok(())) => (true, None),
        Ok(Err(e)) => {
            warn!("Invitation email to {} failed: {}", invitation.email, e);
            (
                false,
                Some(format!("{}. The invitation was created - you can share the link manually.", e)),
            )
        }
        Err(_) => {
            warn!("Invitation email to {} timed out after {:?}", invitation.email, EMAIL_SEND_WAIT);
            (
                false,
                Some("Email sending timed out. The invitation was created - you can share the link manually.".to_string()),
            )
        }
    }
}

pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let invitations = state.invitation_repo.list_by_enterprise(&enterprise_id).await?;

    Ok(Json(json!({
        "success": true,
        "invitations": invitations
    })))
}

pub async fn cancel_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(invitation_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut invitation = state
        .invitation_repo
        .find_by_id(&invitation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".into()))?;

    let mut access = state.access();
    access.ensure_org_admin(&user.id, &invitation.enterprise_id).await?;

    if invitation.status != "pending" {
        return Err(AppError::Validation(format!(
            "Cannot cancel invitation with status '{}'",
            invitation.status
        )));
    }

    invitation.status = "cancelled".to_string();
    state.invitation_repo.update(&invitation).await?;

    info!("Invitation {} cancelled by {}", invitation_id, user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Invitation cancelled successfully"
    })))
}

pub async fn verify_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    verify_token(&state, &token).await
}

pub async fn verify_invitation_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyInvitationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let token = query.token.unwrap_or_default();
    verify_token(&state, token.trim()).await
}

async fn verify_token(state: &Arc<AppState>, token: &str) -> Result<Json<serde_json::Value>, AppError> {
    if token.is_empty() {
        return Err(AppError::NotFound("Invalid invitation token".into()));
    }

    let invitation = state
        .invitation_repo
        .find_by_token(token)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid invitation token".into()))?;

    if invitation.status != "pending" {
        return Err(AppError::Validation(format!("Invitation is {}", invitation.status)));
    }
    if invitation.is_expired() {
        return Err(AppError::Validation("Invitation has expired".into()));
    }

    let enterprise = state.enterprise_repo.find_by_id(&invitation.enterprise_id).await?;
    let enterprise_summary = match &enterprise {
        Some(e) => json!({
            "id": e.id,
            "name": e.name,
            "organization_type": e.organization_type
        }),
        None => json!({
            "id": invitation.enterprise_id,
            "name": "Unknown Organization",
            "organization_type": "organization"
        }),
    };

    Ok(Json(json!({
        "success": true,
        "invitation": {
            "id": invitation.id,
            "email": invitation.email,
            "role": invitation.role,
            "message": invitation.message,
            "enterprise": enterprise_summary,
            "enterprise_name": enterprise_summary["name"],
            "organization_type": enterprise_summary["organization_type"]
        }
    })))
}

pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(payload): Json<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = payload
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Invitation token is required".into()))?;

    let mut invitation = state
        .invitation_repo
        .find_by_token(&token)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid or expired invitation".into()))?;

    if invitation.status != "pending" {
        return Err(AppError::Validation("Invitation has already been used or expired".into()));
    }
    if invitation.is_expired() {
        return Err(AppError::Validation("Invitation has expired".into()));
    }

    let enterprise = state.enterprise_repo.find_by_id(&invitation.enterprise_id).await?;
    let enterprise_name = enterprise
        .as_ref()
        .map(|e| e.name.clone())
        .unwrap_or_else(|| "Unknown Organization".to_string());

    let Some(user) = user else {
        // Anonymous accept: membership is created later, after the user
        // registers and calls the complete endpoint.
        return Ok(Json(json!({
            "success": true,
            "message": "Please create an account to accept this invitation",
            "invitation": {
                "id": invitation.id,
                "email": invitation.email,
                "enterprise_id": invitation.enterprise_id,
                "enterprise_name": enterprise_name,
                "role": invitation.role
            },
            "requires_registration": true
        })));
    };

    if state
        .membership_repo
        .find_by_member(&invitation.enterprise_id, &user.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("You are already a member of this organization".into()));
    }

    let mut access = state.access();
    finalize_acceptance(&state, &mut access, &mut invitation, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Invitation accepted successfully",
        "enterprise_id": invitation.enterprise_id,
        "enterprise_name": enterprise_name,
        "requires_registration": false
    })))
}

pub async fn complete_invitation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CompleteInvitationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invitation_id = payload
        .invitation_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Invitation ID is required".into()))?;

    let mut invitation = state
        .invitation_repo
        .find_by_id(&invitation_id)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid invitation ID".into()))?;

    // An anonymous accept may already have flipped the status; the
    // membership itself is what must not exist yet.
    if invitation.status != "pending" && invitation.status != "accepted" {
        return Err(AppError::Validation("Invitation has already been used or expired".into()));
    }

    if state
        .membership_repo
        .find_by_member(&invitation.enterprise_id, &user.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("You are already a member of this organization".into()));
    }

    let mut access = state.access();
    let enterprise = finalize_acceptance(&state, &mut access, &mut invitation, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Invitation accepted successfully",
        "enterprise_id": invitation.enterprise_id,
        "enterprise_name": enterprise.map(|e| e.name).unwrap_or_else(|| "Unknown Organization".to_string())
    })))
}

/// Inserts the membership row, flips the invitation, and queues the
/// owner notification. The notification is best-effort; the acceptance
/// is never rolled back.
pub async fn finalize_acceptance(
    state: &Arc<AppState>,
    access: &mut AccessContext,
    invitation: &mut Invitation,
    user: &UserAccount,
) -> Result<Option<Enterprise>, AppError> {
    let membership = OrganizationUser::new(
        invitation.enterprise_id.clone(),
        user.id.clone(),
        invitation.role.clone(),
    );
    state.membership_repo.create(&membership).await?;

    invitation.mark_accepted(&user.id);
    *invitation = state.invitation_repo.update(invitation).await?;

    info!(
        "User {} accepted invitation {} into enterprise {}",
        user.id, invitation.id, invitation.enterprise_id
    );

    let enterprise = access.enterprise(&invitation.enterprise_id).await?;
    if let Some(enterprise) = &enterprise {
        state.notifier.enqueue(Notification::InvitationAccepted {
            owner_id: enterprise.created_by.clone(),
            enterprise_name: enterprise.name.clone(),
            accepted_user_email: user.email.clone(),
            accepted_user_name: user.display_name(),
            role: invitation.role.clone(),
        });
    }

    Ok(enterprise)
}
