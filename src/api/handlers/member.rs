use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{CreateManagedUserRequest, UpdateMembershipRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{identity::NewUserAccount, membership::OrganizationUser, notification::Notification};
use crate::error::AppError;
use crate::state::AppState;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Lists the organization's membership rows enriched with identity
/// details. The owner is not a membership row and never appears here.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let memberships = state.membership_repo.list_by_enterprise(&enterprise_id).await?;

    let invitations = state.invitation_repo.list_by_enterprise(&enterprise_id).await?;
    let mut accepted_by_email: HashMap<&str, &crate::domain::models::invitation::Invitation> = HashMap::new();
    let mut accepted_by_user: HashMap<&str, &crate::domain::models::invitation::Invitation> = HashMap::new();
    for invitation in invitations.iter().filter(|i| i.status == "accepted") {
        accepted_by_email.insert(invitation.email.as_str(), invitation);
        if let Some(accepted_by) = &invitation.accepted_by {
            accepted_by_user.insert(accepted_by.as_str(), invitation);
        }
    }

    let mut users = Vec::with_capacity(memberships.len());
    for membership in &memberships {
        let details = access.user(&membership.user_id).await;
        let (first_name, last_name, email) = match &details {
            Some(account) => (
                account.first_name().to_string(),
                account.last_name().to_string(),
                account.email.clone(),
            ),
            None => ("Unknown".to_string(), "Unknown".to_string(), "Unknown".to_string()),
        };

        let accepted_invitation = accepted_by_user
            .get(membership.user_id.as_str())
            .or_else(|| accepted_by_email.get(email.as_str()))
            .copied();

        users.push(json!({
            "id": membership.id,
            "user_id": membership.user_id,
            "first_name": first_name,
            "last_name": last_name,
            "email": email,
            "role": membership.role,
            "status": membership.status,
            "joined_at": membership.joined_at,
            "notes": membership.notes,
            "metadata": membership.metadata,
            "accepted_invitation": accepted_invitation.map(|inv| json!({
                "id": inv.id,
                "accepted_at": inv.accepted_at,
                "invited_by": inv.invited_by
            })),
            "has_accepted_invitation": accepted_invitation.is_some()
        }));
    }

    Ok(Json(json!({
        "success": true,
        "users": users,
        "total_count": users.len()
    })))
}

/// Admin creates a BaaS account directly and attaches it to the
/// organization, skipping the invitation flow.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Json(payload): Json<CreateManagedUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let enterprise_id = require_field(payload.enterprise_id, "enterprise_id")?;
    let first_name = require_field(payload.first_name, "first_name")?;
    let last_name = require_field(payload.last_name, "last_name")?;
    let email = require_field(payload.email, "email")?;
    let password = require_field(payload.password, "password")?;
    let role = require_field(payload.role, "role")?;

    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    let enterprise = access
        .enterprise(&enterprise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;

    match state.identity.find_user_by_email(&email).await {
        Ok(Some(_)) => return Err(AppError::Conflict("User with this email already exists".into())),
        Ok(None) => {}
        Err(e) => warn!("Could not check existing account for {}: {}", email, e),
    }

    let account = NewUserAccount {
        email: email.clone(),
        password,
        email_confirm: true,
        user_metadata: json!({
            "first_name": first_name,
            "last_name": last_name,
            "full_name": format!("{} {}", first_name, last_name)
        }),
    };
    let created = state.identity.create_user(&account).await?;

    let membership = OrganizationUser::new(enterprise_id.clone(), created.id.clone(), role.clone());
    state.membership_repo.create(&membership).await?;

    info!("Created user {} in enterprise {}", created.id, enterprise_id);

    let inviter_name = match access.user(&admin.id).await {
        Some(account) => {
            let name = account.display_name();
            if name == account.email {
                "Organization Admin".to_string()
            } else {
                name
            }
        }
        None => "Organization Admin".to_string(),
    };

    state.notifier.enqueue(Notification::UserCreated {
        recipient: email.clone(),
        enterprise_name: enterprise.name.clone(),
        inviter_name,
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created and added to organization successfully",
            "user": {
                "id": created.id,
                "email": email,
                "first_name": first_name,
                "last_name": last_name,
                "role": role,
                "enterprise_id": enterprise_id,
                "enterprise_name": enterprise.name
            }
        })),
    ))
}

fn require_field(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

pub async fn update_membership(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((enterprise_id, relation_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMembershipRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let mut membership = state
        .membership_repo
        .find_by_id(&relation_id)
        .await?
        .filter(|m| m.enterprise_id == enterprise_id)
        .ok_or_else(|| AppError::NotFound("User not found in organization".into()))?;

    if let Some(status) = payload.status {
        membership.status = status;
    }
    if let Some(role) = payload.role {
        membership.role = role;
    }
    if payload.notes.is_some() {
        membership.notes = payload.notes;
    }
    if let Some(metadata) = payload.metadata {
        membership.metadata = metadata;
    }

    state.membership_repo.update(&membership).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully"
    })))
}

pub async fn remove_membership(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((enterprise_id, relation_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    state.membership_repo.delete(&enterprise_id, &relation_id).await?;

    info!("Removed membership {} from enterprise {}", relation_id, enterprise_id);

    Ok(Json(json!({
        "success": true,
        "message": "User removed successfully"
    })))
}

/// Owner-only full purge: removes the member's settings, history, meal
/// plans, memberships, invitations and finally the auth account. Each
/// step is attempted even when earlier ones fail; the log of what
/// happened is returned to the caller.
pub async fn purge_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(relation_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let membership = state
        .membership_repo
        .find_by_id(&relation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found in organization".into()))?;

    let enterprise = state
        .enterprise_repo
        .find_by_id(&membership.enterprise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enterprise not found".into()))?;

    if enterprise.created_by != user.id {
        return Err(AppError::Forbidden(
            "Access denied. You can only delete users from your own organization.".into(),
        ));
    }

    let target_user_id = membership.user_id.clone();
    let target = state.identity.get_user(&target_user_id).await.unwrap_or_else(|e| {
        warn!("Could not fetch user {} before purge: {}", target_user_id, e);
        None
    });
    let target_email = target.as_ref().map(|u| u.email.clone()).unwrap_or_else(|| "Unknown".to_string());
    let target_name = target.as_ref().map(|u| u.display_name()).unwrap_or_else(|| "Unknown".to_string());

    let mut deletion_log = Vec::new();

    match state.settings_repo.delete_history_for_user(&target_user_id).await {
        Ok(n) => deletion_log.push(format!("Deleted {} user_settings_history records", n)),
        Err(e) => {
            warn!("Error deleting user_settings_history: {}", e);
            deletion_log.push(format!("Error deleting user_settings_history: {}", e));
        }
    }
    match state.settings_repo.delete_all_for_user(&target_user_id).await {
        Ok(n) => deletion_log.push(format!("Deleted {} user_settings records", n)),
        Err(e) => {
            warn!("Error deleting user_settings: {}", e);
            deletion_log.push(format!("Error deleting user_settings: {}", e));
        }
    }
    match state.meal_plan_repo.delete_all_for_user(&target_user_id).await {
        Ok(n) => deletion_log.push(format!("Deleted {} meal plan records", n)),
        Err(e) => {
            warn!("Error deleting meal plans: {}", e);
            deletion_log.push(format!("Error deleting meal plans: {}", e));
        }
    }
    match state.membership_repo.delete_all_for_user(&target_user_id).await {
        Ok(n) => deletion_log.push(format!("Deleted {} organization membership records", n)),
        Err(e) => {
            warn!("Error deleting memberships: {}", e);
            deletion_log.push(format!("Error deleting memberships: {}", e));
        }
    }
    if target_email != "Unknown" {
        match state.invitation_repo.delete_by_email(&target_email).await {
            Ok(n) => deletion_log.push(format!("Deleted {} invitation records", n)),
            Err(e) => {
                warn!("Error deleting invitations: {}", e);
                deletion_log.push(format!("Error deleting invitations: {}", e));
            }
        }
    }

    match state.identity.delete_user(&target_user_id).await {
        Ok(()) => deletion_log.push("Deleted user from authentication system".to_string()),
        Err(e) => {
            warn!("Auth delete failed for {}: {}", target_user_id, e);
            deletion_log.push(format!("Auth delete failed: {}", e));
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "User data deleted but authentication account could not be removed",
                    "deletion_log": deletion_log
                })),
            ));
        }
    }

    info!("Purged user {} ({}) from the system", target_user_id, target_email);

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": format!(
                "User {} ({}) has been completely deleted from the system. They can now be re-invited or register again.",
                target_name, target_email
            ),
            "deleted_user": {
                "id": relation_id,
                "user_id": target_user_id,
                "name": target_name,
                "email": target_email
            },
            "deletion_log": deletion_log
        })),
    ))
}
