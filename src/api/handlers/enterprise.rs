use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{RegisterEnterpriseRequest, TimeRestrictionsRequest, UpdateEnterpriseRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::enterprise::{Enterprise, TimeRestrictions};
use crate::error::AppError;
use crate::state::AppState;
use chrono_tz::Tz;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub async fn register(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<RegisterEnterpriseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload
        .name
        .ok_or_else(|| AppError::Validation("Missing required field: name".into()))?;
    let email = payload
        .email
        .ok_or_else(|| AppError::Validation("Missing required field: email".into()))?;
    let organization_type = payload
        .organization_type
        .ok_or_else(|| AppError::Validation("Missing required field: organization_type".into()))?;

    let mut access = state.access();
    let (can_create, reason) = access.can_create_organizations(&user).await?;
    if !can_create {
        return Err(AppError::Forbidden(reason));
    }

    if state.enterprise_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("An organization with this email already exists".into()));
    }

    let mut enterprise = Enterprise::new(name, email, organization_type, user.id.clone());
    enterprise.phone = payload.phone;
    enterprise.address = payload.address;

    let created = state.enterprise_repo.create(&enterprise).await.map_err(|e| match e {
        AppError::Conflict(_) => AppError::Conflict("An organization with this email already exists".into()),
        other => other,
    })?;

    info!("Enterprise registered: {} by user {}", created.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Enterprise registered successfully",
            "enterprise": created
        })),
    ))
}

pub async fn can_create(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    let (can_create, reason) = access.can_create_organizations(&user).await?;

    Ok(Json(json!({
        "success": true,
        "can_create": can_create,
        "reason": reason
    })))
}

pub async fn my_enterprises(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let enterprises = state.enterprise_repo.list_by_owner(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "enterprises": enterprises
    })))
}

/// Everything the caller can reach: organizations they own plus the
/// ones they were invited into.
pub async fn accessible_enterprises(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let mut entries = Vec::new();

    for enterprise in state.enterprise_repo.list_by_owner(&user.id).await? {
        entries.push(json!({
            "id": enterprise.id,
            "name": enterprise.name,
            "organization_type": enterprise.organization_type,
            "access_type": "owner",
            "role": "owner"
        }));
    }

    for membership in state.membership_repo.list_by_user(&user.id).await? {
        if let Some(enterprise) = state.enterprise_repo.find_by_id(&membership.enterprise_id).await? {
            entries.push(json!({
                "id": enterprise.id,
                "name": enterprise.name,
                "organization_type": enterprise.organization_type,
                "access_type": "member",
                "role": membership.role
            }));
        }
    }

    Ok(Json(json!({
        "success": true,
        "enterprises": entries
    })))
}

pub async fn get_enterprise(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let enterprise = state
        .enterprise_repo
        .find_by_id(&enterprise_id)
        .await?
        .filter(|e| e.created_by == user.id)
        .ok_or_else(|| AppError::NotFound("Enterprise not found or access denied".into()))?;

    let stats = collect_statistics(&state, &enterprise).await?;
    let mut body = serde_json::to_value(&enterprise).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;
    body["stats"] = stats;

    Ok(Json(json!({
        "success": true,
        "enterprise": body
    })))
}

pub async fn update_enterprise(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
    Json(payload): Json<UpdateEnterpriseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut enterprise = state
        .enterprise_repo
        .find_by_id(&enterprise_id)
        .await?
        .filter(|e| e.created_by == user.id)
        .ok_or_else(|| AppError::NotFound("Enterprise not found or access denied".into()))?;

    if let Some(name) = payload.name {
        enterprise.name = name;
    }
    if let Some(email) = payload.email {
        enterprise.email = email;
    }
    if payload.phone.is_some() {
        enterprise.phone = payload.phone;
    }
    if payload.address.is_some() {
        enterprise.address = payload.address;
    }
    if let Some(organization_type) = payload.organization_type {
        enterprise.organization_type = organization_type;
    }
    if let Some(max_users) = payload.max_users {
        enterprise.max_users = max_users;
    }
    if let Some(settings) = payload.settings {
        enterprise.settings = settings;
    }
    if let Some(is_active) = payload.is_active {
        enterprise.is_active = is_active;
    }

    let updated = state.enterprise_repo.update(&enterprise).await?;
    info!("Enterprise updated: {}", enterprise_id);

    Ok(Json(json!({
        "success": true,
        "message": "Enterprise updated successfully",
        "enterprise": updated
    })))
}

pub async fn statistics(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let enterprise = access
        .enterprise(&enterprise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enterprise not found".into()))?;

    let mut statistics = collect_statistics(&state, &enterprise).await?;

    let owner_info = match access.user(&enterprise.created_by).await {
        Some(owner) => json!({
            "id": owner.id,
            "email": owner.email,
            "name": if owner.display_name() == owner.email { "Owner".to_string() } else { owner.display_name() }
        }),
        None => json!({
            "id": enterprise.created_by,
            "email": "Unknown",
            "name": "Unknown"
        }),
    };
    statistics["owner_info"] = owner_info;
    statistics["enterprise_name"] = json!(enterprise.name);
    statistics["organization_type"] = json!(enterprise.organization_type);

    Ok(Json(json!({
        "success": true,
        "statistics": statistics
    })))
}

/// Member and invitation counts. The owner is not a membership row, so
/// total_users never includes them.
async fn collect_statistics(state: &Arc<AppState>, enterprise: &Enterprise) -> Result<serde_json::Value, AppError> {
    let members = state.membership_repo.list_by_enterprise(&enterprise.id).await?;
    let total_users = members.len() as i64;
    let active_users = members.iter().filter(|m| m.status == "active").count() as i64;

    let invitations = state.invitation_repo.list_by_enterprise(&enterprise.id).await?;
    let total_invitations = invitations.len() as i64;
    let pending_invitations = invitations.iter().filter(|i| i.status == "pending").count() as i64;
    let accepted_invitations = invitations.iter().filter(|i| i.status == "accepted").count() as i64;

    let capacity_percentage = if enterprise.max_users > 0 {
        (total_users as f64 / enterprise.max_users as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    Ok(json!({
        "total_users": total_users,
        "active_users": active_users,
        "inactive_users": total_users - active_users,
        "pending_invitations": pending_invitations,
        "accepted_invitations": accepted_invitations,
        "total_invitations": total_invitations,
        "max_users": enterprise.max_users,
        "capacity_percentage": capacity_percentage
    }))
}

pub async fn get_time_restrictions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let enterprise = access
        .enterprise(&enterprise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enterprise not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "time_restrictions": enterprise.time_restrictions()
    })))
}

pub async fn update_time_restrictions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(enterprise_id): Path<String>,
    Json(payload): Json<TimeRestrictionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&user.id, &enterprise_id).await?;

    let mut enterprise = access
        .enterprise(&enterprise_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Enterprise not found".into()))?;

    let timezone = payload.timezone.unwrap_or_else(|| "UTC".to_string());
    timezone
        .parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Invalid timezone: {}", timezone)))?;

    let restrictions = TimeRestrictions {
        enabled: payload.enabled,
        timezone,
        windows: payload.windows,
    };

    if !enterprise.settings.is_object() {
        enterprise.settings = json!({});
    }
    enterprise.settings["time_restrictions"] =
        serde_json::to_value(&restrictions).map_err(|e| AppError::InternalWithMsg(e.to_string()))?;

    state.enterprise_repo.update(&enterprise).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Time restrictions updated successfully",
        "time_restrictions": restrictions
    })))
}
