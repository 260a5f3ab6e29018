use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{SaveSettingsRequest, SettingsQuery};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::settings::{SettingsHistoryEntry, UserSettings, DEFAULT_SETTINGS_TYPE};
use crate::domain::services::settings_diff;
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

const DEFAULT_HISTORY_LIMIT: usize = 50;
const ENTERPRISE_HISTORY_LIMIT: usize = 100;

/// Reads the previous value, records the diff, writes the new value and
/// appends a history row. A failed history append never fails the save.
async fn persist_settings(
    state: &Arc<AppState>,
    user_id: &str,
    settings_type: &str,
    settings_data: Value,
) -> Result<UserSettings, AppError> {
    let previous = match state.settings_repo.get(user_id, settings_type).await {
        Ok(previous) => previous,
        Err(e) if e.is_transient() => {
            warn!(
                "Could not fetch existing settings for {}: {}. Continuing without comparison.",
                user_id, e
            );
            None
        }
        Err(e) => return Err(e),
    };
    let previous_data = previous
        .as_ref()
        .map(|s| s.settings_data.clone())
        .unwrap_or_else(|| json!({}));

    let changed_fields = settings_diff::changed_fields(&previous_data, &settings_data);

    let record = match previous {
        Some(mut existing) => {
            existing.settings_data = settings_data;
            existing.updated_at = Utc::now();
            existing
        }
        None => UserSettings::new(user_id.to_string(), settings_type.to_string(), settings_data),
    };
    let saved = state.settings_repo.upsert(&record).await?;

    let entry = SettingsHistoryEntry::new(
        user_id.to_string(),
        settings_type.to_string(),
        saved.settings_data.clone(),
        previous_data,
        changed_fields,
    );
    if let Err(e) = state.settings_repo.append_history(&entry).await {
        error!("Failed to save settings history for {}: {}", user_id, e);
    }

    Ok(saved)
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SaveSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings_type = payload.settings_type.unwrap_or_else(|| DEFAULT_SETTINGS_TYPE.to_string());
    let settings_data = payload
        .settings_data
        .filter(|d| d.as_object().map(|m| !m.is_empty()).unwrap_or(false))
        .ok_or_else(|| AppError::Validation("Settings data cannot be empty".into()))?;

    let saved = persist_settings(&state, &user.id, &settings_type, settings_data).await?;

    info!("Settings saved for user {} ({})", user.id, settings_type);

    Ok(Json(json!({
        "success": true,
        "message": "Settings saved successfully",
        "settings": saved.settings_data,
        "settings_type": saved.settings_type,
        "updated_at": saved.updated_at
    })))
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<SettingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let settings_type = query.settings_type.unwrap_or_else(|| DEFAULT_SETTINGS_TYPE.to_string());

    match state.settings_repo.get(&user.id, &settings_type).await {
        Ok(Some(settings)) => Ok(Json(json!({
            "success": true,
            "settings": settings.settings_data,
            "settings_type": settings.settings_type,
            "updated_at": settings.updated_at
        }))),
        Ok(None) => Ok(Json(json!({
            "success": true,
            "settings": {},
            "message": "No settings found"
        }))),
        // Transient trouble is downgraded so the UI stays usable.
        Err(e) if e.is_transient() => {
            warn!("Transient error fetching settings for user {}: {}", user.id, e);
            Ok(Json(json!({
                "success": true,
                "settings": {},
                "message": "No settings found"
            })))
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<SettingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let settings_type = query.settings_type.unwrap_or_else(|| DEFAULT_SETTINGS_TYPE.to_string());
    state.settings_repo.delete(&user.id, &settings_type).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Settings deleted successfully"
    })))
}

pub async fn settings_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<SettingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let settings_type = query.settings_type.unwrap_or_else(|| DEFAULT_SETTINGS_TYPE.to_string());
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    match state.settings_repo.list_history(&user.id, &settings_type, limit).await {
        Ok(history) => Ok(Json(json!({
            "success": true,
            "count": history.len(),
            "history": history
        }))),
        Err(e) if e.is_transient() => {
            warn!("Transient error fetching settings history for {}: {}", user.id, e);
            Ok(Json(json!({
                "success": true,
                "history": [],
                "count": 0,
                "message": "Temporary connection issue. Please try again."
            })))
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_settings_history_record(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(record_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.settings_repo.delete_history_record(&user.id, &record_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Record not found or not authorized".into()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Settings history record deleted successfully."
    })))
}

// Enterprise-side settings management

async fn ensure_member(
    state: &Arc<AppState>,
    enterprise_id: &str,
    user_id: &str,
) -> Result<(), AppError> {
    state
        .membership_repo
        .find_by_member(enterprise_id, user_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("User is not part of this enterprise".into()))
}

pub async fn get_member_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;
    ensure_member(&state, &enterprise_id, &user_id).await?;

    let settings = state.settings_repo.get(&user_id, DEFAULT_SETTINGS_TYPE).await?;
    let (user_name, user_email) = match access.user(&user_id).await {
        Some(account) => (account.display_name(), account.email),
        None => ("Unknown".to_string(), "Unknown".to_string()),
    };

    Ok(Json(json!({
        "success": true,
        "user_id": user_id,
        "user_name": user_name,
        "user_email": user_email,
        "settings": settings.as_ref().map(|s| s.settings_data.clone()).unwrap_or_else(|| json!({})),
        "updated_at": settings.map(|s| s.updated_at)
    })))
}

pub async fn update_member_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, user_id)): Path<(String, String)>,
    Json(payload): Json<SaveSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;
    ensure_member(&state, &enterprise_id, &user_id).await?;

    let settings_type = payload.settings_type.unwrap_or_else(|| DEFAULT_SETTINGS_TYPE.to_string());
    let settings_data = payload
        .settings_data
        .ok_or_else(|| AppError::Validation("settings_data is required".into()))?;

    persist_settings(&state, &user_id, &settings_type, settings_data).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User settings updated successfully"
    })))
}

pub async fn delete_member_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, user_id)): Path<(String, String)>,
    Query(query): Query<SettingsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;
    ensure_member(&state, &enterprise_id, &user_id).await?;

    let settings_type = query.settings_type.unwrap_or_else(|| DEFAULT_SETTINGS_TYPE.to_string());
    state.settings_repo.delete(&user_id, &settings_type).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User settings deleted successfully"
    })))
}

/// Settings change history across every member of the organization,
/// newest first, enriched with user details.
pub async fn enterprise_settings_history(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(enterprise_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    let memberships = state.membership_repo.list_by_enterprise(&enterprise_id).await?;
    if memberships.is_empty() {
        return Ok(Json(json!({
            "success": true,
            "history": []
        })));
    }

    let user_ids: Vec<String> = memberships.iter().map(|m| m.user_id.clone()).collect();
    let records = state
        .settings_repo
        .list_history_for_users(&user_ids, DEFAULT_SETTINGS_TYPE, ENTERPRISE_HISTORY_LIMIT)
        .await?;

    let mut history = Vec::with_capacity(records.len());
    for record in records {
        let (user_name, user_email) = match access.user(&record.user_id).await {
            Some(account) => (account.display_name(), account.email),
            None => ("Unknown".to_string(), "Unknown".to_string()),
        };

        history.push(json!({
            "id": record.id,
            "user_id": record.user_id,
            "user_name": user_name,
            "user_email": user_email,
            "settings_type": record.settings_type,
            "settings_data": record.settings_data,
            "previous_settings_data": record.previous_settings_data,
            "changed_fields": settings_diff::meaningful_fields(&record.changed_fields),
            "created_at": record.created_at
        }));
    }

    Ok(Json(json!({
        "success": true,
        "history": history
    })))
}
