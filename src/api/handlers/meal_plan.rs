use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use crate::api::dtos::requests::{CreateMealPlanRequest, UpdateMealPlanRequest};
use crate::api::dtos::responses::MealPlanView;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::{identity::UserAccount, meal_plan::MealPlan};
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

fn build_plan(user_id: &str, payload: CreateMealPlanRequest, creator: &UserAccount, created_by_user: bool) -> MealPlan {
    let mut plan = MealPlan::new(user_id.to_string(), created_by_user);
    plan.name = payload.name;
    plan.start_date = payload.start_date;
    plan.end_date = payload.end_date;
    plan.meal_plan = payload.meal_plan.unwrap_or(Value::Null);
    plan.has_sickness = payload.has_sickness;
    plan.sickness_type = payload.sickness_type;
    plan.health_assessment = payload.health_assessment;

    let mut user_info = match payload.user_info {
        Some(Value::Object(map)) => Value::Object(map),
        _ => json!({}),
    };
    user_info["creator_email"] = json!(creator.email);
    user_info["is_created_by_user"] = json!(created_by_user);
    plan.user_info = Some(user_info);

    plan
}

fn apply_update(plan: &mut MealPlan, payload: UpdateMealPlanRequest) {
    if payload.name.is_some() {
        plan.name = payload.name;
    }
    if payload.start_date.is_some() {
        plan.start_date = payload.start_date;
    }
    if payload.end_date.is_some() {
        plan.end_date = payload.end_date;
    }
    if let Some(meal_plan) = payload.meal_plan {
        plan.meal_plan = meal_plan;
    }
    if let Some(has_sickness) = payload.has_sickness {
        plan.has_sickness = has_sickness;
    }
    if let Some(sickness_type) = payload.sickness_type {
        plan.sickness_type = sickness_type;
    }
    if payload.health_assessment.is_some() {
        plan.health_assessment = payload.health_assessment;
    }
    plan.updated_at = Utc::now();
}

fn admin_plan_view(plan: &MealPlan) -> Value {
    json!({
        "id": plan.id,
        "name": plan.name,
        "start_date": plan.start_date,
        "end_date": plan.end_date,
        "meal_plan": plan.meal_plan,
        "created_at": plan.created_at,
        "updated_at": plan.updated_at,
        "has_sickness": plan.has_sickness,
        "sickness_type": plan.sickness_type,
        "health_assessment": plan.health_assessment,
        "user_info": plan.user_info,
        "is_approved": plan.is_approved,
        "creator_email": plan.creator_email(),
        "is_created_by_user": plan.is_created_by_user()
    })
}

// Self-service endpoints

/// A user only ever sees approved plans; their own creations are
/// approved on insert.
pub async fn list_my_plans(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let plans = state.meal_plan_repo.list_by_user(&user.id, true).await?;
    let views: Vec<MealPlanView> = plans.into_iter().map(MealPlanView::from).collect();

    Ok(Json(json!({
        "success": true,
        "meal_plans": views
    })))
}

pub async fn create_my_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateMealPlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = build_plan(&user.id, payload, &user, true);

    let created = state.meal_plan_repo.create(&plan).await.map_err(|e| match e {
        AppError::Conflict(_) => AppError::Conflict(
            "A meal plan already exists for this week and health profile. Please update the existing plan or choose a different week.".into(),
        ),
        other => other,
    })?;

    info!("Meal plan {} created by user {}", created.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "meal_plan": MealPlanView::from(created)
        })),
    ))
}

pub async fn update_my_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(plan_id): Path<String>,
    Json(payload): Json<UpdateMealPlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut plan = state
        .meal_plan_repo
        .find_by_id(&plan_id)
        .await?
        .filter(|p| p.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Meal plan not found".into()))?;

    apply_update(&mut plan, payload);
    let updated = state.meal_plan_repo.update(&plan).await?;

    Ok(Json(json!({
        "success": true,
        "meal_plan": MealPlanView::from(updated)
    })))
}

pub async fn delete_my_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(plan_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .meal_plan_repo
        .find_by_id(&plan_id)
        .await?
        .filter(|p| p.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Meal plan not found".into()))?;

    state.meal_plan_repo.delete(&plan_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Meal plan deleted successfully"
    })))
}

pub async fn clear_my_plans(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.meal_plan_repo.delete_all_for_user(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Deleted {} meal plan(s)", removed)
    })))
}

// Enterprise admin endpoints

/// The admin listing shows approved and pending plans alike.
pub async fn list_member_plans(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    state
        .membership_repo
        .find_by_member(&enterprise_id, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User is not a member of this organization".into()))?;

    let plans = state.meal_plan_repo.list_by_user(&user_id, false).await?;
    let views: Vec<Value> = plans.iter().map(admin_plan_view).collect();

    Ok(Json(json!({
        "success": true,
        "meal_plans": views,
        "total_count": views.len()
    })))
}

/// Admin-authored plans stay hidden from the member until approved.
pub async fn create_member_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, user_id)): Path<(String, String)>,
    Json(payload): Json<CreateMealPlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    state
        .membership_repo
        .find_by_member(&enterprise_id, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User is not a member of this organization".into()))?;

    let plan = build_plan(&user_id, payload, &admin, false);
    let created = state.meal_plan_repo.create(&plan).await?;

    info!("Admin {} created meal plan {} for user {} (pending approval)", admin.id, created.id, user_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Meal plan created. Click Approve to send it to the user.",
            "meal_plan": admin_plan_view(&created)
        })),
    ))
}

async fn load_enterprise_plan(
    state: &Arc<AppState>,
    enterprise_id: &str,
    plan_id: &str,
) -> Result<MealPlan, AppError> {
    let plan = state
        .meal_plan_repo
        .find_by_id(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Meal plan not found".into()))?;

    state
        .membership_repo
        .find_by_member(enterprise_id, &plan.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("User is not a member of this organization".into()))?;

    Ok(plan)
}

pub async fn approve_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, plan_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    let mut plan = load_enterprise_plan(&state, &enterprise_id, &plan_id).await?;
    plan.is_approved = true;
    plan.updated_at = Utc::now();
    let approved = state.meal_plan_repo.update(&plan).await?;

    info!("Meal plan {} approved by {}", plan_id, admin.id);

    Ok(Json(json!({
        "success": true,
        "message": "Meal plan approved! User can now see this plan.",
        "meal_plan": admin_plan_view(&approved)
    })))
}

/// Rejection deletes the row outright; the member never sees the plan.
pub async fn reject_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, plan_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    load_enterprise_plan(&state, &enterprise_id, &plan_id).await?;
    state.meal_plan_repo.delete(&plan_id).await?;

    info!("Meal plan {} rejected and deleted by {}", plan_id, admin.id);

    Ok(Json(json!({
        "success": true,
        "message": "Meal plan rejected and deleted. User will not see this plan."
    })))
}

pub async fn update_member_plan(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path((enterprise_id, plan_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMealPlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut access = state.access();
    access.ensure_org_admin(&admin.id, &enterprise_id).await?;

    let mut plan = load_enterprise_plan(&state, &enterprise_id, &plan_id).await?;
    apply_update(&mut plan, payload);
    let updated = state.meal_plan_repo.update(&plan).await?;

    Ok(Json(json!({
        "success": true,
        "meal_plan": admin_plan_view(&updated)
    })))
}
