use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use crate::api::handlers::{auth, enterprise, health, invitation, meal_plan, member, settings};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    classify::ServerErrorsFailureClass,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    let allowed_origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/api/health", get(health::health_check))

        // Identity
        .route("/api/auth/session", post(auth::session_sync))

        // Enterprise management
        .route("/api/enterprise/register", post(enterprise::register))
        .route("/api/enterprise/can-create", get(enterprise::can_create))
        .route("/api/enterprise/my-enterprises", get(enterprise::my_enterprises))
        .route("/api/my-enterprises", get(enterprise::accessible_enterprises))
        .route("/api/enterprise/{enterprise_id}", get(enterprise::get_enterprise).put(enterprise::update_enterprise))
        .route("/api/enterprise/{enterprise_id}/statistics", get(enterprise::statistics))
        .route("/api/enterprise/{enterprise_id}/time-restrictions", get(enterprise::get_time_restrictions).put(enterprise::update_time_restrictions))

        // Members
        .route("/api/enterprise/{enterprise_id}/users", get(member::list_users))
        .route("/api/enterprise/create-user", post(member::create_user))
        .route("/api/enterprise/{enterprise_id}/user/{user_id}", put(member::update_membership).delete(member::remove_membership))
        .route("/api/enterprise/user/{relation_id}", delete(member::purge_user))

        // Invitations
        .route("/api/enterprise/{enterprise_id}/invite", post(invitation::invite_user))
        .route("/api/enterprise/{enterprise_id}/invitations", get(invitation::list_invitations))
        .route("/api/enterprise/invitation/{invitation_id}/cancel", post(invitation::cancel_invitation))
        .route("/api/enterprise/invitation/verify/{token}", get(invitation::verify_invitation))
        .route("/api/enterprise/invitation/verify", get(invitation::verify_invitation_query))
        .route("/api/enterprise/invitation/accept", post(invitation::accept_invitation))
        .route("/api/enterprise/invitation/complete", post(invitation::complete_invitation))

        // Member settings (admin)
        .route("/api/enterprise/{enterprise_id}/user/{user_id}/settings", get(settings::get_member_settings).put(settings::update_member_settings).delete(settings::delete_member_settings))
        .route("/api/enterprise/{enterprise_id}/settings-history", get(settings::enterprise_settings_history))

        // Member meal plans (admin)
        .route("/api/enterprise/{enterprise_id}/user/{user_id}/meal-plans", get(meal_plan::list_member_plans).post(meal_plan::create_member_plan))
        .route("/api/enterprise/{enterprise_id}/meal-plan/{plan_id}/approve", post(meal_plan::approve_plan))
        .route("/api/enterprise/{enterprise_id}/meal-plan/{plan_id}/reject", post(meal_plan::reject_plan))
        .route("/api/enterprise/{enterprise_id}/meal-plan/{plan_id}", put(meal_plan::update_member_plan))

        // Self-service settings
        .route("/api/settings", post(settings::save_settings).get(settings::get_settings).delete(settings::delete_settings))
        .route("/api/settings/history", get(settings::settings_history))
        .route("/api/settings/history/{record_id}", delete(settings::delete_settings_history_record))

        // Self-service meal plans
        .route("/api/meal-plans", get(meal_plan::list_my_plans).post(meal_plan::create_my_plan).delete(meal_plan::clear_my_plans))
        .route("/api/meal-plans/{plan_id}", put(meal_plan::update_my_plan).delete(meal_plan::delete_my_plan))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(cors)
        .with_state(state)
}
