use meallens_backend::{
    api::router::create_router,
    background::{start_notification_worker, Notifier},
    config::Config,
    domain::models::identity::UserAccount,
    domain::ports::EmailService,
    error::AppError,
    infra::factory::load_templates,
    infra::memory::{
        enterprise_repo::MemoryEnterpriseRepo, identity::MemoryIdentityProvider,
        invitation_repo::MemoryInvitationRepo, meal_plan_repo::MemoryMealPlanRepo,
        membership_repo::MemoryMembershipRepo, settings_repo::MemorySettingsRepo, store::MemoryStore,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Records every outbound email instead of sending it.
#[derive(Default)]
pub struct RecordingEmailService {
    pub sent: Mutex<Vec<(String, String)>>, // (recipient, subject)
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), subject.to_string()));
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentityProvider>,
    pub emails: Arc<RecordingEmailService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let config = Config {
            port: 0,
            storage_url: "memory:".to_string(),
            baas_service_role_key: String::new(),
            baas_anon_key: String::new(),
            frontend_url: "http://localhost:5173".to_string(),
            allowed_origins: vec!["http://localhost:5173".to_string()],
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
        };

        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(MemoryIdentityProvider::new());
        let emails = Arc::new(RecordingEmailService::default());
        let (notifier, rx) = Notifier::channel(64);

        let state = Arc::new(AppState {
            config,
            enterprise_repo: Arc::new(MemoryEnterpriseRepo::new(store.clone())),
            membership_repo: Arc::new(MemoryMembershipRepo::new(store.clone())),
            invitation_repo: Arc::new(MemoryInvitationRepo::new(store.clone())),
            meal_plan_repo: Arc::new(MemoryMealPlanRepo::new(store.clone())),
            settings_repo: Arc::new(MemorySettingsRepo::new(store.clone())),
            identity: identity.clone(),
            email_service: emails.clone(),
            notifier,
            templates: Arc::new(load_templates()),
        });

        let worker_state = state.clone();
        tokio::spawn(async move {
            start_notification_worker(worker_state, rx).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
            identity,
            emails,
        }
    }

    /// Seeds an account in the identity provider. Returns (user_id, token).
    pub fn register_user(&self, email: &str, metadata: Value) -> (String, String) {
        let user_id = Uuid::new_v4().to_string();
        let token = self.identity.register_user(UserAccount {
            id: user_id.clone(),
            email: email.to_string(),
            user_metadata: metadata,
        });
        (user_id, token)
    }

    /// An account allowed to create organizations.
    pub fn register_org_owner(&self, email: &str) -> (String, String) {
        self.register_user(
            email,
            json!({"signup_type": "organization", "first_name": "Olive", "last_name": "Owner"}),
        )
    }

    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Registers an enterprise through the API and returns its id.
    pub async fn create_enterprise(&self, owner_token: &str, name: &str, email: &str) -> String {
        let response = self
            .send(
                "POST",
                "/api/enterprise/register",
                Some(owner_token),
                Some(json!({
                    "name": name,
                    "email": email,
                    "organization_type": "clinic"
                })),
            )
            .await;
        let status = response.status();
        let body = parse_body(response).await;
        assert!(status.is_success(), "Enterprise registration failed: {:?}", body);
        body["enterprise"]["id"].as_str().unwrap().to_string()
    }

    /// Full invite-register-accept round trip. Returns (user_id, token).
    pub async fn add_member(
        &self,
        owner_token: &str,
        enterprise_id: &str,
        email: &str,
        role: &str,
    ) -> (String, String) {
        let response = self
            .send(
                "POST",
                &format!("/api/enterprise/{}/invite", enterprise_id),
                Some(owner_token),
                Some(json!({"email": email, "role": role})),
            )
            .await;
        let status = response.status();
        let body = parse_body(response).await;
        assert!(status.is_success(), "Invite failed: {:?}", body);
        let invitation_token = body["invitation"]["invitation_token"].as_str().unwrap().to_string();

        let (user_id, token) = self.register_user(email, json!({"first_name": "Mia", "last_name": "Member"}));

        let accept = self
            .send(
                "POST",
                "/api/enterprise/invitation/accept",
                Some(&token),
                Some(json!({"token": invitation_token})),
            )
            .await;
        let accept_status = accept.status();
        let accept_body = parse_body(accept).await;
        assert!(accept_status.is_success(), "Accept failed: {:?}", accept_body);

        (user_id, token)
    }
}

pub async fn parse_body(response: axum::response::Response) -> Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        panic!("Response body is empty. Status: {}", status);
    }
    match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(e) => panic!(
            "Failed to parse JSON: {:?}. Status: {}. Body: {:?}",
            e,
            status,
            String::from_utf8_lossy(&bytes)
        ),
    }
}
