use std::sync::Arc;

use crate::background::Notifier;
use crate::config::Config;
use crate::domain::models::notification::Notification;
use crate::infra::baas::{
    client::BaasClient, enterprise_repo::BaasEnterpriseRepo, identity::BaasIdentityProvider,
    invitation_repo::BaasInvitationRepo, meal_plan_repo::BaasMealPlanRepo,
    membership_repo::BaasMembershipRepo, settings_repo::BaasSettingsRepo,
};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::memory::{
    enterprise_repo::MemoryEnterpriseRepo, identity::MemoryIdentityProvider,
    invitation_repo::MemoryInvitationRepo, meal_plan_repo::MemoryMealPlanRepo,
    membership_repo::MemoryMembershipRepo, settings_repo::MemorySettingsRepo, store::MemoryStore,
};
use crate::state::AppState;
use tera::Tera;
use tokio::sync::mpsc;
use tracing::info;

const NOTIFIER_QUEUE_SIZE: usize = 256;

pub fn load_templates() -> Tera {
    let mut tera = Tera::default();
    tera.add_raw_template("invitation.html", include_str!("../templates/invitation.html"))
        .expect("Failed to load invitation template");
    tera.add_raw_template("invitation_accepted.html", include_str!("../templates/invitation_accepted.html"))
        .expect("Failed to load invitation_accepted template");
    tera.add_raw_template("user_created.html", include_str!("../templates/user_created.html"))
        .expect("Failed to load user_created template");
    tera
}

pub async fn bootstrap_state(config: &Config) -> (AppState, mpsc::Receiver<Notification>) {
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let templates = Arc::new(load_templates());
    let (notifier, rx) = Notifier::channel(NOTIFIER_QUEUE_SIZE);

    let storage_url = &config.storage_url;

    let state = if storage_url.starts_with("http://") || storage_url.starts_with("https://") {
        info!("Initializing BaaS storage backend...");

        let client = Arc::new(BaasClient::new(
            storage_url.clone(),
            config.baas_service_role_key.clone(),
        ));
        let identity = Arc::new(BaasIdentityProvider::new(client.clone(), config.baas_anon_key.clone()));

        AppState {
            config: config.clone(),
            enterprise_repo: Arc::new(BaasEnterpriseRepo::new(client.clone())),
            membership_repo: Arc::new(BaasMembershipRepo::new(client.clone())),
            invitation_repo: Arc::new(BaasInvitationRepo::new(client.clone())),
            meal_plan_repo: Arc::new(BaasMealPlanRepo::new(client.clone())),
            settings_repo: Arc::new(BaasSettingsRepo::new(client.clone())),
            identity,
            email_service,
            notifier,
            templates,
        }
    } else {
        info!("Initializing in-memory storage backend...");

        let store = Arc::new(MemoryStore::new());

        AppState {
            config: config.clone(),
            enterprise_repo: Arc::new(MemoryEnterpriseRepo::new(store.clone())),
            membership_repo: Arc::new(MemoryMembershipRepo::new(store.clone())),
            invitation_repo: Arc::new(MemoryInvitationRepo::new(store.clone())),
            meal_plan_repo: Arc::new(MemoryMealPlanRepo::new(store.clone())),
            settings_repo: Arc::new(MemorySettingsRepo::new(store.clone())),
            identity: Arc::new(MemoryIdentityProvider::new()),
            email_service,
            notifier,
            templates,
        }
    };

    (state, rx)
}
