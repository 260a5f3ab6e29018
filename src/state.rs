use std::sync::Arc;

use crate::background::Notifier;
use crate::config::Config;
use crate::domain::ports::{
    EmailService, EnterpriseRepository, IdentityProvider, InvitationRepository, MealPlanRepository,
    MembershipRepository, SettingsRepository,
};
use crate::domain::services::access::AccessContext;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub enterprise_repo: Arc<dyn EnterpriseRepository>,
    pub membership_repo: Arc<dyn MembershipRepository>,
    pub invitation_repo: Arc<dyn InvitationRepository>,
    pub meal_plan_repo: Arc<dyn MealPlanRepository>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub email_service: Arc<dyn EmailService>,
    pub notifier: Notifier,
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Fresh request-scoped authorization context.
    pub fn access(&self) -> AccessContext {
        AccessContext::new(
            self.enterprise_repo.clone(),
            self.membership_repo.clone(),
            self.identity.clone(),
        )
    }
}
