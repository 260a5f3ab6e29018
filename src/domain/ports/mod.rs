use crate::domain::models::{
    enterprise::Enterprise,
    identity::{NewUserAccount, UserAccount},
    invitation::Invitation,
    meal_plan::MealPlan,
    membership::OrganizationUser,
    settings::{SettingsHistoryEntry, UserSettings},
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait EnterpriseRepository: Send + Sync {
    async fn create(&self, enterprise: &Enterprise) -> Result<Enterprise, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Enterprise>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Enterprise>, AppError>;
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Enterprise>, AppError>;
    async fn update(&self, enterprise: &Enterprise) -> Result<Enterprise, AppError>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn create(&self, membership: &OrganizationUser) -> Result<OrganizationUser, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<OrganizationUser>, AppError>;
    async fn find_by_member(&self, enterprise_id: &str, user_id: &str) -> Result<Option<OrganizationUser>, AppError>;
    async fn list_by_enterprise(&self, enterprise_id: &str) -> Result<Vec<OrganizationUser>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<OrganizationUser>, AppError>;
    async fn count_by_enterprise(&self, enterprise_id: &str) -> Result<i64, AppError>;
    async fn update(&self, membership: &OrganizationUser) -> Result<OrganizationUser, AppError>;
    async fn delete(&self, enterprise_id: &str, id: &str) -> Result<(), AppError>;
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, invitation: &Invitation) -> Result<Invitation, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Invitation>, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError>;
    async fn list_by_enterprise(&self, enterprise_id: &str) -> Result<Vec<Invitation>, AppError>;
    async fn find_pending(&self, enterprise_id: &str, email: &str) -> Result<Option<Invitation>, AppError>;
    async fn list_pending_by_email(&self, email: &str) -> Result<Vec<Invitation>, AppError>;
    async fn update(&self, invitation: &Invitation) -> Result<Invitation, AppError>;
    async fn delete_by_email(&self, email: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait MealPlanRepository: Send + Sync {
    async fn create(&self, plan: &MealPlan) -> Result<MealPlan, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<MealPlan>, AppError>;
    async fn list_by_user(&self, user_id: &str, approved_only: bool) -> Result<Vec<MealPlan>, AppError>;
    async fn update(&self, plan: &MealPlan) -> Result<MealPlan, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, user_id: &str, settings_type: &str) -> Result<Option<UserSettings>, AppError>;
    async fn upsert(&self, settings: &UserSettings) -> Result<UserSettings, AppError>;
    async fn delete(&self, user_id: &str, settings_type: &str) -> Result<(), AppError>;
    async fn append_history(&self, entry: &SettingsHistoryEntry) -> Result<(), AppError>;
    async fn list_history(&self, user_id: &str, settings_type: &str, limit: usize) -> Result<Vec<SettingsHistoryEntry>, AppError>;
    async fn list_history_for_users(&self, user_ids: &[String], settings_type: &str, limit: usize) -> Result<Vec<SettingsHistoryEntry>, AppError>;
    async fn delete_history_record(&self, user_id: &str, record_id: &str) -> Result<bool, AppError>;
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError>;
    async fn delete_history_for_user(&self, user_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the account it belongs to.
    async fn verify_token(&self, token: &str) -> Result<UserAccount, AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserAccount>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError>;
    async fn create_user(&self, account: &NewUserAccount) -> Result<UserAccount, AppError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}
