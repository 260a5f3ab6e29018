use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::models::{enterprise::Enterprise, identity::UserAccount};
use crate::domain::ports::{EnterpriseRepository, IdentityProvider, MembershipRepository};
use crate::error::AppError;
use tracing::{info, warn};

/// Request-scoped authorization context. Memoizes enterprise rows, user
/// details and admin decisions so a handler never fetches the same row
/// twice within one request.
pub struct AccessContext {
    enterprise_repo: Arc<dyn EnterpriseRepository>,
    membership_repo: Arc<dyn MembershipRepository>,
    identity: Arc<dyn IdentityProvider>,
    enterprises: HashMap<String, Option<Enterprise>>,
    users: HashMap<String, Option<UserAccount>>,
    admin_checks: HashMap<(String, String), (bool, String)>,
}

impl AccessContext {
    pub fn new(
        enterprise_repo: Arc<dyn EnterpriseRepository>,
        membership_repo: Arc<dyn MembershipRepository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            enterprise_repo,
            membership_repo,
            identity,
            enterprises: HashMap::new(),
            users: HashMap::new(),
            admin_checks: HashMap::new(),
        }
    }

    pub async fn enterprise(&mut self, enterprise_id: &str) -> Result<Option<Enterprise>, AppError> {
        if let Some(cached) = self.enterprises.get(enterprise_id) {
            return Ok(cached.clone());
        }
        let fetched = self.enterprise_repo.find_by_id(enterprise_id).await?;
        self.enterprises.insert(enterprise_id.to_string(), fetched.clone());
        Ok(fetched)
    }

    /// Best-effort identity lookup. Lookup failures degrade to `None`
    /// so listings can still render with "Unknown" user details.
    pub async fn user(&mut self, user_id: &str) -> Option<UserAccount> {
        if let Some(cached) = self.users.get(user_id) {
            return cached.clone();
        }
        let fetched = match self.identity.get_user(user_id).await {
            Ok(account) => account,
            Err(e) => {
                warn!("Could not fetch user details for {}: {}", user_id, e);
                None
            }
        };
        self.users.insert(user_id.to_string(), fetched.clone());
        fetched
    }

    /// Owner (enterprises.created_by) or admin membership row. The owner
    /// is never in the membership table.
    pub async fn check_org_admin(&mut self, user_id: &str, enterprise_id: &str) -> Result<(bool, String), AppError> {
        let key = (user_id.to_string(), enterprise_id.to_string());
        if let Some(cached) = self.admin_checks.get(&key) {
            return Ok(cached.clone());
        }

        let decision = self.resolve_org_admin(user_id, enterprise_id).await?;
        self.admin_checks.insert(key, decision.clone());
        Ok(decision)
    }

    async fn resolve_org_admin(&mut self, user_id: &str, enterprise_id: &str) -> Result<(bool, String), AppError> {
        let enterprise = match self.enterprise(enterprise_id).await? {
            Some(e) => e,
            None => return Ok((false, "Organization not found".to_string())),
        };

        if enterprise.created_by == user_id {
            return Ok((true, "owner".to_string()));
        }

        let membership = self.membership_repo.find_by_member(enterprise_id, user_id).await?;
        let membership = match membership {
            Some(m) => m,
            None => return Ok((false, "User is not a member of this organization".to_string())),
        };

        if membership.role == "admin" {
            Ok((true, "admin".to_string()))
        } else {
            Ok((
                false,
                format!("User role '{}' does not have permission to manage users", membership.role),
            ))
        }
    }

    /// Like `check_org_admin` but converts a denial into a 403.
    pub async fn ensure_org_admin(&mut self, user_id: &str, enterprise_id: &str) -> Result<(), AppError> {
        let (is_admin, reason) = self.check_org_admin(user_id, enterprise_id).await?;
        if is_admin {
            info!("User {} authorized on enterprise {} as {}", user_id, enterprise_id, reason);
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Access denied: {}", reason)))
        }
    }

    /// Users may create organizations unless they were invited into one;
    /// non-owners additionally need an `organization` signup type.
    pub async fn can_create_organizations(&mut self, user: &UserAccount) -> Result<(bool, String), AppError> {
        let memberships = self.membership_repo.list_by_user(&user.id).await?;
        if !memberships.is_empty() {
            return Ok((
                false,
                "Invited users cannot create organizations. Only organization owners can create new organizations.".to_string(),
            ));
        }

        let owned = self.enterprise_repo.list_by_owner(&user.id).await?;
        if !owned.is_empty() {
            return Ok((true, "User can create organizations".to_string()));
        }

        let signup_type = match user.signup_type() {
            Some(t) => Some(t.to_string()),
            None => {
                // Token metadata can be stale; ask the auth admin API.
                self.user(&user.id)
                    .await
                    .and_then(|account| account.signup_type().map(|t| t.to_string()))
            }
        };

        match signup_type.as_deref() {
            Some("organization") => Ok((true, "User can create organizations (registered as organization)".to_string())),
            Some(_) => Ok((
                false,
                "Individual users cannot create organizations. Only users who registered as organizations can create them.".to_string(),
            )),
            None => Ok((false, "Cannot verify user type. Please contact support.".to_string())),
        }
    }
}
