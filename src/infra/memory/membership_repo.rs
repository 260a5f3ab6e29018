use std::sync::Arc;

use crate::domain::models::membership::OrganizationUser;
use crate::domain::ports::MembershipRepository;
use crate::error::AppError;
use crate::infra::memory::store::MemoryStore;
use async_trait::async_trait;

pub struct MemoryMembershipRepo {
    store: Arc<MemoryStore>,
}

impl MemoryMembershipRepo {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MembershipRepository for MemoryMembershipRepo {
    async fn create(&self, membership: &OrganizationUser) -> Result<OrganizationUser, AppError> {
        let mut table = self.store.memberships.write().unwrap();
        // Unique per (enterprise_id, user_id), like the BaaS constraint.
        if table
            .values()
            .any(|m| m.enterprise_id == membership.enterprise_id && m.user_id == membership.user_id)
        {
            return Err(AppError::Conflict("duplicate key value violates unique constraint".into()));
        }
        table.insert(membership.id.clone(), membership.clone());
        Ok(membership.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<OrganizationUser>, AppError> {
        Ok(self.store.memberships.read().unwrap().get(id).cloned())
    }

    async fn find_by_member(&self, enterprise_id: &str, user_id: &str) -> Result<Option<OrganizationUser>, AppError> {
        Ok(self
            .store
            .memberships
            .read()
            .unwrap()
            .values()
            .find(|m| m.enterprise_id == enterprise_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_by_enterprise(&self, enterprise_id: &str) -> Result<Vec<OrganizationUser>, AppError> {
        let mut members: Vec<OrganizationUser> = self
            .store
            .memberships
            .read()
            .unwrap()
            .values()
            .filter(|m| m.enterprise_id == enterprise_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<OrganizationUser>, AppError> {
        Ok(self
            .store
            .memberships
            .read()
            .unwrap()
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_by_enterprise(&self, enterprise_id: &str) -> Result<i64, AppError> {
        Ok(self
            .store
            .memberships
            .read()
            .unwrap()
            .values()
            .filter(|m| m.enterprise_id == enterprise_id)
            .count() as i64)
    }

    async fn update(&self, membership: &OrganizationUser) -> Result<OrganizationUser, AppError> {
        let mut table = self.store.memberships.write().unwrap();
        match table.get(&membership.id) {
            Some(existing) if existing.enterprise_id == membership.enterprise_id => {
                table.insert(membership.id.clone(), membership.clone());
                Ok(membership.clone())
            }
            _ => Err(AppError::NotFound("User not found in organization".into())),
        }
    }

    async fn delete(&self, enterprise_id: &str, id: &str) -> Result<(), AppError> {
        let mut table = self.store.memberships.write().unwrap();
        if table.get(id).map(|m| m.enterprise_id == enterprise_id).unwrap_or(false) {
            table.remove(id);
        }
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut table = self.store.memberships.write().unwrap();
        let before = table.len();
        table.retain(|_, m| m.user_id != user_id);
        Ok((before - table.len()) as u64)
    }
}
