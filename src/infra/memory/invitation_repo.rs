use std::sync::Arc;

use crate::domain::models::invitation::Invitation;
use crate::domain::ports::InvitationRepository;
use crate::error::AppError;
use crate::infra::memory::store::MemoryStore;
use async_trait::async_trait;

pub struct MemoryInvitationRepo {
    store: Arc<MemoryStore>,
}

impl MemoryInvitationRepo {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InvitationRepository for MemoryInvitationRepo {
    async fn create(&self, invitation: &Invitation) -> Result<Invitation, AppError> {
        let mut table = self.store.invitations.write().unwrap();
        if table.values().any(|i| i.invitation_token == invitation.invitation_token) {
            return Err(AppError::Conflict("duplicate key value violates unique constraint".into()));
        }
        table.insert(invitation.id.clone(), invitation.clone());
        Ok(invitation.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invitation>, AppError> {
        Ok(self.store.invitations.read().unwrap().get(id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        Ok(self
            .store
            .invitations
            .read()
            .unwrap()
            .values()
            .find(|i| i.invitation_token == token)
            .cloned())
    }

    async fn list_by_enterprise(&self, enterprise_id: &str) -> Result<Vec<Invitation>, AppError> {
        let mut invitations: Vec<Invitation> = self
            .store
            .invitations
            .read()
            .unwrap()
            .values()
            .filter(|i| i.enterprise_id == enterprise_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(invitations)
    }

    async fn find_pending(&self, enterprise_id: &str, email: &str) -> Result<Option<Invitation>, AppError> {
        Ok(self
            .store
            .invitations
            .read()
            .unwrap()
            .values()
            .find(|i| i.enterprise_id == enterprise_id && i.email == email && i.status == "pending")
            .cloned())
    }

    async fn list_pending_by_email(&self, email: &str) -> Result<Vec<Invitation>, AppError> {
        Ok(self
            .store
            .invitations
            .read()
            .unwrap()
            .values()
            .filter(|i| i.email == email && i.status == "pending")
            .cloned()
            .collect())
    }

    async fn update(&self, invitation: &Invitation) -> Result<Invitation, AppError> {
        let mut table = self.store.invitations.write().unwrap();
        if !table.contains_key(&invitation.id) {
            return Err(AppError::NotFound("Invitation not found".into()));
        }
        table.insert(invitation.id.clone(), invitation.clone());
        Ok(invitation.clone())
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, AppError> {
        let mut table = self.store.invitations.write().unwrap();
        let before = table.len();
        table.retain(|_, i| i.email != email);
        Ok((before - table.len()) as u64)
    }
}
