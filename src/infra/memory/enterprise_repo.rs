use std::sync::Arc;

use crate::domain::models::enterprise::Enterprise;
use crate::domain::ports::EnterpriseRepository;
use crate::error::AppError;
use crate::infra::memory::store::MemoryStore;
use async_trait::async_trait;

pub struct MemoryEnterpriseRepo {
    store: Arc<MemoryStore>,
}

impl MemoryEnterpriseRepo {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EnterpriseRepository for MemoryEnterpriseRepo {
    async fn create(&self, enterprise: &Enterprise) -> Result<Enterprise, AppError> {
        let mut table = self.store.enterprises.write().unwrap();
        if table.values().any(|e| e.email == enterprise.email) {
            return Err(AppError::Conflict("duplicate key value violates unique constraint".into()));
        }
        table.insert(enterprise.id.clone(), enterprise.clone());
        Ok(enterprise.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Enterprise>, AppError> {
        Ok(self.store.enterprises.read().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Enterprise>, AppError> {
        Ok(self
            .store
            .enterprises
            .read()
            .unwrap()
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Enterprise>, AppError> {
        Ok(self
            .store
            .enterprises
            .read()
            .unwrap()
            .values()
            .filter(|e| e.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, enterprise: &Enterprise) -> Result<Enterprise, AppError> {
        let mut table = self.store.enterprises.write().unwrap();
        if !table.contains_key(&enterprise.id) {
            return Err(AppError::NotFound("Enterprise not found".into()));
        }
        table.insert(enterprise.id.clone(), enterprise.clone());
        Ok(enterprise.clone())
    }
}
