use std::sync::Arc;

use crate::domain::models::settings::{SettingsHistoryEntry, UserSettings};
use crate::domain::ports::SettingsRepository;
use crate::error::AppError;
use crate::infra::memory::store::MemoryStore;
use async_trait::async_trait;

pub struct MemorySettingsRepo {
    store: Arc<MemoryStore>,
}

impl MemorySettingsRepo {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepo {
    async fn get(&self, user_id: &str, settings_type: &str) -> Result<Option<UserSettings>, AppError> {
        Ok(self
            .store
            .settings
            .read()
            .unwrap()
            .get(&(user_id.to_string(), settings_type.to_string()))
            .cloned())
    }

    async fn upsert(&self, settings: &UserSettings) -> Result<UserSettings, AppError> {
        self.store
            .settings
            .write()
            .unwrap()
            .insert((settings.user_id.clone(), settings.settings_type.clone()), settings.clone());
        Ok(settings.clone())
    }

    async fn delete(&self, user_id: &str, settings_type: &str) -> Result<(), AppError> {
        self.store
            .settings
            .write()
            .unwrap()
            .remove(&(user_id.to_string(), settings_type.to_string()));
        Ok(())
    }

    async fn append_history(&self, entry: &SettingsHistoryEntry) -> Result<(), AppError> {
        self.store.settings_history.write().unwrap().push(entry.clone());
        Ok(())
    }

    async fn list_history(&self, user_id: &str, settings_type: &str, limit: usize) -> Result<Vec<SettingsHistoryEntry>, AppError> {
        let mut entries: Vec<SettingsHistoryEntry> = self
            .store
            .settings_history
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.settings_type == settings_type)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn list_history_for_users(
        &self,
        user_ids: &[String],
        settings_type: &str,
        limit: usize,
    ) -> Result<Vec<SettingsHistoryEntry>, AppError> {
        let mut entries: Vec<SettingsHistoryEntry> = self
            .store
            .settings_history
            .read()
            .unwrap()
            .iter()
            .filter(|e| user_ids.contains(&e.user_id) && e.settings_type == settings_type)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn delete_history_record(&self, user_id: &str, record_id: &str) -> Result<bool, AppError> {
        let mut history = self.store.settings_history.write().unwrap();
        let before = history.len();
        history.retain(|e| !(e.id == record_id && e.user_id == user_id));
        Ok(history.len() < before)
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut table = self.store.settings.write().unwrap();
        let before = table.len();
        table.retain(|(uid, _), _| uid != user_id);
        Ok((before - table.len()) as u64)
    }

    async fn delete_history_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut history = self.store.settings_history.write().unwrap();
        let before = history.len();
        history.retain(|e| e.user_id != user_id);
        Ok((before - history.len()) as u64)
    }
}
