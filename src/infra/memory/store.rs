use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::models::{
    enterprise::Enterprise,
    invitation::Invitation,
    meal_plan::MealPlan,
    membership::OrganizationUser,
    settings::{SettingsHistoryEntry, UserSettings},
};

/// Shared in-process tables backing the memory repositories. Used by
/// local development (`STORAGE_URL=memory:`) and the integration tests.
#[derive(Default)]
pub struct MemoryStore {
    pub enterprises: RwLock<HashMap<String, Enterprise>>,
    pub memberships: RwLock<HashMap<String, OrganizationUser>>,
    pub invitations: RwLock<HashMap<String, Invitation>>,
    pub meal_plans: RwLock<HashMap<String, MealPlan>>,
    // keyed by (user_id, settings_type)
    pub settings: RwLock<HashMap<(String, String), UserSettings>>,
    pub settings_history: RwLock<Vec<SettingsHistoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
