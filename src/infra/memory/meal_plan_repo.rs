use std::sync::Arc;

use crate::domain::models::meal_plan::MealPlan;
use crate::domain::ports::MealPlanRepository;
use crate::error::AppError;
use crate::infra::memory::store::MemoryStore;
use async_trait::async_trait;

pub struct MemoryMealPlanRepo {
    store: Arc<MemoryStore>,
}

impl MemoryMealPlanRepo {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MealPlanRepository for MemoryMealPlanRepo {
    async fn create(&self, plan: &MealPlan) -> Result<MealPlan, AppError> {
        let mut table = self.store.meal_plans.write().unwrap();
        if table.contains_key(&plan.id) {
            return Err(AppError::Conflict("duplicate key value violates unique constraint".into()));
        }
        table.insert(plan.id.clone(), plan.clone());
        Ok(plan.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<MealPlan>, AppError> {
        Ok(self.store.meal_plans.read().unwrap().get(id).cloned())
    }

    async fn list_by_user(&self, user_id: &str, approved_only: bool) -> Result<Vec<MealPlan>, AppError> {
        let mut plans: Vec<MealPlan> = self
            .store
            .meal_plans
            .read()
            .unwrap()
            .values()
            .filter(|p| p.user_id == user_id && (!approved_only || p.is_approved))
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(plans)
    }

    async fn update(&self, plan: &MealPlan) -> Result<MealPlan, AppError> {
        let mut table = self.store.meal_plans.write().unwrap();
        if !table.contains_key(&plan.id) {
            return Err(AppError::NotFound("Meal plan not found".into()));
        }
        table.insert(plan.id.clone(), plan.clone());
        Ok(plan.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.store.meal_plans.write().unwrap().remove(id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut table = self.store.meal_plans.write().unwrap();
        let before = table.len();
        table.retain(|_, p| p.user_id != user_id);
        Ok((before - table.len()) as u64)
    }
}
