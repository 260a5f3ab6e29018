use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct RegisterEnterpriseRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub organization_type: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateEnterpriseRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub organization_type: Option<String>,
    pub max_users: Option<i64>,
    pub settings: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct InviteUserRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct AcceptInvitationRequest {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct CompleteInvitationRequest {
    pub invitation_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateManagedUserRequest {
    pub enterprise_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateMembershipRequest {
    pub status: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Deserialize)]
pub struct SaveSettingsRequest {
    pub settings_type: Option<String>,
    pub settings_data: Option<Value>,
}

#[derive(Deserialize)]
pub struct SettingsQuery {
    pub settings_type: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct TimeRestrictionsRequest {
    #[serde(default)]
    pub enabled: bool,
    pub timezone: Option<String>,
    #[serde(default)]
    pub windows: Vec<Value>,
}

#[derive(Deserialize)]
pub struct CreateMealPlanRequest {
    pub name: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(alias = "mealPlan")]
    pub meal_plan: Option<Value>,
    #[serde(default)]
    pub has_sickness: bool,
    #[serde(default)]
    pub sickness_type: String,
    pub health_assessment: Option<Value>,
    pub user_info: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateMealPlanRequest {
    pub name: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(alias = "mealPlan")]
    pub meal_plan: Option<Value>,
    pub has_sickness: Option<bool>,
    pub sickness_type: Option<String>,
    pub health_assessment: Option<Value>,
}

#[derive(Deserialize)]
pub struct VerifyInvitationQuery {
    pub token: Option<String>,
}
