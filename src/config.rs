use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub storage_url: String, // BaaS base URL, or "memory:" for the in-process backend
    pub baas_service_role_key: String,
    pub baas_anon_key: String,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub mail_service_url: String,
    pub mail_service_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            storage_url: env::var("STORAGE_URL").expect("STORAGE_URL must be set"),
            baas_service_role_key: env::var("BAAS_SERVICE_ROLE_KEY").unwrap_or_default(),
            baas_anon_key: env::var("BAAS_ANON_KEY").unwrap_or_default(),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
        }
    }
}
