use crate::error::AppError;
use crate::infra::baas::retry::retry_transient;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

/// Thin client for the BaaS REST layer (PostgREST-style `/rest/v1`
/// tables). Every call runs through the transient-retry wrapper; rows
/// go in and out as JSON values, typed at the repository layer.
pub struct BaasClient {
    http: Client,
    base_url: String,
    service_key: String,
}

pub type Filters<'a> = &'a [(&'a str, String)];

impl BaasClient {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn service_key(&self) -> &str {
        &self.service_key
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.service_key))
    }

    pub async fn select(
        &self,
        table: &str,
        filters: Filters<'_>,
        order: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, AppError> {
        let url = self.table_url(table);
        retry_transient(table, || async {
            let mut req = self
                .request(Method::GET, &url)
                .query(&[("select", "*")])
                .query(filters);
            if let Some(order) = order {
                req = req.query(&[("order", order)]);
            }
            if let Some(limit) = limit {
                req = req.query(&[("limit", limit.to_string())]);
            }
            let res = req.send().await.map_err(classify_transport)?;
            read_rows(res).await
        })
        .await
    }

    pub async fn insert(&self, table: &str, row: &Value) -> Result<Vec<Value>, AppError> {
        let url = self.table_url(table);
        retry_transient(table, || async {
            let res = self
                .request(Method::POST, &url)
                .header("Prefer", "return=representation")
                .json(row)
                .send()
                .await
                .map_err(classify_transport)?;
            read_rows(res).await
        })
        .await
    }

    pub async fn upsert(&self, table: &str, row: &Value, on_conflict: &str) -> Result<Vec<Value>, AppError> {
        let url = self.table_url(table);
        retry_transient(table, || async {
            let res = self
                .request(Method::POST, &url)
                .query(&[("on_conflict", on_conflict)])
                .header("Prefer", "resolution=merge-duplicates,return=representation")
                .json(row)
                .send()
                .await
                .map_err(classify_transport)?;
            read_rows(res).await
        })
        .await
    }

    pub async fn update(&self, table: &str, filters: Filters<'_>, patch: &Value) -> Result<Vec<Value>, AppError> {
        let url = self.table_url(table);
        retry_transient(table, || async {
            let res = self
                .request(Method::PATCH, &url)
                .query(filters)
                .header("Prefer", "return=representation")
                .json(patch)
                .send()
                .await
                .map_err(classify_transport)?;
            read_rows(res).await
        })
        .await
    }

    pub async fn delete(&self, table: &str, filters: Filters<'_>) -> Result<Vec<Value>, AppError> {
        let url = self.table_url(table);
        retry_transient(table, || async {
            let res = self
                .request(Method::DELETE, &url)
                .query(filters)
                .header("Prefer", "return=representation")
                .send()
                .await
                .map_err(classify_transport)?;
            read_rows(res).await
        })
        .await
    }

    pub async fn count(&self, table: &str, filters: Filters<'_>) -> Result<i64, AppError> {
        let url = self.table_url(table);
        retry_transient(table, || async {
            let res = self
                .request(Method::GET, &url)
                .query(&[("select", "id")])
                .query(filters)
                .header("Prefer", "count=exact")
                .header(header::RANGE, "0-0")
                .send()
                .await
                .map_err(classify_transport)?;

            let res = check_status(res).await?;
            let content_range = res
                .headers()
                .get(header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();

            // Content-Range looks like "0-0/17"; the total follows the slash.
            content_range
                .rsplit('/')
                .next()
                .and_then(|total| total.parse::<i64>().ok())
                .ok_or_else(|| AppError::InternalWithMsg(format!("Unparseable Content-Range: {}", content_range)))
        })
        .await
    }
}

/// Maps reqwest transport failures onto the error taxonomy. Timeouts and
/// connection-level failures are transient; anything else is not.
pub fn classify_transport(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(e.to_string())
    } else if e.is_connect() || e.is_request() {
        AppError::Unavailable(e.to_string())
    } else {
        AppError::InternalWithMsg(e.to_string())
    }
}

pub async fn check_status(res: Response) -> Result<Response, AppError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

pub fn status_error(status: StatusCode, body: String) -> AppError {
    match status {
        StatusCode::CONFLICT => AppError::Conflict(body),
        StatusCode::NOT_FOUND => AppError::NotFound(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(body),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => AppError::Unavailable(body),
        StatusCode::GATEWAY_TIMEOUT => AppError::Timeout(body),
        _ => AppError::InternalWithMsg(format!("BaaS request failed ({}): {}", status, body)),
    }
}

async fn read_rows(res: Response) -> Result<Vec<Value>, AppError> {
    let res = check_status(res).await?;
    if res.status() == StatusCode::NO_CONTENT {
        return Ok(Vec::new());
    }
    let value: Value = res.json().await.map_err(classify_transport)?;
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        single => Ok(vec![single]),
    }
}

/// Deserializes BaaS rows into a typed model, surfacing shape mismatches
/// as internal errors.
pub fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, AppError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| AppError::InternalWithMsg(format!("Malformed BaaS row: {}", e))))
        .collect()
}

pub fn decode_first<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, AppError> {
    Ok(decode_rows(rows)?.into_iter().next())
}
