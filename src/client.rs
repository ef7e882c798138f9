//! HTTP client wrapper for the protect/reveal API.
//!
//! `ProtectRevealClient` posts JSON to the `/v1/protect`, `/v1/reveal`
//! and bulk endpoints over a pooled `reqwest` connection and returns an
//! [`ApiResponse`] for every outcome: non-2xx statuses and transport
//! failures are data to be tallied, not errors to bubble up. The
//! [`ProtectApi`] trait is the seam the runner drives, so tests can
//! substitute a canned transport.
use std::time::Duration;

use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid auth token: {0}")]
    InvalidAuthToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Response payload: parsed JSON when the server sent any, otherwise
/// the raw body text (or the transport error message).
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

/// Outcome of a single POST. `status` is `None` when the request never
/// produced an HTTP response (refused connection, timeout).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: Option<u16>,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status: Some(status),
            body: ResponseBody::Json(body),
        }
    }

    pub fn text(status: Option<u16>, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(s) if (200..300).contains(&s))
    }

    pub fn body_json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Text(_) => None,
        }
    }
}

/// Request body for a single protect call.
pub fn protect_payload(policy: &str, data: &str) -> Value {
    json!({ "protection_policy_name": policy, "data": data })
}

/// Request body for a single reveal call. `protected` is the token from
/// the matching protect response, or "" when protect yielded none.
pub fn reveal_payload(policy: &str, protected: &str) -> Value {
    json!({ "protection_policy_name": policy, "protected_data": protected })
}

/// Request body for a bulk protect call. Carries the plain list under
/// both `data` and `data_array` since deployed servers disagree on the
/// key name.
pub fn protect_bulk_payload(policy: &str, items: &[String]) -> Value {
    json!({
        "protection_policy_name": policy,
        "data": items,
        "data_array": items,
    })
}

/// Request body for a bulk reveal call. The token list is spelled three
/// ways (`protected_data`, `protected_array`, and the per-item
/// `protected_data_array` form) to cover the known server variants.
pub fn reveal_bulk_payload(policy: &str, protected_items: &[String], username: Option<&str>) -> Value {
    let per_item: Vec<Value> = protected_items
        .iter()
        .map(|p| json!({ "protected_data": p }))
        .collect();
    let mut payload = json!({
        "protection_policy_name": policy,
        "protected_data": protected_items,
        "protected_array": protected_items,
        "protected_data_array": per_item,
    });
    if let Some(user) = username {
        payload["username"] = Value::String(user.to_string());
    }
    payload
}

/// The four calls the runner makes. Implemented by
/// [`ProtectRevealClient`] over HTTP and by test fakes.
pub trait ProtectApi {
    fn policy(&self) -> &str;
    fn protect(&self, data: &str) -> ApiResponse;
    fn reveal(&self, protected: &str) -> ApiResponse;
    fn protect_bulk(&self, items: &[String]) -> ApiResponse;
    fn reveal_bulk(&self, protected_items: &[String], username: Option<&str>) -> ApiResponse;
}

/// Blocking HTTP client bound to one API host and policy.
#[derive(Debug)]
pub struct ProtectRevealClient {
    base_url: String,
    protect_url: String,
    reveal_url: String,
    protect_bulk_url: String,
    reveal_bulk_url: String,
    policy: String,
    http: reqwest::blocking::Client,
}

impl ProtectRevealClient {
    pub fn new(
        host: &str,
        port: u16,
        policy: &str,
        timeout: Duration,
        auth_token: Option<&str>,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        let base_url = format!("http://{host}:{port}");
        Ok(Self {
            protect_url: format!("{base_url}/v1/protect"),
            reveal_url: format!("{base_url}/v1/reveal"),
            protect_bulk_url: format!("{base_url}/v1/protect/bulk"),
            reveal_bulk_url: format!("{base_url}/v1/reveal/bulk"),
            base_url,
            policy: policy.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON payload and fold every outcome into an
    /// [`ApiResponse`]. A transport error that carries an attached
    /// status (e.g. a non-2xx surfaced by a middleware layer) keeps it;
    /// otherwise the status is `None` and the body is the error text.
    pub fn post_json(&self, url: &str, payload: &Value) -> ApiResponse {
        let resp = match self.http.post(url).json(payload).send() {
            Ok(r) => r,
            Err(e) => {
                debug!("POST {url} transport error: {e}");
                return ApiResponse::text(e.status().map(|s| s.as_u16()), e.to_string());
            }
        };
        let status = resp.status().as_u16();
        debug!("POST {url} -> {status}");
        let text = match resp.text() {
            Ok(t) => t,
            Err(e) => return ApiResponse::text(Some(status), e.to_string()),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(v) => ApiResponse::json(status, v),
            Err(_) => ApiResponse::text(Some(status), text),
        }
    }
}

impl ProtectApi for ProtectRevealClient {
    fn policy(&self) -> &str {
        &self.policy
    }

    fn protect(&self, data: &str) -> ApiResponse {
        self.post_json(&self.protect_url, &protect_payload(&self.policy, data))
    }

    fn reveal(&self, protected: &str) -> ApiResponse {
        self.post_json(&self.reveal_url, &reveal_payload(&self.policy, protected))
    }

    fn protect_bulk(&self, items: &[String]) -> ApiResponse {
        self.post_json(
            &self.protect_bulk_url,
            &protect_bulk_payload(&self.policy, items),
        )
    }

    fn reveal_bulk(&self, protected_items: &[String], username: Option<&str>) -> ApiResponse {
        self.post_json(
            &self.reveal_bulk_url,
            &reveal_bulk_payload(&self.policy, protected_items, username),
        )
    }
}
