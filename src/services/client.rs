use super::session::{SessionError, SharedSessionStore};
use crate::models::config::ApiConfig;
use crate::utils::validation::ValidationError;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required, please log in")]
    MissingCredentials,
    #[error("your session has expired, please log in again")]
    SessionExpired,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unexpected response from server: {0}")]
    Decode(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::SessionExpired => Some(StatusCode::UNAUTHORIZED.as_u16()),
            _ => None,
        }
    }
}

/// Turns an error response body into a message fit for the user.
///
/// Tried in order: a plain string body (JSON string or raw text), a
/// `message` string, a `message` array joined with `", "`, then the JSON
/// body itself. Empty bodies fall back to the status code.
pub fn normalize_error_message(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    let fallback = || format!("Request failed with status {status}");
    if text.is_empty() {
        return fallback();
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(message)) if !message.trim().is_empty() => message,
        Ok(Value::String(_)) => fallback(),
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Array(parts)) if !parts.is_empty() => parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            _ => Value::Object(map).to_string(),
        },
        Ok(other) => other.to_string(),
        Err(_) => text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Authenticated,
    Public,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Backend client. Every authenticated call reads the bearer token from the
/// session store; a 401 clears that store before the error is returned.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SharedSessionStore,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: SharedSessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()?;
        Ok(Self::from_parts(http, &config.base_url, session))
    }

    pub fn from_parts(http: reqwest::Client, base_url: &str, session: SharedSessionStore) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    /// Same connection pool and backend, different session holder.
    pub fn with_session(&self, session: SharedSessionStore) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session,
        }
    }

    pub fn session(&self) -> &SharedSessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.execute(request, Access::Authenticated).await
    }

    /// For endpoints used before a session exists (login, signup, OTP).
    pub async fn send_public<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.execute(request, Access::Public).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T, ApiError> {
        self.send(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: impl Into<String>, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::POST, path).json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: impl Into<String>, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::new(Method::PATCH, path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T, ApiError> {
        self.send(ApiRequest::new(Method::DELETE, path)).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: ApiRequest, access: Access) -> Result<T, ApiError> {
        let token = match access {
            Access::Authenticated => Some(
                self.session
                    .get()
                    .ok_or(ApiError::MissingCredentials)?
                    .access_token,
            ),
            Access::Public => None,
        };

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.path, "API request");
        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, "API transport error: {}", e);
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            warn!(path = %request.path, "Backend rejected the session token; clearing session");
            self.session.remove();
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let message = normalize_error_message(status.as_u16(), &body);
            debug!(path = %request.path, status = status.as_u16(), %message, "API request rejected");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        decode_body(&body)
    }
}

/// Empty bodies decode as `null`, or as `{}` for types that need an object.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
            .or_else(|_| serde_json::from_value(Value::Object(Default::default())))
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| ApiError::Decode(e.to_string()))
}
