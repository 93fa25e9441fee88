use crate::domain::DomainError;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;

/// PostgreSQL unique_violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// Error reported by the hosted backend, or a transport failure (`status == 0`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            code: None,
            message: message.into(),
        }
    }

    /// Parse a PostgREST or GoTrue error body
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();

        let code = parsed.as_ref().and_then(|b| {
            b.code.as_ref().map(|c| match c {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        });

        let message = parsed
            .and_then(|b| b.message.or(b.msg).or(b.error_description).or(b.error))
            .or_else(|| Some(body.trim().to_string()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });

        Self {
            status: status.as_u16(),
            code,
            message,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code.as_deref() == Some(UNIQUE_VIOLATION) || self.status == StatusCode::CONFLICT.as_u16()
    }
}

impl From<BackendError> for DomainError {
    fn from(err: BackendError) -> Self {
        DomainError::DataAccess(err.message)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    code: Option<serde_json::Value>,
}

#[async_trait]
pub trait ResponseExt {
    async fn into_backend_result(self) -> Result<Response, BackendError>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn into_backend_result(self) -> Result<Response, BackendError> {
        let status = self.status();
        if status.is_success() {
            return Ok(self);
        }
        let body = self.text().await.unwrap_or_default();
        Err(BackendError::from_body(status, &body))
    }
}

#[async_trait]
impl ResponseExt for Result<Response, reqwest::Error> {
    async fn into_backend_result(self) -> Result<Response, BackendError> {
        match self {
            Ok(response) => response.into_backend_result().await,
            Err(e) => Err(BackendError::transport(e.to_string())),
        }
    }
}
