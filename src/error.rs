use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use tracing::log;

use crate::rate_limiter::RateLimited;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API key is required")]
    AuthenticationMissing,

    #[error("Invalid API key")]
    AuthenticationInvalid,

    #[error("{message}")]
    ValidationFailed { message: String, fields: Vec<String> },

    #[error("Rate limit exceeded")]
    RateLimitExceeded(RateLimited),

    #[error("{0}")]
    NotFound(String),

    /// `message` is shown to the caller, `detail` only reaches the log.
    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> ApiError {
        ApiError::ValidationFailed { message: message.into(), fields }
    }

    pub fn internal(message: impl Into<String>, detail: impl Display) -> ApiError {
        ApiError::Internal { message: message.into(), detail: detail.to_string() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationMissing => StatusCode::UNAUTHORIZED,
            ApiError::AuthenticationInvalid => StatusCode::FORBIDDEN,
            ApiError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            ApiError::RateLimitExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine name used in security events.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::AuthenticationMissing => "AUTHENTICATION_MISSING",
            ApiError::AuthenticationInvalid => "AUTHENTICATION_INVALID",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal { .. } => "INTERNAL",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ErrorRsp {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ErrorRsp { error: self.to_string(), ..Default::default() };
        let mut retry_header = None;

        match self {
            ApiError::ValidationFailed { fields, .. } => body.fields = fields,
            ApiError::RateLimitExceeded(limited) => {
                let secs = limited.retry_after_secs();
                body.message = Some("Too many requests. Please try again later.".to_string());
                body.retry_after = Some(secs);
                body.limit = Some(limited.limit.to_string());
                retry_header = Some(HeaderValue::from(secs));
            },
            ApiError::Internal { message, detail } => {
                log::error!("[API] {message}: {detail}");
            },
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(value) = retry_header {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}
