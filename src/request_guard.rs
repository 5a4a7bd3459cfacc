use std::sync::Arc;

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::log;

use crate::{config_handler::Config, error::ApiError, rate_limiter::{RateLimit, RateLimiter}, sanitize};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Required fields and per-field maximum lengths of a JSON body.
#[derive(Debug)]
pub struct Schema {
    pub required: &'static [&'static str],
    pub max_length: &'static [(&'static str, usize)],
}

/// What the guard enforces for one route.
#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub name: &'static str,
    pub requires_key: bool,
    pub default_limit: RateLimit,
    pub schema: Option<&'static Schema>,
}

/// Progress of a request through the guard. A rejection records the last stage passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    Received,
    Authenticated,
    RateOk,
    Validated,
}

pub fn log_security_event(kind: &str, source: &str, route: &str, reason: &str) {
    tracing::warn!(target: "security", ip = source, route, "SECURITY EVENT - {kind}: {reason}");
}

#[derive(Clone)]
pub struct RequestGuard {
    config: Arc<Config>,
    limiter: RateLimiter,
}

impl RequestGuard {
    pub fn new(config: Arc<Config>, limiter: RateLimiter) -> RequestGuard {
        RequestGuard { config, limiter }
    }

    /// Authentication and rate limiting, for routes without a body.
    pub fn admit(&self, route: &RouteSpec, source: &str, headers: &HeaderMap) -> Result<GuardStage, ApiError> {
        if route.requires_key {
            self.authenticate(headers)
                .map_err(|e| self.reject(GuardStage::Received, route, source, e))?;
            log::info!("[GUARD] Authenticated request from {source} to {}", route.name);
        }

        let limit = self.config.route_limit(route.name, route.default_limit);
        self.limiter.check(route.name, source, &limit)
            .map_err(|e| self.reject(GuardStage::Authenticated, route, source, ApiError::RateLimitExceeded(e)))?;

        Ok(GuardStage::RateOk)
    }

    /// Full pipeline, returning the sanitized body object.
    pub fn admit_json(&self, route: &RouteSpec, source: &str, headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
        self.admit(route, source, headers)?;

        let object = match route.schema {
            Some(schema) => RequestGuard::validate(schema, headers, body),
            None => RequestGuard::parse_object(headers, body),
        }
        .map_err(|e| self.reject(GuardStage::RateOk, route, source, e))?;

        log::info!("[GUARD] Validated input from {source} for {}", route.name);
        Ok(object)
    }

    pub fn admit_payload<T: DeserializeOwned>(&self, route: &RouteSpec, source: &str, headers: &HeaderMap, body: &[u8]) -> Result<T, ApiError> {
        let object = self.admit_json(route, source, headers, body)?;
        serde_path_to_error::deserialize(Value::Object(object)).map_err(|e| {
            let field = e.path().to_string();
            log::debug!("[GUARD] Type mismatch for {}: {}", route.name, e.inner());
            let err = if field == "." {
                ApiError::validation("Invalid request body", vec![])
            } else {
                ApiError::validation(format!("Invalid value for {field}"), vec![field])
            };
            self.reject(GuardStage::Validated, route, source, err)
        })
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let value = match headers.get(API_KEY_HEADER) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(ApiError::AuthenticationMissing),
        };
        match value.to_str() {
            Ok(key) if self.config.is_allowed_key(key) => Ok(()),
            _ => Err(ApiError::AuthenticationInvalid),
        }
    }

    fn parse_object(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
        let is_json = headers
            .get(CONTENT_TYPE)
            .and_then(|e| e.to_str().ok())
            .map(|e| e.split(';').next().unwrap_or_default().trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false);
        if !is_json {
            return Err(ApiError::validation("Content-Type must be application/json", vec![]));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::validation("Request body is required", vec![]));
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(object)) if !object.is_empty() => Ok(object),
            Ok(Value::Object(_)) => Err(ApiError::validation("Request body is required", vec![])),
            Ok(_) => Err(ApiError::validation("Request body must be a JSON object", vec![])),
            Err(_) => Err(ApiError::validation("Request body must be valid JSON", vec![])),
        }
    }

    fn validate(schema: &Schema, headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
        let mut object = RequestGuard::parse_object(headers, body)?;

        let missing: Vec<String> = schema.required.iter()
            .filter(|field| !object.get(**field).map(is_truthy).unwrap_or(false))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::validation(format!("Missing required fields: {}", missing.join(", ")), missing));
        }

        let too_long: Vec<(&str, usize)> = schema.max_length.iter()
            .filter(|(field, max)| match object.get(*field) {
                Some(Value::String(s)) => s.chars().count() > *max,
                _ => false,
            })
            .copied()
            .collect();
        if !too_long.is_empty() {
            let message = too_long.iter()
                .map(|(field, max)| format!("{field} exceeds maximum length of {max}"))
                .collect::<Vec<String>>()
                .join("; ");
            let fields = too_long.iter().map(|(field, _)| field.to_string()).collect();
            return Err(ApiError::validation(message, fields));
        }

        sanitize::clean_strings(&mut object);
        Ok(object)
    }

    fn reject(&self, stage: GuardStage, route: &RouteSpec, source: &str, err: ApiError) -> ApiError {
        log_security_event(err.kind(), source, route.name, &format!("{err} (after {stage:?})"));
        err
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|e| e != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
