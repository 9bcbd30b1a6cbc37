//! Validation contracts and the per-request authentication context

use crate::error::GuardError;
use crate::utils::timing_safe_compare;
use async_trait::async_trait;
use axum::{
    BoxError,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Placeholder stored in [`AuthContext::api_key`] while key redaction is on
pub const REDACTED_KEY: &str = "[REDACTED]";

/// Rate-limit data passed through from the validator.
///
/// The guard carries this into the [`AuthContext`] untouched; accounting and
/// enforcement belong to whoever produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

/// What the external validator decided about a key.
///
/// Produced once per request; everything besides `valid` is optional
/// passthrough data surfaced in the [`AuthContext`] on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationOutcome {
    /// A passing outcome with no scopes or passthrough data
    pub fn valid() -> Self {
        Self {
            valid: true,
            scopes: None,
            rate_limit: None,
            metadata: None,
            error_message: None,
        }
    }

    /// A failing outcome with the generic rejection message
    pub fn invalid() -> Self {
        Self {
            valid: false,
            scopes: None,
            rate_limit: None,
            metadata: None,
            error_message: None,
        }
    }

    /// Attach the scopes granted to this key
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Attach rate-limit passthrough data
    pub fn with_rate_limit(mut self, rate_limit: RateLimitInfo) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Override the message used for the rejection response
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// External check deciding whether an extracted key is valid.
///
/// Implementations typically consult a key store or an upstream service. An
/// `Err` here is a host-level failure of the validator itself and produces a
/// plain 500, distinct from returning `valid: false`.
#[async_trait]
pub trait ApiKeyValidator: Send + Sync {
    async fn validate(
        &self,
        api_key: &str,
        request: &Request,
    ) -> Result<ValidationOutcome, BoxError>;
}

/// Audit hook invoked after every validator call, passing or failing.
///
/// Runs after the validator and before scope checking; its `Ok` value is
/// discarded. An `Err` aborts the request with a plain 500 — hook failures
/// are not isolated from the pipeline.
#[async_trait]
pub trait ValidationHook: Send + Sync {
    async fn on_validation(
        &self,
        api_key: &str,
        outcome: &ValidationOutcome,
        request: &Request,
    ) -> Result<(), BoxError>;
}

/// Custom renderer for guard rejections.
///
/// When configured, the handler assumes full responsibility for producing
/// the response; the default JSON rendering is skipped entirely.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, error: GuardError, request: &Request) -> Response;
}

/// Per-request record of validated key data.
///
/// Inserted into request extensions by the guard on successful
/// authentication only; its absence in a handler means the request came
/// through an anonymous-access branch.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated key, or [`REDACTED_KEY`] unless redaction was
    /// disabled in the [`AuthConfig`](crate::config::AuthConfig)
    pub api_key: String,
    /// Scopes granted by the validator
    pub scopes: Vec<String>,
    /// Rate-limit passthrough, when the validator supplied one
    pub rate_limit: Option<RateLimitInfo>,
    /// Validator-supplied metadata
    pub metadata: HashMap<String, Value>,
}

impl AuthContext {
    /// Check whether a specific scope was granted
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Check whether any of the given scopes was granted
    pub fn has_any_scope<I>(&self, scopes: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        scopes.into_iter().any(|scope| self.has_scope(scope.as_ref()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(GuardError::MissingApiKey)
    }
}

/// The authenticated scope list, exposed separately for handlers that only
/// care about permissions
#[derive(Debug, Clone)]
pub struct ApiKeyScopes(pub Vec<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ApiKeyScopes
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ApiKeyScopes>()
            .cloned()
            .ok_or(GuardError::MissingApiKey)
    }
}

/// In-memory validator over a fixed key set.
///
/// Each stored key carries the scopes it grants. Lookup uses
/// [`timing_safe_compare`] so a probe cannot learn stored keys through
/// response timing. Suited to single-tenant deployments and tests; anything
/// multi-tenant wants its own [`ApiKeyValidator`] against a real store.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyValidator {
    keys: Vec<(String, Vec<String>)>,
}

impl StaticKeyValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key and the scopes it grants
    pub fn with_key<I, S>(mut self, key: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.push((
            key.into(),
            scopes.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

#[async_trait]
impl ApiKeyValidator for StaticKeyValidator {
    async fn validate(
        &self,
        api_key: &str,
        _request: &Request,
    ) -> Result<ValidationOutcome, BoxError> {
        for (stored, scopes) in &self.keys {
            if timing_safe_compare(stored, api_key) {
                return Ok(ValidationOutcome::valid().with_scopes(scopes.clone()));
            }
        }
        Ok(ValidationOutcome::invalid())
    }
}
