//! Structured authentication failures

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Failures raised by the guard pipeline.
///
/// Each kind carries a stable machine-readable code and an HTTP status. The
/// default response body is the JSON produced by [`GuardError::to_json`];
/// a custom [`ErrorHandler`](crate::auth::ErrorHandler) may render these
/// however it likes.
#[derive(Debug, Clone, Error)]
pub enum GuardError {
    /// No API key was found in any configured source
    #[error("Missing API key")]
    MissingApiKey,

    /// The validator rejected the key
    #[error("{message}")]
    InvalidApiKey { message: String },

    /// The key is valid but does not carry the scopes the route requires
    #[error("{message}")]
    InsufficientScopes {
        message: String,
        required_scopes: Vec<String>,
        provided_scopes: Vec<String>,
    },

    /// Defined for consumers building on the rate-limit passthrough; the
    /// pipeline itself never raises this
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: u64 },
}

impl GuardError {
    /// Create an invalid-key error, preferring the validator-supplied message
    pub fn invalid_api_key(message: Option<String>) -> Self {
        Self::InvalidApiKey {
            message: message.unwrap_or_else(|| "Invalid API key".to_string()),
        }
    }

    /// Create an insufficient-scopes error for the requirement set that
    /// failed, with a message naming the missing scopes
    pub fn insufficient_scopes(required_scopes: Vec<String>, provided_scopes: Vec<String>) -> Self {
        let missing: Vec<&str> = required_scopes
            .iter()
            .filter(|scope| !provided_scopes.contains(scope))
            .map(String::as_str)
            .collect();

        Self::InsufficientScopes {
            message: format!("Insufficient scopes, missing: {}", missing.join(", ")),
            required_scopes,
            provided_scopes,
        }
    }

    /// Create a rate-limit error with a `Retry-After` hint in seconds
    pub fn rate_limit_exceeded(retry_after: u64) -> Self {
        Self::RateLimitExceeded { retry_after }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "MISSING_API_KEY",
            Self::InvalidApiKey { .. } => "INVALID_API_KEY",
            Self::InsufficientScopes { .. } => "INSUFFICIENT_SCOPES",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
        }
    }

    /// HTTP status for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingApiKey | Self::InvalidApiKey { .. } => StatusCode::UNAUTHORIZED,
            Self::InsufficientScopes { .. } => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Serializable payload: `{error, message, statusCode}` plus
    /// kind-specific fields
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
            "statusCode": self.status_code().as_u16(),
        });

        match self {
            Self::InsufficientScopes {
                required_scopes,
                provided_scopes,
                ..
            } => {
                body["requiredScopes"] = json!(required_scopes);
                body["providedScopes"] = json!(provided_scopes);
            }
            Self::RateLimitExceeded { retry_after } => {
                body["retryAfter"] = json!(retry_after);
            }
            _ => {}
        }

        body
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            Self::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        };

        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        if let Some(seconds) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}
