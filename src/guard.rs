//! The authentication guard pipeline

use crate::auth::{
    ApiKeyScopes, ApiKeyValidator, AuthContext, ErrorHandler, REDACTED_KEY, ValidationHook,
};
use crate::config::AuthConfig;
use crate::error::GuardError;
use crate::extract::{SourceLocation, extract_api_key};
use crate::scopes::validate_scopes;
use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on how much of a request body is buffered to serve a
/// [`SourceLocation::Body`] key source
const BODY_CAPTURE_LIMIT: usize = 1024 * 1024;

/// The configured authentication plugin.
///
/// Holds the process-wide [`AuthConfig`], the required validator, and the
/// optional hook and error handler. Cheap to clone; every clone shares the
/// same configuration. Guards for individual routes are created through
/// [`guard`](ApiKeyAuth::guard) and [`require_scopes`](ApiKeyAuth::require_scopes).
#[derive(Clone)]
pub struct ApiKeyAuth {
    config: Arc<AuthConfig>,
    validator: Arc<dyn ApiKeyValidator>,
    hook: Option<Arc<dyn ValidationHook>>,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("config", &self.config)
            .field("hook", &self.hook.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

impl ApiKeyAuth {
    /// Create the plugin from its configuration and the external validator
    pub fn new(config: AuthConfig, validator: Arc<dyn ApiKeyValidator>) -> Self {
        Self {
            config: Arc::new(config),
            validator,
            hook: None,
            error_handler: None,
        }
    }

    /// Install an audit hook, invoked after every validator call
    pub fn with_hook(mut self, hook: Arc<dyn ValidationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Install a custom error handler for guard rejections
    pub fn with_error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(error_handler);
        self
    }

    /// Create a guard for one route
    pub fn guard(&self, options: GuardOptions) -> ApiKeyGuard {
        ApiKeyGuard {
            auth: self.clone(),
            options: Arc::new(options),
        }
    }

    /// Convenience alias for a guard that only requires scopes
    pub fn require_scopes<I, S>(&self, scopes: I) -> ApiKeyGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard(GuardOptions::new().with_scopes(scopes))
    }
}

/// Per-route guard requirements.
///
/// Immutable once the guard is created and shared by all requests matching
/// the route.
#[derive(Debug, Clone, Default)]
pub struct GuardOptions {
    /// Scopes the key must all carry
    pub scopes: Vec<String>,
    /// Scopes of which the key must carry at least one
    pub any_scope: Vec<String>,
    /// Per-route anonymous-access override; wins over the process-wide
    /// default in either direction
    pub allow_anonymous: Option<bool>,
}

impl GuardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require every one of these scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Require at least one of these scopes
    pub fn with_any_scope<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_scope = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Override the anonymous-access policy for this route
    pub fn with_allow_anonymous(mut self, allow_anonymous: bool) -> Self {
        self.allow_anonymous = Some(allow_anonymous);
        self
    }
}

/// A per-route request-handling step enforcing authentication and scopes.
///
/// Compose it with [`axum::middleware::from_fn`]:
///
/// ```rust,no_run
/// use apikey_guard::{ApiKeyAuth, AuthConfig, StaticKeyValidator};
/// use axum::{Router, extract::Request, middleware::{Next, from_fn}, routing::get};
/// use std::sync::Arc;
///
/// let auth = ApiKeyAuth::new(
///     AuthConfig::default(),
///     Arc::new(StaticKeyValidator::new().with_key("secret", ["read"])),
/// );
/// let guard = auth.require_scopes(["read"]);
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "ok" }))
///     .layer(from_fn(move |req: Request, next: Next| {
///         let guard = guard.clone();
///         async move { guard.process(req, next).await }
///     }));
/// ```
#[derive(Debug, Clone)]
pub struct ApiKeyGuard {
    auth: ApiKeyAuth,
    options: Arc<GuardOptions>,
}

impl ApiKeyGuard {
    /// Run the guard for one request.
    ///
    /// On success the request continues into `next` carrying an
    /// [`AuthContext`] (and [`ApiKeyScopes`]) in its extensions; on an
    /// anonymous pass-through it continues without them; otherwise the
    /// response is the rendered rejection.
    pub async fn process(&self, request: Request, next: Next) -> Response {
        let allow_anonymous = self
            .options
            .allow_anonymous
            .unwrap_or(self.auth.config.allow_anonymous);

        let (mut request, api_key) = match self.locate_key(request).await {
            Ok(located) => located,
            Err(response) => return response,
        };

        let Some(api_key) = api_key else {
            if allow_anonymous {
                debug!("no API key found, continuing anonymously");
                return next.run(request).await;
            }
            return self.reject(GuardError::MissingApiKey, &request).await;
        };

        // The validator must complete before the hook sees its outcome, and
        // the hook before any scope decision.
        let outcome = match self.auth.validator.validate(&api_key, &request).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("API key validator failed: {error}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "validator failure").into_response();
            }
        };

        if let Some(hook) = &self.auth.hook {
            if let Err(error) = hook.on_validation(&api_key, &outcome, &request).await {
                warn!("validation hook failed: {error}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "validation hook failure")
                    .into_response();
            }
        }

        if !outcome.valid {
            if allow_anonymous {
                debug!("invalid API key, continuing anonymously");
                return next.run(request).await;
            }
            let error = GuardError::invalid_api_key(outcome.error_message.clone());
            return self.reject(error, &request).await;
        }

        let provided = outcome.scopes.clone().unwrap_or_default();
        let check = validate_scopes(&provided, &self.options.scopes, &self.options.any_scope);
        if !check.valid {
            let required_failed = !self.options.scopes.is_empty()
                && !validate_scopes(&provided, &self.options.scopes, &[]).valid;
            let failing = if required_failed {
                self.options.scopes.clone()
            } else {
                self.options.any_scope.clone()
            };
            let error = GuardError::insufficient_scopes(failing, provided);
            return self.reject(error, &request).await;
        }

        let context = AuthContext {
            api_key: if self.auth.config.redact_keys {
                REDACTED_KEY.to_string()
            } else {
                api_key
            },
            scopes: provided.clone(),
            rate_limit: outcome.rate_limit,
            metadata: outcome.metadata.unwrap_or_default(),
        };

        debug!(scopes = ?context.scopes, "request authenticated");
        request.extensions_mut().insert(context);
        request.extensions_mut().insert(ApiKeyScopes(provided));

        next.run(request).await
    }

    /// Run the extractor over the configured sources, buffering the request
    /// body only when a body source demands it
    async fn locate_key(&self, request: Request) -> Result<(Request, Option<String>), Response> {
        let sources = &self.auth.config.sources;

        if !sources
            .iter()
            .any(|source| source.location == SourceLocation::Body)
        {
            let api_key = extract_api_key(request.headers(), request.uri().query(), None, sources);
            return Ok((request, api_key));
        }

        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, BODY_CAPTURE_LIMIT).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!("failed to buffer request body for key extraction: {error}");
                return Err(
                    (StatusCode::BAD_REQUEST, "unreadable request body").into_response()
                );
            }
        };

        let json = serde_json::from_slice::<serde_json::Value>(&bytes).ok();
        let api_key = extract_api_key(&parts.headers, parts.uri.query(), json.as_ref(), sources);

        // Hand the body back so downstream handlers see the request intact.
        Ok((Request::from_parts(parts, Body::from(bytes)), api_key))
    }

    async fn reject(&self, error: GuardError, request: &Request) -> Response {
        warn!(code = error.code(), "rejecting request: {error}");
        match &self.auth.error_handler {
            Some(handler) => handler.handle(error, request).await,
            None => error.into_response(),
        }
    }
}
