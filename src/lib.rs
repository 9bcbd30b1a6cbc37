//! # apikey-guard
//!
//! Request-level API-key authentication and scope enforcement for Axum.
//!
//! The crate intercepts incoming requests, locates a caller-supplied key
//! from one or more configurable locations, delegates validity checking to
//! an external validator, and enforces a flat scope model before the request
//! reaches its handler. Key storage, hashing, and rotation stay on the
//! caller's side of the [`ApiKeyValidator`] boundary.
//!
//! ## Features
//!
//! - **Ordered key sources**: headers, query parameters, JSON body fields,
//!   and cookies, tried strictly in configuration order with optional
//!   prefix stripping (`Authorization: ApiKey <key>`)
//! - **External validation**: an async [`ApiKeyValidator`] you implement;
//!   the pipeline only interprets its returned outcome
//! - **Scope enforcement**: all-required and any-of requirement sets per
//!   route, exact string matching
//! - **Typed request context**: successful requests carry an
//!   [`AuthContext`] (and [`ApiKeyScopes`]) in their extensions, usable
//!   directly as Axum extractors
//! - **Structured rejections**: stable machine-readable codes with JSON
//!   bodies, or a custom [`ErrorHandler`]
//! - **Anonymous access**: a process-wide default with per-route overrides
//!   in either direction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apikey_guard::{ApiKeyAuth, AuthConfig, AuthContext, StaticKeyValidator};
//! use axum::{Router, extract::Request, middleware::{Next, from_fn}, routing::get};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let validator = StaticKeyValidator::new().with_key("my-secret", ["read"]);
//!     let auth = ApiKeyAuth::new(AuthConfig::default(), Arc::new(validator));
//!
//!     let guard = auth.require_scopes(["read"]);
//!     let app: Router = Router::new()
//!         .route("/", get(|ctx: AuthContext| async move {
//!             format!("scopes: {:?}", ctx.scopes)
//!         }))
//!         .layer(from_fn(move |req: Request, next: Next| {
//!             let guard = guard.clone();
//!             async move { guard.process(req, next).await }
//!         }));
//!
//!     // serve `app`...
//! }
//! ```
//!
//! ## Key sources
//!
//! ```rust
//! use apikey_guard::{AuthConfig, KeySource};
//!
//! let config = AuthConfig::new().with_sources([
//!     KeySource::header("authorization").with_prefix("ApiKey "),
//!     KeySource::header("x-api-key"),
//!     KeySource::query("api_key"),
//! ]);
//! ```
//!
//! The first source yielding a non-empty value wins. A configured prefix is
//! stripped only when it matches exactly; otherwise the value is used as-is.
//!
//! ## Scopes
//!
//! ```rust
//! use apikey_guard::GuardOptions;
//!
//! // requires read AND write, plus at least one of admin/super
//! let options = GuardOptions::new()
//!     .with_scopes(["read", "write"])
//!     .with_any_scope(["admin", "super"]);
//! ```
//!
//! Scope matching is exact string equality; wildcard or hierarchical scopes
//! are deliberately out of scope.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod scopes;
pub mod utils;

// Re-export main types for convenience
pub use auth::{
    ApiKeyScopes, ApiKeyValidator, AuthContext, ErrorHandler, REDACTED_KEY, RateLimitInfo,
    StaticKeyValidator, ValidationHook, ValidationOutcome,
};
pub use config::{AuthConfig, DEFAULT_HEADER};
pub use error::GuardError;
pub use extract::{KeySource, SourceLocation, extract_api_key};
pub use guard::{ApiKeyAuth, ApiKeyGuard, GuardOptions};
pub use scopes::{ScopeValidation, validate_scopes};
pub use utils::{KeyOptions, SecureRandom, generate_api_key, timing_safe_compare};

/// Version information for the guard crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
