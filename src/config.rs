//! Process-wide guard configuration

use crate::extract::KeySource;

/// Header consulted when no sources are configured explicitly
pub const DEFAULT_HEADER: &str = "x-api-key";

/// Process-wide authentication configuration.
///
/// Built once at startup and shared read-only by every guard; per-route
/// behavior is layered on top through
/// [`GuardOptions`](crate::guard::GuardOptions).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Where to look for keys, in priority order
    pub sources: Vec<KeySource>,
    /// Whether requests without a valid key pass through by default; routes
    /// may override in either direction
    pub allow_anonymous: bool,
    /// Whether [`AuthContext::api_key`](crate::auth::AuthContext) carries the
    /// redaction placeholder instead of the literal key
    pub redact_keys: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sources: vec![KeySource::header(DEFAULT_HEADER)],
            allow_anonymous: false,
            redact_keys: true,
        }
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the extraction sources
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = KeySource>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Set the process-wide anonymous-access default
    pub fn with_allow_anonymous(mut self, allow_anonymous: bool) -> Self {
        self.allow_anonymous = allow_anonymous;
        self
    }

    /// Toggle key redaction in the authentication context
    pub fn with_redact_keys(mut self, redact_keys: bool) -> Self {
        self.redact_keys = redact_keys;
        self
    }
}
