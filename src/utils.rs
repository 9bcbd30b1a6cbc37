//! Key generation and timing-safe comparison utilities

use base64::{Engine as _, engine::general_purpose};
use rand::Rng;
use subtle::ConstantTimeEq;

/// Secure random generator backed by the thread-local CSPRNG
pub struct SecureRandom;

impl SecureRandom {
    /// Generate cryptographically secure random bytes
    pub fn bytes(length: usize) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        (0..length).map(|_| rng.r#gen()).collect()
    }

    /// Generate a URL-safe base64-encoded random string from `byte_length`
    /// bytes of randomness
    pub fn base64_url_string(byte_length: usize) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(Self::bytes(byte_length))
    }
}

/// Options for [`generate_api_key`]
#[derive(Debug, Clone)]
pub struct KeyOptions {
    /// Prefix prepended to the key, joined with `_`
    pub prefix: Option<String>,
    /// Number of random characters in the key body
    pub length: usize,
}

impl Default for KeyOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            length: 32,
        }
    }
}

impl KeyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

/// Generate a URL-safe API key.
///
/// The key body is exactly `length` characters of URL-safe base64 drawn from
/// the thread-local CSPRNG; when a prefix is configured the result is
/// `{prefix}_{body}`.
///
/// # Example
/// ```rust
/// use apikey_guard::utils::{KeyOptions, generate_api_key};
///
/// let key = generate_api_key(&KeyOptions::new().with_prefix("pk_test").with_length(24));
/// assert!(key.starts_with("pk_test_"));
/// assert_eq!(key.len(), "pk_test_".len() + 24);
/// ```
pub fn generate_api_key(options: &KeyOptions) -> String {
    // base64 of n bytes yields at least n characters, truncate to exact size
    let mut body = SecureRandom::base64_url_string(options.length);
    body.truncate(options.length);

    match &options.prefix {
        Some(prefix) => format!("{prefix}_{body}"),
        None => body,
    }
}

/// Constant-time string equality for API keys.
///
/// On a length mismatch the left input is still compared against itself so
/// the call does not return measurably faster than an equal-length
/// comparison would.
pub fn timing_safe_compare(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        let _ = a.ct_eq(a);
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_api_key_defaults() {
        let key = generate_api_key(&KeyOptions::default());
        assert_eq!(key.len(), 32);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_api_key_with_prefix() {
        let options = KeyOptions::new().with_prefix("pk_test").with_length(24);
        let key = generate_api_key(&options);

        assert!(key.starts_with("pk_test_"));
        assert_eq!(key.len(), "pk_test_".len() + 24);
    }

    #[test]
    fn test_generated_keys_are_distinct() {
        let options = KeyOptions::default();
        let keys: HashSet<String> = (0..100).map(|_| generate_api_key(&options)).collect();
        assert_eq!(keys.len(), 100);
    }

    #[test]
    fn test_generate_api_key_edge_lengths() {
        assert_eq!(generate_api_key(&KeyOptions::new().with_length(0)), "");
        assert_eq!(generate_api_key(&KeyOptions::new().with_length(1)).len(), 1);

        let prefixed = generate_api_key(&KeyOptions::new().with_prefix("pk").with_length(0));
        assert_eq!(prefixed, "pk_");
    }

    #[test]
    fn test_timing_safe_compare() {
        assert!(timing_safe_compare("hello", "hello"));
        assert!(!timing_safe_compare("hello", "world"));
        assert!(!timing_safe_compare("short", "longstring"));
        assert!(!timing_safe_compare("", "hello"));
        assert!(timing_safe_compare("", ""));
    }

    #[test]
    fn test_secure_random_lengths() {
        assert_eq!(SecureRandom::bytes(0).len(), 0);
        assert_eq!(SecureRandom::bytes(32).len(), 32);
        assert_ne!(SecureRandom::bytes(32), SecureRandom::bytes(32));

        let encoded = SecureRandom::base64_url_string(32);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert!(!encoded.contains('='));
    }
}
