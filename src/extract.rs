//! API key extraction from configured request locations

use axum::http::{HeaderMap, header::COOKIE};
use serde_json::Value;

/// Location within a request where an API key may be supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocation {
    /// An HTTP header, looked up case-insensitively
    Header,
    /// A query-string parameter
    Query,
    /// A field of the JSON request body
    Body,
    /// A cookie from the `Cookie` header
    Cookie,
}

/// One place to look for an API key.
///
/// A source names a location and a field within it, plus an optional prefix
/// that is stripped from matching values (e.g. `"ApiKey "` for
/// `Authorization: ApiKey <key>`). An ordered list of sources defines
/// extraction priority: the first source yielding a non-empty value wins.
#[derive(Debug, Clone)]
pub struct KeySource {
    pub location: SourceLocation,
    pub name: String,
    pub prefix: Option<String>,
}

impl KeySource {
    /// Create a source for an arbitrary location
    pub fn new(location: SourceLocation, name: impl Into<String>) -> Self {
        Self {
            location,
            name: name.into(),
            prefix: None,
        }
    }

    /// Look for the key in the named header
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(SourceLocation::Header, name)
    }

    /// Look for the key in the named query parameter
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(SourceLocation::Query, name)
    }

    /// Look for the key in the named field of the JSON request body
    pub fn body(name: impl Into<String>) -> Self {
        Self::new(SourceLocation::Body, name)
    }

    /// Look for the key in the named cookie
    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(SourceLocation::Cookie, name)
    }

    /// Strip `prefix` from values found by this source.
    ///
    /// The match is exact: values that do not start with the prefix are used
    /// unmodified.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    // HeaderMap lookup is case-insensitive; `get` returns the first value
    // when the header appears more than once.
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn query_value(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn body_value(body: Option<&Value>, name: &str) -> Option<String> {
    // Only plain string fields of an object body count as keys.
    match body?.get(name)? {
        Value::String(value) => Some(value.clone()),
        _ => None,
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(cookie_name, _)| *cookie_name == name)
        .map(|(_, value)| value.to_owned())
}

/// Extract an API key from a request, trying `sources` strictly in order.
///
/// For each source the raw value is located, the configured prefix is
/// stripped when it matches exactly, and surrounding whitespace is trimmed.
/// The first source producing a non-empty candidate wins and no further
/// sources are tried. Returns `None` when no source yields a value (or the
/// source list is empty).
///
/// This is a pure function: `query` is the raw query string of the request
/// URI and `body` is the already-parsed JSON body, when one exists.
pub fn extract_api_key(
    headers: &HeaderMap,
    query: Option<&str>,
    body: Option<&Value>,
    sources: &[KeySource],
) -> Option<String> {
    for source in sources {
        let raw = match source.location {
            SourceLocation::Header => header_value(headers, &source.name),
            SourceLocation::Query => query_value(query, &source.name),
            SourceLocation::Body => body_value(body, &source.name),
            SourceLocation::Cookie => cookie_value(headers, &source.name),
        };

        let Some(raw) = raw else { continue };
        if raw.is_empty() {
            continue;
        }

        let stripped = match &source.prefix {
            Some(prefix) => raw.strip_prefix(prefix.as_str()).unwrap_or(&raw),
            None => raw.as_str(),
        };

        let candidate = stripped.trim();
        if !candidate.is_empty() {
            return Some(candidate.to_owned());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn headers_with(name: &'static str, value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = headers_with("x-api-key", "secret");
        let sources = [KeySource::header("X-API-Key")];

        assert_eq!(
            extract_api_key(&headers, None, None, &sources),
            Some("secret".to_string())
        );
    }

    #[test]
    fn test_multi_valued_header_takes_first() {
        let mut headers = HeaderMap::new();
        headers.append("x-api-key", HeaderValue::from_static("first"));
        headers.append("x-api-key", HeaderValue::from_static("second"));
        let sources = [KeySource::header("x-api-key")];

        assert_eq!(
            extract_api_key(&headers, None, None, &sources),
            Some("first".to_string())
        );
    }

    #[test]
    fn test_sources_are_tried_in_order() {
        let headers = headers_with("x-api-key", "from-header");
        let query = Some("api_key=from-query");

        let header_first = [KeySource::header("x-api-key"), KeySource::query("api_key")];
        let query_first = [KeySource::query("api_key"), KeySource::header("x-api-key")];

        assert_eq!(
            extract_api_key(&headers, query, None, &header_first),
            Some("from-header".to_string())
        );
        assert_eq!(
            extract_api_key(&headers, query, None, &query_first),
            Some("from-query".to_string())
        );
    }

    #[test]
    fn test_matching_prefix_is_stripped() {
        let headers = headers_with("authorization", "ApiKey my-secret");
        let sources = [KeySource::header("authorization").with_prefix("ApiKey ")];

        assert_eq!(
            extract_api_key(&headers, None, None, &sources),
            Some("my-secret".to_string())
        );
    }

    #[test]
    fn test_non_matching_prefix_leaves_value_untouched() {
        let headers = headers_with("authorization", "ApiKey my-secret");
        let sources = [KeySource::header("authorization").with_prefix("Bearer ")];

        assert_eq!(
            extract_api_key(&headers, None, None, &sources),
            Some("ApiKey my-secret".to_string())
        );
    }

    #[test]
    fn test_candidate_is_trimmed() {
        let headers = headers_with("x-api-key", "  padded-key  ");
        let sources = [KeySource::header("x-api-key")];

        assert_eq!(
            extract_api_key(&headers, None, None, &sources),
            Some("padded-key".to_string())
        );
    }

    #[test]
    fn test_whitespace_only_value_falls_through_to_next_source() {
        let headers = headers_with("x-api-key", "   ");
        let query = Some("api_key=real");
        let sources = [KeySource::header("x-api-key"), KeySource::query("api_key")];

        assert_eq!(
            extract_api_key(&headers, query, None, &sources),
            Some("real".to_string())
        );
    }

    #[test]
    fn test_query_first_occurrence_wins() {
        let headers = HeaderMap::new();
        let query = Some("api_key=one&api_key=two");
        let sources = [KeySource::query("api_key")];

        assert_eq!(
            extract_api_key(&headers, query, None, &sources),
            Some("one".to_string())
        );
    }

    #[test]
    fn test_body_accepts_only_string_fields() {
        let headers = HeaderMap::new();
        let sources = [KeySource::body("apiKey")];

        let string_body = json!({"apiKey": "from-body"});
        assert_eq!(
            extract_api_key(&headers, None, Some(&string_body), &sources),
            Some("from-body".to_string())
        );

        let number_body = json!({"apiKey": 42});
        assert_eq!(
            extract_api_key(&headers, None, Some(&number_body), &sources),
            None
        );

        let array_body = json!(["apiKey"]);
        assert_eq!(
            extract_api_key(&headers, None, Some(&array_body), &sources),
            None
        );
    }

    #[test]
    fn test_cookie_lookup() {
        let headers = headers_with("cookie", "session=abc; api_key=cookie-secret; theme=dark");
        let sources = [KeySource::cookie("api_key")];

        assert_eq!(
            extract_api_key(&headers, None, None, &sources),
            Some("cookie-secret".to_string())
        );
    }

    #[test]
    fn test_missing_cookie_header_is_absent() {
        let headers = HeaderMap::new();
        let sources = [KeySource::cookie("api_key")];

        assert_eq!(extract_api_key(&headers, None, None, &sources), None);
    }

    #[test]
    fn test_empty_source_list_is_absent() {
        let headers = headers_with("x-api-key", "secret");

        assert_eq!(extract_api_key(&headers, None, None, &[]), None);
    }

    #[test]
    fn test_no_source_yields_value() {
        let headers = HeaderMap::new();
        let sources = [
            KeySource::header("x-api-key"),
            KeySource::query("api_key"),
            KeySource::body("apiKey"),
            KeySource::cookie("api_key"),
        ];

        assert_eq!(extract_api_key(&headers, None, None, &sources), None);
    }

    #[test]
    fn test_prefix_then_trim_produces_empty_falls_through() {
        // Stripping the prefix leaves only whitespace, so the source yields
        // nothing and extraction moves on.
        let headers = headers_with("authorization", "ApiKey   ");
        let sources = [
            KeySource::header("authorization").with_prefix("ApiKey "),
            KeySource::header("x-api-key"),
        ];

        assert_eq!(extract_api_key(&headers, None, None, &sources), None);
    }
}
