//! Scope validation against per-route requirements

use std::collections::HashSet;

/// Outcome of checking provided scopes against a route's requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeValidation {
    /// Whether every configured requirement was satisfied
    pub valid: bool,
    /// The scopes that caused the first failing check, in requirement order
    pub missing: Vec<String>,
}

impl ScopeValidation {
    fn pass() -> Self {
        Self {
            valid: true,
            missing: Vec::new(),
        }
    }

    fn fail(missing: Vec<String>) -> Self {
        Self {
            valid: false,
            missing,
        }
    }
}

/// Check `provided` scopes against two independent requirement sets.
///
/// Every scope in `required` must be present, and at least one scope in
/// `any_of` must be present. Empty requirement sets are vacuously satisfied;
/// duplicates carry no weight. On failure, `missing` reports the first
/// failing check: the absent entries of `required` in their configured
/// order, or the entire `any_of` set when none of its entries matched.
///
/// Matching is exact string equality; hierarchical or wildcard scopes are
/// deliberately not supported.
pub fn validate_scopes(
    provided: &[String],
    required: &[String],
    any_of: &[String],
) -> ScopeValidation {
    let provided_set: HashSet<&str> = provided.iter().map(String::as_str).collect();

    if !required.is_empty() {
        let missing = dedup_in_order(
            required
                .iter()
                .filter(|scope| !provided_set.contains(scope.as_str())),
        );
        if !missing.is_empty() {
            return ScopeValidation::fail(missing);
        }
    }

    if !any_of.is_empty()
        && !any_of
            .iter()
            .any(|scope| provided_set.contains(scope.as_str()))
    {
        return ScopeValidation::fail(dedup_in_order(any_of.iter()));
    }

    ScopeValidation::pass()
}

fn dedup_in_order<'a>(scopes: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    scopes
        .filter(|scope| seen.insert(scope.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_required_present() {
        let result = validate_scopes(
            &scopes(&["read", "write", "admin"]),
            &scopes(&["read", "write"]),
            &[],
        );
        assert!(result.valid);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_missing_required_reported_in_order() {
        let result = validate_scopes(
            &scopes(&["read"]),
            &scopes(&["read", "write", "admin"]),
            &[],
        );
        assert!(!result.valid);
        assert_eq!(result.missing, scopes(&["write", "admin"]));
    }

    #[test]
    fn test_any_of_satisfied_by_single_match() {
        let result = validate_scopes(&scopes(&["read"]), &[], &scopes(&["admin", "read"]));
        assert!(result.valid);
    }

    #[test]
    fn test_any_of_failure_reports_whole_set() {
        let result = validate_scopes(
            &scopes(&["read", "write"]),
            &scopes(&["read", "write"]),
            &scopes(&["admin", "super"]),
        );
        assert!(!result.valid);
        assert_eq!(result.missing, scopes(&["admin", "super"]));
    }

    #[test]
    fn test_required_failure_takes_precedence_over_any_of() {
        let result = validate_scopes(
            &scopes(&["read"]),
            &scopes(&["write"]),
            &scopes(&["admin"]),
        );
        assert!(!result.valid);
        assert_eq!(result.missing, scopes(&["write"]));
    }

    #[test]
    fn test_empty_requirements_are_vacuously_satisfied() {
        assert!(validate_scopes(&[], &[], &[]).valid);
        assert!(validate_scopes(&scopes(&["read"]), &[], &[]).valid);
    }

    #[test]
    fn test_empty_provided_against_requirements() {
        let result = validate_scopes(&[], &scopes(&["read"]), &[]);
        assert!(!result.valid);
        assert_eq!(result.missing, scopes(&["read"]));

        let result = validate_scopes(&[], &[], &scopes(&["read", "write"]));
        assert!(!result.valid);
        assert_eq!(result.missing, scopes(&["read", "write"]));
    }

    #[test]
    fn test_duplicate_requirements_have_no_effect() {
        let result = validate_scopes(
            &scopes(&["read"]),
            &scopes(&["write", "write", "admin"]),
            &[],
        );
        assert!(!result.valid);
        assert_eq!(result.missing, scopes(&["write", "admin"]));

        let result = validate_scopes(&[], &[], &scopes(&["admin", "admin"]));
        assert_eq!(result.missing, scopes(&["admin"]));
    }
}
