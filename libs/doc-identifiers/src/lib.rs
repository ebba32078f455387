//! Format validators for the tenant hierarchy and document-path identifiers
//! (spec §3, §4.A, §9). Pure functions, no I/O.
//!
//! Length and character-class rules are hard-coded defaults but are exposed
//! as a configuration record ([`IdentifierRules`]) per spec §9, so a
//! deployment can loosen or tighten them without a code change.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Configurable length bounds for the tenant-triple identifiers (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierRules {
    pub min_org_len: usize,
    pub max_org_len: usize,
    pub min_project_len: usize,
    pub max_project_len: usize,
    pub min_database_len: usize,
    pub max_database_len: usize,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self {
            min_org_len: 3,
            max_org_len: 30,
            min_project_len: 6,
            max_project_len: 30,
            min_database_len: 3,
            max_database_len: 30,
        }
    }
}

/// A validation failure, carrying the failing character position when the
/// failure is character-class related (spec §4.A).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    pub position: Option<usize>,
}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            position: None,
        }
    }

    fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

fn validate_letter_digit_hyphen(
    kind: &str,
    invalid_code: &'static str,
    value: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min_len || len > max_len {
        return Err(ValidationError::new(
            invalid_code,
            format!("{kind} must be between {min_len} and {max_len} characters, got {len}"),
        ));
    }
    let mut chars = value.char_indices();
    let (_, first) = chars.next().ok_or_else(|| {
        ValidationError::new(invalid_code, format!("{kind} must not be empty"))
    })?;
    if !first.is_ascii_alphabetic() {
        return Err(ValidationError::new(
            invalid_code,
            format!("{kind} must start with a letter, found '{first}'"),
        )
        .at(0));
    }
    for (pos, ch) in chars {
        if !(ch.is_ascii_alphanumeric() || ch == '-') {
            return Err(ValidationError::new(
                invalid_code,
                format!("{kind} contains invalid character '{ch}' at position {pos}"),
            )
            .at(pos));
        }
    }
    Ok(())
}

/// Validate an `organization_id` per spec §3: 3-30 chars, leading letter,
/// remaining letters/digits/hyphens.
pub fn validate_organization_id(
    value: &str,
    rules: &IdentifierRules,
) -> Result<(), ValidationError> {
    validate_letter_digit_hyphen(
        "organization_id",
        "invalid_organization_id",
        value,
        rules.min_org_len,
        rules.max_org_len,
    )
}

/// Validate a `project_id` per spec §3: 6-30 chars, same character class.
pub fn validate_project_id(value: &str, rules: &IdentifierRules) -> Result<(), ValidationError> {
    validate_letter_digit_hyphen(
        "project_id",
        "invalid_project_id",
        value,
        rules.min_project_len,
        rules.max_project_len,
    )
}

/// Validate a `database_id` per spec §3: the literal `(default)`, or 3-30
/// chars under the same character class as organization/project ids.
pub fn validate_database_id(value: &str, rules: &IdentifierRules) -> Result<(), ValidationError> {
    if value == DEFAULT_DATABASE_ID {
        return Ok(());
    }
    validate_letter_digit_hyphen(
        "database_id",
        "invalid_database_id",
        value,
        rules.min_database_len,
        rules.max_database_len,
    )
}

/// Collection and document identifiers are path segments: non-empty, free of
/// the `/` separator, and bounded to a sane length. The spec names these
/// validators (§4.A) but does not fix a character class for them; this is
/// the Open Question resolution recorded in DESIGN.md.
pub fn validate_path_segment(kind: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(
            "invalid_path_segment",
            format!("{kind} must not be empty"),
        ));
    }
    if value.len() > 1500 {
        return Err(ValidationError::new(
            "invalid_path_segment",
            format!("{kind} must be at most 1500 characters"),
        ));
    }
    if let Some(pos) = value.find('/') {
        return Err(ValidationError::new(
            "invalid_path_segment",
            format!("{kind} must not contain '/'"),
        )
        .at(pos));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> IdentifierRules {
        IdentifierRules::default()
    }

    #[test]
    fn accepts_valid_organization_id() {
        assert!(validate_organization_id("org-abc", &rules()).is_ok());
    }

    #[test]
    fn rejects_short_organization_id() {
        let err = validate_organization_id("ab", &rules()).unwrap_err();
        assert_eq!(err.code, "invalid_organization_id");
    }

    #[test]
    fn rejects_organization_id_starting_with_digit() {
        let err = validate_organization_id("1abc", &rules()).unwrap_err();
        assert_eq!(err.code, "invalid_organization_id");
        assert_eq!(err.position, Some(0));
    }

    #[test]
    fn rejects_organization_id_with_invalid_character() {
        let err = validate_organization_id("abc_def", &rules()).unwrap_err();
        assert_eq!(err.code, "invalid_organization_id");
        assert_eq!(err.position, Some(3));
    }

    #[test]
    fn rejects_organization_id_over_max_length() {
        let long = format!("a{}", "b".repeat(40));
        assert!(validate_organization_id(&long, &rules()).is_err());
    }

    #[test]
    fn project_id_requires_six_characters() {
        assert!(validate_project_id("proj-1", &rules()).is_ok());
        assert!(validate_project_id("ab1", &rules()).is_err());
    }

    #[test]
    fn database_id_accepts_default_literal_regardless_of_length_rule() {
        assert!(validate_database_id("(default)", &rules()).is_ok());
    }

    #[test]
    fn database_id_rejects_other_parenthesized_values() {
        assert!(validate_database_id("(custom)", &rules()).is_err());
    }

    #[test]
    fn database_id_accepts_custom_id_under_same_class() {
        assert!(validate_database_id("db-one", &rules()).is_ok());
    }

    #[test]
    fn path_segment_rejects_embedded_slash() {
        let err = validate_path_segment("collection", "a/b").unwrap_err();
        assert_eq!(err.position, Some(1));
    }

    #[test]
    fn path_segment_rejects_empty() {
        assert!(validate_path_segment("document", "").is_err());
    }
}
