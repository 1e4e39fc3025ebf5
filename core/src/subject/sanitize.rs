use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SubjectError;

lazy_static! {
    /// Characters dropped outright.
    static ref UNSAFE: Regex = Regex::new(r#"[&:*?"<>|%#'`$;,\x00-\x1f\x7f]"#).unwrap();
    /// Runs of whitespace, path separators and underscores collapse to one `_`.
    static ref SEPARATORS: Regex = Regex::new(r"[\s/\\_]+").unwrap();
}

/// Turns a free-form subject name into a token usable as a path segment and
/// URL component.
///
/// Deterministic and idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(name: &str) -> Result<String, SubjectError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Err(SubjectError::InvalidSubjectName {
            name: name.to_string(),
        });
    }

    let stripped = UNSAFE.replace_all(trimmed, "");
    let joined = SEPARATORS.replace_all(&stripped, "_");
    let token = joined.trim_matches(|c| c == '_' || c == '.');

    if token.is_empty() {
        return Err(SubjectError::InvalidSubjectName {
            name: name.to_string(),
        });
    }
    Ok(token.to_string())
}
