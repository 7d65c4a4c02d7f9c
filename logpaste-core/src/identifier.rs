use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("ID is required")]
    Missing,
    #[error("At least one valid ID is required")]
    NoValidTokens,
    #[error("Invalid ID format: {0}")]
    InvalidFormat(String),
    #[error("Log ID is required")]
    MissingBatch,
    #[error("At least one valid log ID is required")]
    EmptyBatch,
}

/// Identifier of one stored log. Only constructed from tokens that passed
/// [`is_valid_identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(String);

impl LogId {
    pub fn parse(token: &str) -> Result<Self, IdentifierError> {
        if is_valid_identifier(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(IdentifierError::InvalidFormat(token.to_string()))
        }
    }

    /// Wraps a token produced by the storage layer itself.
    pub(crate) fn from_generated(token: String) -> Self {
        debug_assert!(is_valid_identifier(&token));
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn is_valid_identifier(token: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(token)
}

/// Path remainder after `prefix`, without query string and enclosing slashes.
fn path_remainder<'a>(request_path: &'a str, prefix: &str) -> &'a str {
    let rest = request_path.strip_prefix(prefix).unwrap_or("");
    let rest = rest.split('?').next().unwrap_or("");
    rest.trim_matches('/')
}

fn split_tokens(segment: &str) -> Vec<String> {
    segment
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extracts every identifier from a comma-separated path segment.
///
/// The batch is validated as a whole: one malformed token rejects the entire
/// request and nothing is returned.
pub fn extract_identifiers(request_path: &str, prefix: &str) -> Result<Vec<LogId>, IdentifierError> {
    let remainder = path_remainder(request_path, prefix);
    if remainder.is_empty() {
        return Err(IdentifierError::Missing);
    }

    let tokens = split_tokens(remainder);
    if tokens.is_empty() {
        return Err(IdentifierError::NoValidTokens);
    }

    tokens.iter().map(|token| LogId::parse(token)).collect()
}

/// Same as [`extract_identifiers`] but keeps only the first identifier, for
/// endpoints that do not support batches.
pub fn extract_single_identifier(request_path: &str, prefix: &str) -> Result<LogId, IdentifierError> {
    let mut ids = extract_identifiers(request_path, prefix)?;
    // extract_identifiers never returns an empty list
    Ok(ids.swap_remove(0))
}

/// Splits the trailing path segment into raw, unvalidated tokens.
///
/// Used by the batch executor, which validates each token on its own so a bad
/// token only fails its own entry.
pub fn split_identifier_batch(request_path: &str, prefix: &str) -> Result<Vec<String>, IdentifierError> {
    let remainder = path_remainder(request_path, prefix);
    let segment = remainder.rsplit('/').next().unwrap_or("");
    if segment.is_empty() {
        return Err(IdentifierError::MissingBatch);
    }

    let tokens = split_tokens(segment);
    if tokens.is_empty() {
        return Err(IdentifierError::EmptyBatch);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[LogId]) -> Vec<&str> {
        list.iter().map(LogId::as_str).collect()
    }

    #[test]
    fn test_identifier_validation() {
        assert!(!is_valid_identifier(""));
        assert!(is_valid_identifier("abc_123-XYZ"));
        assert!(!is_valid_identifier("abc/def"));
        assert!(!is_valid_identifier("abc def"));
        assert!(!is_valid_identifier("ümlaut"));
        assert!(!is_valid_identifier("abc\n"));
    }

    #[test]
    fn test_extract_drops_blank_tokens() {
        let result = extract_identifiers("/1/raw/aa,bb, ,cc", "/1/raw/").unwrap();
        assert_eq!(ids(&result), vec!["aa", "bb", "cc"]);
    }

    #[test]
    fn test_extract_strips_query_and_slashes() {
        let result = extract_identifiers("/1/raw/abc/?download=1", "/1/raw/").unwrap();
        assert_eq!(ids(&result), vec!["abc"]);
    }

    #[test]
    fn test_extract_requires_an_id() {
        assert_eq!(
            extract_identifiers("/1/raw/", "/1/raw/"),
            Err(IdentifierError::Missing)
        );
        assert_eq!(
            extract_identifiers("/1/raw/ , ,", "/1/raw/"),
            Err(IdentifierError::NoValidTokens)
        );
    }

    #[test]
    fn test_extract_rejects_whole_batch_on_one_bad_token() {
        let err = extract_identifiers("/1/raw/good,ba.d,also-good", "/1/raw/").unwrap_err();
        assert_eq!(err, IdentifierError::InvalidFormat("ba.d".to_string()));
        assert_eq!(err.to_string(), "Invalid ID format: ba.d");
    }

    #[test]
    fn test_extract_single_returns_first() {
        let id = extract_single_identifier("/1/insights/first,second", "/1/insights/").unwrap();
        assert_eq!(id.as_str(), "first");
    }

    #[test]
    fn test_split_batch_keeps_invalid_tokens() {
        let tokens = split_identifier_batch("/1/delete/a, b ,,x.y", "/1/delete/").unwrap();
        assert_eq!(tokens, vec!["a", "b", "x.y"]);
    }

    #[test]
    fn test_split_batch_uses_last_segment() {
        let tokens = split_identifier_batch("/1/delete/ignored/a,b?force=1", "/1/delete/").unwrap();
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn test_split_batch_errors() {
        assert_eq!(
            split_identifier_batch("/1/delete/", "/1/delete/"),
            Err(IdentifierError::MissingBatch)
        );
        assert_eq!(
            split_identifier_batch("/1/delete/,,", "/1/delete/"),
            Err(IdentifierError::EmptyBatch)
        );
    }
}
