use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Media types accepted for log submissions.
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &[
    "application/x-www-form-urlencoded",
    "application/json",
    "text/plain",
    "application/octet-stream",
];

/// Request body encodings decompressed before parsing.
pub const SUPPORTED_ENCODINGS: &[&str] = &["gzip", "deflate", "br"];

/// Form and JSON field carrying the log text.
const CONTENT_FIELD: &str = "content";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Unsupported Media Type. Expected: {}", ACCEPTED_MEDIA_TYPES.join(" or "))]
    UnsupportedMediaType(String),
    #[error("Request body cannot be empty")]
    Empty,
    #[error("Invalid request body: {0}")]
    Malformed(String),
}

/// Normalizes submitted log content: picks the text out of the body, decodes
/// it and applies the storage limits.
#[derive(Debug, Clone)]
pub struct ContentParser {
    max_length: usize,
    max_lines: usize,
}

impl ContentParser {
    pub fn new(max_length: usize, max_lines: usize) -> Self {
        Self {
            max_length,
            max_lines,
        }
    }

    pub fn parse(&self, content_type: Option<&str>, body: &[u8]) -> Result<String, ContentError> {
        let (media_type, charset) = split_content_type(content_type.unwrap_or(""));

        let text = match media_type.as_str() {
            "application/x-www-form-urlencoded" => form_field(body),
            "application/json" => json_field(body)?,
            "" | "text/plain" | "application/octet-stream" => decode(body, charset.as_deref()),
            other => return Err(ContentError::UnsupportedMediaType(other.to_string())),
        };

        if text.trim().is_empty() {
            return Err(ContentError::Empty);
        }

        let limited = self.apply_limits(&text);
        debug!(
            media_type = %media_type,
            received_chars = text.len(),
            kept_chars = limited.len(),
            "Parsed submitted content"
        );
        Ok(limited)
    }

    fn apply_limits(&self, text: &str) -> String {
        let text = match text.char_indices().nth(self.max_length) {
            Some((index, _)) => &text[..index],
            None => text,
        };
        text.split('\n')
            .take(self.max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lowercased media type and the optional `charset` parameter.
fn split_content_type(header: &str) -> (String, Option<String>) {
    let mut parts = header.split(';');
    let media_type = parts.next().unwrap_or("").trim().to_ascii_lowercase();
    let charset = parts.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    });
    (media_type, charset)
}

fn decode(body: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    // decode() sniffs a BOM before falling back to the given encoding
    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        debug!("Replaced malformed {} sequences in submitted content", used.name());
    }
    text.into_owned()
}

fn form_field(body: &[u8]) -> String {
    url::form_urlencoded::parse(body)
        .find(|(name, _)| name == CONTENT_FIELD)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

fn json_field(body: &[u8]) -> Result<String, ContentError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ContentError::Empty);
    }
    let json: Value =
        serde_json::from_slice(body).map_err(|e| ContentError::Malformed(e.to_string()))?;
    // a blank string value is left for the caller's empty check
    match json.get(CONTENT_FIELD) {
        Some(Value::String(text)) => Ok(text.clone()),
        _ => Err(ContentError::Malformed(format!(
            "missing string field '{}'",
            CONTENT_FIELD
        ))),
    }
}
