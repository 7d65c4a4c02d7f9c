use serde_json::Value;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiClient;

/// Placeholder shipped in sample configuration files.
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY";

/// Number of characters of an unparseable error body quoted back to the client.
pub const ERROR_SNIPPET_CHARS: usize = 200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Failed to encode payload JSON: {0}")]
    EncodingFailure(String),

    #[error("AI returned an empty response. Response: {body}")]
    EmptyOrMalformedProviderResponse { body: String },

    #[error("{message}")]
    ProviderRequestFailed {
        status: u16,
        transport_error: Option<String>,
        provider_message: Option<String>,
        body_snippet: Option<String>,
        message: String,
    },
}

impl AnalysisError {
    /// HTTP status reported to the client. Provider problems are always ours.
    pub fn status_code(&self) -> u16 {
        500
    }

    pub fn request_failed(
        status: u16,
        transport_error: Option<String>,
        provider_message: Option<String>,
        body_snippet: Option<String>,
    ) -> Self {
        let mut message = format!("AI Request Failed (HTTP {}).", status);
        if let Some(err) = &transport_error {
            message.push_str(&format!(" Transport Error: {}", err));
        }
        if let Some(provider) = &provider_message {
            message.push_str(&format!(" Provider Message: {}", provider));
        } else if let Some(snippet) = &body_snippet {
            message.push_str(&format!(" Response: {}", snippet));
        }

        Self::ProviderRequestFailed {
            status,
            transport_error,
            provider_message,
            body_snippet,
            message,
        }
    }
}

/// Analysis text on success, a classified failure otherwise.
pub type AnalysisOutcome = Result<String, AnalysisError>;

#[async_trait::async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, prompt: &str, api_key: &str, model: &str) -> AnalysisOutcome;
    fn provider_name(&self) -> &str;
}

/// True when the key is empty or still the sample placeholder.
pub fn is_unconfigured_key(api_key: &str) -> bool {
    let key = api_key.trim();
    key.is_empty() || key.contains(API_KEY_PLACEHOLDER)
}

/// Classifies a finished exchange with the provider.
///
/// `status` is 0 when no HTTP response was received.
pub fn classify_response(status: u16, body: &str, transport_error: Option<&str>) -> AnalysisOutcome {
    if status == 200 && transport_error.is_none() {
        let text = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            json.pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        return text.ok_or_else(|| AnalysisError::EmptyOrMalformedProviderResponse {
            body: body.to_string(),
        });
    }

    let (provider_message, body_snippet) = if body.is_empty() {
        (None, None)
    } else {
        let provider_message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let snippet = match provider_message {
            Some(_) => None,
            None => Some(body.chars().take(ERROR_SNIPPET_CHARS).collect()),
        };
        (provider_message, snippet)
    };

    Err(AnalysisError::request_failed(
        status,
        transport_error.map(str::to_string),
        provider_message,
        body_snippet,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_extracts_first_part() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"X"},{"text":"Y"}]}}]}"#;
        assert_eq!(classify_response(200, body, None), Ok("X".to_string()));
    }

    #[test]
    fn test_unexpected_shape_quotes_body() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = classify_response(200, body, None).unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyOrMalformedProviderResponse { .. }));
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains(body));
    }

    #[test]
    fn test_non_json_success_body_is_malformed() {
        let err = classify_response(200, "<html>proxy</html>", None).unwrap_err();
        assert!(err.to_string().ends_with("<html>proxy</html>"));
    }

    #[test]
    fn test_provider_error_message_is_used() {
        let body = r#"{"error":{"code":503,"message":"quota exceeded","status":"UNAVAILABLE"}}"#;
        let err = classify_response(503, body, None).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.to_string(),
            "AI Request Failed (HTTP 503). Provider Message: quota exceeded"
        );
    }

    #[test]
    fn test_unparseable_error_body_is_truncated() {
        let body = "e".repeat(500);
        let err = classify_response(502, &body, None).unwrap_err();
        match err {
            AnalysisError::ProviderRequestFailed { body_snippet, provider_message, .. } => {
                assert_eq!(body_snippet.unwrap().len(), ERROR_SNIPPET_CHARS);
                assert!(provider_message.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_without_response() {
        let err = classify_response(0, "", Some("connection refused")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI Request Failed (HTTP 0). Transport Error: connection refused"
        );
    }

    #[test]
    fn test_unconfigured_keys() {
        assert!(is_unconfigured_key(""));
        assert!(is_unconfigured_key("   "));
        assert!(is_unconfigured_key("YOUR_API_KEY"));
        assert!(is_unconfigured_key("YOUR_API_KEY_HERE"));
        assert!(!is_unconfigured_key("AIzaSyExample"));
    }
}
