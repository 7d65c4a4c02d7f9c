use crate::ai_provider::{classify_response, AnalysisError, AnalysisOutcome, AnalysisProvider};
use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

impl<'a> GeminiRequest<'a> {
    fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        }
    }
}

/// Client for the `generateContent` endpoint.
///
/// One attempt per call, no retries, transport default timeouts.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, model: &str, api_key: &str) -> Result<Url, AnalysisError> {
        let base = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            model
        );
        Url::parse_with_params(&base, &[("key", api_key)])
            .map_err(|e| AnalysisError::EncodingFailure(format!("invalid provider URL: {}", e)))
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait::async_trait]
impl AnalysisProvider for GeminiClient {
    async fn analyze(&self, prompt: &str, api_key: &str, model: &str) -> AnalysisOutcome {
        let payload = serde_json::to_vec(&GeminiRequest::from_prompt(prompt))
            .map_err(|e| AnalysisError::EncodingFailure(e.to_string()))?;
        let url = self.request_url(model, api_key)?;

        debug!(model = %model, prompt_chars = prompt.len(), "Sending analysis request");

        let response = match self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                // the URL carries the API key
                let e = e.without_url();
                warn!("Analysis request failed before a response: {}", e);
                let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                return classify_response(status, "", Some(&e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let outcome = match response.text().await {
            Ok(body) => classify_response(status, &body, None),
            Err(e) => classify_response(status, "", Some(&e.without_url().to_string())),
        };

        if let Err(e) = &outcome {
            warn!(status, "Analysis provider call failed: {}", e);
        }
        outcome
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
