use crate::envelope::{Envelope, SuccessData};
use crate::error_handling::{AppError, AppResult};
use crate::validation::{request_target, validate_method};
use crate::AppState;
use axum::{
    extract::State,
    http::{Method, Uri},
};
use logpaste_core::{extract_single_identifier, is_unconfigured_key};
use serde_json::json;
use tracing::{info, warn};

const AI_ANALYSIS_PREFIX: &str = "/1/ai-analysis/";

/// `GET /1/ai-analysis/{id}`: asks the analysis provider to explain a stored log.
///
/// The record is not renewed; reading it for analysis does not count as an access.
pub async fn ai_analysis(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> AppResult<Envelope> {
    validate_method(&method, &[Method::GET])?;
    let id = extract_single_identifier(request_target(&uri), AI_ANALYSIS_PREFIX)?;

    if !state.store.exists(&id).await? {
        return Err(AppError::not_found("Log not found"));
    }

    let ai = &state.config.ai;
    let api_key = ai.gemini_api_key.trim();
    if is_unconfigured_key(api_key) {
        warn!("AI analysis requested but no Gemini API key is configured");
        return Err(AppError::configuration(
            "Please configure your Gemini API Key (ai.gemini_api_key or GEMINI_API_KEY)",
        ));
    }

    let record = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| AppError::internal("Could not read log data"))?;

    let prompt = state.prompt_builder.build(record.content());
    info!(
        id = %id,
        provider = state.analyzer.provider_name(),
        model = %ai.model,
        prompt_chars = prompt.chars().count(),
        "Requesting AI analysis"
    );

    let analysis = state.analyzer.analyze(&prompt, api_key, &ai.model).await?;

    Ok(Envelope::success(
        SuccessData::from_value(json!({ "analysis": analysis })),
        "AI analysis completed",
    ))
}
