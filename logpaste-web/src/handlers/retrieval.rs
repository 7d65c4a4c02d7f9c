use crate::envelope::Envelope;
use crate::error_handling::{AppError, AppResult};
use crate::validation::{request_target, validate_method};
use crate::AppState;
use axum::{
    extract::State,
    http::{Method, Uri},
};
use logpaste_core::{extract_single_identifier, LogId, LogInsights, LogRecord};

const RAW_PREFIX: &str = "/1/raw/";
const INSIGHTS_PREFIX: &str = "/1/insights/";

/// Loads a live record and pushes its expiry back.
async fn fetch_renewed(state: &AppState, id: &LogId) -> AppResult<LogRecord> {
    if !state.store.exists(id).await? {
        return Err(AppError::not_found("Log not found."));
    }
    state.store.renew(id).await?;

    // expired between the check and the read
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("Log not found."))
}

/// `GET /1/raw/{id}`
pub async fn get_raw(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> AppResult<Envelope> {
    validate_method(&method, &[Method::GET])?;
    let id = extract_single_identifier(request_target(&uri), RAW_PREFIX)?;

    let record = fetch_renewed(&state, &id).await?;
    Ok(Envelope::text(record.content))
}

/// `GET /1/insights/{id}`
pub async fn get_insights(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> AppResult<Envelope> {
    validate_method(&method, &[Method::GET])?;
    let id = extract_single_identifier(request_target(&uri), INSIGHTS_PREFIX)?;

    let record = fetch_renewed(&state, &id).await?;
    let mut insights = LogInsights::analyse(record.content()).with_id(id);
    insights.set_include_entries(false);

    Ok(Envelope::json(serde_json::to_value(&insights)?))
}
