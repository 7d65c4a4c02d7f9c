use crate::envelope::{Envelope, SuccessData};
use crate::error_handling::{AppError, AppResult};
use crate::validation::{content_type, validate_method};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, Method},
};
use logpaste_core::LogInsights;
use serde_json::json;
use tracing::info;

fn read_body(state: &AppState, body: Result<Bytes, BytesRejection>) -> AppResult<Bytes> {
    body.map_err(|rejection| {
        AppError::from_body_rejection(rejection, state.config.server.max_upload_size)
    })
}

/// `POST /1/log`
pub async fn submit_log(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Envelope> {
    validate_method(&method, &[Method::POST])?;
    let body = read_body(&state, body)?;

    let content = state.content_parser.parse(content_type(&headers), &body)?;
    let id = state.store.put(&content).await?;
    info!(id = %id, length = content.len(), "Stored new log");

    let urls = &state.config.urls;
    let data = json!({
        "id": id,
        "url": format!("{}/{}", urls.base_url, id),
        "raw": format!("{}/1/raw/{}", urls.api_base_url, id),
    });
    Ok(Envelope::success(
        SuccessData::from_value(data),
        "Log submitted successfully",
    ))
}

/// `POST /1/analyse`: insights for a body that is never stored.
pub async fn analyse_log(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Envelope> {
    validate_method(&method, &[Method::POST])?;
    let body = read_body(&state, body)?;

    let content = state.content_parser.parse(content_type(&headers), &body)?;
    let mut insights = LogInsights::analyse(&content);
    insights.set_include_entries(false);

    Ok(Envelope::json(serde_json::to_value(&insights)?))
}
