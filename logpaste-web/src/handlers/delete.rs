use crate::envelope::{Envelope, SuccessData};
use crate::error_handling::AppResult;
use crate::validation::{request_target, validate_method};
use crate::AppState;
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
};
use logpaste_core::{delete_batch, split_identifier_batch, DeleteReport};
use serde_json::json;
use tracing::info;

const DELETE_PREFIX: &str = "/1/delete/";

/// `DELETE /1/delete/{id}` and `DELETE /1/delete/{id1,id2,...}`
pub async fn delete_logs(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> AppResult<Envelope> {
    validate_method(&method, &[Method::DELETE])?;
    let tokens = split_identifier_batch(request_target(&uri), DELETE_PREFIX)?;

    let results = delete_batch(state.store.as_ref(), &tokens).await;
    let report = DeleteReport::from_results(results);

    Ok(match report {
        DeleteReport::Single(result) if result.succeeded => Envelope::success(
            SuccessData::from_value(json!({
                "deleted": [result.identifier],
                "failed": [],
            })),
            result.message,
        ),
        DeleteReport::Single(result) => Envelope::error(
            result.message,
            StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        ),
        DeleteReport::AllFailed { message } => Envelope::error(message, StatusCode::BAD_REQUEST),
        DeleteReport::Batch(batch) => {
            info!(
                total = batch.total,
                deleted = batch.deleted_count,
                failed = batch.failed_count,
                "Batch delete finished"
            );
            Envelope::json(serde_json::to_value(&batch)?)
        }
    })
}
