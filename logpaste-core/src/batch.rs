//! Multi-target delete with per-item failure isolation.

use crate::identifier::LogId;
use crate::storage::LogStore;
use serde::Serialize;
use tracing::{error, info, warn};

pub const DELETED_MESSAGE: &str = "Log deleted successfully";

/// Outcome for one requested identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub identifier: String,
    pub succeeded: bool,
    pub message: String,
    pub status_code: u16,
}

impl OperationResult {
    fn succeeded(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            succeeded: true,
            message: DELETED_MESSAGE.to_string(),
            status_code: 200,
        }
    }

    fn failed(identifier: &str, status_code: u16, message: String) -> Self {
        Self {
            identifier: identifier.to_string(),
            succeeded: false,
            message,
            status_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub id: String,
    pub message: String,
    pub code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedItem>,
    pub total: usize,
    pub deleted_count: usize,
    pub failed_count: usize,
}

impl BatchResponse {
    pub fn from_results(results: &[OperationResult]) -> Self {
        let deleted: Vec<String> = results
            .iter()
            .filter(|r| r.succeeded)
            .map(|r| r.identifier.clone())
            .collect();
        let failed: Vec<FailedItem> = results
            .iter()
            .filter(|r| !r.succeeded)
            .map(|r| FailedItem {
                id: r.identifier.clone(),
                message: r.message.clone(),
                code: r.status_code,
            })
            .collect();

        Self {
            success: !deleted.is_empty(),
            total: results.len(),
            deleted_count: deleted.len(),
            failed_count: failed.len(),
            deleted,
            failed,
        }
    }
}

/// How a finished delete request must be reported.
///
/// A lone identifier keeps the legacy single-delete shape; only requests
/// naming several identifiers get the batch shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteReport {
    Single(OperationResult),
    Batch(BatchResponse),
    AllFailed { message: String },
}

impl DeleteReport {
    pub fn from_results(results: Vec<OperationResult>) -> Self {
        if results.len() == 1 {
            let mut results = results;
            return DeleteReport::Single(results.remove(0));
        }

        let batch = BatchResponse::from_results(&results);
        if batch.success {
            return DeleteReport::Batch(batch);
        }

        let messages: Vec<&str> = batch.failed.iter().map(|f| f.message.as_str()).collect();
        DeleteReport::AllFailed {
            message: format!("Failed to delete logs: {}", messages.join(", ")),
        }
    }
}

/// Validates, checks and deletes a single raw token. Never fails as a whole.
pub async fn delete_one(store: &dyn LogStore, token: &str) -> OperationResult {
    let id = match LogId::parse(token) {
        Ok(id) => id,
        Err(_) => {
            return OperationResult::failed(token, 400, format!("Invalid log ID format: {}", token));
        }
    };

    match store.exists(&id).await {
        Ok(true) => {}
        Ok(false) => return OperationResult::failed(token, 404, format!("Log not found: {}", token)),
        Err(e) => {
            error!(id = %id, "Existence check failed: {}", e);
            return OperationResult::failed(token, 500, format!("Failed to delete log: {}", token));
        }
    }

    match store.delete(&id).await {
        Ok(true) => {
            info!(id = %id, "Deleted log");
            OperationResult::succeeded(token)
        }
        Ok(false) => {
            warn!(id = %id, "Log vanished before it could be deleted");
            OperationResult::failed(token, 500, format!("Failed to delete log: {}", token))
        }
        Err(e) => {
            error!(id = %id, "Delete failed: {}", e);
            OperationResult::failed(token, 500, format!("Failed to delete log: {}", token))
        }
    }
}

/// Runs [`delete_one`] for every token, in order, one after another.
pub async fn delete_batch(store: &dyn LogStore, tokens: &[String]) -> Vec<OperationResult> {
    let mut results = Vec::with_capacity(tokens.len());
    for token in tokens {
        results.push(delete_one(store, token).await);
    }
    results
}
