use axum::{routing::any, Router};

use crate::{handlers, AppState};

/// Every route accepts any method; the handlers answer disallowed ones with
/// the 405 envelope instead of axum's bare status.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", any(handlers::index))
        // Submission
        .route("/1/log", any(handlers::submit_log))
        .route("/1/log/", any(handlers::submit_log))
        .route("/1/analyse", any(handlers::analyse_log))
        .route("/1/analyse/", any(handlers::analyse_log))
        .route("/1/limits", any(handlers::limits))
        // Lookups by id. The bare prefix is routed so a missing id is a 400,
        // not a 404.
        .route("/1/raw/", any(handlers::get_raw))
        .route("/1/raw/*ids", any(handlers::get_raw))
        .route("/1/ai-analysis/", any(handlers::ai_analysis))
        .route("/1/ai-analysis/*ids", any(handlers::ai_analysis))
        .route("/1/insights/", any(handlers::get_insights))
        .route("/1/insights/*ids", any(handlers::get_insights))
        .route("/1/delete/", any(handlers::delete_logs))
        .route("/1/delete/*ids", any(handlers::delete_logs))
}
