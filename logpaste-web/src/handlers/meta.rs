use crate::envelope::Envelope;
use crate::error_handling::AppResult;
use crate::validation::validate_method;
use crate::AppState;
use axum::{extract::State, http::Method};
use serde_json::json;

/// `GET /`: lists the available endpoints.
pub async fn index() -> Envelope {
    Envelope::json(json!({
        "message": "Welcome to the API. Please use the following endpoints:",
        "endpoints": {
            "POST /1/log": "Submit log data",
            "POST /1/analyse": "Analyze log data",
            "GET /1/limits": "Get API rate limits",
            "GET /1/raw/{id}": "Retrieve raw log by ID",
            "GET /1/ai-analysis/{id}": "Get AI analysis for log ID",
            "GET /1/insights/{id}": "Get insights for log ID",
            "DELETE /1/delete/{id}": "Delete log by ID (supports multiple IDs: /1/delete/id1,id2,id3)"
        },
        "documentation": "Please refer to the API documentation for detailed usage."
    }))
}

/// `GET /1/limits`
pub async fn limits(State(state): State<AppState>, method: Method) -> AppResult<Envelope> {
    validate_method(&method, &[Method::GET])?;
    Ok(Envelope::json(serde_json::to_value(
        state.config.storage.limits(),
    )?))
}
