use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use logpaste_core::{AppConfig, GeminiClient, LogId, LogStore, SqliteLogStore};
use logpaste_web::{create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    app: Router,
    store: Arc<SqliteLogStore>,
}

impl TestApp {
    async fn put(&self, content: &str) -> LogId {
        self.store.put(content).await.unwrap()
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn delete(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// Helper to create a test app over an in-memory store
async fn create_test_app(config: AppConfig) -> TestApp {
    let store = Arc::new(
        SqliteLogStore::in_memory(config.storage.storage_duration())
            .await
            .expect("Failed to create in-memory store"),
    );
    let analyzer = Arc::new(GeminiClient::new(config.ai.endpoint.clone()));
    let state = AppState::with_components(config, store.clone(), analyzer);

    TestApp {
        app: create_app(state),
        store,
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.urls.base_url = "https://logs.example".to_string();
    config.urls.api_base_url = "https://api.logs.example".to_string();
    config
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let app = create_test_app(test_config()).await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::ACCEPT_ENCODING], "gzip,deflate,br");

    let body = body_json(response).await;
    assert!(body["endpoints"]["POST /1/log"].is_string());
    assert!(body["endpoints"]["DELETE /1/delete/{id}"].is_string());
}

#[tokio::test]
async fn test_submit_then_read_raw() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log")
                .header("content-type", "text/plain")
                .body(Body::from("[12:00:00] [Server thread/INFO]: Done\n"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Log submitted successfully");
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["url"], format!("https://logs.example/{}", id));
    assert_eq!(body["raw"], format!("https://api.logs.example/1/raw/{}", id));

    let response = app.get(&format!("/1/raw/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    assert_eq!(body_text(response).await, "[12:00:00] [Server thread/INFO]: Done\n");
}

#[tokio::test]
async fn test_submit_form_and_json_bodies() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log/")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from("content=line+one%0Aline+two"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();
    let raw = body_text(app.get(&format!("/1/raw/{}", id)).await).await;
    assert_eq!(raw, "line one\nline two");

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log")
                .header("content-type", "application/json")
                .body(Body::from(json!({"content": "from json"}).to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_submit_rejections() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log")
                .header("content-type", "image/png")
                .body(Body::from("png"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["code"], 415);

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log")
                .header("content-type", "text/plain")
                .body(Body::from("   \n"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Request body cannot be empty");

    let response = app.get("/1/log").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": false,
            "error": "Method not allowed. Only POST requests are allowed for this endpoint.",
            "code": 405
        })
    );
}

#[tokio::test]
async fn test_submit_applies_line_limit() {
    let mut config = test_config();
    config.storage.max_lines = 2;
    let app = create_test_app(config).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log")
                .header("content-type", "text/plain")
                .body(Body::from("a\nb\nc\nd"))
                .unwrap(),
        )
        .await;
    let id = body_json(response).await["id"].as_str().unwrap().to_string();
    assert_eq!(body_text(app.get(&format!("/1/raw/{}", id)).await).await, "a\nb");
}

#[tokio::test]
async fn test_analyse_returns_insights_without_id() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/analyse")
                .header("content-type", "text/plain")
                .body(Body::from("INFO starting\nERROR broken\nWARN careful"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["lines"], 3);
    assert_eq!(body["levels"]["error"], 1);
    assert_eq!(body["problems"][0]["message"], "ERROR broken");
    assert!(body.get("entries").is_none());
    assert!(body.get("success").is_none());
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn test_raw_errors() {
    let app = create_test_app(test_config()).await;

    let response = app.get("/1/raw/doesnotexist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Log not found.");

    let response = app.get("/1/raw/").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "ID is required");

    let response = app.get("/1/raw/bad.id").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid ID format: bad.id");

    let response = app.delete("/1/raw/abc").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_raw_uses_first_of_several_ids() {
    let app = create_test_app(test_config()).await;
    let first = app.put("first log").await;
    let second = app.put("second log").await;

    let response = app.get(&format!("/1/raw/{},{}", first, second)).await;
    assert_eq!(body_text(response).await, "first log");
}

#[tokio::test]
async fn test_insights_for_stored_log() {
    let app = create_test_app(test_config()).await;
    let id = app.put("INFO boot\nSEVERE disk failure\nDEBUG noise").await;

    let response = app.get(&format!("/1/insights/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["levels"], json!({"error": 1, "warn": 0, "info": 1, "debug": 1}));
    assert_eq!(body["problems"][0]["line"], 2);
    assert!(body.get("entries").is_none());

    let response = app.get("/1/insights/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_limits() {
    let mut config = test_config();
    config.storage.max_lines = 1234;
    let app = create_test_app(config).await;

    let response = app.get("/1/limits").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"storageTime": 7_776_000, "maxLength": 10_485_760, "maxLines": 1234})
    );

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/limits")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_json(response).await["error"],
        "Method not allowed. Only GET requests are allowed for this endpoint."
    );
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let app = create_test_app(test_config()).await;

    let response = app.get("/1/errors/rate").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Endpoint not found",
            "uri": "/1/errors/rate",
            "message": "Please check the available endpoints at /"
        })
    );
}

#[tokio::test]
async fn test_options_preflight() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .method("OPTIONS")
                .uri("/1/log")
                .header("origin", "https://somewhere.example")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCEPT_ENCODING], "gzip,deflate,br");
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_cors_on_regular_responses() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .uri("/1/limits")
                .header("origin", "https://somewhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_delete_single_keeps_legacy_shape() {
    let app = create_test_app(test_config()).await;
    let id = app.put("to delete").await;

    let response = app.delete(&format!("/1/delete/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "message": "Log deleted successfully",
            "deleted": [id.as_str()],
            "failed": []
        })
    );

    // Deleting twice reports the second one as missing
    let response = app.delete(&format!("/1/delete/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"success": false, "error": format!("Log not found: {}", id), "code": 404})
    );
}

#[tokio::test]
async fn test_delete_single_invalid_id() {
    let app = create_test_app(test_config()).await;

    let response = app.delete("/1/delete/bad.id").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid log ID format: bad.id");
}

#[tokio::test]
async fn test_delete_batch_all_success() {
    let app = create_test_app(test_config()).await;
    let a = app.put("a").await;
    let b = app.put("b").await;

    let response = app.delete(&format!("/1/delete/{},{}", a, b)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "deleted": [a.as_str(), b.as_str()],
            "failed": [],
            "total": 2,
            "deletedCount": 2,
            "failedCount": 0
        })
    );
    assert_eq!(app.get(&format!("/1/raw/{}", a)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_batch_mixed() {
    let app = create_test_app(test_config()).await;
    let a = app.put("a").await;

    let response = app.delete(&format!("/1/delete/{},missing1,bad.id", a)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["deleted"], json!([a.as_str()]));
    assert_eq!(
        body["failed"],
        json!([
            {"id": "missing1", "message": "Log not found: missing1", "code": 404},
            {"id": "bad.id", "message": "Invalid log ID format: bad.id", "code": 400}
        ])
    );
    assert_eq!(body["total"], 3);
    assert_eq!(body["failedCount"], 2);
}

#[tokio::test]
async fn test_delete_batch_all_failed() {
    let app = create_test_app(test_config()).await;

    let response = app.delete("/1/delete/missing1,missing2").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": false,
            "error": "Failed to delete logs: Log not found: missing1, Log not found: missing2",
            "code": 400
        })
    );
}

#[tokio::test]
async fn test_delete_request_errors() {
    let app = create_test_app(test_config()).await;

    let response = app.delete("/1/delete/").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Log ID is required");

    let response = app.delete("/1/delete/,,").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "At least one valid log ID is required");

    let response = app.get("/1/delete/abc").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_json(response).await["error"],
        "Method not allowed. Only DELETE requests are allowed for this endpoint."
    );
}

#[tokio::test]
async fn test_ai_analysis_missing_log() {
    let app = create_test_app(test_config()).await;

    let response = app.get("/1/ai-analysis/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Log not found");
}

#[tokio::test]
async fn test_ai_analysis_requires_api_key() {
    let app = create_test_app(test_config()).await;
    let id = app.put("ERROR something").await;

    let response = app.get(&format!("/1/ai-analysis/{}", id)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["code"], 500);
    assert!(body["error"].as_str().unwrap().contains("Gemini API Key"));
}

#[tokio::test]
async fn test_ai_analysis_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "real-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Out of memory, raise -Xmx"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.ai.gemini_api_key = "real-key".to_string();
    config.ai.endpoint = server.uri();
    let app = create_test_app(config).await;
    let id = app.put("INFO start\njava.lang.OutOfMemoryError: Java heap space").await;

    let response = app.get(&format!("/1/ai-analysis/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "message": "AI analysis completed",
            "analysis": "Out of memory, raise -Xmx"
        })
    );

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("java.lang.OutOfMemoryError: Java heap space"));
    assert!(prompt.contains("### Log Excerpt (Errors/Warnings):"));
}

#[tokio::test]
async fn test_ai_analysis_provider_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(json!({"error": {"code": 503, "message": "The model is overloaded."}})),
        )
        .mount(&server)
        .await;

    let mut config = test_config();
    config.ai.gemini_api_key = "real-key".to_string();
    config.ai.endpoint = server.uri();
    let app = create_test_app(config).await;
    let id = app.put("ERROR crash").await;

    let response = app.get(&format!("/1/ai-analysis/{}", id)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("HTTP 503"));
    assert!(error.contains("The model is overloaded."));
    assert!(!error.contains("real-key"));
}

#[tokio::test]
async fn test_ai_analysis_malformed_provider_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.ai.gemini_api_key = "real-key".to_string();
    config.ai.endpoint = server.uri();
    let app = create_test_app(config).await;
    let id = app.put("ERROR crash").await;

    let response = app.get(&format!("/1/ai-analysis/{}", id)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("AI returned an empty response."));
}

#[tokio::test]
async fn test_expired_logs_are_gone() {
    let mut config = test_config();
    config.storage.storage_time = 0;
    let app = create_test_app(config).await;
    let id = app.put("gone").await;

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(app.get(&format!("/1/raw/{}", id)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_json_without_content_field() {
    let app = create_test_app(test_config()).await;

    for body in [r#"{"text":"hello"}"#, r#"["x"]"#] {
        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/1/log")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error": "Invalid request body: missing string field 'content'",
                "code": 400
            })
        );
    }
}

#[tokio::test]
async fn test_oversized_body_uses_error_envelope() {
    let mut config = test_config();
    config.server.max_upload_size = 10;
    let app = create_test_app(config).await;

    for uri in ["/1/log", "/1/analyse"] {
        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "text/plain")
                    .body(Body::from("x".repeat(100)))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error": "Request body exceeds the maximum upload size of 10 bytes",
                "code": 413
            })
        );
    }
}

#[tokio::test]
async fn test_unknown_content_encoding_uses_error_envelope() {
    let app = create_test_app(test_config()).await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/1/log")
                .header("content-type", "text/plain")
                .header("content-encoding", "compress")
                .body(Body::from("not really compressed"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::ACCEPT_ENCODING], "gzip,deflate,br");
    assert_eq!(
        body_json(response).await,
        json!({
            "success": false,
            "error": "Unsupported Content-Encoding. Expected: gzip, deflate, br",
            "code": 415
        })
    );
}
