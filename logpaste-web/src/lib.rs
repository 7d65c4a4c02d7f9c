// LogPaste web backend library
// HTTP API for submitting, reading, analysing and deleting pasted logs

pub mod envelope;
pub mod error_handling;
pub mod handlers;
pub mod routes;
pub mod validation;

pub use envelope::{Envelope, SuccessData};
pub use error_handling::{AppError, AppResult};

use axum::{extract::DefaultBodyLimit, Router};
use logpaste_core::{
    AnalysisProvider, AppConfig, ContentParser, GeminiClient, LogStore, PromptBuilder,
    SqliteLogStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    decompression::RequestDecompressionLayer,
    trace::TraceLayer,
};

use error_handling::{advertise_encodings, envelope_encoding_rejections, handle_404, trace_request};

// Main application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn LogStore>,
    pub analyzer: Arc<dyn AnalysisProvider>,
    pub content_parser: ContentParser,
    pub prompt_builder: PromptBuilder,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store =
            SqliteLogStore::connect(&config.storage.database_url, config.storage.storage_duration())
                .await?;
        let analyzer = GeminiClient::new(config.ai.endpoint.clone());

        Ok(Self::with_components(config, Arc::new(store), Arc::new(analyzer)))
    }

    /// Builds the state around an existing store and provider.
    pub fn with_components(
        config: AppConfig,
        store: Arc<dyn LogStore>,
        analyzer: Arc<dyn AnalysisProvider>,
    ) -> Self {
        let content_parser =
            ContentParser::new(config.storage.max_length, config.storage.max_lines);
        let prompt_builder =
            PromptBuilder::new(config.ai.log_subject.clone(), config.ai.response_language.clone());

        Self {
            config: Arc::new(config),
            store,
            analyzer,
            content_parser,
            prompt_builder,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let max_upload_size = state.config.server.max_upload_size;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::api_routes())
        .fallback(handle_404)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(trace_request))
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(advertise_encodings))
                .layer(cors)
                .layer(axum::middleware::from_fn(envelope_encoding_rejections))
                .layer(RequestDecompressionLayer::new())
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .with_state(state)
}

/// Deletes expired logs every `interval` until the runtime shuts down.
pub fn spawn_expiry_task(store: Arc<dyn LogStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Starting expired log purge task (every {:?})", interval);

        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!("Purged {} expired logs", purged),
                Err(e) => tracing::error!("Failed to purge expired logs: {}", e),
            }
        }
    })
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
