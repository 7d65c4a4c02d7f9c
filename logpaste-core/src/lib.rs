// LogPaste core library
// Identifier handling, content parsing, storage, triage and AI analysis for the log paste service

pub mod ai_provider;
pub mod batch;
pub mod config;
pub mod content;
pub mod identifier;
pub mod insights;
pub mod storage;
pub mod triage;

pub use ai_provider::{
    classify_response, is_unconfigured_key, AnalysisError, AnalysisOutcome, AnalysisProvider,
    GeminiClient,
};
pub use batch::{delete_batch, delete_one, BatchResponse, DeleteReport, FailedItem, OperationResult};
pub use config::{AppConfig, StorageLimits};
pub use content::{ContentError, ContentParser};
pub use identifier::{
    extract_identifiers, extract_single_identifier, is_valid_identifier, split_identifier_batch,
    IdentifierError, LogId,
};
pub use insights::{LogInsights, LogLevel};
pub use storage::{LogRecord, LogStore, SqliteLogStore, StorageError};
pub use triage::{PromptBuilder, TriageExcerpt};
