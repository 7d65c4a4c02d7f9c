//! One handler per endpoint. Each validates the method first, then its
//! input, and answers with exactly one [`crate::envelope::Envelope`].

pub mod ai_analysis;
pub mod delete;
pub mod logs;
pub mod meta;
pub mod retrieval;

pub use ai_analysis::ai_analysis;
pub use delete::delete_logs;
pub use logs::{analyse_log, submit_log};
pub use meta::{index, limits};
pub use retrieval::{get_insights, get_raw};
