use crate::identifier::LogId;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on reported problems per log.
pub const MAX_PROBLEMS: usize = 100;

lazy_static! {
    static ref ERROR_MARKER: Regex = Regex::new(r"\b(FATAL|SEVERE|ERROR)\b").unwrap();
    static ref WARN_MARKER: Regex = Regex::new(r"\b(WARN|WARNING)\b").unwrap();
    static ref INFO_MARKER: Regex = Regex::new(r"\bINFO\b").unwrap();
    static ref DEBUG_MARKER: Regex = Regex::new(r"\b(DEBUG|TRACE)\b").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Most severe level marker found in the line, if any.
    pub fn detect(line: &str) -> Option<Self> {
        if ERROR_MARKER.is_match(line) {
            Some(LogLevel::Error)
        } else if WARN_MARKER.is_match(line) {
            Some(LogLevel::Warn)
        } else if INFO_MARKER.is_match(line) {
            Some(LogLevel::Info)
        } else if DEBUG_MARKER.is_match(line) {
            Some(LogLevel::Debug)
        } else {
            None
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
    pub debug: usize,
}

impl LevelCounts {
    fn record(&mut self, level: LogLevel) {
        match level {
            LogLevel::Error => self.error += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Debug => self.debug += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// 1-based line number.
    pub line: usize,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    pub text: String,
}

/// Summary of a log body returned by `/1/analyse` and `/1/insights/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInsights {
    pub id: Option<LogId>,
    pub lines: usize,
    pub length: usize,
    pub levels: LevelCounts,
    pub problems: Vec<Problem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,
}

impl LogInsights {
    pub fn analyse(content: &str) -> Self {
        let mut levels = LevelCounts::default();
        let mut problems = Vec::new();
        let mut entries = Vec::new();

        for (index, text) in content.lines().enumerate() {
            let level = LogLevel::detect(text);
            if let Some(level) = level {
                levels.record(level);
                if level == LogLevel::Error && problems.len() < MAX_PROBLEMS {
                    problems.push(Problem {
                        line: index + 1,
                        level,
                        message: text.trim().to_string(),
                    });
                }
            }
            entries.push(Entry {
                line: index + 1,
                level,
                text: text.to_string(),
            });
        }

        Self {
            id: None,
            lines: entries.len(),
            length: content.chars().count(),
            levels,
            problems,
            entries: Some(entries),
        }
    }

    pub fn with_id(mut self, id: LogId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn set_include_entries(&mut self, include: bool) {
        if !include {
            self.entries = None;
        }
    }
}
