use lazy_static::lazy_static;
use regex::Regex;

/// Maximum number of lines kept in an excerpt.
pub const EXCERPT_LINE_CAP: usize = 50;
/// Number of trailing characters of the raw log appended as context.
pub const TAIL_CONTEXT_CHARS: usize = 3000;

lazy_static! {
    static ref RELEVANCE_PATTERN: Regex =
        Regex::new(r"(?i)(error|exception|warn|fail|caused by|critical)").unwrap();
}

/// How the lines of a [`TriageExcerpt`] were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcerptSource {
    /// Lines matching the relevance pattern, trimmed.
    Relevant,
    /// No line matched; the last lines of the log, verbatim.
    Tail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageExcerpt {
    pub lines: Vec<String>,
    pub source: ExcerptSource,
}

impl TriageExcerpt {
    pub fn from_log(content: &str) -> Self {
        let mut relevant = Vec::new();
        for line in content.split('\n') {
            if RELEVANCE_PATTERN.is_match(line) {
                relevant.push(line.trim().to_string());
                if relevant.len() >= EXCERPT_LINE_CAP {
                    break;
                }
            }
        }

        if !relevant.is_empty() {
            return Self {
                lines: relevant,
                source: ExcerptSource::Relevant,
            };
        }

        let all: Vec<&str> = content.split('\n').collect();
        let start = all.len().saturating_sub(EXCERPT_LINE_CAP);
        Self {
            lines: all[start..].iter().map(|line| line.to_string()).collect(),
            source: ExcerptSource::Tail,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// Last `max_chars` characters of `content`, cut on a char boundary.
pub fn tail_chars(content: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match content.char_indices().rev().nth(max_chars - 1) {
        Some((index, _)) => &content[index..],
        None => content,
    }
}

/// Builds the natural-language request sent to the analysis provider.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    subject: String,
    language: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            subject: "Minecraft server".to_string(),
            language: "simplified Chinese".to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn new(subject: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            language: language.into(),
        }
    }

    pub fn build(&self, content: &str) -> String {
        let excerpt = TriageExcerpt::from_log(content);
        self.build_with_excerpt(content, &excerpt)
    }

    pub fn build_with_excerpt(&self, content: &str, excerpt: &TriageExcerpt) -> String {
        let mut prompt = String::new();
        prompt.push_str(&self.preamble());
        prompt.push_str("### Log Excerpt (Errors/Warnings):\n");
        prompt.push_str(&excerpt.joined());
        prompt.push_str("\n\n");
        prompt.push_str("### End of Log (Context):\n");
        prompt.push_str(tail_chars(content, TAIL_CONTEXT_CHARS));
        prompt.push_str("\n\n");
        prompt.push_str(Self::closing_directive());
        prompt
    }

    fn preamble(&self) -> String {
        format!(
            "You are an expert {subject} Log Analyzer.\n\
             Your answer must be in {language}\n\
             Analyze the following {subject} log and identify the root cause of any crashes or errors.\n\
             Suggest specific, actionable solutions to fix the issues.\n\n",
            subject = self.subject,
            language = self.language,
        )
    }

    fn closing_directive() -> &'static str {
        "Provide your analysis in Markdown. Be professional, concise, and helpful."
    }
}
