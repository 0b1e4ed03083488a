pub mod batch;
pub mod opentdb;
pub mod proxy;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use thiserror::Error;

use crate::game::question::{Category, Difficulty, Question, QuestionType};

pub const MAX_AMOUNT: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionQuery {
    pub amount: u32,
    pub difficulty: Difficulty,
    pub category: Option<u32>,
    pub kind: Option<QuestionType>,
}

impl QuestionQuery {
    pub fn new(amount: u32, difficulty: Difficulty) -> Self {
        Self {
            amount: amount.clamp(1, MAX_AMOUNT),
            difficulty,
            category: None,
            kind: None,
        }
    }

    pub fn with_category(mut self, category: Option<u32>) -> Self {
        self.category = category;
        self
    }

    pub fn with_kind(mut self, kind: Option<QuestionType>) -> Self {
        self.kind = kind;
        self
    }

    /// Query-string pairs shared by both HTTP sources.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("amount", self.amount.clamp(1, MAX_AMOUNT).to_string()),
            ("difficulty", self.difficulty.as_str().to_string()),
        ];
        if let Some(kind) = self.kind {
            params.push(("type", kind.as_str().to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        params
    }

    /// `amount=10&difficulty=easy&..`, for naming a request in diagnostics
    /// when the source itself gave no URL.
    pub fn describe(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// One failed attempt against a source. Carries enough context to build the
/// user-facing diagnostic when every fallback has failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {cause}")]
    Transport { url: String, cause: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16, body: Value },
    #[error("{url} returned no questions")]
    Empty { url: String, status: u16, body: Value },
}

impl SourceError {
    pub fn url(&self) -> &str {
        match self {
            SourceError::Transport { url, .. }
            | SourceError::Status { url, .. }
            | SourceError::Empty { url, .. } => url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Transport { .. } => None,
            SourceError::Status { status, .. } | SourceError::Empty { status, .. } => Some(*status),
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            SourceError::Transport { .. } => None,
            SourceError::Status { body, .. } | SourceError::Empty { body, .. } => Some(body),
        }
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            SourceError::Transport { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Anything that can hand out trivia questions. Each call is a single attempt;
/// fallbacks live in [`batch::fetch_batch`].
pub trait QuestionSource: Send + Sync {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError>;

    fn fetch_categories(&self) -> Result<Vec<Category>, SourceError>;
}

/// Parse a response body as JSON, keeping non-JSON text as `{"raw": ...}`.
pub fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "raw": text }))
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
