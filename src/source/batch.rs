use log::{debug, warn};
use thiserror::Error;

use crate::game::question::{Difficulty, Question, QuestionType};
use crate::source::{CancelToken, QuestionQuery, QuestionSource, SourceError};

pub const PLAN_AMOUNTS: [u32; 4] = [10, 7, 5, 3];
pub const EXHAUSTED_LABEL: &str = "Could not fetch questions after multiple attempts.";
const BODY_PREVIEW_CHARS: usize = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Plan {
    pub amount: u32,
    pub use_category: bool,
}

/// Attempt order: every amount with the category, then every amount without.
/// Without a category the constrained half would repeat the same requests, so
/// it is skipped.
pub fn plans(category: Option<u32>) -> Vec<Plan> {
    let constrained = PLAN_AMOUNTS.iter().map(|&amount| Plan {
        amount,
        use_category: true,
    });
    let broad = PLAN_AMOUNTS.iter().map(|&amount| Plan {
        amount,
        use_category: false,
    });
    if category.is_some() {
        constrained.chain(broad).collect()
    } else {
        broad.collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub questions: Vec<Question>,
    /// The run's category had to be dropped to find questions.
    pub broadened: bool,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch superseded")]
    Cancelled,
    #[error("{0}")]
    Exhausted(String),
}

pub fn fetch_batch(
    source: &dyn QuestionSource,
    difficulty: Difficulty,
    category: Option<u32>,
    kind: Option<QuestionType>,
    cancel: &CancelToken,
) -> Result<Batch, FetchError> {
    let mut last_error: Option<SourceError> = None;

    for plan in plans(category) {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let query = QuestionQuery::new(plan.amount, difficulty)
            .with_category(if plan.use_category { category } else { None })
            .with_kind(kind);

        let outcome = source.fetch_questions(&query);
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        match outcome {
            Ok(questions) if !questions.is_empty() => {
                let broadened = !plan.use_category && category.is_some();
                debug!(
                    "fetched {} {difficulty} questions (amount {}, broadened: {broadened})",
                    questions.len(),
                    plan.amount
                );
                return Ok(Batch {
                    questions,
                    broadened,
                });
            }
            Ok(_) => {
                debug!("empty batch for {query:?}");
                last_error = Some(SourceError::Empty {
                    url: query.describe(),
                    status: 200,
                    body: serde_json::json!({ "questions": [] }),
                });
            }
            Err(err) => {
                debug!("attempt failed: {err}");
                last_error = Some(err);
            }
        }
    }

    let diagnostic = format_diagnostic(EXHAUSTED_LABEL, last_error.as_ref());
    warn!("{diagnostic}");
    Err(FetchError::Exhausted(diagnostic))
}

/// `label | URL: .. | HTTP: .. | Body: .. | Cause: ..`, skipping absent parts.
pub fn format_diagnostic(label: &str, error: Option<&SourceError>) -> String {
    let mut parts = vec![label.to_string()];
    if let Some(err) = error {
        parts.push(format!("URL: {}", err.url()));
        if let Some(status) = err.status() {
            parts.push(format!("HTTP: {status}"));
        }
        if let Some(body) = err.body() {
            let text = body.to_string();
            let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
            parts.push(format!("Body: {preview}"));
        }
        if let Some(cause) = err.cause() {
            parts.push(format!("Cause: {cause}"));
        }
    }
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::game::question::Category;
    use serde_json::json;

    #[test]
    fn test_plans_with_category() {
        let plans = plans(Some(9));
        assert_eq!(plans.len(), 8);
        assert!(plans[..4].iter().all(|p| p.use_category));
        assert!(plans[4..].iter().all(|p| !p.use_category));
        let amounts: Vec<u32> = plans.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![10, 7, 5, 3, 10, 7, 5, 3]);
    }

    #[test]
    fn test_plans_without_category() {
        let plans = plans(None);
        assert_eq!(plans.len(), 4);
        assert!(plans.iter().all(|p| !p.use_category));
    }

    #[test]
    fn test_diagnostic_truncates_body() {
        let err = SourceError::Status {
            url: "http://x/api/questions?amount=3".to_string(),
            status: 502,
            body: json!({ "raw": "y".repeat(1000) }),
        };
        let msg = format_diagnostic(EXHAUSTED_LABEL, Some(&err));
        assert!(msg.starts_with(EXHAUSTED_LABEL));
        assert!(msg.contains("URL: http://x/api/questions?amount=3"));
        assert!(msg.contains("HTTP: 502"));
        let body = msg.split("Body: ").nth(1).unwrap();
        assert_eq!(body.chars().count(), BODY_PREVIEW_CHARS);
        assert!(!msg.contains("Cause"));
    }

    #[test]
    fn test_diagnostic_reports_transport_cause() {
        let err = SourceError::Transport {
            url: "http://x".to_string(),
            cause: "connection refused".to_string(),
        };
        let msg = format_diagnostic(EXHAUSTED_LABEL, Some(&err));
        assert!(msg.ends_with("Cause: connection refused"));
        assert!(!msg.contains("HTTP"));
    }

    /// Hands out canned outcomes in order, then empty batches.
    struct Replay(Mutex<VecDeque<Result<Vec<Question>, SourceError>>>);

    impl QuestionSource for Replay {
        fn fetch_questions(&self, _query: &QuestionQuery) -> Result<Vec<Question>, SourceError> {
            self.0.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
        }

        fn fetch_categories(&self) -> Result<Vec<Category>, SourceError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_diagnostic_names_last_attempt_even_when_it_was_empty() {
        let source = Replay(Mutex::new(VecDeque::from(vec![Err(SourceError::Status {
            url: "http://x/api/questions?amount=10&category=9".to_string(),
            status: 500,
            body: json!({}),
        })])));

        let err = fetch_batch(&source, Difficulty::Easy, Some(9), None, &CancelToken::new())
            .unwrap_err();
        let FetchError::Exhausted(msg) = err else {
            panic!("expected exhaustion, got {err:?}");
        };
        assert_eq!(
            msg,
            format!(
                "{EXHAUSTED_LABEL} | URL: amount=3&difficulty=easy | HTTP: 200 | Body: {{\"questions\":[]}}"
            )
        );
    }

    #[test]
    fn test_diagnostic_without_attempts_is_label_only() {
        assert_eq!(format_diagnostic(EXHAUSTED_LABEL, None), EXHAUSTED_LABEL);
    }
}
