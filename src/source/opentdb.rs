use std::thread;
use std::time::Duration;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::game::question::{Category, Difficulty, Question, QuestionType};
use crate::source::{QuestionQuery, QuestionSource, SourceError, parse_body};

pub const API_URL: &str = "https://opentdb.com/api.php";
pub const CATEGORY_URL: &str = "https://opentdb.com/api_category.php";
const CATEGORY_TIMEOUT: Duration = Duration::from_secs(5);
const RAW_BODY_CHARS: usize = 300;

struct RetryStep {
    timeout: Duration,
    backoff: Duration,
}

const RETRY_SCHEDULE: [RetryStep; 3] = [
    RetryStep {
        timeout: Duration::from_millis(4000),
        backoff: Duration::from_millis(250),
    },
    RetryStep {
        timeout: Duration::from_millis(6000),
        backoff: Duration::from_millis(500),
    },
    RetryStep {
        timeout: Duration::from_millis(8000),
        backoff: Duration::from_millis(900),
    },
];

#[derive(Deserialize)]
struct RawResponse {
    response_code: u32,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

#[derive(Deserialize)]
pub struct RawQuestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub difficulty: String,
    pub category: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

#[derive(Deserialize)]
struct RawCategories {
    trivia_categories: Vec<Category>,
}

/// Talks to Open Trivia DB directly, doing the decoding and shuffling the
/// proxy would otherwise do.
pub struct OpenTdbSource {
    client: Client,
}

impl OpenTdbSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("trivia/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn questions_url(query: &QuestionQuery) -> Result<Url, SourceError> {
        let mut params = query.params();
        params.push(("encode", "base64".to_string()));
        Url::parse_with_params(API_URL, params).map_err(|e| SourceError::Transport {
            url: API_URL.to_string(),
            cause: e.to_string(),
        })
    }

    /// GET with the upstream retry schedule. Retries transport failures,
    /// 429 and 5xx; any other status is final.
    fn get_with_retry(&self, url: &str) -> Result<(u16, Value), SourceError> {
        let mut last_error = None;

        for (attempt, step) in RETRY_SCHEDULE.iter().enumerate() {
            match self
                .client
                .get(url)
                .timeout(step.timeout)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .and_then(|resp| {
                    let status = resp.status();
                    resp.text().map(|text| (status, text))
                }) {
                Ok((status, text)) => {
                    let body = truncate_raw(parse_body(&text));
                    if status.is_success() {
                        return Ok((status.as_u16(), body));
                    }
                    let err = SourceError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                        body,
                    };
                    if !is_retryable(status) {
                        return Err(err);
                    }
                    log::debug!("retryable upstream failure: {err}");
                    last_error = Some(err);
                }
                Err(e) => {
                    log::debug!("upstream transport failure: {e}");
                    last_error = Some(SourceError::Transport {
                        url: url.to_string(),
                        cause: e.to_string(),
                    });
                }
            }
            if attempt + 1 < RETRY_SCHEDULE.len() {
                thread::sleep(step.backoff);
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::Transport {
            url: url.to_string(),
            cause: "no attempts made".to_string(),
        }))
    }
}

pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn truncate_raw(body: Value) -> Value {
    match body.get("raw").and_then(Value::as_str) {
        Some(raw) if raw.chars().count() > RAW_BODY_CHARS => {
            let short: String = raw.chars().take(RAW_BODY_CHARS).collect();
            serde_json::json!({ "raw": short })
        }
        _ => body,
    }
}

/// Lenient base64: anything that does not decode is passed through untouched.
pub fn decode_field(input: &str) -> String {
    match STANDARD.decode(input) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => input.to_string(),
    }
}

pub fn decode_results<R: Rng>(results: Vec<RawQuestion>, rng: &mut R, now_ms: i64) -> Vec<Question> {
    results
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let correct = decode_field(&raw.correct_answer);
            let mut answers: Vec<String> = std::iter::once(correct.clone())
                .chain(raw.incorrect_answers.iter().map(|a| decode_field(a)))
                .collect();
            answers.shuffle(rng);

            Question {
                id: format!("{now_ms}-{i}"),
                kind: QuestionType::from_str_lossy(&decode_field(&raw.kind)),
                difficulty: Difficulty::from_str_lossy(&decode_field(&raw.difficulty)),
                category: decode_field(&raw.category),
                question: decode_field(&raw.question),
                answers,
                correct_answer: correct,
            }
        })
        .collect()
}

impl QuestionSource for OpenTdbSource {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError> {
        let url = Self::questions_url(query)?.to_string();
        let (status, body) = self.get_with_retry(&url)?;

        let raw = match serde_json::from_value::<RawResponse>(body.clone()) {
            Ok(raw) if raw.response_code == 0 && !raw.results.is_empty() => raw,
            _ => return Err(SourceError::Empty { url, status, body }),
        };

        let mut rng = rand::thread_rng();
        Ok(decode_results(
            raw.results,
            &mut rng,
            Utc::now().timestamp_millis(),
        ))
    }

    fn fetch_categories(&self) -> Result<Vec<Category>, SourceError> {
        let url = CATEGORY_URL.to_string();
        let transport = |e: reqwest::Error| SourceError::Transport {
            url: CATEGORY_URL.to_string(),
            cause: e.to_string(),
        };
        let response = self
            .client
            .get(CATEGORY_URL)
            .timeout(CATEGORY_TIMEOUT)
            .send()
            .map_err(transport)?;
        let status = response.status();
        let text = response.text().map_err(transport)?;
        let body = truncate_raw(parse_body(&text));
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        match serde_json::from_value::<RawCategories>(body.clone()) {
            Ok(raw) => Ok(raw.trivia_categories),
            Err(_) => Err(SourceError::Empty {
                url,
                status: status.as_u16(),
                body,
            }),
        }
    }
}
