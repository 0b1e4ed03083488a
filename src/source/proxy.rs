use std::time::Duration;

use anyhow::Result;
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::game::question::{Category, Question};
use crate::source::{QuestionQuery, QuestionSource, SourceError, parse_body};

/// Client for the trivia proxy: `GET /api/questions` and `GET /api/categories`.
/// The proxy already decodes and shuffles, so bodies map straight onto
/// [`Question`].
pub struct ProxySource {
    base_url: String,
    client: Client,
}

impl ProxySource {
    pub fn new(base_url: &str) -> Result<Self> {
        // The proxy applies its own upstream timeouts; none here.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn questions_url(&self, query: &QuestionQuery) -> Result<Url, SourceError> {
        let raw = format!("{}/api/questions", self.base_url);
        Url::parse_with_params(&raw, query.params()).map_err(|e| SourceError::Transport {
            url: raw,
            cause: e.to_string(),
        })
    }

    pub fn categories_url(&self) -> String {
        format!("{}/api/categories", self.base_url)
    }

    fn get(&self, url: &str) -> Result<(u16, bool, Value), SourceError> {
        let transport = |e: reqwest::Error| SourceError::Transport {
            url: url.to_string(),
            cause: e.to_string(),
        };
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        let text = response.text().map_err(transport)?;
        Ok((status.as_u16(), status.is_success(), parse_body(&text)))
    }
}

pub fn questions_from_body(body: &Value) -> Vec<Question> {
    body.get("questions")
        .and_then(|v| serde_json::from_value::<Vec<Question>>(v.clone()).ok())
        .unwrap_or_default()
}

pub fn categories_from_body(body: &Value) -> Option<Vec<Category>> {
    body.get("categories")
        .and_then(|v| serde_json::from_value::<Vec<Category>>(v.clone()).ok())
}

impl QuestionSource for ProxySource {
    fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<Question>, SourceError> {
        let url = self.questions_url(query)?.to_string();
        let (status, ok, body) = self.get(&url)?;
        if !ok {
            return Err(SourceError::Status { url, status, body });
        }
        let questions = questions_from_body(&body);
        if questions.is_empty() {
            return Err(SourceError::Empty { url, status, body });
        }
        Ok(questions)
    }

    fn fetch_categories(&self) -> Result<Vec<Category>, SourceError> {
        let url = self.categories_url();
        let (status, ok, body) = self.get(&url)?;
        if !ok {
            return Err(SourceError::Status { url, status, body });
        }
        categories_from_body(&body).ok_or(SourceError::Empty { url, status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::question::{Difficulty, QuestionType};
    use serde_json::json;

    #[test]
    fn test_questions_url_includes_filters() {
        let source = ProxySource::new("http://localhost:3000/").unwrap();
        let query = QuestionQuery::new(10, Difficulty::Easy)
            .with_category(Some(9))
            .with_kind(Some(QuestionType::Multiple));
        let url = source.questions_url(&query).unwrap();
        assert_eq!(url.path(), "/api/questions");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("amount".into(), "10".into())));
        assert!(pairs.contains(&("difficulty".into(), "easy".into())));
        assert!(pairs.contains(&("category".into(), "9".into())));
        assert!(pairs.contains(&("type".into(), "multiple".into())));
        assert_eq!(source.categories_url(), "http://localhost:3000/api/categories");
    }

    #[test]
    fn test_questions_from_body_tolerates_garbage() {
        assert!(questions_from_body(&json!({ "raw": "oops" })).is_empty());
        assert!(questions_from_body(&json!({ "questions": "nope" })).is_empty());
        let body = json!({ "questions": [{
            "id": "1", "type": "multiple", "difficulty": "easy",
            "category": "General Knowledge", "question": "2+2?",
            "answers": ["3", "4", "5", "22"], "correctAnswer": "4"
        }]});
        let qs = questions_from_body(&body);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].correct_answer, "4");
    }

    #[test]
    fn test_categories_from_body() {
        let body = json!({ "categories": [{ "id": 9, "name": "General Knowledge" }] });
        let cats = categories_from_body(&body).unwrap();
        assert_eq!(cats[0].id, 9);
        assert!(categories_from_body(&json!({ "error": "x" })).is_none());
    }
}
