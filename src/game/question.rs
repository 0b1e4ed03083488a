use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Lenient parse used for upstream payloads; unknown values fall back to easy.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Boolean,
    Multiple,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Boolean => "boolean",
            QuestionType::Multiple => "multiple",
        }
    }

    /// Unknown values fall back to multiple choice.
    pub fn from_str_lossy(s: &str) -> Self {
        if s == "boolean" {
            QuestionType::Boolean
        } else {
            QuestionType::Multiple
        }
    }

    /// Config spelling: "any" (or anything unrecognised) means no constraint.
    pub fn from_config(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(QuestionType::Boolean),
            "multiple" => Some(QuestionType::Multiple),
            _ => None,
        }
    }
}

/// A decoded question. `answers` is already shuffled and contains
/// `correct_answer` exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub difficulty: Difficulty,
    pub category: String,
    pub question: String,
    pub answers: Vec<String>,
    pub correct_answer: String,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.answers.iter().position(|a| *a == self.correct_answer)
    }

    /// Case-insensitive lookup used by the True/False shortcuts.
    pub fn find_answer(&self, text: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.eq_ignore_ascii_case(text))
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}
