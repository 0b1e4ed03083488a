use indexmap::IndexMap;

use crate::game::question::Difficulty;

pub const TOP_CATEGORIES: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub attempts: u32,
    pub correct: u32,
}

impl Tally {
    fn record(&mut self, correct: bool) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// `None` until the first attempt.
    pub fn rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.correct as f64 / self.attempts as f64)
        }
    }

    pub fn percent_label(&self) -> String {
        percent_label(self.rate())
    }
}

/// Rounded percentage, or an em dash when there is nothing to show.
pub fn percent_label(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{}%", (r * 100.0).round() as u32),
        None => "\u{2014}".to_string(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DifficultyTallies {
    pub easy: Tally,
    pub medium: Tally,
    pub hard: Tally,
}

impl DifficultyTallies {
    pub fn get(&self, difficulty: Difficulty) -> &Tally {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    fn get_mut(&mut self, difficulty: Difficulty) -> &mut Tally {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// Per-run answer tallies. Categories keep first-seen order so equal attempt
/// counts rank in the order they were met.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metrics {
    pub by_difficulty: DifficultyTallies,
    pub by_category: IndexMap<String, Tally>,
}

impl Metrics {
    pub fn record(&mut self, difficulty: Difficulty, category: &str, correct: bool) {
        self.by_difficulty.get_mut(difficulty).record(correct);
        self.by_category
            .entry(category.to_string())
            .or_default()
            .record(correct);
    }

    pub fn difficulty_rate(&self, difficulty: Difficulty) -> Option<f64> {
        self.by_difficulty.get(difficulty).rate()
    }

    pub fn difficulty_success(&self, difficulty: Difficulty) -> String {
        self.by_difficulty.get(difficulty).percent_label()
    }

    pub fn totals(&self) -> Tally {
        Difficulty::ALL
            .iter()
            .map(|&d| *self.by_difficulty.get(d))
            .fold(Tally::default(), |acc, t| Tally {
                attempts: acc.attempts + t.attempts,
                correct: acc.correct + t.correct,
            })
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.totals().rate()
    }

    pub fn accuracy_label(&self) -> String {
        percent_label(self.accuracy())
    }

    /// Categories by attempts, most-attempted first, capped at [`TOP_CATEGORIES`].
    pub fn category_rows(&self) -> Vec<(&str, Tally)> {
        let mut rows: Vec<(&str, Tally)> = self
            .by_category
            .iter()
            .map(|(name, tally)| (name.as_str(), *tally))
            .collect();
        // sort_by is stable: ties keep first-seen order
        rows.sort_by(|a, b| b.1.attempts.cmp(&a.1.attempts));
        rows.truncate(TOP_CATEGORIES);
        rows
    }
}
