use std::time::Duration;

use log::debug;

use crate::game::metrics::{Metrics, percent_label};
use crate::game::question::{Difficulty, Question};
use crate::game::stage::{
    MAX_HEARTS, STAGES, Stage, WIN_TARGET, has_next_stage, points_for_difficulty, stage,
};
use crate::source::batch::{Batch, EXHAUSTED_LABEL, FetchError};

/// Lets the final "Incorrect." render before the end panel replaces it.
pub const LOSS_DELAY: Duration = Duration::from_millis(250);
pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);
pub const BROADENED_NOTICE: &str =
    "Note: not enough questions in this category at this difficulty, so the category was broadened.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Playing,
    Won,
    Lost,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::Playing => "playing",
            Status::Won => "won",
            Status::Lost => "lost",
            Status::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Won | Status::Lost | Status::Error)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadReason {
    Start,
    Stage,
    Refill,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answered {
    pub selected: String,
    pub correct: bool,
}

impl Answered {
    pub fn feedback_text(&self) -> &'static str {
        if self.correct { "Correct." } else { "Incorrect." }
    }
}

/// Input is locked exactly while a turn is `Answered`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Turn {
    Open,
    Answered(Answered),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Also serves as the guard against a second concurrent fetch.
    Loading(LoadReason),
    Playing(Turn),
    Won,
    Lost,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub difficulty: Difficulty,
    pub category: Option<u32>,
    pub reason: LoadReason,
}

/// Delayed transitions. Each carries the id it was issued for so a timer that
/// outlives its run or notice does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timer {
    Lose { run: u64 },
    ClearNotice { notice: u64 },
}

/// Side effects requested by a transition. The caller executes them; the run
/// itself never does I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Supersedes (and cancels) any fetch already in flight.
    Fetch(FetchRequest),
    CancelFetch,
    Schedule { delay: Duration, timer: Timer },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct RunState {
    phase: Phase,
    pub stage_index: usize,
    pub stage_correct: u32,
    pub questions: Vec<Question>,
    pub idx: usize,
    pub correct_count: u32,
    pub score: u32,
    pub hearts: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub metrics: Metrics,
    pub notice: Option<Notice>,
    category: Option<u32>,
    run: u64,
    generation: u64,
    notice_seq: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            stage_index: 0,
            stage_correct: 0,
            questions: Vec::new(),
            idx: 0,
            correct_count: 0,
            score: 0,
            hearts: MAX_HEARTS,
            streak: 0,
            best_streak: 0,
            metrics: Metrics::default(),
            notice: None,
            category: None,
            run: 0,
            generation: 0,
            notice_seq: 0,
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        match self.phase {
            Phase::Idle => Status::Idle,
            Phase::Loading(_) => Status::Loading,
            Phase::Playing(_) => Status::Playing,
            Phase::Won => Status::Won,
            Phase::Lost => Status::Lost,
            Phase::Error(_) => Status::Error,
        }
    }

    /// Category locked in by the last `start_game`.
    pub fn category(&self) -> Option<u32> {
        self.category
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.idx)
    }

    pub fn stage(&self) -> &'static Stage {
        &STAGES[self.stage_index]
    }

    pub fn stage_complete(&self) -> bool {
        self.stage_correct >= self.stage().needed_correct
    }

    pub fn answered(&self) -> Option<&Answered> {
        match &self.phase {
            Phase::Playing(Turn::Answered(answered)) => Some(answered),
            _ => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.answered().is_some()
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.answered().map(|a| a.selected.as_str())
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn loading_reason(&self) -> Option<LoadReason> {
        match self.phase {
            Phase::Loading(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn stage_label(&self) -> String {
        let stage = self.stage();
        format!(
            "{} ({}/{})",
            stage.difficulty.as_str().to_uppercase(),
            self.stage_correct,
            stage.needed_correct
        )
    }

    pub fn run_progress(&self) -> f64 {
        self.correct_count as f64 / WIN_TARGET as f64
    }

    pub fn stage_progress(&self) -> f64 {
        self.stage_correct as f64 / self.stage().needed_correct as f64
    }

    pub fn accuracy_label(&self) -> String {
        percent_label(self.metrics.accuracy())
    }

    fn reset_fields(&mut self) {
        self.stage_index = 0;
        self.stage_correct = 0;
        self.questions.clear();
        self.idx = 0;
        self.correct_count = 0;
        self.score = 0;
        self.hearts = MAX_HEARTS;
        self.streak = 0;
        self.best_streak = 0;
        self.metrics = Metrics::default();
        self.notice = None;
    }

    fn begin_fetch(&mut self, reason: LoadReason) -> Effect {
        self.generation += 1;
        self.phase = Phase::Loading(reason);
        let difficulty = self.stage().difficulty;
        debug!(
            "fetch #{} for {difficulty} ({reason:?}, category {:?})",
            self.generation, self.category
        );
        Effect::Fetch(FetchRequest {
            generation: self.generation,
            difficulty,
            category: self.category,
            reason,
        })
    }

    pub fn start_game(&mut self, category: Option<u32>) -> Vec<Effect> {
        self.run += 1;
        self.reset_fields();
        self.category = category;
        vec![self.begin_fetch(LoadReason::Start)]
    }

    pub fn reset_to_idle(&mut self) -> Vec<Effect> {
        self.run += 1;
        // Anything still in flight is now stale.
        self.generation += 1;
        self.reset_fields();
        self.category = None;
        self.phase = Phase::Idle;
        vec![Effect::CancelFetch]
    }

    pub fn handle_answer(&mut self, answer: &str) -> Vec<Effect> {
        if self.phase != Phase::Playing(Turn::Open) || self.hearts == 0 {
            return Vec::new();
        }
        let Some(question) = self.questions.get(self.idx) else {
            return Vec::new();
        };

        let correct = question.is_correct(answer);
        let difficulty = question.difficulty;
        self.metrics.record(difficulty, &question.category, correct);

        let mut effects = Vec::new();
        if correct {
            self.correct_count += 1;
            self.score += points_for_difficulty(difficulty);
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            self.stage_correct += 1;
        } else {
            self.hearts = self.hearts.saturating_sub(1);
            self.streak = 0;
            if self.hearts == 0 {
                effects.push(Effect::Schedule {
                    delay: LOSS_DELAY,
                    timer: Timer::Lose { run: self.run },
                });
            }
        }
        debug!(
            "answer correct={correct} score={} hearts={} stage={}",
            self.score,
            self.hearts,
            self.stage_label()
        );

        self.phase = Phase::Playing(Turn::Answered(Answered {
            selected: answer.to_string(),
            correct,
        }));
        effects
    }

    pub fn next_question(&mut self) -> Vec<Effect> {
        let was_correct = match &self.phase {
            Phase::Playing(Turn::Answered(answered)) => answered.correct,
            Phase::Playing(Turn::Open) => false,
            _ => return Vec::new(),
        };
        if self.hearts == 0 {
            return Vec::new();
        }

        // Reaching the target wins even mid-stage.
        if self.correct_count >= WIN_TARGET {
            self.phase = Phase::Won;
            debug!("run won with score {}", self.score);
            return Vec::new();
        }

        self.phase = Phase::Playing(Turn::Open);

        if was_correct && self.stage_complete() && has_next_stage(self.stage_index) {
            return self.go_to_stage(self.stage_index + 1);
        }

        self.idx += 1;
        self.refill_if_needed().into_iter().collect()
    }

    fn go_to_stage(&mut self, next: usize) -> Vec<Effect> {
        if stage(next).is_none() {
            return Vec::new();
        }
        self.stage_index = next;
        self.stage_correct = 0;
        self.questions.clear();
        self.idx = 0;
        vec![self.begin_fetch(LoadReason::Stage)]
    }

    /// Batch exhausted mid-stage with the run still live.
    pub fn needs_refill(&self) -> bool {
        self.phase == Phase::Playing(Turn::Open)
            && self.correct_count < WIN_TARGET
            && self.hearts > 0
            && !self.stage_complete()
            && self.current().is_none()
    }

    fn refill_if_needed(&mut self) -> Option<Effect> {
        if self.needs_refill() {
            Some(self.begin_fetch(LoadReason::Refill))
        } else {
            None
        }
    }

    /// Apply a finished batch fetch. Results from superseded generations, or
    /// arriving when nothing is loading, are dropped.
    pub fn apply_fetch(&mut self, generation: u64, result: Result<Batch, FetchError>) -> Vec<Effect> {
        if generation != self.generation || !matches!(self.phase, Phase::Loading(_)) {
            debug!("dropping stale fetch #{generation} (current #{})", self.generation);
            return Vec::new();
        }

        match result {
            Ok(batch) if batch.questions.is_empty() => {
                self.phase = Phase::Error(EXHAUSTED_LABEL.to_string());
                Vec::new()
            }
            Ok(batch) => {
                self.questions = batch.questions;
                self.idx = 0;
                self.phase = Phase::Playing(Turn::Open);
                if batch.broadened {
                    self.notice_seq += 1;
                    self.notice = Some(Notice {
                        id: self.notice_seq,
                        text: BROADENED_NOTICE.to_string(),
                    });
                    vec![Effect::Schedule {
                        delay: NOTICE_DURATION,
                        timer: Timer::ClearNotice {
                            notice: self.notice_seq,
                        },
                    }]
                } else {
                    Vec::new()
                }
            }
            Err(FetchError::Cancelled) => Vec::new(),
            Err(FetchError::Exhausted(message)) => {
                self.phase = Phase::Error(message);
                Vec::new()
            }
        }
    }

    pub fn fire(&mut self, timer: Timer) -> Vec<Effect> {
        match timer {
            Timer::Lose { run } => {
                if run == self.run && matches!(self.phase, Phase::Playing(_)) && self.hearts == 0 {
                    debug!("run lost with score {}", self.score);
                    self.phase = Phase::Lost;
                }
            }
            Timer::ClearNotice { notice } => {
                if self.notice.as_ref().is_some_and(|n| n.id == notice) {
                    self.notice = None;
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::question::QuestionType;

    fn question(id: usize, difficulty: Difficulty, category: &str) -> Question {
        Question {
            id: id.to_string(),
            kind: QuestionType::Multiple,
            difficulty,
            category: category.to_string(),
            question: format!("Question {id}?"),
            answers: vec!["right".into(), "wrong".into(), "nope".into(), "nah".into()],
            correct_answer: "right".to_string(),
        }
    }

    fn batch(difficulty: Difficulty, n: usize) -> Batch {
        Batch {
            questions: (0..n).map(|i| question(i, difficulty, "General")).collect(),
            broadened: false,
        }
    }

    fn fetch_of(effects: &[Effect]) -> FetchRequest {
        match effects {
            [Effect::Fetch(req)] => req.clone(),
            other => panic!("expected a single fetch, got {other:?}"),
        }
    }

    fn playing(n: usize) -> RunState {
        let mut run = RunState::new();
        let req = fetch_of(&run.start_game(None));
        run.apply_fetch(req.generation, Ok(batch(Difficulty::Easy, n)));
        run
    }

    #[test]
    fn test_start_game_fetches_first_stage() {
        let mut run = RunState::new();
        let req = fetch_of(&run.start_game(Some(11)));
        assert_eq!(run.status(), Status::Loading);
        assert_eq!(req.difficulty, Difficulty::Easy);
        assert_eq!(req.category, Some(11));
        assert_eq!(req.reason, LoadReason::Start);

        run.apply_fetch(req.generation, Ok(batch(Difficulty::Easy, 10)));
        assert_eq!(run.status(), Status::Playing);
        assert_eq!(run.current().unwrap().id, "0");
        assert_eq!(run.hearts, MAX_HEARTS);
        assert_eq!(run.stage_label(), "EASY (0/3)");
    }

    #[test]
    fn test_correct_answer_scores_and_locks() {
        let mut run = playing(10);
        assert!(run.handle_answer("right").is_empty());
        assert_eq!(run.score, 10);
        assert_eq!(run.correct_count, 1);
        assert_eq!(run.streak, 1);
        assert_eq!(run.best_streak, 1);
        assert_eq!(run.stage_correct, 1);
        assert!(run.is_locked());
        assert_eq!(run.selected_answer(), Some("right"));
        assert_eq!(run.answered().unwrap().feedback_text(), "Correct.");

        // Locked: a second answer is ignored entirely.
        run.handle_answer("wrong");
        assert_eq!(run.metrics.totals().attempts, 1);
        assert_eq!(run.hearts, MAX_HEARTS);
    }

    #[test]
    fn test_incorrect_answer_costs_heart_and_streak() {
        let mut run = playing(10);
        run.handle_answer("right");
        run.next_question();
        run.handle_answer("right");
        run.next_question();
        run.handle_answer("wrong");
        assert_eq!(run.hearts, MAX_HEARTS - 1);
        assert_eq!(run.streak, 0);
        assert_eq!(run.best_streak, 2);
        assert_eq!(run.answered().unwrap().feedback_text(), "Incorrect.");
        assert_eq!(run.metrics.by_difficulty.easy.attempts, 3);
        assert_eq!(run.metrics.by_difficulty.easy.correct, 2);
    }

    #[test]
    fn test_last_heart_schedules_loss() {
        let mut run = playing(10);
        let mut last = Vec::new();
        for _ in 0..MAX_HEARTS {
            last = run.handle_answer("wrong");
            run.next_question();
        }
        assert_eq!(run.hearts, 0);
        let timer = match last.as_slice() {
            [Effect::Schedule { delay, timer }] => {
                assert_eq!(*delay, LOSS_DELAY);
                *timer
            }
            other => panic!("expected loss timer, got {other:?}"),
        };
        // Still showing the final feedback until the timer fires.
        assert_eq!(run.status(), Status::Playing);
        assert!(run.handle_answer("right").is_empty());
        assert_eq!(run.correct_count, 0);

        run.fire(timer);
        assert_eq!(run.status(), Status::Lost);
        assert!(run.handle_answer("right").is_empty());
        assert!(run.next_question().is_empty());
        assert_eq!(run.status(), Status::Lost);
    }

    #[test]
    fn test_loss_timer_from_previous_run_is_ignored() {
        let mut run = playing(10);
        let mut timer = None;
        for _ in 0..MAX_HEARTS {
            if let [Effect::Schedule { timer: t, .. }] = run.handle_answer("wrong").as_slice() {
                timer = Some(*t);
            }
            run.next_question();
        }
        let req = fetch_of(&run.start_game(None));
        run.apply_fetch(req.generation, Ok(batch(Difficulty::Easy, 3)));
        run.fire(timer.unwrap());
        assert_eq!(run.status(), Status::Playing);
        assert_eq!(run.hearts, MAX_HEARTS);
    }

    #[test]
    fn test_stage_completion_moves_to_next_stage() {
        let mut run = playing(10);
        for _ in 0..2 {
            run.handle_answer("right");
            assert!(run.next_question().is_empty());
        }
        run.handle_answer("right");
        assert_eq!(run.stage_label(), "EASY (3/3)");
        let req = fetch_of(&run.next_question());
        assert_eq!(req.difficulty, Difficulty::Medium);
        assert_eq!(req.reason, LoadReason::Stage);
        assert_eq!(run.stage_index, 1);
        assert_eq!(run.stage_correct, 0);
        assert_eq!(run.status(), Status::Loading);
        assert_eq!(run.score, 30);
    }

    #[test]
    fn test_win_target_preempts_stage_logic() {
        let mut run = playing(10);
        run.correct_count = WIN_TARGET - 1;
        run.handle_answer("right");
        assert!(!run.stage_complete());
        assert!(run.next_question().is_empty());
        assert_eq!(run.status(), Status::Won);
        assert!(!run.is_locked());
    }

    #[test]
    fn test_exhausted_batch_triggers_refill() {
        let mut run = playing(2);
        run.handle_answer("right");
        assert!(run.next_question().is_empty());
        run.handle_answer("wrong");
        let req = fetch_of(&run.next_question());
        assert_eq!(req.reason, LoadReason::Refill);
        assert_eq!(req.difficulty, Difficulty::Easy);
        assert_eq!(run.status(), Status::Loading);
        assert_eq!(run.stage_correct, 1);

        run.apply_fetch(req.generation, Ok(batch(Difficulty::Easy, 4)));
        assert_eq!(run.status(), Status::Playing);
        assert_eq!(run.idx, 0);
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let mut run = RunState::new();
        let first = fetch_of(&run.start_game(None));
        let second = fetch_of(&run.start_game(None));
        assert!(second.generation > first.generation);

        run.apply_fetch(first.generation, Ok(batch(Difficulty::Easy, 1)));
        assert_eq!(run.status(), Status::Loading);

        let mut fresh = batch(Difficulty::Easy, 5);
        fresh.questions[0].id = "fresh".into();
        run.apply_fetch(second.generation, Ok(fresh));
        assert_eq!(run.current().unwrap().id, "fresh");

        // A late first result cannot clobber the applied batch.
        run.apply_fetch(first.generation, Ok(batch(Difficulty::Easy, 1)));
        assert_eq!(run.questions.len(), 5);
    }

    #[test]
    fn test_cancelled_fetch_changes_nothing() {
        let mut run = RunState::new();
        let req = fetch_of(&run.start_game(None));
        run.apply_fetch(req.generation, Err(FetchError::Cancelled));
        assert_eq!(run.status(), Status::Loading);
    }

    #[test]
    fn test_exhausted_fetch_surfaces_error_and_reset_recovers() {
        let mut run = RunState::new();
        let req = fetch_of(&run.start_game(None));
        run.apply_fetch(req.generation, Err(FetchError::Exhausted("boom".into())));
        assert_eq!(run.status(), Status::Error);
        assert_eq!(run.error_message(), Some("boom"));

        assert_eq!(run.reset_to_idle(), vec![Effect::CancelFetch]);
        assert_eq!(run.status(), Status::Idle);
        assert_eq!(run.error_message(), None);
        // Any result for the old generation is now stale.
        run.apply_fetch(req.generation, Ok(batch(Difficulty::Easy, 3)));
        assert_eq!(run.status(), Status::Idle);
    }

    #[test]
    fn test_broadened_batch_raises_notice_that_expires() {
        let mut run = RunState::new();
        let req = fetch_of(&run.start_game(Some(9)));
        let mut b = batch(Difficulty::Easy, 3);
        b.broadened = true;
        let effects = run.apply_fetch(req.generation, Ok(b));
        let timer = match effects.as_slice() {
            [Effect::Schedule { delay, timer }] => {
                assert_eq!(*delay, NOTICE_DURATION);
                *timer
            }
            other => panic!("expected notice timer, got {other:?}"),
        };
        assert_eq!(run.notice.as_ref().unwrap().text, BROADENED_NOTICE);
        // The notice never locks input.
        assert!(!run.is_locked());
        run.fire(timer);
        assert!(run.notice.is_none());
    }

    #[test]
    fn test_operations_ignored_outside_playing() {
        let mut run = RunState::new();
        assert!(run.handle_answer("right").is_empty());
        assert!(run.next_question().is_empty());
        run.start_game(None);
        assert!(run.handle_answer("right").is_empty());
        assert_eq!(run.metrics.totals().attempts, 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut run = playing(10);
        run.handle_answer("right");
        run.reset_to_idle();
        assert_eq!(run.score, 0);
        assert_eq!(run.best_streak, 0);
        assert_eq!(run.metrics, Metrics::default());
        assert!(run.questions.is_empty());
        assert_eq!(run.category(), None);
    }
}
