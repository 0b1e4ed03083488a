use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::game::question::QuestionType;
use crate::game::run::{Effect, RunState, Status};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Answer(String),
    Next,
}

/// Keyboard bindings for a live question. Only presses count; held-key
/// repeats are ignored.
pub fn action_for_key(run: &RunState, key: &KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if run.status() != Status::Playing {
        return None;
    }
    let question = run.current()?;

    // Advancing is the one thing allowed while locked: the lock exists to wait for it.
    if run.answered().is_some() && matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
        return Some(Action::Next);
    }

    if run.is_locked() || run.hearts == 0 {
        return None;
    }

    match key.code {
        KeyCode::Char(ch @ '1'..='4') => {
            let slot = ch as usize - '1' as usize;
            action_for_slot(run, slot)
        }
        KeyCode::Char(ch) if question.kind == QuestionType::Boolean => {
            let text = match ch.to_ascii_lowercase() {
                't' => "true",
                'f' => "false",
                _ => return None,
            };
            question
                .find_answer(text)
                .map(|a| Action::Answer(a.to_string()))
        }
        _ => None,
    }
}

/// Pointer (or digit) selection of the answer at `slot`.
pub fn action_for_slot(run: &RunState, slot: usize) -> Option<Action> {
    if run.status() != Status::Playing || run.is_locked() || run.hearts == 0 {
        return None;
    }
    run.current()?
        .answers
        .get(slot)
        .map(|a| Action::Answer(a.clone()))
}

/// Pointer press on the "next" control; only live once feedback is showing.
pub fn action_for_next(run: &RunState) -> Option<Action> {
    if run.status() == Status::Playing && run.answered().is_some() && run.current().is_some() {
        Some(Action::Next)
    } else {
        None
    }
}

pub fn apply(run: &mut RunState, action: Action) -> Vec<Effect> {
    match action {
        Action::Answer(answer) => run.handle_answer(&answer),
        Action::Next => run.next_question(),
    }
}
