use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::game::question::QuestionType;
use crate::game::run::RunState;
use crate::ui::layout::CardLayout;
use crate::ui::theme::Theme;

pub struct QuestionCard<'a> {
    run: &'a RunState,
    theme: &'a Theme,
}

impl<'a> QuestionCard<'a> {
    pub fn new(run: &'a RunState, theme: &'a Theme) -> Self {
        Self { run, theme }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AnswerMark {
    Plain,
    Correct,
    Wrong,
}

/// How an answer row looks once the turn is resolved: the right answer is
/// always marked, the chosen one only when it was wrong.
fn mark_for(run: &RunState, index: usize) -> AnswerMark {
    let (Some(answered), Some(question)) = (run.answered(), run.current()) else {
        return AnswerMark::Plain;
    };
    if question.correct_index() == Some(index) {
        AnswerMark::Correct
    } else if question.answers.get(index) == Some(&answered.selected) {
        AnswerMark::Wrong
    } else {
        AnswerMark::Plain
    }
}

impl Widget for QuestionCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let title = format!(" Question {} ", self.run.idx + 1);
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        block.render(area, buf);

        let Some(question) = self.run.current() else {
            return;
        };
        let layout = CardLayout::new(area, question.answers.len());

        let kind = match question.kind {
            QuestionType::Boolean => "true / false",
            QuestionType::Multiple => "multiple choice",
        };
        let meta = Line::from(vec![
            Span::styled(&*question.category, Style::default().fg(colors.accent())),
            Span::styled(
                format!("  \u{00b7}  {}  \u{00b7}  {kind}", question.difficulty),
                Style::default().fg(colors.muted()),
            ),
        ]);
        Paragraph::new(meta).render(layout.meta, buf);

        Paragraph::new(Line::from(Span::styled(
            &*question.question,
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        )))
        .wrap(Wrap { trim: true })
        .render(layout.question, buf);

        let locked = self.run.is_locked();
        for (i, (answer, rect)) in question.answers.iter().zip(&layout.answers).enumerate() {
            let mark = mark_for(self.run, i);
            let border = match mark {
                AnswerMark::Correct => colors.success(),
                AnswerMark::Wrong => colors.error(),
                AnswerMark::Plain if locked => colors.accent_dim(),
                AnswerMark::Plain => colors.border(),
            };
            let mut row_style = Style::default().fg(colors.fg());
            if self.run.selected_answer() == Some(answer.as_str()) {
                row_style = row_style.bg(colors.selected_bg());
            }
            let suffix = match mark {
                AnswerMark::Correct => "  \u{2713}",
                AnswerMark::Wrong => "  \u{2717}",
                AnswerMark::Plain => "",
            };

            let line = Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), Style::default().fg(colors.muted())),
                Span::styled(format!("{answer}{suffix}"), row_style),
            ]);
            Paragraph::new(line)
                .block(
                    Block::bordered()
                        .border_style(Style::default().fg(border))
                        .style(row_style),
                )
                .render(*rect, buf);
        }

        if let Some(answered) = self.run.answered() {
            let color = if answered.correct {
                colors.success()
            } else {
                colors.error()
            };
            Paragraph::new(Line::from(Span::styled(
                answered.feedback_text(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .render(layout.feedback, buf);

            Paragraph::new(Line::from(Span::styled(
                "[ Next \u{21b5} ]",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )))
            .render(layout.next, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::question::{Difficulty, Question};
    use crate::source::batch::Batch;

    fn loaded_run() -> RunState {
        let mut run = RunState::new();
        run.start_game(None);
        let questions = vec![Question {
            id: "q-0".to_string(),
            kind: QuestionType::Multiple,
            difficulty: Difficulty::Easy,
            category: "Geography".to_string(),
            question: "Capital of France?".to_string(),
            answers: vec![
                "Lyon".to_string(),
                "Paris".to_string(),
                "Nice".to_string(),
                "Lille".to_string(),
            ],
            correct_answer: "Paris".to_string(),
        }];
        let generation = run.generation();
        run.apply_fetch(
            generation,
            Ok(Batch {
                questions,
                broadened: false,
            }),
        );
        run
    }

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_marks_after_wrong_answer() {
        let mut run = loaded_run();
        assert_eq!(mark_for(&run, 1), AnswerMark::Plain);
        run.handle_answer("Lyon");
        assert_eq!(mark_for(&run, 1), AnswerMark::Correct);
        assert_eq!(mark_for(&run, 0), AnswerMark::Wrong);
        assert_eq!(mark_for(&run, 2), AnswerMark::Plain);
    }

    #[test]
    fn test_render_shows_question_and_feedback() {
        let theme = Theme::default();
        let mut run = loaded_run();
        let area = Rect::new(0, 0, 60, 24);

        let mut buf = Buffer::empty(area);
        QuestionCard::new(&run, &theme).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Capital of France?"));
        assert!(text.contains("[2] Paris"));
        assert!(!text.contains("Next"));

        run.handle_answer("Paris");
        let mut buf = Buffer::empty(area);
        QuestionCard::new(&run, &theme).render(area, &mut buf);
        let text = buffer_text(&buf);
        assert!(text.contains("Correct."));
        assert!(text.contains("Next"));
    }
}
