use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::game::run::{RunState, Status};
use crate::game::stage::WIN_TARGET;
use crate::ui::components::metrics_panel::MetricsPanel;
use crate::ui::theme::Theme;

/// End-of-run panel shown for both won and lost runs.
pub struct Dashboard<'a> {
    pub run: &'a RunState,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(run: &'a RunState, theme: &'a Theme) -> Self {
        Self { run, theme }
    }

    fn headline(&self) -> (&'static str, &'static str) {
        match self.run.status() {
            Status::Won => (" Run Complete ", "You climbed all the way. Victory!"),
            _ => (" Run Over ", "Out of hearts."),
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let won = self.run.status() == Status::Won;
        let (title, headline) = self.headline();

        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(if won { colors.success() } else { colors.error() }))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            headline,
            Style::default()
                .fg(if won { colors.success() } else { colors.error() })
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let score_text = format!("{}", self.run.score);
        let score_line = Line::from(vec![
            Span::styled("  Score:       ", Style::default().fg(colors.fg())),
            Span::styled(
                &*score_text,
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  (reached {})", self.run.stage_label()),
                Style::default().fg(colors.muted()),
            ),
        ]);
        Paragraph::new(score_line).render(layout[1], buf);

        let correct_text = format!("{}/{WIN_TARGET}", self.run.correct_count);
        let correct_line = Line::from(vec![
            Span::styled("  Correct:     ", Style::default().fg(colors.fg())),
            Span::styled(&*correct_text, Style::default().fg(colors.fg())),
            Span::styled(
                format!("  accuracy {}", self.run.accuracy_label()),
                Style::default().fg(colors.muted()),
            ),
        ]);
        Paragraph::new(correct_line).render(layout[2], buf);

        let streak_text = format!("{}", self.run.best_streak);
        let streak_line = Line::from(vec![
            Span::styled("  Best streak: ", Style::default().fg(colors.fg())),
            Span::styled(&*streak_text, Style::default().fg(colors.warning())),
        ]);
        Paragraph::new(streak_line).render(layout[3], buf);

        MetricsPanel::new(&self.run.metrics, "Breakdown", self.theme).render(layout[4], buf);

        let help = Paragraph::new(Line::from(vec![
            Span::styled("  [r] Play again  ", Style::default().fg(colors.accent())),
            Span::styled("[q/Esc] Menu", Style::default().fg(colors.accent())),
        ]));
        help.render(layout[5], buf);
    }
}
