use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::game::metrics::{Metrics, Tally};
use crate::game::question::Difficulty;
use crate::ui::theme::{Theme, ThemeColors};

/// Per-difficulty success rates plus the most-attempted categories.
pub struct MetricsPanel<'a> {
    metrics: &'a Metrics,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> MetricsPanel<'a> {
    pub fn new(metrics: &'a Metrics, title: &'a str, theme: &'a Theme) -> Self {
        Self {
            metrics,
            title,
            theme,
        }
    }
}

fn rate_color(colors: &ThemeColors, rate: Option<f64>) -> ratatui::style::Color {
    match rate {
        None => colors.muted(),
        Some(r) if r >= 0.75 => colors.success(),
        Some(r) if r >= 0.5 => colors.warning(),
        Some(_) => colors.error(),
    }
}

fn tally_line<'l>(colors: &ThemeColors, label: String, tally: &Tally) -> Line<'l> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(colors.fg())),
        Span::styled(
            tally.percent_label(),
            Style::default().fg(rate_color(colors, tally.rate())),
        ),
        Span::styled(
            format!("  ({}/{})", tally.correct, tally.attempts),
            Style::default().fg(colors.muted()),
        ),
    ])
}

/// Clip a category name so the tally still fits on one sidebar row.
fn clip(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        format!("{name:<width$}")
    } else {
        let head: String = name.chars().take(width.saturating_sub(1)).collect();
        format!("{head}\u{2026}")
    }
}

impl Widget for MetricsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let totals = self.metrics.totals();

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Accuracy: ", Style::default().fg(colors.fg())),
                Span::styled(
                    self.metrics.accuracy_label(),
                    Style::default().fg(rate_color(colors, self.metrics.accuracy())),
                ),
                Span::styled(
                    format!("  ({}/{})", totals.correct, totals.attempts),
                    Style::default().fg(colors.muted()),
                ),
            ]),
            Line::from(""),
        ];

        for difficulty in Difficulty::ALL {
            let label = format!("{:<8}", difficulty.as_str());
            lines.push(tally_line(
                colors,
                label,
                self.metrics.by_difficulty.get(difficulty),
            ));
        }

        let rows = self.metrics.category_rows();
        if !rows.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Categories",
                Style::default().fg(colors.accent()),
            )));
            let name_width = (area.width as usize).saturating_sub(22).clamp(8, 28);
            for (name, tally) in rows {
                lines.push(tally_line(colors, format!("{} ", clip(name, name_width)), &tally));
            }
        }

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
