use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

/// Single-row gauge with a caller-supplied caption centred on it.
pub struct ProgressBar<'a> {
    pub label: String,
    pub ratio: f64,
    pub caption: String,
    pub theme: &'a Theme,
}

impl<'a> ProgressBar<'a> {
    pub fn new(label: &str, ratio: f64, caption: String, theme: &'a Theme) -> Self {
        Self {
            label: label.to_string(),
            ratio: if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 },
            caption,
            theme,
        }
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.label))
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let filled_width = (self.ratio * inner.width as f64) as u16;
        let caption = self.caption;

        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(colors.bar_filled())
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let caption_x = inner.x + (inner.width.saturating_sub(caption.len() as u16)) / 2;
        buf.set_string(caption_x, inner.y, &caption, Style::default().fg(colors.fg()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_clamps() {
        let theme = Theme::default();
        assert_eq!(ProgressBar::new("Run", 0.4, String::new(), &theme).ratio, 0.4);
        assert_eq!(ProgressBar::new("Run", 1.2, String::new(), &theme).ratio, 1.0);
        assert_eq!(ProgressBar::new("Run", f64::NAN, String::new(), &theme).ratio, 0.0);
    }

    #[test]
    fn test_render_caption() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        ProgressBar::new("Stage", 2.0 / 3.0, "2/3".to_string(), &theme).render(area, &mut buf);
        let row: String = (0..20).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("2/3"));
    }
}
