use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥100 cols: question card + metrics sidebar
    Medium, // 60-99 cols: full-width card, progress bars
    Narrow, // <60 cols: full-width card only
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 100 {
            LayoutTier::Wide
        } else if area.width >= 60 {
            LayoutTier::Medium
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn show_progress_bars(&self, height: u16) -> bool {
        height >= 24 && *self != LayoutTier::Narrow
    }

    pub fn show_sidebar(&self) -> bool {
        *self == LayoutTier::Wide
    }
}

pub struct AppLayout {
    pub header: Rect,
    pub progress: Option<Rect>,
    pub main: Rect,
    pub sidebar: Option<Rect>,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let tier = LayoutTier::from_area(area);
        let progress_height = if tier.show_progress_bars(area.height) { 3 } else { 0 };

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(progress_height),
                Constraint::Min(10),
                Constraint::Length(2),
            ])
            .split(area);

        let progress = (progress_height > 0).then_some(vertical[1]);

        if tier.show_sidebar() {
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
                .split(vertical[2]);

            Self {
                header: vertical[0],
                progress,
                main: horizontal[0],
                sidebar: Some(horizontal[1]),
                footer: vertical[3],
                tier,
            }
        } else {
            Self {
                header: vertical[0],
                progress,
                main: vertical[2],
                sidebar: None,
                footer: vertical[3],
                tier,
            }
        }
    }
}

/// Geometry of the question card. Rendering and mouse hit-testing both go
/// through this so a click lands on the row that was drawn.
pub struct CardLayout {
    pub meta: Rect,
    pub question: Rect,
    pub answers: Vec<Rect>,
    pub feedback: Rect,
    pub next: Rect,
}

impl CardLayout {
    pub const ANSWER_HEIGHT: u16 = 3;
    const NEXT_WIDTH: u16 = 14;

    /// `area` is the card's outer rectangle, border included.
    pub fn new(area: Rect, answer_count: usize) -> Self {
        let inner = Rect::new(
            area.x.saturating_add(1),
            area.y.saturating_add(1),
            area.width.saturating_sub(2),
            area.height.saturating_sub(2),
        );

        let mut constraints = vec![Constraint::Length(1), Constraint::Min(2)];
        constraints.extend((0..answer_count).map(|_| Constraint::Length(Self::ANSWER_HEIGHT)));
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Length(1));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let answers = rows[2..2 + answer_count].to_vec();
        let feedback = rows[2 + answer_count];
        let next_row = rows[3 + answer_count];
        let next_width = Self::NEXT_WIDTH.min(next_row.width);
        let next = Rect::new(
            next_row.x + next_row.width.saturating_sub(next_width),
            next_row.y,
            next_width,
            next_row.height,
        );

        Self {
            meta: rows[0],
            question: rows[1],
            answers,
            feedback,
            next,
        }
    }

    pub fn answer_at(&self, column: u16, row: u16) -> Option<usize> {
        let pos = Position::new(column, row);
        self.answers.iter().position(|rect| rect.contains(pos))
    }

    pub fn next_contains(&self, column: u16, row: u16) -> bool {
        self.next.contains(Position::new(column, row))
    }
}

pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = "  ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 56;
    const MIN_POPUP_HEIGHT: u16 = 16;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert_eq!(LayoutTier::from_area(Rect::new(0, 0, 120, 40)), LayoutTier::Wide);
        assert_eq!(LayoutTier::from_area(Rect::new(0, 0, 80, 40)), LayoutTier::Medium);
        assert_eq!(LayoutTier::from_area(Rect::new(0, 0, 40, 40)), LayoutTier::Narrow);
        assert!(AppLayout::new(Rect::new(0, 0, 120, 40)).sidebar.is_some());
        assert!(AppLayout::new(Rect::new(0, 0, 80, 40)).sidebar.is_none());
    }

    #[test]
    fn test_card_hit_testing() {
        let card = CardLayout::new(Rect::new(0, 0, 60, 24), 4);
        assert_eq!(card.answers.len(), 4);
        let first = card.answers[0];
        let last = card.answers[3];
        assert_eq!(card.answer_at(first.x + 2, first.y + 1), Some(0));
        assert_eq!(card.answer_at(last.x + 2, last.y), Some(3));
        assert_eq!(card.answer_at(0, 0), None);
        assert!(card.next_contains(card.next.x, card.next.y));
        assert!(!card.next_contains(card.next.x.saturating_sub(1), card.next.y));
    }

    #[test]
    fn test_pack_hint_lines_wraps() {
        let lines = pack_hint_lines(&["[1-4] Answer", "[Enter] Next", "[Esc] Quit run"], 30);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn test_centered_rect_stays_inside() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect, area);
    }
}
