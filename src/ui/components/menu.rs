use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::game::stage::{MAX_HEARTS, STAGES, WIN_TARGET};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Category,
    Theme,
    Quit,
}

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
    pub action: MenuAction,
}

pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            items: vec![
                MenuItem {
                    key: "s".to_string(),
                    label: "Start".to_string(),
                    description: "Begin a new run at the easy stage".to_string(),
                    action: MenuAction::Start,
                },
                MenuItem {
                    key: "\u{2190}/\u{2192}".to_string(),
                    label: "Category".to_string(),
                    description: String::new(),
                    action: MenuAction::Category,
                },
                MenuItem {
                    key: "t".to_string(),
                    label: "Theme".to_string(),
                    description: String::new(),
                    action: MenuAction::Theme,
                },
                MenuItem {
                    key: "q".to_string(),
                    label: "Quit".to_string(),
                    description: "Leave trivia".to_string(),
                    action: MenuAction::Quit,
                },
            ],
            selected: 0,
            theme,
        }
    }

    /// Refresh the descriptions that show the current picker values.
    pub fn set_choices(&mut self, category: &str, theme: &str) {
        for item in &mut self.items {
            match item.action {
                MenuAction::Category => item.description = format!("Questions from: {category}"),
                MenuAction::Theme => item.description = format!("Current theme: {theme}"),
                _ => {}
            }
        }
    }

    pub fn selected_action(&self) -> MenuAction {
        self.items[self.selected].action
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }
}

fn rules_line() -> String {
    let stages = STAGES
        .iter()
        .map(|s| format!("{} {}", s.difficulty, s.needed_correct))
        .collect::<Vec<_>>()
        .join(" \u{2192} ");
    format!("{stages}  \u{00b7}  {WIN_TARGET} correct wins  \u{00b7}  {MAX_HEARTS} hearts")
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "trivia",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(rules_line(), Style::default().fg(colors.fg()))),
            Line::from(""),
        ];

        let title = Paragraph::new(title_lines).alignment(Alignment::Center);
        title.render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_text = format!(" {indicator} [{key}] {label}", key = item.key, label = item.label);
            let desc_text = format!("     {}", item.description);

            let lines = vec![
                Line::from(Span::styled(
                    &*label_text,
                    Style::default()
                        .fg(if is_selected {
                            colors.accent()
                        } else {
                            colors.fg()
                        })
                        .add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                )),
                Line::from(Span::styled(
                    &*desc_text,
                    Style::default().fg(colors.muted()),
                )),
            ];

            let p = Paragraph::new(lines);
            if i < menu_layout.len() {
                p.render(menu_layout[i], buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_choices_updates_descriptions() {
        let theme = Theme::default();
        let mut menu = Menu::new(&theme);
        menu.set_choices("Science: Computers", "light");
        assert_eq!(menu.items[1].description, "Questions from: Science: Computers");
        assert_eq!(menu.items[2].description, "Current theme: light");
        assert_eq!(menu.items[0].description, "Begin a new run at the easy stage");
    }

    #[test]
    fn test_navigation_wraps() {
        let theme = Theme::default();
        let mut menu = Menu::new(&theme);
        menu.prev();
        assert_eq!(menu.selected_action(), MenuAction::Quit);
        menu.next();
        assert_eq!(menu.selected_action(), MenuAction::Start);
    }

    #[test]
    fn test_rules_line_lists_stages() {
        assert_eq!(
            rules_line(),
            "easy 3 \u{2192} medium 3 \u{2192} hard 4  \u{00b7}  10 correct wins  \u{00b7}  5 hearts"
        );
    }
}
