use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::Config;
use crate::event::AppEvent;
use crate::game::input::{self, Action};
use crate::game::question::Category;
use crate::game::run::{Effect, FetchRequest, RunState, Status, Timer};
use crate::source::batch::{self, Batch, FetchError};
use crate::source::{CancelToken, QuestionSource};
use crate::ui::components::menu::Menu;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Setup,
    Loading,
    Playing,
    Summary,
    Error,
}

pub struct App {
    pub run: RunState,
    pub config: Config,
    pub theme: &'static Theme,
    pub menu: Menu<'static>,
    pub categories: Vec<Category>,
    /// Index into the category picker; 0 is "any category".
    pub category_selected: usize,
    pub should_quit: bool,
    source: Arc<dyn QuestionSource>,
    events: Sender<AppEvent>,
    in_flight: Option<CancelToken>,
    timers: Vec<(Instant, Timer)>,
}

impl App {
    pub fn new(config: Config, source: Arc<dyn QuestionSource>, events: Sender<AppEvent>) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let menu = Menu::new(theme);

        let mut app = Self {
            run: RunState::new(),
            config,
            theme,
            menu,
            categories: Vec::new(),
            category_selected: 0,
            should_quit: false,
            source,
            events,
            in_flight: None,
            timers: Vec::new(),
        };
        app.refresh_menu();
        app.load_categories();
        app
    }

    pub fn screen(&self) -> AppScreen {
        match self.run.status() {
            Status::Idle => AppScreen::Setup,
            Status::Loading => AppScreen::Loading,
            Status::Playing => AppScreen::Playing,
            Status::Won | Status::Lost => AppScreen::Summary,
            Status::Error => AppScreen::Error,
        }
    }

    fn load_categories(&self) {
        let source = Arc::clone(&self.source);
        let tx = self.events.clone();
        thread::spawn(move || {
            let categories = match source.fetch_categories() {
                Ok(categories) => categories,
                Err(err) => {
                    warn!("categories unavailable: {err}");
                    Vec::new()
                }
            };
            let _ = tx.send(AppEvent::Categories(categories));
        });
    }

    pub fn on_categories(&mut self, categories: Vec<Category>) {
        info!("loaded {} categories", categories.len());
        self.categories = categories;
        self.category_selected = self
            .config
            .category
            .and_then(|id| self.categories.iter().position(|c| c.id == id))
            .map_or(0, |pos| pos + 1);
        self.refresh_menu();
    }

    /// The picker's current choice. Only read when a run starts.
    pub fn selected_category(&self) -> Option<u32> {
        self.category_selected
            .checked_sub(1)
            .and_then(|i| self.categories.get(i))
            .map(|c| c.id)
    }

    pub fn selected_category_name(&self) -> &str {
        self.category_selected
            .checked_sub(1)
            .and_then(|i| self.categories.get(i))
            .map_or("Any category", |c| c.name.as_str())
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let count = self.categories.len() + 1;
        self.category_selected = if forward {
            (self.category_selected + 1) % count
        } else if self.category_selected == 0 {
            count - 1
        } else {
            self.category_selected - 1
        };
        self.refresh_menu();
    }

    pub fn cycle_theme(&mut self) {
        let themes = Theme::available_themes();
        if themes.is_empty() {
            return;
        }
        let next = themes
            .iter()
            .position(|t| *t == self.config.theme)
            .map_or(0, |idx| (idx + 1) % themes.len());
        self.config.theme = themes[next].clone();
        if let Some(new_theme) = Theme::load(&self.config.theme) {
            let theme: &'static Theme = Box::leak(Box::new(new_theme));
            self.theme = theme;
            self.menu.theme = theme;
        }
        if let Err(err) = Config::save_theme(&self.config.theme) {
            warn!("could not persist theme: {err}");
        }
        self.refresh_menu();
    }

    fn refresh_menu(&mut self) {
        let category = self.selected_category_name().to_string();
        let theme = self.config.theme.clone();
        self.menu.set_choices(&category, &theme);
    }

    pub fn start_game(&mut self) {
        let category = self.selected_category();
        info!("starting run (category {category:?})");
        let effects = self.run.start_game(category);
        self.apply(effects);
    }

    pub fn reset_to_idle(&mut self) {
        let effects = self.run.reset_to_idle();
        self.timers.clear();
        self.apply(effects);
    }

    pub fn act(&mut self, action: Action) {
        let effects = input::apply(&mut self.run, action);
        self.apply(effects);
    }

    pub fn on_questions(&mut self, generation: u64, result: Result<Batch, FetchError>) {
        let effects = self.run.apply_fetch(generation, result);
        debug!(
            "batch #{generation} handled (latest #{}), run is {}",
            self.run.generation(),
            self.run.status().as_str()
        );
        self.apply(effects);
    }

    /// Fire every timer due at `now`, earliest first.
    pub fn tick(&mut self, now: Instant) {
        if self.timers.is_empty() {
            return;
        }
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|(at, _)| *at <= now);
        self.timers = pending;
        due.sort_by_key(|(at, _)| *at);
        for (_, timer) in due {
            let effects = self.run.fire(timer);
            self.apply(effects);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch(request) => self.spawn_fetch(request),
                Effect::CancelFetch => {
                    if let Some(token) = self.in_flight.take() {
                        token.cancel();
                    }
                }
                Effect::Schedule { delay, timer } => {
                    self.timers.push((Instant::now() + delay, timer));
                }
            }
        }
    }

    fn spawn_fetch(&mut self, request: FetchRequest) {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
        let token = CancelToken::new();
        self.in_flight = Some(token.clone());

        let source = Arc::clone(&self.source);
        let tx = self.events.clone();
        let kind = self.config.question_kind();
        debug!("spawning fetch #{}", request.generation);
        thread::spawn(move || {
            let result = batch::fetch_batch(
                source.as_ref(),
                request.difficulty,
                request.category,
                kind,
                &token,
            );
            let _ = tx.send(AppEvent::Questions {
                generation: request.generation,
                result,
            });
        });
    }

    pub fn hearts_display(&self) -> String {
        let filled = self.run.hearts as usize;
        let empty = crate::game::stage::MAX_HEARTS as usize - filled;
        format!("{}{}", "\u{2665}".repeat(filled), "\u{2661}".repeat(empty))
    }
}
