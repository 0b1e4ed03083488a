mod app;
mod config;
mod event;
mod game;
mod source;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{error, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use app::{App, AppScreen};
use config::{APP_NAME, Config, SourceKind};
use event::{AppEvent, EventHandler};
use game::input;
use game::run::LoadReason;
use game::stage::WIN_TARGET;
use source::QuestionSource;
use source::opentdb::OpenTdbSource;
use source::proxy::ProxySource;
use ui::components::dashboard::Dashboard;
use ui::components::menu::MenuAction;
use ui::components::metrics_panel::MetricsPanel;
use ui::components::progress_bar::ProgressBar;
use ui::components::question_card::QuestionCard;
use ui::layout::{AppLayout, CardLayout, pack_hint_lines};

#[derive(Parser)]
#[command(name = "trivia", version, about = "Terminal trivia: climb easy, medium and hard stages")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, value_enum, help = "Question source")]
    source: Option<SourceKind>,

    #[arg(long, help = "Base URL of the question proxy (with --source proxy)")]
    api_url: Option<String>,

    #[arg(short, long, help = "Preselected category id")]
    category: Option<u32>,

    #[arg(long = "type", help = "Question type (any, boolean, multiple)")]
    question_type: Option<String>,

    #[arg(long, help = "Write logs here instead of the data directory")]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("trivia.log")
}

/// The terminal owns stdout/stderr, so logs go to a file.
fn init_logging(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn build_source(config: &Config) -> Result<Arc<dyn QuestionSource>> {
    Ok(match config.source {
        SourceKind::Opentdb => Arc::new(OpenTdbSource::new()?),
        SourceKind::Proxy => Arc::new(ProxySource::new(&config.api_url)?),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file)?;

    let mut config = Config::load().unwrap_or_else(|err| {
        error!("ignoring unreadable config: {err:#}");
        Config::default()
    });
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(source) = cli.source {
        config.source = source;
    }
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if cli.category.is_some() {
        config.category = cli.category;
    }
    if let Some(question_type) = cli.question_type {
        config.question_type = question_type;
        config.normalize_question_type();
    }
    info!("starting with source {:?}", config.source);

    let source = build_source(&config)?;
    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::new(config, source, events.sender());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!("event loop failed: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Mouse(mouse) => {
                let size = terminal.size()?;
                handle_mouse(app, mouse, Rect::new(0, 0, size.width, size.height));
            }
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
            AppEvent::Questions { generation, result } => app.on_questions(generation, result),
            AppEvent::Categories(categories) => app.on_categories(categories),
        }
        app.tick(Instant::now());

        if app.should_quit {
            info!("quitting");
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen() {
        AppScreen::Setup => handle_setup_key(app, key),
        AppScreen::Loading => handle_loading_key(app, key),
        AppScreen::Playing => handle_playing_key(app, key),
        AppScreen::Summary => handle_summary_key(app, key),
        AppScreen::Error => handle_error_key(app, key),
    }
}

fn handle_setup_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('s') | KeyCode::Char('1') => app.start_game(),
        KeyCode::Char('t') => app.cycle_theme(),
        KeyCode::Left | KeyCode::Char('h') => app.cycle_category(false),
        KeyCode::Right | KeyCode::Char('l') => app.cycle_category(true),
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => match app.menu.selected_action() {
            MenuAction::Start => app.start_game(),
            MenuAction::Category => app.cycle_category(true),
            MenuAction::Theme => app.cycle_theme(),
            MenuAction::Quit => app.should_quit = true,
        },
        _ => {}
    }
}

fn handle_loading_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.reset_to_idle();
    }
}

fn handle_playing_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.reset_to_idle();
        return;
    }
    if let Some(action) = input::action_for_key(&app.run, &key) {
        app.act(action);
    }
}

fn handle_summary_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.start_game(),
        KeyCode::Char('q') | KeyCode::Esc => app.reset_to_idle(),
        _ => {}
    }
}

fn handle_error_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.start_game(),
        KeyCode::Esc | KeyCode::Char('q') => app.reset_to_idle(),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, area: Rect) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) || app.screen() != AppScreen::Playing {
        return;
    }
    let Some(question) = app.run.current() else {
        return;
    };
    let card = CardLayout::new(AppLayout::new(area).main, question.answers.len());

    let action = if let Some(slot) = card.answer_at(mouse.column, mouse.row) {
        input::action_for_slot(&app.run, slot)
    } else if card.next_contains(mouse.column, mouse.row) {
        input::action_for_next(&app.run)
    } else {
        None
    };
    if let Some(action) = action {
        app.act(action);
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen() {
        AppScreen::Setup => render_setup(frame, app),
        AppScreen::Loading => render_loading(frame, app),
        AppScreen::Playing => render_playing(frame, app),
        AppScreen::Summary => render_summary(frame, app),
        AppScreen::Error => render_error(frame, app),
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let run = &app.run;

    let info = format!(
        " {}  |  Score {}  |  {}/{WIN_TARGET} correct  |  Streak {} (best {})  ",
        run.stage_label(),
        run.score,
        run.correct_count,
        run.streak,
        run.best_streak,
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " trivia ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            info,
            Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
        ),
        Span::styled(
            app.hearts_display(),
            Style::default().fg(colors.heart()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut ratatui::Frame, app: &App, area: Rect, hints: &[&str]) {
    let colors = &app.theme.colors;
    let mut lines: Vec<Line> = Vec::new();

    if let Some(notice) = &app.run.notice {
        lines.push(Line::from(Span::styled(
            format!("  {}", notice.text),
            Style::default().fg(colors.warning()),
        )));
    }
    for hint in pack_hint_lines(hints, area.width as usize) {
        lines.push(Line::from(Span::styled(hint, Style::default().fg(colors.muted()))));
    }
    lines.truncate(area.height as usize);
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_setup(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " trivia ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} categories loaded ", app.categories.len()),
            Style::default().fg(colors.muted()).bg(colors.header_bg()),
        ),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout[0]);

    let menu_area = ui::layout::centered_rect(50, 80, layout[1]);
    frame.render_widget(&app.menu, menu_area);

    let footer = Paragraph::new(Line::from(Span::styled(
        " [s/Enter] Start  [\u{2190}/\u{2192}] Category  [t] Theme  [q] Quit ",
        Style::default().fg(colors.muted()),
    )));
    frame.render_widget(footer, layout[2]);
}

fn loading_text(reason: Option<LoadReason>) -> &'static str {
    match reason {
        Some(LoadReason::Stage) => "Next stage! Fetching harder questions\u{2026}",
        Some(LoadReason::Refill) => "Fetching more questions\u{2026}",
        Some(LoadReason::Start) | None => "Fetching questions\u{2026}",
    }
}

fn render_loading(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let app_layout = AppLayout::new(area);

    render_header(frame, app, app_layout.header);

    let body = ui::layout::centered_rect(40, 20, app_layout.main);
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            loading_text(app.run.loading_reason()),
            Style::default().fg(colors.accent()),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(text, body);

    render_footer(frame, app, app_layout.footer, &["[Esc] Abandon run"]);
}

fn render_playing(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let app_layout = AppLayout::new(area);

    render_header(frame, app, app_layout.header);

    if let Some(progress_area) = app_layout.progress {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(progress_area);
        let run = &app.run;
        frame.render_widget(
            ProgressBar::new(
                "Run",
                run.run_progress(),
                format!("{}/{WIN_TARGET}", run.correct_count),
                app.theme,
            ),
            halves[0],
        );
        let stage = run.stage();
        let stage_title = format!("Stage: {}", stage.difficulty);
        frame.render_widget(
            ProgressBar::new(
                &stage_title,
                run.stage_progress(),
                format!("{}/{}", run.stage_correct, stage.needed_correct),
                app.theme,
            ),
            halves[1],
        );
    }

    frame.render_widget(QuestionCard::new(&app.run, app.theme), app_layout.main);

    if let Some(sidebar) = app_layout.sidebar {
        frame.render_widget(
            MetricsPanel::new(&app.run.metrics, "Metrics", app.theme),
            sidebar,
        );
    }

    let hints: &[&str] = if app.run.answered().is_some() {
        &["[Enter/Space] Next", "[Esc] Abandon run"]
    } else {
        &["[1-4] Answer", "[t/f] True/False", "[click] Select", "[Esc] Abandon run"]
    };
    render_footer(frame, app, app_layout.footer, hints);
}

fn render_summary(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let centered = ui::layout::centered_rect(60, 80, area);
    frame.render_widget(Dashboard::new(&app.run, app.theme), centered);
}

fn render_error(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;
    let centered = ui::layout::centered_rect(60, 50, area);

    let message = app.run.error_message().unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled(
            "Could not load questions",
            Style::default()
                .fg(colors.error())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(colors.fg()))),
        Line::from(""),
        Line::from(Span::styled(
            "[r] Retry  [Esc] Back",
            Style::default().fg(colors.accent()),
        )),
    ];
    let block = Block::bordered()
        .title(" Error ")
        .border_style(Style::default().fg(colors.error()))
        .style(Style::default().bg(colors.bg()));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        centered,
    );
}
