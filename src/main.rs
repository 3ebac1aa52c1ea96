mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use pagetype::{
    config::{Config, ConfigOverrides, ConfigStore, FileConfigStore},
    provider::{ExtractedText, HttpTextProvider, ProviderError, TextProvider},
    runtime::{spawn_extraction, AppEvent, CrosstermEventSource, FixedTicker, Runner},
    scoring::RateUnit,
    session::{Difficulty, InputOutcome, PollOutcome, TypingSession},
    util,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::Arc,
    time::Duration,
};
use webbrowser::Browser;

const TICK_RATE_MS: u64 = 100;

/// type web articles page by page and see how fast you really are
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Paste the url of an article, and its title and body become a paginated typing drill with live speed and accuracy."
)]
pub struct Cli {
    /// article to fetch and type on startup
    #[clap(short = 'u', long)]
    url: Option<String>,

    /// custom text to type (first line is the title, body starts on the third line)
    #[clap(short = 't', long)]
    text: Option<String>,

    /// number of characters per body page
    #[clap(short = 'c', long)]
    chars_per_page: Option<usize>,

    /// difficulty shown in the header
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// report speed in characters or words per minute
    #[clap(short = 'r', long, value_enum)]
    rate_unit: Option<RateUnit>,

    /// pause in milliseconds between finishing a page and showing the next
    #[clap(long)]
    advance_delay_ms: Option<u64>,

    /// persist the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl From<&Cli> for ConfigOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            chars_per_page: cli.chars_per_page,
            difficulty: cli.difficulty,
            rate_unit: cli.rate_unit,
            advance_delay_ms: cli.advance_delay_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    UrlEntry,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Fetch(String),
}

pub struct App {
    pub session: TypingSession,
    pub state: AppState,
    pub config: Config,
    pub url_input: String,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(config: Config, text: Option<String>) -> Result<Self, Box<dyn Error>> {
        let mut session = TypingSession::new(config.session_config(), config.difficulty)?;
        if let Some(text) = text {
            session.load_text(text)?;
        }
        let unit = config.rate_unit;
        session.on_complete(move |rate| info!("final rate {rate} {unit}"));

        Ok(Self {
            session,
            state: AppState::Typing,
            config,
            url_input: String::new(),
            source_url: None,
            source_title: None,
            loading: false,
            notice: None,
        })
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.state {
            AppState::Typing => self.on_typing_key(key),
            AppState::UrlEntry => self.on_url_key(key),
            AppState::Results => self.on_results_key(key),
        }
    }

    fn on_typing_key(&mut self, key: KeyEvent) -> Action {
        let outcome = match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Tab => {
                self.state = AppState::UrlEntry;
                return Action::None;
            }
            KeyCode::Left => {
                self.session.restart();
                return Action::None;
            }
            KeyCode::Up => {
                self.select_difficulty(self.session.difficulty().next());
                return Action::None;
            }
            KeyCode::Down => {
                self.select_difficulty(self.session.difficulty().previous());
                return Action::None;
            }
            KeyCode::Backspace => self.session.backspace(),
            KeyCode::Enter => self.session.push_char('\n'),
            KeyCode::Char(c) => self.session.push_char(c),
            _ => return Action::None,
        };

        if let InputOutcome::SessionComplete { .. } = outcome {
            self.state = AppState::Results;
        }
        Action::None
    }

    fn on_url_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.state = if self.session.is_finished() {
                    AppState::Results
                } else {
                    AppState::Typing
                };
            }
            KeyCode::Enter => {
                if !self.loading {
                    let url = self.url_input.trim().to_string();
                    self.begin_fetch(&url);
                    return Action::Fetch(url);
                }
            }
            KeyCode::Backspace => {
                self.url_input.pop();
            }
            KeyCode::Char(c) => self.url_input.push(c),
            _ => {}
        }
        Action::None
    }

    fn on_results_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('r') | KeyCode::Left => {
                self.session.restart();
                self.state = AppState::Typing;
            }
            KeyCode::Char('u') | KeyCode::Tab => self.state = AppState::UrlEntry,
            KeyCode::Char('o') => {
                if let Some(url) = &self.source_url {
                    if Browser::is_available() {
                        webbrowser::open(url).unwrap_or_default();
                    }
                }
            }
            KeyCode::Up => self.select_difficulty(self.session.difficulty().next()),
            KeyCode::Down => self.select_difficulty(self.session.difficulty().previous()),
            _ => {}
        }
        Action::None
    }

    fn select_difficulty(&mut self, difficulty: Difficulty) {
        self.session.set_difficulty(difficulty);
        self.state = AppState::Typing;
    }

    pub fn begin_fetch(&mut self, url: &str) {
        self.loading = true;
        self.url_input = url.to_string();
        self.notice = Some(Notice::Info(format!("fetching {url} ...")));
    }

    /// Apply a provider result. Failures only change the notice.
    pub fn on_text_loaded(&mut self, url: String, result: Result<ExtractedText, ProviderError>) {
        self.loading = false;

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                warn!("could not load {url}: {e}");
                self.notice = Some(Notice::Error(e.to_string()));
                return;
            }
        };

        match self.session.load_text(text.compose()) {
            Ok(()) => {
                self.notice = Some(Notice::Info(format!("loaded \"{}\"", text.title)));
                self.source_title = Some(text.title);
                self.source_url = Some(url);
                self.url_input.clear();
                self.state = AppState::Typing;
            }
            Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
    }

    /// Returns true when something visible changed
    pub fn on_tick(&mut self) -> bool {
        self.session.poll() != PollOutcome::Idle
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = store.load().apply(&ConfigOverrides::from(&cli));
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    util::init_logging();
    if cli.save_config {
        store.save(&config)?;
        info!("saved config to {}", store.path().display());
    }

    let provider: Arc<dyn TextProvider> = Arc::new(HttpTextProvider::new(config.provider.clone())?);
    let mut app = App::new(config, cli.text.clone())?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, provider, cli.url);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    provider: Arc<dyn TextProvider>,
    initial_url: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    if let Some(url) = initial_url {
        app.begin_fetch(&url);
        spawn_extraction(Arc::clone(&provider), url, runner.sender());
    }

    terminal.draw(|f| ui(app, f))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => true,
            AppEvent::Key(key) => match app.on_key(key) {
                Action::Quit => break,
                Action::Fetch(url) => {
                    spawn_extraction(Arc::clone(&provider), url, runner.sender());
                    true
                }
                Action::None => true,
            },
            AppEvent::TextLoaded { url, result } => {
                app.on_text_loaded(url, result);
                true
            }
        };

        if redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
