use crate::pagination::{Pages, DEFAULT_CHARS_PER_PAGE};
use crate::scoring::{self, Glyph, RateUnit};
use crate::timer::{Clock, Generation, PendingAdvance, SystemClock, TickTimer, STAT_TICK};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_TEXT: &str =
    "Hello. This is the sample text of the typing game. Start typing whenever you are ready!";
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(100);

/// Display-only setting; never changes pagination, timing or scoring.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[strum(serialize = "easy")]
    Easy,
    #[default]
    #[strum(serialize = "normal")]
    Medium,
    #[strum(serialize = "hard")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("source text has nothing to type")]
    EmptyText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Running,
    Complete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub chars_per_page: usize,
    pub advance_delay: Duration,
    pub rate_unit: RateUnit,
    pub default_text: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chars_per_page: DEFAULT_CHARS_PER_PAGE,
            advance_delay: DEFAULT_ADVANCE_DELAY,
            rate_unit: RateUnit::default(),
            default_text: DEFAULT_TEXT.to_string(),
        }
    }
}

/// Numbers shown next to the prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub elapsed_secs: u64,
    pub rate: u32,
    pub accuracy: u32,
    pub errors: usize,
}

/// The page currently being typed
#[derive(Debug)]
pub struct PageAttempt {
    target: String,
    input: String,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    error_count: usize,
    accuracy: u32,
    elapsed_secs: u64,
    current_rate: u32,
    tick: Option<TickTimer>,
}

impl PageAttempt {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            input: String::new(),
            started_at: None,
            ended_at: None,
            error_count: 0,
            accuracy: 100,
            elapsed_secs: 0,
            current_rate: 0,
            tick: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Instant> {
        self.ended_at
    }

    pub fn state(&self) -> AttemptState {
        match (self.started_at, self.ended_at) {
            (_, Some(_)) => AttemptState::Complete,
            (Some(_), None) => AttemptState::Running,
            (None, None) => AttemptState::Idle,
        }
    }

    /// Whether the once-per-second stat tick is alive
    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    fn start_clock(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.tick = Some(TickTimer::start(now, STAT_TICK));
    }

    fn rescore(&mut self) {
        self.error_count = scoring::error_count(&self.target, &self.input);
        self.accuracy = scoring::accuracy(self.input.chars().count(), self.error_count);
    }

    fn refresh_rate(&mut self, now: Instant, unit: RateUnit) {
        if let Some(started_at) = self.started_at {
            self.elapsed_secs = now.saturating_duration_since(started_at).as_secs();
            self.current_rate =
                scoring::live_rate(self.input.chars().count(), self.elapsed_secs, unit);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Input arrived while the page or session was already complete
    Ignored,
    Updated,
    PageComplete { page: usize, rate: u32 },
    SessionComplete { rate: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Idle,
    Ticked,
    Advanced { page: usize },
}

type CompletionCallback = Box<dyn FnMut(u32) + Send>;

/// One game over one source text.
///
/// Every transition happens synchronously inside `set_input`, `poll`,
/// `restart`, `load_text` or `set_difficulty`; the host is expected to call
/// `poll` regularly so the stat tick and delayed page advances can fire.
pub struct TypingSession<C: Clock = SystemClock> {
    config: SessionConfig,
    clock: C,
    source_text: String,
    pages: Pages,
    current_page: usize,
    difficulty: Difficulty,
    attempt: PageAttempt,
    session_started_at: Option<Instant>,
    completed_chars: usize,
    generation: Generation,
    pending_advance: Option<PendingAdvance>,
    final_rate: Option<u32>,
    on_complete: Option<CompletionCallback>,
}

impl TypingSession<SystemClock> {
    pub fn new(config: SessionConfig, difficulty: Difficulty) -> Result<Self, SessionError> {
        Self::with_clock(config, difficulty, SystemClock)
    }
}

impl<C: Clock> TypingSession<C> {
    /// Build a session over the configured default text
    pub fn with_clock(
        config: SessionConfig,
        difficulty: Difficulty,
        clock: C,
    ) -> Result<Self, SessionError> {
        let source_text = config.default_text.clone();
        let pages = paginate_checked(&source_text, config.chars_per_page)?;

        let mut session = Self {
            attempt: PageAttempt::new(pages.title()),
            config,
            clock,
            source_text,
            pages,
            current_page: 0,
            difficulty,
            session_started_at: None,
            completed_chars: 0,
            generation: Generation::default(),
            pending_advance: None,
            final_rate: None,
            on_complete: None,
        };
        session.reset_progress();
        Ok(session)
    }

    /// Register the callback fired once per fully typed session
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(u32) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Replace the source text. Leaves the session untouched on error.
    pub fn load_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let text = text.into();
        let pages = paginate_checked(&text, self.config.chars_per_page)?;

        info!(
            "loaded text: {} chars over {} pages",
            text.chars().count(),
            pages.len()
        );
        self.source_text = text;
        self.pages = pages;
        self.reset_progress();
        Ok(())
    }

    pub fn load_default_text(&mut self) -> Result<(), SessionError> {
        let text = self.config.default_text.clone();
        self.load_text(text)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        info!("difficulty set to {}", difficulty.label());
        self.difficulty = difficulty;
        self.reset_progress();
    }

    /// Clear the current attempt. The clock starts again on the next keystroke.
    /// A finished session starts over from its first page.
    pub fn restart(&mut self) {
        self.generation.bump();

        if self.is_finished() {
            info!("restarting finished session");
            self.reset_progress();
            return;
        }

        debug!("restarting page {}", self.current_page);
        self.attempt = PageAttempt::new(self.current_target());
        if self.completed_chars == 0 {
            self.session_started_at = None;
        }
    }

    /// Replace the whole typed input for the current page
    pub fn set_input(&mut self, input: &str) -> InputOutcome {
        if self.is_finished()
            || self.has_pending_advance()
            || self.attempt.state() == AttemptState::Complete
        {
            return InputOutcome::Ignored;
        }

        let now = self.clock.now();
        if self.attempt.started_at.is_none() && self.attempt.input.is_empty() && !input.is_empty()
        {
            self.attempt.start_clock(now);
            self.session_started_at.get_or_insert(now);
        }

        self.attempt.input = input.to_string();
        self.attempt.rescore();

        if self.attempt.input == self.attempt.target {
            self.complete_page(now)
        } else {
            InputOutcome::Updated
        }
    }

    pub fn push_char(&mut self, c: char) -> InputOutcome {
        let mut input = self.attempt.input.clone();
        input.push(c);
        self.set_input(&input)
    }

    pub fn backspace(&mut self) -> InputOutcome {
        let mut input = self.attempt.input.clone();
        if input.pop().is_none() {
            return InputOutcome::Ignored;
        }
        self.set_input(&input)
    }

    /// Drive time-based transitions: delayed page advances and the stat tick.
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();

        if let Some(pending) = self.pending_advance {
            if !pending.is_current(self.generation) {
                debug!("dropping stale page advance");
                self.pending_advance = None;
            } else if pending.is_due(now) {
                self.pending_advance = None;
                self.advance();
                return PollOutcome::Advanced {
                    page: self.current_page,
                };
            }
        }

        if let Some(tick) = self.attempt.tick.as_mut() {
            if tick.poll(now) {
                self.attempt.refresh_rate(now, self.config.rate_unit);
                return PollOutcome::Ticked;
            }
        }

        PollOutcome::Idle
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn pages(&self) -> &Pages {
        &self.pages
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn attempt(&self) -> &PageAttempt {
        &self.attempt
    }

    pub fn state(&self) -> AttemptState {
        self.attempt.state()
    }

    pub fn session_started_at(&self) -> Option<Instant> {
        self.session_started_at
    }

    pub fn has_pending_advance(&self) -> bool {
        self.pending_advance
            .is_some_and(|pending| pending.is_current(self.generation))
    }

    pub fn is_finished(&self) -> bool {
        self.final_rate.is_some()
    }

    pub fn final_rate(&self) -> Option<u32> {
        self.final_rate
    }

    pub fn classify(&self) -> Vec<Glyph> {
        scoring::classify(&self.attempt.target, &self.attempt.input)
    }

    pub fn stats(&self) -> Stats {
        Stats {
            elapsed_secs: self.attempt.elapsed_secs,
            rate: self.final_rate.unwrap_or(self.attempt.current_rate),
            accuracy: self.attempt.accuracy,
            errors: self.attempt.error_count,
        }
    }

    fn current_target(&self) -> &str {
        self.pages.get(self.current_page).unwrap_or_default()
    }

    /// First page at or after `from` with something to type
    fn first_typeable(&self, from: usize) -> usize {
        (from..self.pages.len())
            .find(|&idx| self.pages.get(idx).is_some_and(|page| !page.is_empty()))
            .unwrap_or(from)
    }

    fn reset_progress(&mut self) {
        self.generation.bump();
        self.pending_advance = None;
        self.session_started_at = None;
        self.completed_chars = 0;
        self.final_rate = None;
        self.current_page = self.first_typeable(0);
        self.attempt = PageAttempt::new(self.current_target());
    }

    fn complete_page(&mut self, now: Instant) -> InputOutcome {
        let started_at = self.attempt.started_at.unwrap_or(now);
        let page_elapsed = now.saturating_duration_since(started_at);
        let page_chars = self.attempt.target.chars().count();
        let page_rate = scoring::final_rate(page_chars, page_elapsed, self.config.rate_unit);

        self.attempt.ended_at = Some(now);
        self.attempt.tick = None;
        self.attempt.elapsed_secs = page_elapsed.as_secs();
        self.attempt.current_rate = page_rate;

        let page = self.current_page;
        info!(
            "page {}/{} complete: {} {}",
            page + 1,
            self.pages.len(),
            page_rate,
            self.config.rate_unit
        );

        if page + 1 < self.pages.len() {
            if self.config.advance_delay.is_zero() {
                self.advance();
            } else {
                self.pending_advance = Some(PendingAdvance {
                    due: now + self.config.advance_delay,
                    generation: self.generation,
                });
            }
            return InputOutcome::PageComplete {
                page,
                rate: page_rate,
            };
        }

        let total_chars = self.completed_chars + page_chars;
        let total_elapsed = now.saturating_duration_since(self.session_started_at.unwrap_or(started_at));
        let rate = scoring::final_rate(total_chars, total_elapsed, self.config.rate_unit);
        self.final_rate = Some(rate);
        info!(
            "session complete: {} chars in {:.1}s, {} {}",
            total_chars,
            total_elapsed.as_secs_f64(),
            rate,
            self.config.rate_unit
        );

        if let Some(callback) = self.on_complete.as_mut() {
            callback(rate);
        }

        InputOutcome::SessionComplete { rate }
    }

    fn advance(&mut self) {
        self.completed_chars += self.attempt.target.chars().count();
        self.current_page = self.first_typeable(self.current_page + 1);
        self.attempt = PageAttempt::new(self.current_target());
        debug!("advanced to page {}", self.current_page);
    }
}

impl<C: Clock> fmt::Debug for TypingSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypingSession")
            .field("current_page", &self.current_page)
            .field("page_count", &self.pages.len())
            .field("difficulty", &self.difficulty)
            .field("attempt", &self.attempt)
            .field("final_rate", &self.final_rate)
            .finish_non_exhaustive()
    }
}

fn paginate_checked(text: &str, chars_per_page: usize) -> Result<Pages, SessionError> {
    let pages = Pages::paginate(text, chars_per_page);
    if pages.iter().all(|page| page.trim().is_empty()) {
        return Err(SessionError::EmptyText);
    }
    Ok(pages)
}
