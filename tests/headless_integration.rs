use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pagetype::provider::{ExtractedText, ProviderError, TextProvider};
use pagetype::runtime::{spawn_extraction, AppEvent, FixedTicker, Runner, TestEventSource};
use pagetype::session::{Difficulty, InputOutcome, PollOutcome, SessionConfig, TypingSession};

struct CannedProvider;

impl TextProvider for CannedProvider {
    fn extract_text(&self, url: &str) -> Result<ExtractedText, ProviderError> {
        if !url.contains("brunch.co.kr") {
            return Err(ProviderError::UnsupportedSource("brunch.co.kr".into()));
        }
        Ok(ExtractedText {
            title: "Title".into(),
            body: "Hello World".into(),
        })
    }
}

fn send_text(tx: &std::sync::mpsc::Sender<AppEvent>, text: &str) {
    for c in text.chars() {
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)))
            .unwrap();
    }
}

// Headless integration using the runtime + session without a TTY.
// Drives a whole game through Runner/TestEventSource, including the provider round trip.
#[test]
fn headless_fetch_and_type_flow_completes() {
    let config = SessionConfig {
        advance_delay: Duration::from_millis(20),
        ..SessionConfig::default()
    };
    let mut session = TypingSession::new(config, Difficulty::Easy).unwrap();
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completions);
    session.on_complete(move |rate| {
        assert!(rate > 0);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(5)),
    );
    let tx = runner.sender();

    spawn_extraction(
        Arc::new(CannedProvider),
        "https://brunch.co.kr/@writer/1".into(),
        runner.sender(),
    )
    .join()
    .unwrap();

    let mut finished = false;
    for _ in 0..2000u32 {
        match runner.step() {
            AppEvent::TextLoaded { result, .. } => {
                let text = result.expect("canned provider succeeds");
                session.load_text(text.compose()).unwrap();
                assert_eq!(session.page_count(), 2);
                send_text(&tx, "Title");
            }
            AppEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    if let InputOutcome::SessionComplete { .. } = session.push_char(c) {
                        finished = true;
                        break;
                    }
                }
            }
            AppEvent::Tick => {
                if session.poll() == (PollOutcome::Advanced { page: 1 }) {
                    send_text(&tx, "Hello World");
                }
            }
            AppEvent::Resize => {}
        }
    }

    assert!(finished, "session should have finished typing");
    assert!(session.is_finished());
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

#[test]
fn headless_provider_failure_leaves_session_alone() {
    let mut session = TypingSession::new(SessionConfig::default(), Difficulty::Medium).unwrap();
    session.push_char('H');
    let before = session.source_text().to_string();

    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(5)),
    );
    spawn_extraction(
        Arc::new(CannedProvider),
        "https://example.com/post".into(),
        runner.sender(),
    )
    .join()
    .unwrap();

    match runner.step() {
        AppEvent::TextLoaded { result, .. } => {
            assert!(matches!(result, Err(ProviderError::UnsupportedSource(_))));
        }
        other => panic!("expected TextLoaded, got {other:?}"),
    }

    assert_eq!(session.source_text(), before);
    assert_eq!(session.attempt().input(), "H");
}

#[test]
fn headless_ticks_refresh_live_rate() {
    let mut session =
        TypingSession::new(SessionConfig::default(), Difficulty::Medium).unwrap();
    session.push_char('H');
    session.push_char('e');

    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(50)),
    );

    let mut ticked = false;
    for _ in 0..40u32 {
        if let AppEvent::Tick = runner.step() {
            if session.poll() == PollOutcome::Ticked {
                ticked = true;
                break;
            }
        }
    }

    assert!(ticked, "a stat tick should fire after one second of typing");
    assert!(session.stats().elapsed_secs >= 1);
}

/// Send one key every `gap`, like a steady typist.
fn type_steadily(tx: Sender<AppEvent>, text: String, gap: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for c in text.chars() {
            let key = AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
            if tx.send(key).is_err() {
                break;
            }
            thread::sleep(gap);
        }
    })
}

/// Mirror of the binary's loop: keys go to the session, ticks poll it.
fn drive(
    session: &mut TypingSession,
    runner: &Runner<TestEventSource, FixedTicker>,
    for_how_long: Duration,
) -> usize {
    let started = Instant::now();
    let mut ignored = 0;
    while started.elapsed() < for_how_long {
        match runner.step() {
            AppEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    if session.push_char(c) == InputOutcome::Ignored {
                        ignored += 1;
                    }
                }
            }
            AppEvent::Tick => {
                session.poll();
            }
            _ => {}
        }
    }
    ignored
}

#[test]
fn headless_stat_tick_fires_while_keys_keep_arriving() {
    let config = SessionConfig {
        default_text: "b".repeat(100),
        ..SessionConfig::default()
    };
    let mut session = TypingSession::new(config, Difficulty::Medium).unwrap();
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(100)),
    );

    // 30 keys 50ms apart, never idle long enough for a timeout
    let feeder = type_steadily(runner.sender(), "b".repeat(30), Duration::from_millis(50));
    drive(&mut session, &runner, Duration::from_millis(1400));
    feeder.join().unwrap();

    let stats = session.stats();
    assert!(stats.elapsed_secs >= 1, "stats never refreshed: {stats:?}");
    assert!(stats.rate > 0);
}

#[test]
fn headless_page_advances_while_keys_keep_arriving() {
    let config = SessionConfig {
        default_text: format!("T\n\n{}", "b".repeat(60)),
        advance_delay: Duration::from_millis(100),
        ..SessionConfig::default()
    };
    let mut session = TypingSession::new(config, Difficulty::Medium).unwrap();
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(100)),
    );

    let text = format!("T{}", "b".repeat(30));
    let feeder = type_steadily(runner.sender(), text, Duration::from_millis(50));
    let ignored = drive(&mut session, &runner, Duration::from_millis(1900));
    feeder.join().unwrap();

    assert_eq!(session.current_page(), 1);
    // only keys inside the advance delay plus one tick are dropped
    assert!(ignored <= 5, "{ignored} keys dropped");
    assert!(session.attempt().input().chars().count() >= 25);
}
