use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const STAT_TICK: Duration = Duration::from_secs(1);

/// Time source for the typing engine
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests. Clones share the same offset.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_nanos
            .fetch_add(saturating_nanos(by), Ordering::SeqCst);
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

/// Periodic stat tick owned by a running attempt.
///
/// There is no background task: the host polls, and the tick only exists while
/// the owning attempt holds it. Dropping the value is the cancellation.
#[derive(Debug)]
pub struct TickTimer {
    started_at: Instant,
    interval: Duration,
    fired: u128,
}

impl TickTimer {
    pub fn start(started_at: Instant, interval: Duration) -> Self {
        Self {
            started_at,
            interval: interval.max(Duration::from_millis(1)),
            fired: 0,
        }
    }

    /// True when at least one interval boundary was crossed since the last poll.
    /// Several missed boundaries collapse into a single fire.
    pub fn poll(&mut self, now: Instant) -> bool {
        let boundaries =
            now.saturating_duration_since(self.started_at).as_nanos() / self.interval.as_nanos();
        if boundaries > self.fired {
            self.fired = boundaries;
            true
        } else {
            false
        }
    }
}

/// Monotonic counter that invalidates outstanding scheduled work when bumped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Generation(u64);

impl Generation {
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// A page advance waiting for its delay to elapse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingAdvance {
    pub due: Instant,
    pub generation: Generation,
}

impl PendingAdvance {
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }
}
