//! Clock abstraction and the repeating rotation timer.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// An armed interval. Dropping it is the cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatingTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl RepeatingTimer {
    /// `None` unless `seconds` is a positive, finite period.
    pub fn arm(seconds: f64, now: Instant) -> Option<Self> {
        if seconds.is_nan() || seconds <= 0.0 {
            return None;
        }
        let period = Duration::try_from_secs_f64(seconds)
            .unwrap_or(Duration::MAX)
            .max(MIN_PERIOD);
        Some(Self {
            period,
            // Periods too long to represent simply never come due.
            next_due: now.checked_add(period),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// True when a deadline has passed at `now`. Missed periods collapse into
    /// this one tick and the schedule keeps its original phase, unless the
    /// gap is too long to step over, in which case it restarts from `now`.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let missed = (now - due).as_nanos() / self.period.as_nanos();
        let skip = u32::try_from(missed + 1)
            .ok()
            .and_then(|n| self.period.checked_mul(n));
        self.next_due = skip
            .and_then(|step| due.checked_add(step))
            .or_else(|| now.checked_add(self.period));
        true
    }
}
