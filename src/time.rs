//! Clock abstraction and spend-window boundaries
//!
//! The orchestrator and the sweeper never call the system clock directly;
//! they go through the [`Clock`] trait so that limit windows and expiration
//! can be tested against a controlled point in time.
//!
//! Spend windows use local-time semantics: the daily window opens at 00:00
//! of the current day, the monthly window at 00:00 of day 1 of the current
//! month.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;

/// Source of the current local date and time
pub trait Clock: Send + Sync {
    /// The current moment, local time
    fn now(&self) -> NaiveDateTime;

    /// The current date, local time
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Production clock reading the system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that can be moved from the outside
///
/// Used by tests and by scenario replay, where operations may carry an
/// explicit timestamp to make limit windows and expiration deterministic.
#[derive(Debug)]
pub struct SteppingClock(Mutex<NaiveDateTime>);

impl SteppingClock {
    /// A clock initially reporting `start`
    pub fn starting_at(start: NaiveDateTime) -> Self {
        SteppingClock(Mutex::new(start))
    }

    /// Move the clock to `now`
    pub fn set(&self, now: NaiveDateTime) {
        *self.0.lock() = now;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock()
    }
}

/// Start of the calendar day containing `now`
pub fn start_of_day(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(NaiveTime::MIN)
}

/// Start of the calendar month containing `now` (day 1, 00:00)
pub fn start_of_month(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    // Day 1 always exists for a valid (year, month) pair.
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date)
        .and_time(NaiveTime::MIN)
}
