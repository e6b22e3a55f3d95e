//! Time source for the tracker and reports.
//!
//! All timestamps are local wall-clock time without an offset, matching the
//! `YYYY-MM-DD HH:MM:SS` strings stored on disk.

use std::cell::Cell;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};

pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the operating system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        // Whole seconds only; sub-second precision never reaches the store.
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(parse_timestamp("2024-03-01 09:00:00").unwrap());
        clock.advance(Duration::minutes(45) + Duration::seconds(30));
        assert_eq!(clock.now(), parse_timestamp("2024-03-01 09:45:30").unwrap());
        assert_eq!(clock.today().to_string(), "2024-03-01");
    }

    #[test]
    fn test_system_clock_has_no_subsecond_part() {
        assert_eq!(SystemClock.now().nanosecond(), 0);
    }
}
