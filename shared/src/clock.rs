//! Clock - instant source and the 1 Hz ticker driving re-renders

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at an instant, moved by hand
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    pub fn advance(&mut self, by: Duration) {
        self.instant += by;
    }

    pub fn set(&mut self, instant: DateTime<Utc>) {
        self.instant = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Turns a per-frame poll into one tick per interval
///
/// There is no catch-up: after a stall the next poll yields a single tick at
/// the current instant.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    last: Option<DateTime<Utc>>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::seconds(1))
    }

    /// Returns the tick instant if one is due
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let due = match self.last {
            None => true,
            // A clock that jumped backwards also ticks
            Some(last) => now - last >= self.interval || now < last,
        };
        if due {
            self.last = Some(now);
            Some(now)
        } else {
            None
        }
    }

    /// Make the next poll tick immediately
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::every_second()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_poll_ticks() {
        let mut ticker = Ticker::every_second();
        assert_eq!(ticker.poll(start()), Some(start()));
    }

    #[test]
    fn test_at_most_once_per_second() {
        let mut clock = FixedClock::new(start());
        let mut ticker = Ticker::every_second();
        let mut ticks = 0;

        // 60 frames per second for three seconds
        for _ in 0..180 {
            if ticker.poll(clock.now()).is_some() {
                ticks += 1;
            }
            clock.advance(Duration::milliseconds(16));
        }
        assert!((2..=3).contains(&ticks), "ticks = {}", ticks);
    }

    #[test]
    fn test_no_catch_up_after_stall() {
        let mut clock = FixedClock::new(start());
        let mut ticker = Ticker::every_second();
        ticker.poll(clock.now());

        clock.advance(Duration::seconds(90));
        assert_eq!(ticker.poll(clock.now()), Some(clock.now()));
        assert_eq!(ticker.poll(clock.now()), None);

        clock.advance(Duration::milliseconds(999));
        assert_eq!(ticker.poll(clock.now()), None);
        clock.advance(Duration::milliseconds(1));
        assert!(ticker.poll(clock.now()).is_some());
    }

    #[test]
    fn test_reset_forces_tick() {
        let mut ticker = Ticker::every_second();
        ticker.poll(start());
        assert_eq!(ticker.poll(start()), None);
        ticker.reset();
        assert_eq!(ticker.poll(start()), Some(start()));
    }

    #[test]
    fn test_fixed_clock_set() {
        let mut clock = FixedClock::new(start());
        let later = start() + Duration::hours(5);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
