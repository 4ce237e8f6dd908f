//! Coalescing rate limiter for deferred state commits.
//!
//! At most one apply-action is scheduled at a time. Values offered while an
//! action is pending overwrite the pending value instead of queuing, so the
//! action always commits the most recent value once its delay has elapsed.

use std::time::{Duration, Instant};

/// Source of the current time for scheduling deferred actions.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Trailing-value throttle state: a pending value plus an optional deadline.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    delay: Duration,
    deadline: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            pending: None,
        }
    }

    /// Stores `value` as the latest pending value.
    ///
    /// Schedules an apply-action at `now + delay` if none is pending and
    /// returns `true` in that case.
    pub fn offer(&mut self, value: T, now: Instant) -> bool {
        self.pending = Some(value);
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    /// Fires the scheduled action if its deadline has passed.
    ///
    /// Returns the latest pending value and clears the scheduled flag so the
    /// next offer schedules a fresh action.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drops the scheduled action and the pending value.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Manually advanced clock shared between a test and the code under test.
    #[derive(Debug, Clone)]
    pub(crate) struct ManualClock {
        now: Rc<Cell<Instant>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(Instant::now())),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }

    #[test]
    fn test_offer_schedules_once() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::new(Duration::from_millis(100));

        assert!(throttle.offer(1, clock.now()));
        assert!(!throttle.offer(2, clock.now()));
        assert!(!throttle.offer(3, clock.now()));
        assert!(throttle.is_scheduled());
        assert_eq!(throttle.pending(), Some(&3));
    }

    #[test]
    fn test_take_due_waits_for_deadline() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::new(Duration::from_millis(100));
        throttle.offer("a", clock.now());

        clock.advance(Duration::from_millis(99));
        assert_eq!(throttle.take_due(clock.now()), None);

        clock.advance(Duration::from_millis(1));
        assert_eq!(throttle.take_due(clock.now()), Some("a"));
        assert!(!throttle.is_scheduled());
        assert_eq!(throttle.take_due(clock.now()), None);
    }

    #[test]
    fn test_fires_latest_value_not_scheduled_value() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::new(Duration::from_millis(100));
        throttle.offer(1, clock.now());
        clock.advance(Duration::from_millis(50));
        throttle.offer(2, clock.now());
        clock.advance(Duration::from_millis(49));
        throttle.offer(3, clock.now());
        clock.advance(Duration::from_millis(1));

        assert_eq!(throttle.take_due(clock.now()), Some(3));
    }

    #[test]
    fn test_new_window_after_fire() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::new(Duration::from_millis(100));
        throttle.offer(1, clock.now());
        clock.advance(Duration::from_millis(100));
        assert_eq!(throttle.take_due(clock.now()), Some(1));

        assert!(throttle.offer(2, clock.now()));
        clock.advance(Duration::from_millis(60));
        assert_eq!(throttle.take_due(clock.now()), None);
        clock.advance(Duration::from_millis(40));
        assert_eq!(throttle.take_due(clock.now()), Some(2));
    }

    #[test]
    fn test_cancel_discards_pending() {
        let clock = ManualClock::new();
        let mut throttle = Throttle::new(Duration::from_millis(100));
        throttle.offer(7, clock.now());
        throttle.cancel();

        clock.advance(Duration::from_secs(1));
        assert_eq!(throttle.take_due(clock.now()), None);
        assert_eq!(throttle.pending(), None);
    }
}
