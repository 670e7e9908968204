//! Time source for polling loops, waits and retry bounds.
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;

    /// Block for `d`. Simulated clocks advance instead.
    fn sleep(&self, d: Duration);

    /// Time passed since `epoch`; zero if `epoch` lies in the future.
    fn elapsed_since(&self, epoch: Instant) -> Duration {
        self.now().saturating_duration_since(epoch)
    }
}

/// Wall-clock time from `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_clock {
    use super::Clock;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::{Duration, Instant};

    #[derive(Debug, Default)]
    struct State {
        elapsed: Duration,
        sleeps: Vec<Duration>,
    }

    /// Manually driven clock. `sleep` returns at once, moves time forward
    /// and remembers the requested duration. Clones share one timeline.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        state: Arc<Mutex<State>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                state: Arc::default(),
            }
        }

        fn state(&self) -> MutexGuard<'_, State> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn advance(&self, d: Duration) {
            let mut s = self.state();
            s.elapsed = s.elapsed.saturating_add(d);
        }

        pub fn elapsed(&self) -> Duration {
            self.state().elapsed
        }

        /// Durations passed to `sleep`, oldest first.
        pub fn sleeps(&self) -> Vec<Duration> {
            self.state().sleeps.clone()
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            let mut s = self.state();
            s.elapsed = s.elapsed.saturating_add(d);
            s.sleeps.push(d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn sleeping_moves_simulated_time() {
        let clock = TestClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_secs(30));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.elapsed_since(start), Duration::from_millis(30_005));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(30)]);
    }

    #[test]
    fn future_epoch_reads_as_zero() {
        let clock = TestClock::new();
        let later = clock.now() + Duration::from_secs(1);
        assert_eq!(clock.elapsed_since(later), Duration::ZERO);
    }
}
