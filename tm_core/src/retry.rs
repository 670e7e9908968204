//! Bounded retry as a policy object.
//!
//! A [`Retry`] combines a stop condition with a wait strategy and runs an
//! operation in one of two modes:
//!
//! - [`Retry::call`]: retry a fallible operation until it succeeds; when the
//!   bound is hit the last error is returned.
//! - [`Retry::until`]: retry an infallible probe until a predicate accepts its
//!   value; when the bound is hit the last value is returned.
//!
//! Time comes from the injected [`Clock`], so tests run without sleeping.
use rand::Rng;
use std::fmt::Display;
use std::time::{Duration, Instant};
use tm_traits::Clock;
use tracing::{debug, warn};

/// When to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAfter {
    /// Wall-clock time since the first attempt.
    Delay(Duration),
    /// Total number of attempts (0 is treated as 1).
    Attempts(u32),
}

/// Pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    None,
    Fixed(Duration),
    /// Uniformly jittered in `[min, max]`.
    Random { min: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    stop: StopAfter,
    wait: Wait,
}

impl Retry {
    pub fn after_delay(limit: Duration) -> Self {
        Self {
            stop: StopAfter::Delay(limit),
            wait: Wait::None,
        }
    }

    pub fn attempts(n: u32) -> Self {
        Self {
            stop: StopAfter::Attempts(n),
            wait: Wait::None,
        }
    }

    #[must_use]
    pub fn wait(mut self, wait: Wait) -> Self {
        self.wait = wait;
        self
    }

    fn exhausted<C: Clock>(&self, clock: &C, start: Instant, attempt: u32) -> bool {
        match self.stop {
            StopAfter::Delay(limit) => clock.elapsed_since(start) >= limit,
            StopAfter::Attempts(n) => attempt >= n.max(1),
        }
    }

    fn pause<C: Clock>(&self, clock: &C) {
        let d = match self.wait {
            Wait::None => return,
            Wait::Fixed(d) => d,
            Wait::Random { min, max } => {
                let lo = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
                let hi = u64::try_from(max.as_millis()).unwrap_or(u64::MAX).max(lo);
                Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
            }
        };
        clock.sleep(d);
    }

    /// Mode (a): run `op` until it returns `Ok`, propagating the last error
    /// once the stop condition is met.
    pub fn call<T, E, C, F>(&self, clock: &C, mut op: F) -> Result<T, E>
    where
        C: Clock,
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let start = clock.now();
        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            match op() {
                Ok(v) => {
                    if attempt > 1 {
                        debug!(attempt, "retry succeeded");
                    }
                    return Ok(v);
                }
                Err(e) if self.exhausted(clock, start, attempt) => {
                    warn!(attempt, error = %e, "retry exhausted");
                    return Err(e);
                }
                Err(e) => {
                    debug!(attempt, error = %e, "attempt failed, retrying");
                    self.pause(clock);
                }
            }
        }
    }

    /// Mode (b): run `op` until `accept` returns true for its value. Never
    /// fails; the last value is returned when the stop condition is met.
    pub fn until<T, C, F, P>(&self, clock: &C, mut op: F, accept: P) -> T
    where
        C: Clock,
        F: FnMut() -> T,
        P: Fn(&T) -> bool,
    {
        let start = clock.now();
        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            let value = op();
            if accept(&value) {
                return value;
            }
            if self.exhausted(clock, start, attempt) {
                debug!(attempt, "retry bound reached, keeping last result");
                return value;
            }
            self.pause(clock);
        }
    }
}
