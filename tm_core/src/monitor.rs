//! Bounded connectivity checks.
//!
//! The first attempt just looks at the link. Every later attempt restarts
//! the supplicant and waits for it to settle before looking again; a button
//! press during the wait gives up early with the last known status.
use std::time::Duration;
use tracing::{debug, info};

/// What the monitor needs from the outside world.
pub trait Link {
    /// Is the interface associated right now?
    fn check(&mut self) -> bool;
    /// Kick the supplicant.
    fn restart(&mut self);
    /// Wait up to `d`; true when cut short by a button.
    fn settle(&mut self, d: Duration) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Checking,
    RetryWait,
    Connected,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorReport {
    pub connected: bool,
    /// Number of `Link::check` calls made.
    pub checks: u32,
    /// A button ended a settle wait.
    pub interrupted: bool,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    max_attempts: u32,
    settle: Duration,
    /// Skip restarts and waits (forced provisioning runs).
    test_mode: bool,
}

impl Monitor {
    pub fn new(max_attempts: u32, settle: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            settle,
            test_mode: false,
        }
    }

    #[must_use]
    pub fn test_mode(mut self, on: bool) -> Self {
        self.test_mode = on;
        self
    }

    pub fn run<L: Link + ?Sized>(&self, link: &mut L) -> MonitorReport {
        let mut state = MonitorState::Checking;
        let mut report = MonitorReport {
            connected: false,
            checks: 0,
            interrupted: false,
        };
        loop {
            debug!(?state, checks = report.checks, "monitor");
            state = match state {
                MonitorState::Checking => {
                    report.checks += 1;
                    report.connected = link.check();
                    if report.connected {
                        MonitorState::Connected
                    } else if report.checks >= self.max_attempts {
                        MonitorState::Failed
                    } else {
                        MonitorState::RetryWait
                    }
                }
                MonitorState::RetryWait => {
                    if !self.test_mode {
                        link.restart();
                        if link.settle(self.settle) {
                            report.interrupted = true;
                            info!(checks = report.checks, "connectivity wait interrupted");
                            return report;
                        }
                    }
                    MonitorState::Checking
                }
                MonitorState::Connected | MonitorState::Failed => break,
            };
        }
        info!(
            connected = report.connected,
            checks = report.checks,
            "connectivity monitor finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeLink {
        answers: VecDeque<bool>,
        restarts: u32,
        waits: Vec<Duration>,
        press_on_wait: Option<usize>,
    }

    impl Link for FakeLink {
        fn check(&mut self) -> bool {
            self.answers.pop_front().unwrap_or(false)
        }
        fn restart(&mut self) {
            self.restarts += 1;
        }
        fn settle(&mut self, d: Duration) -> bool {
            self.waits.push(d);
            self.press_on_wait == Some(self.waits.len())
        }
    }

    #[test]
    fn connects_on_third_check() {
        let mut link = FakeLink {
            answers: [false, false, true].into(),
            ..Default::default()
        };
        let r = Monitor::new(7, Duration::from_secs(10)).run(&mut link);
        assert_eq!(
            r,
            MonitorReport {
                connected: true,
                checks: 3,
                interrupted: false
            }
        );
        assert_eq!(link.restarts, 2);
        assert_eq!(link.waits, vec![Duration::from_secs(10); 2]);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut link = FakeLink::default();
        let r = Monitor::new(4, Duration::from_secs(1)).run(&mut link);
        assert!(!r.connected);
        assert_eq!(r.checks, 4);
        assert_eq!(link.restarts, 3);
    }

    #[test]
    fn button_during_wait_returns_early() {
        let mut link = FakeLink {
            press_on_wait: Some(1),
            ..Default::default()
        };
        let r = Monitor::new(7, Duration::from_secs(1)).run(&mut link);
        assert!(r.interrupted);
        assert!(!r.connected);
        assert_eq!(r.checks, 1);
    }

    #[test]
    fn test_mode_skips_restart_and_wait() {
        let mut link = FakeLink {
            answers: [false, true].into(),
            ..Default::default()
        };
        let r = Monitor::new(3, Duration::from_secs(1))
            .test_mode(true)
            .run(&mut link);
        assert!(r.connected);
        assert_eq!(link.restarts, 0);
        assert!(link.waits.is_empty());
    }
}
