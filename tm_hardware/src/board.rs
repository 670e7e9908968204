//! Shared input state written by driver callbacks and read by the main flow.
//!
//! Callback threads only ever move the step counter or raise a flag; the
//! main flow polls. Flags are plain atomic booleans so repeated presses
//! collapse into one pending signal. The wake channel has a single slot for
//! the same reason: it only tells a blocked waiter that *some* button moved.
use crossbeam_channel as xch;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::{Duration, Instant};
use tm_traits::{InputSource, Signal};

pub struct SignalBoard {
    steps: AtomicI32,
    min: AtomicI32,
    max: AtomicI32,
    active: AtomicBool,
    flags: [AtomicBool; 3],
    wake_tx: xch::Sender<()>,
    wake_rx: xch::Receiver<()>,
}

impl Default for SignalBoard {
    fn default() -> Self {
        Self::new((i32::MIN, i32::MAX))
    }
}

impl SignalBoard {
    pub fn new(bounds: (i32, i32)) -> Self {
        let (wake_tx, wake_rx) = xch::bounded(1);
        Self {
            steps: AtomicI32::new(0),
            min: AtomicI32::new(bounds.0),
            max: AtomicI32::new(bounds.1),
            active: AtomicBool::new(false),
            flags: [
                AtomicBool::new(false),
                AtomicBool::new(false),
                AtomicBool::new(false),
            ],
            wake_tx,
            wake_rx,
        }
    }

    /// Encoder moved by `delta` detents. Bounds are not applied until `settle`.
    pub fn twist(&self, delta: i32) {
        self.active.store(true, Ordering::Relaxed);
        let steps = self.steps.fetch_add(delta, Ordering::Relaxed).saturating_add(delta);
        tracing::trace!(steps, "encoder twist");
    }

    /// Encoder came to rest: clamp the position into the current bounds.
    pub fn settle(&self) {
        let lo = self.min.load(Ordering::Relaxed);
        let hi = self.max.load(Ordering::Relaxed);
        let _ = self
            .steps
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| {
                Some(s.clamp(lo, hi.max(lo)))
            });
        self.active.store(false, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn bounds(&self) -> (i32, i32) {
        (
            self.min.load(Ordering::Relaxed),
            self.max.load(Ordering::Relaxed),
        )
    }

    /// A mapped button was pressed.
    pub fn press(&self, signal: Signal) {
        tracing::debug!(?signal, "button pressed");
        self.flags[signal.index()].store(true, Ordering::Release);
        self.wake();
    }

    /// Any button was pressed, mapped or not.
    pub fn wake(&self) {
        // Full slot means a wake is already pending; that is enough.
        let _ = self.wake_tx.try_send(());
    }

    fn drain_wakes(&self) {
        while self.wake_rx.try_recv().is_ok() {}
    }
}

impl InputSource for SignalBoard {
    fn steps(&self) -> i32 {
        self.steps.load(Ordering::Relaxed)
    }

    fn reset(&self, bounds: (i32, i32)) {
        self.min.store(bounds.0, Ordering::Relaxed);
        self.max.store(bounds.1, Ordering::Relaxed);
        self.steps.store(0, Ordering::Relaxed);
    }

    fn is_set(&self, signal: Signal) -> bool {
        self.flags[signal.index()].load(Ordering::Acquire)
    }

    fn clear(&self, signal: Signal) {
        self.flags[signal.index()].store(false, Ordering::Release);
    }

    fn wait_for_press(&self, timeout: Duration) -> bool {
        self.drain_wakes();
        let pressed = self.wake_rx.recv_timeout(timeout).is_ok();
        self.drain_wakes();
        pressed
    }
}

/// Time-based contact debouncer for one button.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns true when an edge at `now` counts as a new press.
    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last {
            Some(prev) if now.saturating_duration_since(prev) < self.window => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debouncer_drops_chatter_inside_window() {
        let mut d = Debouncer::new(Duration::from_millis(20));
        let t0 = Instant::now();
        assert!(d.accept(t0));
        assert!(!d.accept(t0 + Duration::from_millis(5)));
        assert!(!d.accept(t0 + Duration::from_millis(19)));
        assert!(d.accept(t0 + Duration::from_millis(25)));
    }

    #[test]
    fn settle_uses_bounds_installed_by_reset() {
        let board = SignalBoard::default();
        board.reset((-1, 3));
        board.twist(-4);
        board.settle();
        assert_eq!(board.steps(), -1);
        assert_eq!(board.bounds(), (-1, 3));
    }
}
