pub mod clock;
pub mod display;

pub use clock::{Clock, MonotonicClock};
pub use display::{Point, Rect, Tone};

/// Error type used at every trait boundary in the workspace.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Button signals the selection engine reacts to.
///
/// Signals are level flags, not events: pressing twice before the main loop
/// polls still reads as a single pending signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Re-derive the current choice list (e.g. re-scan networks).
    Rewind,
    /// Accept the highlighted choice / character.
    Select,
    /// Finish character entry.
    Stop,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Rewind, Signal::Select, Signal::Stop];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Signal::Rewind => 0,
            Signal::Select => 1,
            Signal::Stop => 2,
        }
    }
}

/// Encoder + buttons as seen by the main flow.
///
/// Implementations are shared with driver callback threads, hence `&self`
/// everywhere; they must use interior mutability.
pub trait InputSource {
    /// Current encoder position in detents.
    fn steps(&self) -> i32;

    /// Zero the encoder and install new inclusive clamping bounds.
    fn reset(&self, bounds: (i32, i32));

    fn is_set(&self, signal: Signal) -> bool;

    fn clear(&self, signal: Signal);

    /// Block for at most `timeout` waiting for any button press.
    ///
    /// Presses that happened before the call are discarded. Returns `true`
    /// when the wait was cut short by a press.
    fn wait_for_press(&self, timeout: std::time::Duration) -> bool;

    fn clear_all(&self) {
        for s in Signal::ALL {
            self.clear(s);
        }
    }
}

/// Text renderer for the appliance panel.
///
/// Coordinates are in pixels with the origin at the top-left corner. When
/// `flush` is false the drawing may be buffered until the next flushing call.
pub trait Renderer {
    fn bounds(&self) -> Rect;
    fn line_height(&self) -> i32;
    fn text_width(&self, text: &str) -> i32;
    fn clear(&mut self) -> Result<(), BoxError>;
    fn clear_area(&mut self, area: Rect, flush: bool) -> Result<(), BoxError>;
    fn draw_text(&mut self, text: &str, at: Point, tone: Tone, flush: bool)
    -> Result<(), BoxError>;
}

/// Line-oriented access to the OS network tooling.
pub trait Shell {
    /// Run `cmd` and capture stdout. A non-zero exit status is an error.
    fn output(&mut self, cmd: &str) -> Result<String, BoxError>;

    /// Run `cmd` for its side effect only; returns whether it exited successfully.
    fn status(&mut self, cmd: &str) -> Result<bool, BoxError>;
}

impl<T: InputSource + ?Sized> InputSource for std::sync::Arc<T> {
    fn steps(&self) -> i32 {
        (**self).steps()
    }
    fn reset(&self, bounds: (i32, i32)) {
        (**self).reset(bounds);
    }
    fn is_set(&self, signal: Signal) -> bool {
        (**self).is_set(signal)
    }
    fn clear(&self, signal: Signal) {
        (**self).clear(signal);
    }
    fn wait_for_press(&self, timeout: std::time::Duration) -> bool {
        (**self).wait_for_press(timeout)
    }
}

impl<T: Renderer + ?Sized> Renderer for Box<T> {
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }
    fn line_height(&self) -> i32 {
        (**self).line_height()
    }
    fn text_width(&self, text: &str) -> i32 {
        (**self).text_width(text)
    }
    fn clear(&mut self) -> Result<(), BoxError> {
        (**self).clear()
    }
    fn clear_area(&mut self, area: Rect, flush: bool) -> Result<(), BoxError> {
        (**self).clear_area(area, flush)
    }
    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        tone: Tone,
        flush: bool,
    ) -> Result<(), BoxError> {
        (**self).draw_text(text, at, tone, flush)
    }
}

impl<T: Shell + ?Sized> Shell for Box<T> {
    fn output(&mut self, cmd: &str) -> Result<String, BoxError> {
        (**self).output(cmd)
    }
    fn status(&mut self, cmd: &str) -> Result<bool, BoxError> {
        (**self).status(cmd)
    }
}
