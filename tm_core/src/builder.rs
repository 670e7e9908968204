//! Type-state builder for [`Device`].
//!
//! Input, renderer and shell start out as [`Missing`]; `build()` only exists
//! once all three have been supplied. The clock defaults to
//! [`MonotonicClock`] and the layout to [`Layout::default`].

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tm_traits::clock::{Clock, MonotonicClock};
use tm_traits::{InputSource, Renderer, Shell};

use crate::config::Layout;
use crate::device::{Device, DeviceUi};
use crate::error::{BuildError, Result};

/// Placeholder for a collaborator that has not been provided yet.
pub struct Missing;

pub struct DeviceBuilder<I, R, S, C> {
    input: I,
    screen: R,
    shell: S,
    clock: C,
    layout: Layout,
    abort: Option<Arc<AtomicBool>>,
}

impl Default for DeviceBuilder<Missing, Missing, Missing, MonotonicClock> {
    fn default() -> Self {
        Self {
            input: Missing,
            screen: Missing,
            shell: Missing,
            clock: MonotonicClock::new(),
            layout: Layout::default(),
            abort: None,
        }
    }
}

impl Device<Missing, Missing, MonotonicClock, Missing> {
    /// Start building a device context.
    pub fn builder() -> DeviceBuilder<Missing, Missing, Missing, MonotonicClock> {
        DeviceBuilder::default()
    }
}

/// Chainable setters that do not affect type-state.
impl<I, R, S, C> DeviceBuilder<I, R, S, C> {
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Flag checked by every selection tick; raising it ends the run.
    pub fn with_abort(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn with_input<I2: InputSource>(self, input: I2) -> DeviceBuilder<I2, R, S, C> {
        DeviceBuilder {
            input,
            screen: self.screen,
            shell: self.shell,
            clock: self.clock,
            layout: self.layout,
            abort: self.abort,
        }
    }

    pub fn with_screen<R2: Renderer>(self, screen: R2) -> DeviceBuilder<I, R2, S, C> {
        DeviceBuilder {
            input: self.input,
            screen,
            shell: self.shell,
            clock: self.clock,
            layout: self.layout,
            abort: self.abort,
        }
    }

    pub fn with_shell<S2: Shell>(self, shell: S2) -> DeviceBuilder<I, R, S2, C> {
        DeviceBuilder {
            input: self.input,
            screen: self.screen,
            shell,
            clock: self.clock,
            layout: self.layout,
            abort: self.abort,
        }
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock`.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> DeviceBuilder<I, R, S, C2> {
        DeviceBuilder {
            input: self.input,
            screen: self.screen,
            shell: self.shell,
            clock,
            layout: self.layout,
            abort: self.abort,
        }
    }
}

impl<I, R, S, C> DeviceBuilder<I, R, S, C>
where
    I: InputSource,
    R: Renderer,
    S: Shell,
    C: Clock,
{
    pub fn build(self) -> Result<Device<I, R, C, S>> {
        if self.layout.list_rows == 0 {
            return Err(eyre::Report::new(BuildError::InvalidLayout(
                "list_rows must be >= 1",
            )));
        }
        if self.layout.char_window == 0 {
            return Err(eyre::Report::new(BuildError::InvalidLayout(
                "char_window must be >= 1",
            )));
        }
        let bounds = self.screen.bounds();
        if bounds.width() <= 0 || bounds.height() <= 0 {
            return Err(eyre::Report::new(BuildError::InvalidLayout(
                "renderer has an empty surface",
            )));
        }
        tracing::debug!(
            list_rows = self.layout.list_rows,
            char_window = self.layout.char_window,
            width = bounds.width(),
            height = bounds.height(),
            "device context ready"
        );
        Ok(Device {
            ui: DeviceUi {
                input: self.input,
                screen: self.screen,
                clock: self.clock,
                layout: self.layout,
                abort: self.abort,
            },
            shell: self.shell,
        })
    }
}
