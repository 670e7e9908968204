//! The device context: input, panel, clock and layout, plus the shell.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tm_traits::{Clock, InputSource, Point, Renderer, Signal, Tone};

use crate::config::Layout;
use crate::error::{Result, TmError};
use crate::hw_error::display_report;

/// Input, panel and clock used by the selection loops.
pub struct DeviceUi<I, R, C> {
    pub(crate) input: I,
    pub(crate) screen: R,
    pub(crate) clock: C,
    pub(crate) layout: Layout,
    pub(crate) abort: Option<Arc<AtomicBool>>,
}

/// Everything the provisioning flow talks to, built once at startup.
///
/// The shell lives next to the UI rather than inside it so a choice producer
/// can borrow the shell while a selection loop borrows the UI.
pub struct Device<I, R, C, S> {
    pub ui: DeviceUi<I, R, C>,
    pub shell: S,
}

impl<I, R, C> DeviceUi<I, R, C>
where
    I: InputSource,
    R: Renderer,
    C: Clock,
{
    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn screen(&self) -> &R {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut R {
        &mut self.screen
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Fails with `TmError::Interrupted` once the abort flag is raised.
    pub fn check_abort(&self) -> Result<()> {
        match &self.abort {
            Some(flag) if flag.load(Ordering::Acquire) => Err(TmError::Interrupted.into()),
            _ => Ok(()),
        }
    }

    pub fn clear_screen(&mut self) -> Result<()> {
        self.screen.clear().map_err(|e| display_report(&e))
    }

    /// Clear the panel and show `text` at the top-left corner.
    pub fn show(&mut self, text: &str, tone: Tone) -> Result<()> {
        self.clear_screen()?;
        self.show_at(text, Point::new(0, 0), tone)
    }

    /// Draw `text` without clearing and flush.
    pub fn show_at(&mut self, text: &str, at: Point, tone: Tone) -> Result<()> {
        self.screen
            .draw_text(text, at, tone, true)
            .map_err(|e| display_report(&e))
    }

    /// Block for `d` unless a button is pressed first. Returns true when cut short.
    pub fn pause(&self, d: Duration) -> bool {
        let pressed = self.input.wait_for_press(d);
        if pressed {
            tracing::debug!(?d, "wait skipped by button");
        }
        pressed
    }

    pub fn clear_signals(&self) {
        for s in Signal::ALL {
            self.input.clear(s);
        }
    }

    /// Clear the panel and draw a header; returns the y just below it.
    pub(crate) fn header(&mut self, text: &str) -> Result<i32> {
        self.show(text, Tone::Header)?;
        let lines = i32::try_from(text.matches('\n').count()).unwrap_or(i32::MAX);
        Ok(self.screen.line_height().saturating_mul(lines.saturating_add(1)))
    }

    pub(crate) fn draw(&mut self, text: &str, at: Point, tone: Tone, flush: bool) -> Result<()> {
        self.screen
            .draw_text(text, at, tone, flush)
            .map_err(|e| display_report(&e))
    }

    pub(crate) fn clear_region(&mut self, area: tm_traits::Rect, flush: bool) -> Result<()> {
        self.screen
            .clear_area(area, flush)
            .map_err(|e| display_report(&e))
    }
}
