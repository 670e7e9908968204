//! Raspberry Pi GPIO wiring for the encoder and buttons (rppal).
//!
//! Every pin is an input with pull-up and an async interrupt. Interrupt
//! callbacks run on rppal's poll thread and only touch the `SignalBoard`.
use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tm_traits::{InputSource, Signal};
use tracing::{debug, info, warn};

use crate::board::{Debouncer, SignalBoard};
use crate::error::{HwError, Result};
use crate::quadrature::Quadrature;

/// BCM pin numbers for the knob and buttons.
#[derive(Debug, Clone)]
pub struct GpioLayout {
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub select: u8,
    pub stop: u8,
    pub rewind: u8,
    /// Buttons that only interrupt waits.
    pub wake: Vec<u8>,
    pub debounce: Duration,
}

pub struct GpioInput {
    board: Arc<SignalBoard>,
    // Held so the interrupts stay armed.
    pins: Vec<InputPin>,
}

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

struct EncoderPins {
    a: bool,
    b: bool,
    decoder: Quadrature,
}

impl GpioInput {
    pub fn new(layout: &GpioLayout, board: Arc<SignalBoard>) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let mut pins = Vec::with_capacity(5 + layout.wake.len());

        let mut a = gpio.get(layout.encoder_a).map_err(gpio_err)?.into_input_pullup();
        let mut b = gpio.get(layout.encoder_b).map_err(gpio_err)?.into_input_pullup();
        let state = Arc::new(Mutex::new(EncoderPins {
            a: a.is_high(),
            b: b.is_high(),
            decoder: Quadrature::new(),
        }));
        for (pin, is_a) in [(&mut a, true), (&mut b, false)] {
            let state = state.clone();
            let board = board.clone();
            pin.set_async_interrupt(Trigger::Both, move |level: Level| {
                let Ok(mut s) = state.lock() else { return };
                if is_a {
                    s.a = level == Level::High;
                } else {
                    s.b = level == Level::High;
                }
                let (pa, pb) = (s.a, s.b);
                let edge = s.decoder.update(pa, pb);
                if edge.delta != 0 {
                    board.twist(edge.delta);
                }
                if edge.at_rest {
                    board.settle();
                }
            })
            .map_err(gpio_err)?;
        }
        pins.push(a);
        pins.push(b);

        let mapped = [
            (layout.select, Some(Signal::Select)),
            (layout.stop, Some(Signal::Stop)),
            (layout.rewind, Some(Signal::Rewind)),
        ];
        let unmapped = layout.wake.iter().map(|&p| (p, None));
        for (pin_no, signal) in mapped.into_iter().chain(unmapped) {
            let mut pin = gpio.get(pin_no).map_err(gpio_err)?.into_input_pullup();
            let board = board.clone();
            let mut debouncer = Debouncer::new(layout.debounce);
            pin.set_async_interrupt(Trigger::FallingEdge, move |_level: Level| {
                if !debouncer.accept(Instant::now()) {
                    return;
                }
                match signal {
                    Some(s) => board.press(s),
                    None => board.wake(),
                }
            })
            .map_err(gpio_err)?;
            debug!(pin = pin_no, ?signal, "button armed");
            pins.push(pin);
        }

        info!(
            encoder_a = layout.encoder_a,
            encoder_b = layout.encoder_b,
            buttons = pins.len() - 2,
            "gpio input ready"
        );
        Ok(Self { board, pins })
    }
}

impl Drop for GpioInput {
    fn drop(&mut self) {
        for pin in &mut self.pins {
            if let Err(e) = pin.clear_async_interrupt() {
                warn!(error = %e, "failed to clear interrupt");
            }
        }
    }
}

impl InputSource for GpioInput {
    fn steps(&self) -> i32 {
        self.board.steps()
    }
    fn reset(&self, bounds: (i32, i32)) {
        self.board.reset(bounds);
    }
    fn is_set(&self, signal: Signal) -> bool {
        self.board.is_set(signal)
    }
    fn clear(&self, signal: Signal) {
        self.board.clear(signal);
    }
    fn wait_for_press(&self, timeout: Duration) -> bool {
        self.board.wait_for_press(timeout)
    }
}
