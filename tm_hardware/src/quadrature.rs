//! Detented quadrature decoding for the rotary encoder.
//!
//! Pins are pulled up, so the rest position between detents is A=1, B=1.
//! One detent is four valid Gray-code transitions. A step is reported as soon
//! as the knob is half-way (two transitions in one direction) so the UI feels
//! responsive; if the knob falls back to rest without completing the cycle
//! the step is reverted.

const REST: u8 = 0b11;

// Indexed by (prev << 2) | curr.
const TRANSITION: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

#[derive(Debug, Clone)]
pub struct Quadrature {
    prev: u8,
    acc: i8,
    emitted: i8,
}

/// What a pin edge did to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edge {
    /// Detents to add to the step counter.
    pub delta: i32,
    /// Both pins are back at rest; the position may be clamped now.
    pub at_rest: bool,
}

impl Default for Quadrature {
    fn default() -> Self {
        Self::new()
    }
}

impl Quadrature {
    pub fn new() -> Self {
        Self {
            prev: REST,
            acc: 0,
            emitted: 0,
        }
    }

    /// Feed the current pin levels (true = high).
    pub fn update(&mut self, a: bool, b: bool) -> Edge {
        let curr = (u8::from(a) << 1) | u8::from(b);
        if curr == self.prev {
            return Edge::default();
        }
        self.acc += TRANSITION[usize::from((self.prev << 2) | curr)];
        self.prev = curr;

        let mut delta = 0;
        if self.emitted == 0 && self.acc.abs() >= 2 {
            self.emitted = self.acc.signum();
            delta = i32::from(self.emitted);
        }

        if curr != REST {
            return Edge {
                delta,
                at_rest: false,
            };
        }

        let full = self.acc.abs() >= 4;
        if self.emitted != 0 && !full {
            delta -= i32::from(self.emitted);
        } else if self.emitted == 0 && full {
            delta += i32::from(self.acc.signum());
        }
        self.acc = 0;
        self.emitted = 0;
        Edge {
            delta,
            at_rest: true,
        }
    }
}
