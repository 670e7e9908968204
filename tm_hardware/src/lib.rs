//! Hardware-facing backends: encoder/button state, GPIO wiring, the system
//! shell and a terminal stand-in for the panel.
pub mod board;
pub mod error;
pub mod quadrature;
pub mod shell;
pub mod term;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

pub use board::{Debouncer, SignalBoard};
pub use error::HwError;
pub use quadrature::{Edge, Quadrature};
pub use shell::SystemShell;
pub use term::TermRenderer;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use gpio::{GpioInput, GpioLayout};
