#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Provisioning console logic (hardware-agnostic).
//!
//! Every hardware interaction goes through the `tm_traits` seams:
//! `InputSource` (knob and buttons), `Renderer` (panel), `Shell` (OS network
//! tooling) and `Clock`.
//!
//! ## Architecture
//!
//! - **Device**: input, panel, clock and shell assembled by a type-state
//!   builder (`device`, `builder`)
//! - **Selection**: knob-driven list picking and character entry (`selection`)
//! - **Network**: scanning, link and address checks (`scan`, `net`)
//! - **Persistence**: supplicant rendering and installation (`supplicant`)
//! - **Flow**: provisioning and the top-level run (`provision`, `runner`)
//! - **Retry**: bounded retries with fixed or jittered waits (`retry`, `monitor`)

pub mod builder;
pub mod charset;
pub mod config;
pub mod conversions;
pub mod device;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod net;
pub mod provision;
pub mod retry;
pub mod runner;
pub mod scan;
pub mod selection;
pub mod supplicant;
pub mod types;

pub use builder::{DeviceBuilder, Missing};
pub use charset::CharSet;
pub use config::{Layout, MonitorCfg, PersistCfg, ProvisionCfg, RunCfg};
pub use device::{Device, DeviceUi};
pub use error::{BuildError, Result, TmError};
pub use monitor::{Link, Monitor, MonitorReport};
pub use retry::{Retry, StopAfter, Wait};
pub use runner::Outcome;
pub use selection::ChoiceSource;
pub use types::{ExtraFields, WifiCredential};
