use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TmError {
    #[error("no choices to select from")]
    EmptyChoices,
    #[error("hardware init failed: {0}")]
    HardwareInit(String),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("shell command failed: {0}")]
    Shell(String),
    #[error("display error: {0}")]
    Display(String),
    #[error("failed to persist network config: {0}")]
    Persist(String),
    #[error("invalid ssid: {0}")]
    InvalidSsid(String),
    #[error("interrupted")]
    Interrupted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid layout: {0}")]
    InvalidLayout(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
