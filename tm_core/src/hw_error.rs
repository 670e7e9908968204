//! Maps `Box<dyn Error>` from trait boundaries to typed `TmError`.
//!
//! The traits in `tm_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated
//! path for `tm_hardware::HwError` downcasting.

use crate::error::TmError;
use tm_traits::BoxError;

/// Map a trait-boundary error to a typed `TmError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TmError {
    #[cfg(feature = "hardware-errors")]
    {
        use tm_hardware::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Command { .. } => TmError::Shell(hw.to_string()),
                HwError::Gpio(_) | HwError::Io(_) => TmError::Hardware(hw.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        TmError::Timeout(s)
    } else {
        TmError::Hardware(s)
    }
}

/// Shell collaborator failure as a report.
pub(crate) fn shell_report(e: &BoxError) -> eyre::Report {
    let typed = match map_hw_error(e.as_ref()) {
        TmError::Hardware(s) => TmError::Shell(s),
        other => other,
    };
    eyre::Report::new(typed)
}

/// Renderer failure as a report.
pub(crate) fn display_report(e: &BoxError) -> eyre::Report {
    eyre::Report::new(TmError::Display(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_errors_fall_back_to_heuristics() {
        let e: BoxError = "scan timeout after 10s".into();
        assert!(matches!(map_hw_error(e.as_ref()), TmError::Timeout(_)));
        let e: BoxError = "bus fault".into();
        assert_eq!(map_hw_error(e.as_ref()), TmError::Hardware("bus fault".into()));
        assert!(matches!(
            shell_report(&e).downcast_ref::<TmError>(),
            Some(TmError::Shell(_))
        ));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_command_errors_map_to_shell() {
        let e: BoxError = Box::new(tm_hardware::HwError::Command {
            cmd: "iwconfig".into(),
            code: Some(1),
            stderr: String::new(),
        });
        assert!(matches!(map_hw_error(e.as_ref()), TmError::Shell(_)));
    }
}
