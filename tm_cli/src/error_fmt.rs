//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use tm_core::{BuildError, TmError};

    // Typed matches first
    if let Some(BuildError::InvalidLayout(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: The display layout is unusable ({msg}).\nLikely causes: [display] values of 0 or a renderer with no surface.\nHow to fix: Set display.list_rows, display.char_window, width and height to positive values."
        );
    }

    if let Some(te) = err.downcast_ref::<TmError>() {
        return match te {
            TmError::HardwareInit(e) => format!(
                "What happened: The knob and buttons could not be set up ({e}).\nLikely causes: Wrong [pins] numbers, missing GPIO permissions, or another process holding the pins.\nHow to fix: Check the [pins] section, run as a user in the gpio group, or raise timing.hw_init_timeout_ms."
            ),
            TmError::Persist(e) => format!(
                "What happened: The network config could not be written ({e}).\nLikely causes: No sudo rights, a read-only filesystem, or a missing directory.\nHow to fix: Check network.wpa_path and network.privileged, and that sudo works without a password."
            ),
            TmError::Shell(e) => format!(
                "What happened: A network command failed ({e}).\nLikely causes: Wireless tools (iwlist, iwconfig) missing or the interface name is wrong.\nHow to fix: Install wireless-tools and check network.interface."
            ),
            TmError::Timeout(e) => format!(
                "What happened: An operation timed out ({e}).\nLikely causes: The radio is blocked or the scan takes longer than allowed.\nHow to fix: Run `rfkill list`, or raise timing.scan_timeout_ms."
            ),
            TmError::InvalidSsid(e) => format!(
                "What happened: The network name could not be encoded ({e}).\nLikely causes: A malformed \\x or \\u escape, or an escaped character above \\xff.\nHow to fix: Re-enter the name; use \\xHH with two hex digits for raw bytes."
            ),
            TmError::EmptyChoices => "What happened: A selection list was empty.\nLikely causes: Internal error; every list carries at least one entry.\nHow to fix: Re-run with --log-level=debug and report the log.".to_string(),
            TmError::Interrupted => "What happened: The run was interrupted.\nLikely causes: Ctrl-C, or the simulated input script ran out.\nHow to fix: Start a new run.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Check the path. Original: {msg}"
        );
    }

    if lower.starts_with("parse config") {
        return format!(
            "What happened: The config file is not valid TOML for this program.\nLikely causes: A typo or a value of the wrong type.\nHow to fix: Compare against the sample config. Original: {msg}"
        );
    }

    if ["network.", "timing.", "monitor.", "display.", "pins.", "logging."]
        .iter()
        .any(|s| lower.contains(s))
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range or conflicting values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes; 0 and 3 are reserved for finished runs.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use tm_core::TmError;
    match err.downcast_ref::<TmError>() {
        Some(TmError::Persist(_)) => 4,
        Some(TmError::EmptyChoices) => 5,
        Some(TmError::HardwareInit(_)) => 6,
        Some(TmError::Interrupted) => 130,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    use tm_core::TmError;
    match err.downcast_ref::<TmError>() {
        Some(TmError::EmptyChoices) => "EmptyChoices",
        Some(TmError::HardwareInit(_)) => "HardwareInit",
        Some(TmError::Hardware(_)) => "Hardware",
        Some(TmError::Timeout(_)) => "Timeout",
        Some(TmError::Shell(_)) => "Shell",
        Some(TmError::Display(_)) => "Display",
        Some(TmError::Persist(_)) => "Persist",
        Some(TmError::InvalidSsid(_)) => "InvalidSsid",
        Some(TmError::Interrupted) => "Interrupted",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tm_core::TmError;

    #[rstest]
    #[case(TmError::Persist("sudo mv".into()), 4, "Persist")]
    #[case(TmError::EmptyChoices, 5, "EmptyChoices")]
    #[case(TmError::HardwareInit("gpio".into()), 6, "HardwareInit")]
    #[case(TmError::Interrupted, 130, "Interrupted")]
    #[case(TmError::Shell("iwlist".into()), 1, "Shell")]
    fn typed_errors_map_to_codes(#[case] e: TmError, #[case] code: i32, #[case] reason: &str) {
        let r = eyre::Report::new(e);
        assert_eq!(exit_code_for_error(&r), code);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&r)).unwrap();
        assert_eq!(v["reason"], reason);
        assert_eq!(v["exit_code"], code);
        assert!(v["message"].as_str().unwrap().starts_with("What happened"));
    }

    #[test]
    fn config_messages_are_explained() {
        let r = eyre::eyre!("timing.list_poll_ms must be >= 1");
        assert!(humanize(&r).contains("Configuration is invalid"));
        assert_eq!(exit_code_for_error(&r), 1);
        assert_eq!(reason_name(&r), "Error");
    }
}
