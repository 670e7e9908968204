//! `sh -c` backed implementation of the shell collaborator.
use std::process::{Command, Stdio};
use tm_traits::{BoxError, Shell};
use tracing::{debug, trace};

use crate::error::HwError;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }

    fn run(cmd: &str) -> Result<std::process::Output, HwError> {
        debug!(cmd, "shell");
        let out = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .output()?;
        trace!(cmd, status = ?out.status, "shell done");
        Ok(out)
    }
}

impl Shell for SystemShell {
    fn output(&mut self, cmd: &str) -> Result<String, BoxError> {
        let out = Self::run(cmd)?;
        if !out.status.success() {
            return Err(Box::new(HwError::Command {
                cmd: cmd.to_string(),
                code: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn status(&mut self, cmd: &str) -> Result<bool, BoxError> {
        Ok(Self::run(cmd)?.status.success())
    }
}
