use std::process::{Child, Command, ExitStatus};

use crate::error::{Error, Result};

/// Answers "is the traced root still running?" between sampling cycles.
pub trait Liveness {
    fn pid(&self) -> u32;
    fn is_running(&mut self) -> bool;
}

/// The traced command, spawned with inherited stdio.
pub struct LaunchedCommand {
    child: Child,
    exit_status: Option<ExitStatus>,
}

impl LaunchedCommand {
    pub fn spawn(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or(Error::InvalidInvocation)?;
        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|source| Error::Launch {
                command: command.join(" "),
                source,
            })?;
        tracing::info!(pid = child.id(), command = %command.join(" "), "launched");
        Ok(LaunchedCommand {
            child,
            exit_status: None,
        })
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Blocks until the command exits, reaping it.
    pub fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }
        let status = self.child.wait()?;
        self.exit_status = Some(status);
        Ok(status)
    }
}

impl Liveness for LaunchedCommand {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn is_running(&mut self) -> bool {
        if self.exit_status.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!(pid = self.child.id(), %status, "root process exited");
                self.exit_status = Some(status);
                false
            }
            Err(e) => {
                tracing::warn!(pid = self.child.id(), error = %e, "cannot poll root process");
                false
            }
        }
    }
}
