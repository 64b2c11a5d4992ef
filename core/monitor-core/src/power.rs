//! Host power-off.

use std::process::{Command, Stdio};

use crate::error::{MonitorError, Result};

/// Irreversible host shutdown, invoked once at the end of the shutdown
/// sequence. On a real host the machine goes down shortly after this returns.
pub trait PowerOff {
    fn power_off(&mut self) -> Result<()>;
}

impl<T: PowerOff + ?Sized> PowerOff for Box<T> {
    fn power_off(&mut self) -> Result<()> {
        (**self).power_off()
    }
}

/// Runs a shutdown command such as `sudo shutdown -h now`.
#[derive(Debug, Clone)]
pub struct CommandPowerOff {
    command: Vec<String>,
}

impl CommandPowerOff {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn display(&self) -> String {
        self.command.join(" ")
    }

    /// Fails when the command cannot succeed unattended. As root anything
    /// goes. Otherwise the command must go through `sudo -n`, and sudo must
    /// confirm (without prompting) that the command is allowed.
    pub fn check_privilege(&self) -> Result<()> {
        self.check_privilege_as(is_root())
    }

    fn check_privilege_as(&self, root: bool) -> Result<()> {
        if root {
            return Ok(());
        }
        let Some((program, args)) = self
            .command
            .split_first()
            .filter(|(program, _)| is_sudo(program))
        else {
            return Err(MonitorError::PowerPrivilege(format!(
                "`{}` needs root; run as root or prefix the command with `sudo -n`",
                self.display()
            )));
        };

        let options = args.iter().take_while(|arg| arg.starts_with('-'));
        if !options.clone().any(|arg| arg == "-n" || arg == "--non-interactive") {
            return Err(MonitorError::PowerPrivilege(format!(
                "`{}` may prompt for a password at shutdown; add `-n` after sudo",
                self.display()
            )));
        }

        let target = args.iter().skip(options.count());
        let status = Command::new(program)
            .args(["-n", "-l"])
            .args(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| {
                MonitorError::PowerPrivilege(format!("running {}: {}", program, err))
            })?;
        if !status.success() {
            return Err(MonitorError::PowerPrivilege(format!(
                "sudo does not allow `{}` without a password ({})",
                self.display(),
                status
            )));
        }
        tracing::debug!(command = %self.display(), "Power-off command allowed by sudo");
        Ok(())
    }
}

impl PowerOff for CommandPowerOff {
    fn power_off(&mut self) -> Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(MonitorError::PowerOff {
                command: String::new(),
                details: "empty command".to_string(),
            });
        };

        tracing::warn!(command = %self.display(), "Powering off host");
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|err| MonitorError::PowerOff {
                command: self.display(),
                details: err.to_string(),
            })?;

        if !status.success() {
            return Err(MonitorError::PowerOff {
                command: self.display(),
                details: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

/// Logs instead of powering off; for development hosts.
#[derive(Debug, Clone, Default)]
pub struct NoopPowerOff;

impl PowerOff for NoopPowerOff {
    fn power_off(&mut self) -> Result<()> {
        tracing::warn!("Power-off skipped (disabled)");
        Ok(())
    }
}

fn is_sudo(program: &str) -> bool {
    program == "sudo" || program.ends_with("/sudo")
}

fn is_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        #[allow(unsafe_code)]
        unsafe {
            libc::geteuid() == 0
        }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
