//! Optional self-elevation at startup.
//!
//! The first process decides whether it should hand over to an elevated copy
//! of itself. The elevated copy gets a marker argument so it never tries
//! again.

use anyhow::{Context, Result};
use std::process::Command;
use tracing::{info, warn};

/// Opt-in switch for the elevated boot
pub const ELEVATE_ENV: &str = "ZHENXUN_GUI_ELEVATE";
/// Passed to the relaunched process
pub const ELEVATED_MARKER: &str = "--elevated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootEnv {
    pub elevation_requested: bool,
    pub is_elevated: bool,
    pub already_relaunched: bool,
}

impl BootEnv {
    pub fn detect() -> Self {
        let requested = std::env::var(ELEVATE_ENV)
            .map(|v| {
                let v = v.trim().to_ascii_lowercase();
                v == "1" || v == "true" || v == "yes"
            })
            .unwrap_or(false);
        Self {
            elevation_requested: requested,
            is_elevated: is_elevated(),
            already_relaunched: std::env::args().any(|a| a == ELEVATED_MARKER),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    /// Start an elevated copy and exit
    Relaunch,
    /// Build the UI in this process
    Proceed,
}

pub fn decide_boot_phase(env: BootEnv) -> BootPhase {
    if env.elevation_requested && !env.is_elevated && !env.already_relaunched {
        BootPhase::Relaunch
    } else {
        BootPhase::Proceed
    }
}

#[cfg(unix)]
pub fn is_elevated() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(windows)]
pub fn is_elevated() -> bool {
    // `net session` only succeeds from an elevated shell.
    use std::os::windows::process::CommandExt;
    Command::new("net")
        .arg("session")
        .creation_flags(0x0800_0000)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(not(any(unix, windows)))]
pub fn is_elevated() -> bool {
    false
}

/// Spawn an elevated copy of this executable with the same arguments.
pub fn relaunch_elevated() -> Result<()> {
    let exe = std::env::current_exe().context("Could not locate the running executable")?;
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    args.push(ELEVATED_MARKER.to_string());

    let mut cmd = if cfg!(windows) {
        let arg_list = args
            .iter()
            .map(|a| format!("'{}'", a.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");
        let script = format!(
            "Start-Process -FilePath '{}' -ArgumentList {} -Verb RunAs",
            exe.display().to_string().replace('\'', "''"),
            arg_list
        );
        let mut c = Command::new("powershell");
        c.args(["-NoProfile", "-NonInteractive", "-Command", &script]);
        c
    } else {
        let mut c = Command::new("sudo");
        c.arg("-E").arg(&exe).args(&args);
        c
    };

    info!("Relaunching {} with elevated privileges", exe.display());
    cmd.spawn().context("Failed to start elevated process")?;
    Ok(())
}

/// Run phase one of the boot. Returns `true` when the caller should exit.
pub fn handle_boot() -> bool {
    match decide_boot_phase(BootEnv::detect()) {
        BootPhase::Proceed => false,
        BootPhase::Relaunch => match relaunch_elevated() {
            Ok(()) => true,
            Err(e) => {
                warn!("Continuing without elevation: {:#}", e);
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relaunch_only_when_needed() {
        let requested = BootEnv {
            elevation_requested: true,
            ..Default::default()
        };
        assert_eq!(decide_boot_phase(requested), BootPhase::Relaunch);

        assert_eq!(decide_boot_phase(BootEnv::default()), BootPhase::Proceed);
        assert_eq!(
            decide_boot_phase(BootEnv {
                is_elevated: true,
                ..requested
            }),
            BootPhase::Proceed
        );
    }

    #[test]
    fn test_marker_prevents_loop() {
        let env = BootEnv {
            elevation_requested: true,
            is_elevated: false,
            already_relaunched: true,
        };
        assert_eq!(decide_boot_phase(env), BootPhase::Proceed);
    }
}
