//! Adding a directory to the user's persistent PATH.
//!
//! Windows keeps it in the user environment registry key. Everywhere else
//! it goes into the login shell's rc file. Both edits are append-only and
//! skip the write when the directory is already mentioned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChange {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Error)]
pub enum PathEditError {
    #[error("Failed to update {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not determine the home directory")]
    NoHome,

    #[error("Registry error: {0}")]
    Registry(#[source] io::Error),
}

pub trait UserPathEditor: Send + Sync {
    fn append_to_user_path(&self, dir: &Path) -> Result<PathChange, PathEditError>;
}

/// The editor for the host platform
pub fn platform_editor() -> Result<Box<dyn UserPathEditor>, PathEditError> {
    #[cfg(windows)]
    {
        Ok(Box::new(RegistryPathEditor))
    }
    #[cfg(not(windows))]
    {
        Ok(Box::new(ShellRcPathEditor::from_env()?))
    }
}

/// Pick the rc file for a `SHELL` value. Unknown shells get `.bashrc`.
pub fn rc_file_for_shell(home: &Path, shell: Option<&str>) -> PathBuf {
    let shell = shell.unwrap_or_default();
    if shell.contains("zsh") {
        home.join(".zshrc")
    } else if shell.contains("fish") {
        home.join(".config").join("fish").join("config.fish")
    } else {
        home.join(".bashrc")
    }
}

/// Appends an `export PATH=...` line to the shell rc file
#[derive(Debug, Clone)]
pub struct ShellRcPathEditor {
    home: PathBuf,
    shell: Option<String>,
    update_process_env: bool,
}

impl ShellRcPathEditor {
    pub fn from_env() -> Result<Self, PathEditError> {
        let home = dirs::home_dir().ok_or(PathEditError::NoHome)?;
        Ok(Self {
            home,
            shell: std::env::var("SHELL").ok(),
            update_process_env: true,
        })
    }

    /// An editor that only touches files under `home`.
    pub fn with_home(home: impl Into<PathBuf>, shell: Option<&str>) -> Self {
        Self {
            home: home.into(),
            shell: shell.map(str::to_string),
            update_process_env: false,
        }
    }

    pub fn rc_file(&self) -> PathBuf {
        rc_file_for_shell(&self.home, self.shell.as_deref())
    }
}

impl UserPathEditor for ShellRcPathEditor {
    fn append_to_user_path(&self, dir: &Path) -> Result<PathChange, PathEditError> {
        let rc = self.rc_file();
        let dir_str = dir.display().to_string();
        let io_err = |source| PathEditError::Io {
            path: rc.clone(),
            source,
        };

        let content = match fs::read_to_string(&rc) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(io_err(e)),
        };

        let change = if content.contains(&dir_str) {
            debug!("{} already mentions {}", rc.display(), dir_str);
            PathChange::AlreadyPresent
        } else {
            if let Some(parent) = rc.parent() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            let line = format!("\nexport PATH=\"$PATH:{}\"\n", dir_str);
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&rc)
                .and_then(|mut f| io::Write::write_all(&mut f, line.as_bytes()))
                .map_err(io_err)?;
            info!("Added {} to PATH in {}", dir_str, rc.display());
            PathChange::Added
        };

        if self.update_process_env {
            add_to_process_path(dir);
        }
        Ok(change)
    }
}

/// Make `dir` visible to child processes started from here on.
pub fn add_to_process_path(dir: &Path) {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut entries: Vec<PathBuf> = std::env::split_paths(&current).collect();
    if entries.iter().any(|p| p == dir) {
        return;
    }
    entries.push(dir.to_path_buf());
    if let Ok(joined) = std::env::join_paths(entries) {
        std::env::set_var("PATH", joined);
    }
}

/// Appends to `HKCU\Environment\Path`
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryPathEditor;

#[cfg(windows)]
impl UserPathEditor for RegistryPathEditor {
    fn append_to_user_path(&self, dir: &Path) -> Result<PathChange, PathEditError> {
        use winreg::enums::{RegType, HKEY_CURRENT_USER};
        use winreg::{RegKey, RegValue};

        let dir_str = dir.display().to_string();
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (env, _) = hkcu
            .create_subkey("Environment")
            .map_err(PathEditError::Registry)?;
        let current = existing_path_value(env.get_value::<String, _>("Path"))?;

        if current.contains(&dir_str) {
            add_to_process_path(dir);
            return Ok(PathChange::AlreadyPresent);
        }

        let updated = if current.is_empty() {
            dir_str.clone()
        } else if current.ends_with(';') {
            format!("{}{}", current, dir_str)
        } else {
            format!("{};{}", current, dir_str)
        };

        let bytes: Vec<u8> = updated
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(|u| u.to_le_bytes())
            .collect();
        env.set_raw_value(
            "Path",
            &RegValue {
                bytes,
                vtype: RegType::REG_EXPAND_SZ,
            },
        )
        .map_err(PathEditError::Registry)?;
        info!("Added {} to the user PATH", dir_str);

        broadcast_environment_change();
        add_to_process_path(dir);
        Ok(PathChange::Added)
    }
}

/// The stored PATH, where a missing value counts as empty. Any other read
/// error aborts so an unreadable PATH is never replaced.
#[cfg(any(windows, test))]
fn existing_path_value(read: io::Result<String>) -> Result<String, PathEditError> {
    match read {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(PathEditError::Registry(e)),
    }
}

/// Tell running programs (Explorer in particular) that the user environment
/// changed, without touching the stored value.
#[cfg(windows)]
fn broadcast_environment_change() {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        SendMessageTimeoutW, HWND_BROADCAST, SMTO_ABORTIFHUNG, WM_SETTINGCHANGE,
    };

    const TIMEOUT_MS: u32 = 5000;
    let area: Vec<u16> = "Environment"
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    let mut result = 0usize;
    // SAFETY: `area` is NUL-terminated and outlives the call
    let sent = unsafe {
        SendMessageTimeoutW(
            HWND_BROADCAST,
            WM_SETTINGCHANGE,
            0,
            area.as_ptr() as isize,
            SMTO_ABORTIFHUNG,
            TIMEOUT_MS,
            &mut result,
        )
    };
    if sent == 0 {
        tracing::warn!(
            "Could not broadcast environment change: {}",
            io::Error::last_os_error()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rc_file_selection() {
        let home = Path::new("/home/u");
        assert_eq!(rc_file_for_shell(home, Some("/bin/bash")), home.join(".bashrc"));
        assert_eq!(rc_file_for_shell(home, Some("/usr/bin/zsh")), home.join(".zshrc"));
        assert_eq!(
            rc_file_for_shell(home, Some("/usr/bin/fish")),
            home.join(".config/fish/config.fish")
        );
        assert_eq!(rc_file_for_shell(home, Some("/bin/tcsh")), home.join(".bashrc"));
        assert_eq!(rc_file_for_shell(home, None), home.join(".bashrc"));
    }

    #[test]
    fn test_append_is_idempotent() {
        let home = TempDir::new().unwrap();
        let editor = ShellRcPathEditor::with_home(home.path(), Some("/bin/zsh"));
        let dir = Path::new("/home/u/.local/bin/ffmpeg");

        assert_eq!(editor.append_to_user_path(dir).unwrap(), PathChange::Added);
        assert_eq!(
            editor.append_to_user_path(dir).unwrap(),
            PathChange::AlreadyPresent
        );

        let content = fs::read_to_string(home.path().join(".zshrc")).unwrap();
        assert_eq!(content.matches("export PATH").count(), 1);
        assert!(content.contains("export PATH=\"$PATH:/home/u/.local/bin/ffmpeg\""));
    }

    #[test]
    fn test_fish_config_dir_created() {
        let home = TempDir::new().unwrap();
        let editor = ShellRcPathEditor::with_home(home.path(), Some("/usr/bin/fish"));
        editor
            .append_to_user_path(Path::new("/opt/python/bin"))
            .unwrap();
        assert!(home.path().join(".config/fish/config.fish").exists());
    }

    #[test]
    fn test_existing_rc_content_kept() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join(".bashrc"), "alias ll='ls -l'\n").unwrap();
        let editor = ShellRcPathEditor::with_home(home.path(), Some("/bin/bash"));
        editor.append_to_user_path(Path::new("/opt/tool")).unwrap();

        let content = fs::read_to_string(home.path().join(".bashrc")).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert!(content.ends_with("export PATH=\"$PATH:/opt/tool\"\n"));
    }

    #[test]
    fn test_missing_registry_path_reads_as_empty() {
        let missing = Err(io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(existing_path_value(missing).unwrap(), "");
        assert_eq!(
            existing_path_value(Ok("%USERPROFILE%\\bin".into())).unwrap(),
            "%USERPROFILE%\\bin"
        );
    }

    #[test]
    fn test_unreadable_registry_path_is_an_error() {
        let denied = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(
            existing_path_value(denied),
            Err(PathEditError::Registry(e)) if e.kind() == io::ErrorKind::PermissionDenied
        ));
    }
}
