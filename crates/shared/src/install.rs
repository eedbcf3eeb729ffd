//! Tool installation messages and the on-disk install manifest.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MANIFEST_FILE_NAME: &str = "install_info.json";
pub const MANIFEST_VERSION: &str = "1.0.0";

/// Pipeline stage, reported before the stage starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallStage {
    Downloading,
    Extracting,
    Installing,
    ConfiguringPath,
}

impl InstallStage {
    pub fn status_text(&self, target: &str) -> String {
        match self {
            InstallStage::Downloading => format!("Downloading {}...", target),
            InstallStage::Extracting => format!("Extracting {}...", target),
            InstallStage::Installing => format!("Installing {}...", target),
            InstallStage::ConfiguringPath => "Configuring PATH...".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallOutcome {
    Success(String),
    Failure(String),
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InstallOutcome::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            InstallOutcome::Success(m) | InstallOutcome::Failure(m) => m,
        }
    }
}

/// Messages an installer worker sends to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallEvent {
    Status(String),
    /// Download progress, 0..=100, never decreasing within one job
    Progress(u8),
    Finished(InstallOutcome),
}

/// Written into the install directory after a successful install
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallManifest {
    pub install_dir: PathBuf,
    pub install_time: DateTime<Local>,
    pub version: String,
}

impl InstallManifest {
    pub fn new(install_dir: PathBuf) -> Self {
        Self {
            install_dir,
            install_time: Local::now(),
            version: MANIFEST_VERSION.to_string(),
        }
    }
}
