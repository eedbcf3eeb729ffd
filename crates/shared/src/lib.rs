pub mod config;
pub mod environment;
pub mod install;

pub use config::{AppConfig, ConfigError, ConfigStore, WindowGeometry};
pub use environment::{DetectionResult, ProbeEvent, ProbeSelection, Tool, ValidationFailure};
pub use install::{InstallEvent, InstallManifest, InstallOutcome, InstallStage};

/// Product name shown in window titles
pub const APP_NAME: &str = "Zhenxun Bot GUI";
