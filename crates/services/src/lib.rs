pub mod archive;
pub mod download;
pub mod elevation;
pub mod installer;
pub mod probe;
pub mod process;
pub mod user_path;

pub use download::{Fetcher, HttpFetcher};
pub use installer::{InstallJob, ToolInstaller};
pub use process::{ProcessRunner, SystemRunner};
pub use user_path::UserPathEditor;
