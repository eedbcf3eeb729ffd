//! Content pages shown in the main window.

pub mod environment;
pub mod form;
pub mod home;
pub mod settings;

pub use environment::{EnvironmentPage, EnvironmentRequest};
pub use home::HomePage;
pub use settings::SettingsPage;
