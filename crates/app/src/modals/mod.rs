//! Modal dialogs for the application.
//!
//! Every prompt in the app is a [`GlobalDialog`] built from a [`DialogSpec`]
//! and queued on the [`DialogHost`].

pub mod dialog;
pub mod host;

pub use dialog::{
    ButtonSpec, ButtonStyle, DialogEvent, DialogIcon, DialogId, DialogPhase, DialogSpec,
    GlobalDialog,
};
pub use host::DialogHost;

use egui::Context;

/// Trait for modal dialogs.
pub trait Modal {
    /// Update and render the modal. Returns true once it has fully closed.
    fn update(&mut self, ctx: &Context) -> bool;

    /// Returns true if the modal is currently visible.
    fn is_open(&self) -> bool;

    /// Open the modal.
    fn open(&mut self);

    /// Close the modal immediately.
    fn close(&mut self);
}
