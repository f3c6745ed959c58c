//! Interactive editor: form state and the eframe window

pub mod app;
pub mod form;

pub use app::{run_editor, EditorApp};
pub use form::{EditForm, FormField, FormStatus};
