//! Presentation layer handling terminal UI and user input.
//!
//! Renders the session state with ratatui and turns key presses into
//! user actions for the request coordinator.

pub mod ui;
pub mod input;

pub use ui::*;
pub use input::*;
