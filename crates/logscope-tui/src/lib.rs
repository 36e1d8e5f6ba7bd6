//! TUI components for logscope
//!
//! This crate provides the terminal user interface for logscope,
//! including UI state, keybindings, event handling, and widgets.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, Focus, InputMode, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{FileList, HelpOverlay, StatusBar};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme};
