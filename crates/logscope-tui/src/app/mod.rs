mod action;
mod state;

pub use action::Action;
pub use state::{Focus, InputMode, UiState};
