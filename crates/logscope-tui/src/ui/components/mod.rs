mod file_list;
mod help_overlay;
mod status_bar;

pub use file_list::FileList;
pub use help_overlay::HelpOverlay;
pub use status_bar::{viewer_hints, StatusBar};
