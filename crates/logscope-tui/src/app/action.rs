/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    FocusNext,

    // File list
    ListUp,
    ListDown,
    /// Load the selected file
    ListSelect,
    RefreshFiles,

    // Log panel navigation
    ScrollUp(usize),
    ScrollDown(usize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    ToggleFollow,
    ToggleStats,

    // Viewer operations
    ToggleLive,
    CycleLevel,
    CycleLevelBack,
    ClearDate,
    ClearViewer,
    Export,

    // Text input (search / date)
    OpenSearch,
    OpenDateInput,
    InputChar(char),
    InputBackspace,
    InputClear,
    InputSubmit,
    InputCancel,

    // Render request
    Render,
}
