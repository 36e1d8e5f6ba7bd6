use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    FileList,
    LogPanel,
    TextInput,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings, active whenever no text input is open
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Tab), Action::FocusNext);
        global.insert(KeyBinding::new(KeyCode::Char('l')), Action::ToggleLive);
        global.insert(KeyBinding::new(KeyCode::Char('v')), Action::CycleLevel);
        global.insert(KeyBinding::shift(KeyCode::Char('V')), Action::CycleLevelBack);
        global.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        global.insert(KeyBinding::new(KeyCode::Char('d')), Action::OpenDateInput);
        global.insert(KeyBinding::new(KeyCode::Char('x')), Action::ClearDate);
        global.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearViewer);
        global.insert(KeyBinding::new(KeyCode::Char('e')), Action::Export);
        global.insert(KeyBinding::new(KeyCode::Char('r')), Action::RefreshFiles);
        global.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // File list navigation
        let mut files = HashMap::new();
        files.insert(KeyBinding::new(KeyCode::Char('j')), Action::ListDown);
        files.insert(KeyBinding::new(KeyCode::Down), Action::ListDown);
        files.insert(KeyBinding::new(KeyCode::Char('k')), Action::ListUp);
        files.insert(KeyBinding::new(KeyCode::Up), Action::ListUp);
        files.insert(KeyBinding::new(KeyCode::Enter), Action::ListSelect);
        bindings.insert(KeyContext::FileList, files);

        // Log panel - less-like navigation
        let mut logs = HashMap::new();
        logs.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        logs.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        logs.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        logs.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        logs.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        logs.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        logs.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        logs.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        logs.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        logs.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        logs.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        logs.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        logs.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        bindings.insert(KeyContext::LogPanel, logs);

        // Search / date field
        let mut input = HashMap::new();
        input.insert(KeyBinding::new(KeyCode::Enter), Action::InputSubmit);
        input.insert(KeyBinding::new(KeyCode::Esc), Action::InputCancel);
        input.insert(KeyBinding::new(KeyCode::Backspace), Action::InputBackspace);
        input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::InputClear);
        input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::InputCancel);
        bindings.insert(KeyContext::TextInput, input);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event while a text field is open
    ///
    /// Global bindings are not consulted, so every printable character is
    /// typed into the field.
    pub fn get_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::TextInput)
            .and_then(|input_bindings| input_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::InputChar(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
