//! Type definitions for script selection and UI state.

/// The user's script selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptChoice {
    /// Position in the catalog, 0-based.
    Index(usize),
    Quit,
}

/// Represents the user's choice when confirming a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunChoice {
    Yes,
    No,
    ChangeArguments,
}

/// Direction to cycle through scripts in the selection UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Up,
    Down,
}

/// The visible part of the script list.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ViewportState {
    pub offset: usize,
    pub height: u16,
    pub width: u16,
}

/// Complete UI state for the script selection list.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UiState {
    /// Position of the selection within the filtered list
    pub selected_index: usize,
    pub viewport: ViewportState,
    /// Whether the user is currently filtering/searching
    pub is_filtering: bool,
    pub filter_text: String,
}

impl UiState {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            selected_index: 0,
            viewport: ViewportState {
                offset: 0,
                // Subtract 2 for header and filter line
                height: height.saturating_sub(2),
                width,
            },
            is_filtering: false,
            filter_text: String::new(),
        }
    }

    /// Moves the selection one step, wrapping around and keeping it inside
    /// the viewport.
    #[must_use]
    pub fn moved(&self, direction: CycleDirection, display_count: usize) -> Self {
        let mut state = self.clone();
        if display_count == 0 {
            return state;
        }

        let height = usize::from(state.viewport.height.max(1));
        let mut index = state.selected_index.min(display_count - 1);

        match direction {
            CycleDirection::Up => {
                if index == 0 {
                    index = display_count - 1;
                    state.viewport.offset = index.saturating_sub(height - 1);
                } else {
                    index -= 1;
                    if index < state.viewport.offset {
                        state.viewport.offset = index;
                    }
                }
            }
            CycleDirection::Down => {
                index = (index + 1) % display_count;
                if index == 0 {
                    state.viewport.offset = 0;
                } else if index >= state.viewport.offset + height {
                    state.viewport.offset = index + 1 - height;
                }
            }
        }

        state.selected_index = index;
        state
    }

    /// Applies a new filter text, returning to the top of the list.
    #[must_use]
    pub fn filtered(&self, filter_text: String) -> Self {
        let mut state = self.clone();
        state.filter_text = filter_text;
        state.selected_index = 0;
        state.viewport.offset = 0;
        state
    }
}
