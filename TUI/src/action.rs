use crate::flows::SlotRole;
use crate::ui_state::{ScanMode, Screen};

/// Which category `/viz` refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryRef {
    /// 1-based position in the selected option
    Index(usize),
    Name(String),
}

/// User actions that can be triggered by commands or UI events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Show help message
    Help,
    /// Switch screen
    Navigate(Screen),
    /// Single or compare on Style Scan
    SetScanMode(ScanMode),
    /// Load an image file into a slot
    LoadImage { role: SlotRole, path: String },
    /// Remove a slot's image
    DropImage { role: SlotRole },
    /// Analyze one garment, or compare in compare mode
    Analyze { slot: Option<SlotRole> },
    /// Submit a stylist prompt
    Ask { prompt: String },
    /// Repeat the last failed request on the current screen
    Retry,
    /// Open a recommendation option (1-based)
    SelectOption(usize),
    /// Back from option detail to the option list
    Back,
    /// Visualize one category of the open option
    Visualize(CategoryRef),
    /// Use a try-on prompt idea (1-based)
    UseIdea(usize),
    /// Run the try-on, optionally setting the prompt first
    Generate { prompt: Option<String> },
    /// Start a new conversation; the old transcript is dropped whole
    NewChat,
    /// Start over: empty every slot and flow, new session id
    NewSession,
    /// Copy chat or search terms to the clipboard
    Copy,
    /// Quit application
    Quit,
    /// Plain text typed into the input box
    Input(String),
}
