use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    StyleScan,
    Stylist,
    TryOn,
    Chat,
    Weather,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Home,
        Screen::StyleScan,
        Screen::Stylist,
        Screen::TryOn,
        Screen::Chat,
        Screen::Weather,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::StyleScan => "Style Scan",
            Screen::Stylist => "AI Stylist",
            Screen::TryOn => "Try-On",
            Screen::Chat => "Chat",
            Screen::Weather => "Weather",
        }
    }

    pub fn next(&self) -> Screen {
        let index = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Style Scan works on one garment at a time or on a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Single,
    Compare,
}

#[derive(Default)]
pub struct UIState {
    pub screen: Screen,
    pub scan_mode: ScanMode,
    pub input: String,
    pub scroll_offset: usize,
    pub status_message: Option<String>,
    /// Ticks left before the status message is cleared
    pub status_ticks: u64,

    /// Command list overlay
    pub show_help: bool,

    // Command popup state
    pub command_selection: Option<usize>,

    // How far the current screen can scroll up
    pub max_scroll: usize,

    // Markdown rendering toggle
    pub show_raw_markdown: bool,

    /// Where the last try-on image was written
    pub last_saved: Option<std::path::PathBuf>,
}

impl UIState {
    pub fn new() -> Self {
        Self::default()
    }
}
