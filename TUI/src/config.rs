//! Application configuration and constants.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! command-line / environment overrides (highest priority).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the analysis service, e.g. `http://localhost:8005/api`
    pub api_base: String,

    /// Per-request timeout; image generation can be slow
    pub request_timeout_secs: u64,

    /// Where generated try-on images are written
    pub output_dir: PathBuf,

    /// Tracing output (the terminal belongs to the UI)
    pub log_file: PathBuf,

    /// Skip the network entirely; every remote call fails fast
    pub offline: bool,

    pub weather: WeatherConfig,

    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Main loop tick rate in milliseconds (target 60 FPS = ~16ms)
    pub tick_rate_ms: u64,

    /// How many ticks to show status messages (180 = ~3s at 60fps)
    pub status_timeout_ticks: u64,

    /// Lines to scroll per key press
    pub scroll_step: usize,

    /// Width of the sidebar in characters
    pub sidebar_width: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8005/api".to_string(),
            request_timeout_secs: 120,
            output_dir: PathBuf::from("./drape-output"),
            log_file: PathBuf::from("drape.log"),
            offline: false,
            weather: WeatherConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: 51.5072,
            longitude: -0.1276,
            location_name: "London".to_string(),
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 16,
            status_timeout_ticks: 180,
            scroll_step: 3,
            sidebar_width: 26,
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base: Option<String>,
    pub log_file: Option<PathBuf>,
    pub offline: bool,
}

impl Config {
    /// Loads the TOML file at `path` (if any) and applies `overrides`.
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                let config = Self::from_toml_str(&content)?;
                info!("Loaded configuration from {:?}", path);
                config
            }
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(api_base) = overrides.api_base {
            self.api_base = api_base;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        self.offline |= overrides.offline;
    }

    fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(Error::Config("api_base must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be positive".to_string()));
        }
        if self.ui.tick_rate_ms == 0 {
            return Err(Error::Config("ui.tick_rate_ms must be positive".to_string()));
        }
        if !(-90.0..=90.0).contains(&self.weather.latitude)
            || !(-180.0..=180.0).contains(&self.weather.longitude)
        {
            return Err(Error::Config(format!(
                "weather coordinates out of range: {}, {}",
                self.weather.latitude, self.weather.longitude
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_rate_ms)
    }
}

/// Global commands list
pub const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show available commands"),
    ("/home", "Back to the home screen"),
    ("/scan", "Analyze one or two garments"),
    ("/stylist", "Persona recommendations"),
    ("/tryon", "Virtual try-on"),
    ("/chat", "Talk to the fashion assistant"),
    ("/weather", "Outfit ideas for today's weather"),
    ("/mode", "Scan mode: single | compare"),
    ("/load", "Load an image: /load <slot> <path>"),
    ("/drop", "Remove an image: /drop <slot>"),
    ("/analyze", "Analyze garment 1 or 2, or compare"),
    ("/ask", "Ask the stylist: /ask <prompt>"),
    ("/retry", "Retry the last failed request"),
    ("/option", "Open a recommendation: /option <n>"),
    ("/back", "Back to the option list"),
    ("/viz", "Visualize a category: /viz <n|name>"),
    ("/idea", "Use a try-on prompt idea: /idea <n>"),
    ("/generate", "Run the try-on: /generate [prompt]"),
    ("/newchat", "Start a new conversation"),
    ("/new", "Start a new session: clears every image and result"),
    ("/copy", "Copy chat or search terms to clipboard"),
    ("/quit", "Exit drape"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::load(None, ConfigOverrides::default()).unwrap();
        assert_eq!(config.api_base, "http://localhost:8005/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.ui.tick_rate_ms, 16);
        assert_eq!(config.ui.status_timeout_ticks, 180);
        assert!(!config.offline);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_base = "https://drape.example/api"

[weather]
latitude = 12.97
longitude = 77.59
location_name = "Bengaluru"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path()), ConfigOverrides::default()).unwrap();
        assert_eq!(config.api_base, "https://drape.example/api");
        assert_eq!(config.weather.location_name, "Bengaluru");
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1/forecast");
        assert_eq!(config.ui.scroll_step, 3);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api_base = \"http://from-file/api\"").unwrap();

        let overrides = ConfigOverrides {
            api_base: Some("http://from-cli/api".to_string()),
            log_file: Some(PathBuf::from("/tmp/drape-test.log")),
            offline: true,
        };
        let config = Config::load(Some(file.path()), overrides).unwrap();
        assert_eq!(config.api_base, "http://from-cli/api");
        assert_eq!(config.log_file, PathBuf::from("/tmp/drape-test.log"));
        assert!(config.offline);
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = Config::from_toml_str("[ui]\ntick_rate = 5\n").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("tick_rate")));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing), ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 0").unwrap();
        assert!(Config::load(Some(file.path()), ConfigOverrides::default()).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[weather]\nlatitude = 123.0").unwrap();
        assert!(Config::load(Some(file.path()), ConfigOverrides::default()).is_err());
    }

    #[test]
    fn test_every_command_is_listed_once() {
        let mut names: Vec<_> = COMMANDS.iter().map(|(name, _)| *name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"/viz"));
    }
}
