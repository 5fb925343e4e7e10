//! Current weather and what to wear for it.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::backend::{RemoteResult, RemoteServiceError};
use crate::config::WeatherConfig;
use crate::error::{Error, Result};

const MAX_SUGGESTIONS: usize = 4;

/// Coarse sky condition from a WMO weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Rainy,
    Snowy,
    Cloudy,
}

impl WeatherCondition {
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => WeatherCondition::Clear,
            1..=3 => WeatherCondition::PartlyCloudy,
            4..=67 => WeatherCondition::Rainy,
            68..=77 => WeatherCondition::Snowy,
            _ => WeatherCondition::Cloudy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear Sky",
            WeatherCondition::PartlyCloudy => "Partly Cloudy",
            WeatherCondition::Rainy => "Rainy",
            WeatherCondition::Snowy => "Snowy",
            WeatherCondition::Cloudy => "Cloudy",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rounded current conditions, as shown on the weather screen.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temperature: i32,
    pub feels_like: i32,
    pub humidity: u8,
    pub wind_speed: i32,
    pub precipitation: f64,
    pub weather_code: u16,
}

impl WeatherReport {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(self.weather_code)
    }

    pub fn is_raining(&self) -> bool {
        self.precipitation > 0.0
    }

    pub fn is_windy(&self) -> bool {
        self.wind_speed > 20
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutfitSuggestion {
    pub category: &'static str,
    pub items: [&'static str; 3],
    pub description: &'static str,
}

const fn outfit(
    category: &'static str,
    items: [&'static str; 3],
    description: &'static str,
) -> OutfitSuggestion {
    OutfitSuggestion {
        category,
        items,
        description,
    }
}

/// Temperature band first, then rain and wind extras. Never more than four.
pub fn outfit_suggestions(report: &WeatherReport) -> Vec<OutfitSuggestion> {
    let mut suggestions = match report.temperature {
        t if t < 10 => vec![
            outfit(
                "Outerwear",
                ["Heavy Coat", "Wool Jacket", "Puffer Jacket"],
                "Layer up with warm, insulated pieces",
            ),
            outfit("Accessories", ["Scarf", "Gloves", "Beanie"], "Essential cold-weather accessories"),
        ],
        t if t < 20 => vec![
            outfit(
                "Outerwear",
                ["Light Jacket", "Cardigan", "Hoodie"],
                "Comfortable layers for mild weather",
            ),
            outfit("Bottoms", ["Jeans", "Chinos", "Long Pants"], "Versatile options for cool days"),
        ],
        t if t < 30 => vec![
            outfit("Tops", ["T-Shirt", "Light Shirt", "Polo"], "Breathable and comfortable choices"),
            outfit("Bottoms", ["Shorts", "Light Pants", "Skirt"], "Stay cool and stylish"),
        ],
        _ => vec![
            outfit("Summer Wear", ["Tank Top", "Shorts", "Sundress"], "Beat the heat with light fabrics"),
            outfit("Protection", ["Sunglasses", "Hat", "Sunscreen"], "Essential sun protection"),
        ],
    };

    if report.is_raining() {
        suggestions.push(outfit(
            "Rain Gear",
            ["Umbrella", "Raincoat", "Waterproof Boots"],
            "Stay dry in wet conditions",
        ));
    }
    if report.is_windy() {
        suggestions.push(outfit(
            "Wind Protection",
            ["Windbreaker", "Fitted Clothing", "Hair Ties"],
            "Secure your style against the wind",
        ));
    }
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self) -> RemoteResult<WeatherReport>;

    /// Shown next to the report, e.g. a city name.
    fn location_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ForecastDto {
    current: CurrentDto,
}

#[derive(Debug, Deserialize)]
struct CurrentDto {
    temperature_2m: f64,
    apparent_temperature: f64,
    #[serde(default)]
    relative_humidity_2m: f64,
    #[serde(default)]
    precipitation: f64,
    weather_code: u16,
    #[serde(default)]
    wind_speed_10m: f64,
}

impl From<CurrentDto> for WeatherReport {
    fn from(dto: CurrentDto) -> Self {
        WeatherReport {
            temperature: dto.temperature_2m.round() as i32,
            feels_like: dto.apparent_temperature.round() as i32,
            humidity: dto.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
            wind_speed: dto.wind_speed_10m.round() as i32,
            precipitation: dto.precipitation,
            weather_code: dto.weather_code,
        }
    }
}

fn parse_forecast(body: &[u8]) -> RemoteResult<WeatherReport> {
    let forecast: ForecastDto = serde_json::from_slice(body)
        .map_err(|e| RemoteServiceError::Malformed(format!("forecast: {}", e)))?;
    Ok(forecast.current.into())
}

/// Open-Meteo forecast API client.
pub struct OpenMeteoClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    pub fn new(config: WeatherConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn query(&self) -> [(&'static str, String); 4] {
        [
            ("latitude", self.config.latitude.to_string()),
            ("longitude", self.config.longitude.to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,weather_code,wind_speed_10m"
                    .to_string(),
            ),
            ("timezone", "auto".to_string()),
        ]
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current(&self) -> RemoteResult<WeatherReport> {
        debug!(lat = self.config.latitude, lon = self.config.longitude, "fetching weather");
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query())
            .send()
            .await
            .map_err(|e| RemoteServiceError::Transport(format!("weather request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteServiceError::Transport(format!("weather response unreadable: {}", e)))?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "weather request failed");
            return Err(RemoteServiceError::Status {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        let report = parse_forecast(&body)?;
        info!(temperature = report.temperature, code = report.weather_code, "weather updated");
        Ok(report)
    }

    fn location_name(&self) -> &str {
        &self.config.location_name
    }
}

/// Used with `--offline`; never touches the network.
#[derive(Debug, Clone)]
pub struct OfflineWeatherProvider {
    location_name: String,
}

impl OfflineWeatherProvider {
    pub fn new(location_name: impl Into<String>) -> Self {
        Self {
            location_name: location_name.into(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OfflineWeatherProvider {
    async fn current(&self) -> RemoteResult<WeatherReport> {
        Err(RemoteServiceError::Transport("running offline".to_string()))
    }

    fn location_name(&self) -> &str {
        &self.location_name
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum WeatherPhase {
    #[default]
    Loading,
    Ready(WeatherReport),
    Failed(String),
}

/// Weather screen state. Only the latest refresh may land.
#[derive(Debug, Default)]
pub struct WeatherPanel {
    phase: WeatherPhase,
    request: u64,
}

impl WeatherPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &WeatherPhase {
        &self.phase
    }

    /// Marks the panel loading; returns the request number to complete with.
    pub fn begin_refresh(&mut self) -> u64 {
        self.request += 1;
        self.phase = WeatherPhase::Loading;
        self.request
    }

    pub fn complete_refresh(&mut self, request: u64, result: RemoteResult<WeatherReport>) -> bool {
        if request != self.request {
            return false;
        }
        self.phase = match result {
            Ok(report) => WeatherPhase::Ready(report),
            Err(e) => WeatherPhase::Failed(e.to_string()),
        };
        true
    }

    pub fn suggestions(&self) -> Vec<OutfitSuggestion> {
        match &self.phase {
            WeatherPhase::Ready(report) => outfit_suggestions(report),
            _ => Vec::new(),
        }
    }
}
