use super::conditions::{AirQuality, WeatherCondition};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Numbers the provider omits, nulls or sends as text become NaN so arithmetic
// propagates instead of failing the whole payload.
fn nan() -> f64 {
    f64::NAN
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64().unwrap_or(f64::NAN))
}

/// Falls back to `T::default()` when the value is null or has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Keeps every sample that decodes; a sample without a usable `dt` is dropped.
fn lenient_samples<'de, D>(deserializer: D) -> Result<Vec<ForecastSample>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    };
    let total = raw.len();
    let samples: Vec<ForecastSample> = raw
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if samples.len() < total {
        tracing::warn!(
            "Skipped {} of {} malformed forecast samples",
            total - samples.len(),
            total
        );
    }
    Ok(samples)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub id: i32,
    #[serde(default, deserialize_with = "lenient")]
    pub main: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient")]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainReadings {
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub temp: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub feels_like: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub pressure: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub humidity: f64,
}

impl Default for MainReadings {
    fn default() -> Self {
        Self {
            temp: f64::NAN,
            feels_like: f64::NAN,
            pressure: f64::NAN,
            humidity: f64::NAN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindReadings {
    /// Metres per second.
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub speed: f64,
}

impl Default for WindReadings {
    fn default() -> Self {
        Self { speed: f64::NAN }
    }
}

/// `/weather` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub main: MainReadings,
    #[serde(default, deserialize_with = "lenient")]
    pub weather: Vec<ConditionEntry>,
    #[serde(default, deserialize_with = "lenient")]
    pub wind: WindReadings,
    /// Metres.
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub visibility: f64,
    /// Seconds east of UTC.
    #[serde(default, deserialize_with = "lenient")]
    pub timezone: i32,
}

/// One 3-hour sample of the `/forecast` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSample {
    /// Epoch seconds, UTC.
    pub dt: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub main: MainReadings,
    #[serde(default, deserialize_with = "lenient")]
    pub weather: Vec<ConditionEntry>,
    #[serde(default, deserialize_with = "lenient")]
    pub wind: WindReadings,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub visibility: f64,
}

impl ForecastSample {
    pub fn condition(&self) -> Option<&ConditionEntry> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub country: String,
    #[serde(default, deserialize_with = "lenient")]
    pub timezone: i32,
}

/// `/forecast` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default, deserialize_with = "lenient_samples")]
    pub list: Vec<ForecastSample>,
    #[serde(default, deserialize_with = "lenient")]
    pub city: ForecastCity,
}

/// One entry of the geocoding `/direct` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub name: String,
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<GeocodeResponse> for CitySuggestion {
    fn from(entry: GeocodeResponse) -> Self {
        Self {
            name: entry.name,
            state: entry.state,
            country: entry.country,
            lat: entry.lat,
            lon: entry.lon,
        }
    }
}

/// Normalized current conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    pub city: String,
    pub temp: f64,
    pub condition: WeatherCondition,
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    pub description: String,
    pub feels_like: f64,
    pub pressure: f64,
    pub visibility: f64,
    pub icon: String,
    pub timezone: i32,
}

/// One aggregated forecast day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub day: String,
    pub date: String,
    pub condition: WeatherCondition,
    /// `"low~high°"`
    pub temp: String,
    pub label: &'static str,
    pub wind: String,
    pub quality: AirQuality,
    pub high_temp: f64,
    pub low_temp: f64,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub current: WeatherData,
    pub forecast: Vec<ForecastDay>,
}
