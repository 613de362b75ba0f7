use super::conditions::{round_half_up, WeatherCondition};
use super::daily::summarize_forecast;
use super::gateway::{UpstreamError, UpstreamGateway};
use super::types::*;
use crate::utils::validate_coordinates;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

const MIN_CITY_QUERY_LEN: usize = 2;
const CITY_SUGGESTION_LIMIT: &str = "5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherErrorCode {
    InvalidCity,
    ApiError,
    NetworkError,
    NotFound,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct WeatherError {
    pub message: String,
    pub code: WeatherErrorCode,
    #[serde(skip)]
    pub status: u16,
}

impl WeatherError {
    pub fn invalid_city(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: WeatherErrorCode::InvalidCity,
            status: 400,
        }
    }

    pub fn not_found(city: &str) -> Self {
        Self {
            message: format!("City \"{}\" not found", city),
            code: WeatherErrorCode::NotFound,
            status: 404,
        }
    }

    /// Any failed lookup that is not a missing city. Provider statuses are
    /// not forwarded; a provider failure answers 502.
    pub fn network(upstream: &UpstreamError) -> Self {
        // Status 500 is what the gateway reports when no response came back at all
        let (message, status) = if upstream.status == 500 {
            ("Network error. Please check your connection.", 500)
        } else {
            ("Network error. Please try again.", 502)
        };
        Self {
            message: message.to_string(),
            code: WeatherErrorCode::NetworkError,
            status,
        }
    }
}

/// Provider message and status surfaced as-is.
impl From<UpstreamError> for WeatherError {
    fn from(upstream: UpstreamError) -> Self {
        Self {
            message: upstream.message,
            code: WeatherErrorCode::ApiError,
            status: upstream.status,
        }
    }
}

pub struct OpenWeatherClient {
    gateway: Arc<UpstreamGateway>,
    geo_base_url: String,
}

impl OpenWeatherClient {
    pub fn new(gateway: Arc<UpstreamGateway>, geo_base_url: impl Into<String>) -> Self {
        Self {
            gateway,
            geo_base_url: geo_base_url.into(),
        }
    }

    pub fn gateway(&self) -> &UpstreamGateway {
        &self.gateway
    }

    pub async fn get_current_weather(&self, city: &str) -> Result<WeatherData, WeatherError> {
        let city = validate_city(city)?;
        let payload = self.fetch_for_city("/weather", city).await?;
        Ok(map_current_weather(decode(payload)?))
    }

    pub async fn get_forecast(&self, city: &str) -> Result<Vec<ForecastDay>, WeatherError> {
        let city = validate_city(city)?;
        let payload = self.fetch_for_city("/forecast", city).await?;
        let forecast: ForecastResponse = decode(payload)?;
        Ok(summarize_forecast(&forecast.list, forecast.city.timezone))
    }

    pub async fn get_weather_by_city(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let (current, forecast) =
            tokio::try_join!(self.get_current_weather(city), self.get_forecast(city))?;
        Ok(WeatherReport { current, forecast })
    }

    pub async fn get_weather_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherReport, WeatherError> {
        validate_coordinates(lat, lon).map_err(WeatherError::invalid_city)?;

        let lat = lat.to_string();
        let lon = lon.to_string();
        let params = [("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")];

        let (current, forecast) = tokio::join!(
            self.gateway.fetch("/weather", &params, None),
            self.gateway.fetch("/forecast", &params, None),
        );
        let current = current.map_err(|e| WeatherError::network(&e))?;
        let forecast = forecast.map_err(|e| WeatherError::network(&e))?;

        let current: CurrentWeatherResponse = decode(current.data)?;
        let forecast: ForecastResponse = decode(forecast.data)?;

        Ok(WeatherReport {
            current: map_current_weather(current),
            forecast: summarize_forecast(&forecast.list, forecast.city.timezone),
        })
    }

    /// Autocomplete suggestions, deduplicated on name, state and country.
    pub async fn search_cities(&self, query: &str) -> Result<Vec<CitySuggestion>, WeatherError> {
        if query.chars().count() < MIN_CITY_QUERY_LEN {
            return Ok(Vec::new());
        }

        let upstream = self
            .gateway
            .fetch(
                "/direct",
                &[("q", query), ("limit", CITY_SUGGESTION_LIMIT)],
                Some(self.geo_base_url.as_str()),
            )
            .await?;
        let entries: Vec<GeocodeResponse> = decode(upstream.data)?;

        let mut suggestions: Vec<CitySuggestion> = Vec::with_capacity(entries.len());
        for entry in entries {
            let duplicate = suggestions.iter().any(|s| {
                s.name == entry.name && s.state == entry.state && s.country == entry.country
            });
            if !duplicate {
                suggestions.push(entry.into());
            }
        }
        Ok(suggestions)
    }

    async fn fetch_for_city(&self, endpoint: &str, city: &str) -> Result<Value, WeatherError> {
        match self
            .gateway
            .fetch(endpoint, &[("q", city), ("units", "metric")], None)
            .await
        {
            Ok(upstream) => Ok(upstream.data),
            Err(e) if e.status == 404 => Err(WeatherError::not_found(city)),
            Err(e) => Err(WeatherError::network(&e)),
        }
    }
}

fn validate_city(city: &str) -> Result<&str, WeatherError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::invalid_city("Please enter a city name"));
    }
    Ok(city)
}

fn decode<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, WeatherError> {
    serde_json::from_value(payload).map_err(|e| {
        tracing::error!("Unexpected provider payload: {}", e);
        WeatherError::from(UpstreamError {
            message: "Unexpected response from weather service".to_string(),
            status: 502,
        })
    })
}

pub fn map_current_weather(current: CurrentWeatherResponse) -> WeatherData {
    let entry = current.weather.into_iter().next().unwrap_or_default();

    WeatherData {
        city: current.name,
        temp: round_half_up(current.main.temp),
        condition: WeatherCondition::classify(&entry.main),
        humidity: current.main.humidity,
        wind_speed: round_half_up(current.wind.speed * 3.6),
        description: entry.description,
        feels_like: round_half_up(current.main.feels_like),
        pressure: current.main.pressure,
        visibility: current.visibility,
        icon: entry.icon,
        timezone: current.timezone,
    }
}
