use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{
    forecast::{
        openweather::{OpenWeatherClient, WeatherError},
        types::{CitySuggestion, WeatherReport},
    },
    utils::parse_coordinates,
};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-eval' 'unsafe-inline'; \
    style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
    font-src 'self' https://fonts.gstatic.com; \
    img-src 'self' data: https://openweathermap.org; \
    connect-src 'self' https://api.openweathermap.org;";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather_client: Arc<OpenWeatherClient>,
}

// Request/Response types
#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub q: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub units: Option<String>,
}

/// Where a request points: a city name or a coordinate pair.
enum Target<'a> {
    City(&'a str),
    Coords(&'a str, &'a str),
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl LocationQuery {
    fn target(&self) -> Option<Target<'_>> {
        if let Some(city) = non_empty(&self.q) {
            Some(Target::City(city))
        } else if let (Some(lat), Some(lon)) = (non_empty(&self.lat), non_empty(&self.lon)) {
            Some(Target::Coords(lat, lon))
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn proxy_weather(
    State(state): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<Value>, WeatherError> {
    proxy_to(&state, "/weather", &params).await
}

pub async fn proxy_forecast(
    State(state): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<Value>, WeatherError> {
    proxy_to(&state, "/forecast", &params).await
}

/// Raw provider JSON, passed through the gateway and its cache.
async fn proxy_to(
    state: &AppState,
    endpoint: &str,
    params: &LocationQuery,
) -> Result<Json<Value>, WeatherError> {
    let units = params.units.as_deref().unwrap_or("metric");
    let mut query = vec![("units", units)];
    match params.target() {
        Some(Target::City(city)) => query.push(("q", city)),
        Some(Target::Coords(lat, lon)) => {
            query.push(("lat", lat));
            query.push(("lon", lon));
        }
        None => return Err(WeatherError::invalid_city("City or coordinates required")),
    }

    let upstream = state
        .weather_client
        .gateway()
        .fetch(endpoint, &query, None)
        .await?;
    tracing::debug!(from_cache = upstream.from_cache, "Proxied {}", endpoint);
    Ok(Json(upstream.data))
}

pub async fn search_cities(
    State(state): State<AppState>,
    Query(params): Query<CitiesQuery>,
) -> Result<Json<Vec<CitySuggestion>>, WeatherError> {
    let query = params.q.unwrap_or_default();
    let suggestions = state.weather_client.search_cities(&query).await?;
    Ok(Json(suggestions))
}

pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LocationQuery>,
) -> Result<Json<WeatherReport>, WeatherError> {
    let report = match params.target() {
        Some(Target::City(city)) => state.weather_client.get_weather_by_city(city).await?,
        Some(Target::Coords(lat, lon)) => {
            let (lat, lon) = parse_coordinates(lat, lon).map_err(WeatherError::invalid_city)?;
            state.weather_client.get_weather_by_coords(lat, lon).await?
        }
        None => return Err(WeatherError::invalid_city("City or coordinates required")),
    };

    tracing::info!(
        "Lookup for {} returned {} forecast days",
        report.current.city,
        report.forecast.len()
    );
    Ok(Json(report))
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather", get(proxy_weather))
        .route("/api/forecast", get(proxy_forecast))
        .route("/api/cities", get(search_cities))
        .route("/api/lookup", get(lookup))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(TraceLayer::new_for_http())
}
