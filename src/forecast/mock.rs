//! Deterministic provider payloads for tests.

use super::types::*;
use serde_json::{json, Value};

fn icon_for(condition: &str) -> &'static str {
    match condition {
        "Clear" => "01d",
        "Clouds" => "03d",
        "Rain" => "10d",
        "Snow" => "13d",
        _ => "50d",
    }
}

pub fn forecast_sample(dt: i64, temp: f64, condition: &str) -> ForecastSample {
    ForecastSample {
        dt,
        main: MainReadings {
            temp,
            feels_like: temp - 1.0,
            pressure: 1013.0,
            humidity: 60.0,
        },
        weather: vec![ConditionEntry {
            id: 800,
            main: condition.to_string(),
            description: condition.to_lowercase(),
            icon: icon_for(condition).to_string(),
        }],
        wind: WindReadings { speed: 3.0 },
        visibility: 10000.0,
    }
}

/// `count` samples three hours apart with a diurnal temperature swing.
pub fn three_hourly_samples(start: i64, count: usize) -> Vec<ForecastSample> {
    (0..count)
        .map(|i| {
            let hours_ahead = i as i64 * 3;
            let temp = 18.0 + 6.0 * (hours_ahead as f64 * 0.26).sin();
            let condition = if i % 5 == 0 { "Rain" } else { "Clear" };
            forecast_sample(start + hours_ahead * 3600, temp, condition)
        })
        .collect()
}

pub fn forecast_payload(city: &str, timezone: i32, samples: &[ForecastSample]) -> Value {
    json!({
        "cod": "200",
        "message": 0,
        "cnt": samples.len(),
        "list": samples,
        "city": {
            "id": 1850147,
            "name": city,
            "coord": { "lat": 35.6895, "lon": 139.6917 },
            "country": "JP",
            "population": 12445327,
            "timezone": timezone
        }
    })
}

pub fn current_payload(city: &str) -> Value {
    json!({
        "coord": { "lon": 139.6917, "lat": 35.6895 },
        "weather": [
            { "id": 502, "main": "Rain", "description": "heavy intensity rain", "icon": "10d" }
        ],
        "base": "stations",
        "main": {
            "temp": 17.6,
            "feels_like": 17.2,
            "temp_min": 16.1,
            "temp_max": 18.4,
            "pressure": 1008,
            "humidity": 88
        },
        "visibility": 7000,
        "wind": { "speed": 4.12, "deg": 40 },
        "clouds": { "all": 100 },
        "dt": 1792152000,
        "sys": { "country": "JP" },
        "timezone": 32400,
        "id": 1850147,
        "name": city,
        "cod": 200
    })
}

pub fn geocode_payload() -> Value {
    json!([
        { "name": "Springfield", "state": "Illinois", "country": "US", "lat": 39.7990, "lon": -89.6440 },
        { "name": "Springfield", "state": "Missouri", "country": "US", "lat": 37.2153, "lon": -93.2982 },
        { "name": "Springfield", "state": "Illinois", "country": "US", "lat": 39.8017, "lon": -89.6437 }
    ])
}
