use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
}

// Checked in order; the first needle found wins.
const CLASSIFICATION_RULES: &[(&[&str], WeatherCondition)] = &[
    (&["clear"], WeatherCondition::Clear),
    (&["cloud"], WeatherCondition::Clouds),
    (&["rain"], WeatherCondition::Rain),
    (&["drizzle"], WeatherCondition::Drizzle),
    (&["thunder", "storm"], WeatherCondition::Thunderstorm),
    (&["snow"], WeatherCondition::Snow),
    (&["mist"], WeatherCondition::Mist),
    (&["smoke"], WeatherCondition::Smoke),
    (&["haze"], WeatherCondition::Haze),
    (&["dust"], WeatherCondition::Dust),
    (&["fog"], WeatherCondition::Fog),
    (&["sand"], WeatherCondition::Sand),
    (&["ash"], WeatherCondition::Ash),
    (&["squall"], WeatherCondition::Squall),
    (&["tornado"], WeatherCondition::Tornado),
];

impl WeatherCondition {
    /// Map a provider condition string onto a condition, defaulting to `Clouds`.
    pub fn classify(provider_condition: &str) -> Self {
        let condition = provider_condition.to_lowercase();

        CLASSIFICATION_RULES
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| condition.contains(needle)))
            .map(|(_, mapped)| *mapped)
            .unwrap_or(WeatherCondition::Clouds)
    }

    /// Short uppercase label shown next to a forecast day.
    pub fn label(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "SUNNY",
            WeatherCondition::Clouds => "CLOUDY",
            WeatherCondition::Rain => "RAIN",
            WeatherCondition::Snow => "SNOW",
            WeatherCondition::Thunderstorm => "STORM",
            WeatherCondition::Drizzle => "DRIZZLE",
            WeatherCondition::Mist => "MISTY",
            WeatherCondition::Smoke => "SMOKY",
            WeatherCondition::Haze => "HAZY",
            WeatherCondition::Dust => "DUSTY",
            WeatherCondition::Fog => "FOGGY",
            WeatherCondition::Sand => "SANDY",
            WeatherCondition::Ash => "ASH",
            WeatherCondition::Squall => "SQUALL",
            WeatherCondition::Tornado => "TORNADO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQuality {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl AirQuality {
    /// Rough estimate from visibility (metres) and relative humidity (%).
    /// NaN inputs fail every comparison and land on `Poor`.
    pub fn estimate(visibility: f64, humidity: f64) -> Self {
        if visibility > 9000.0 && humidity < 70.0 {
            AirQuality::Excellent
        } else if visibility > 6000.0 && humidity < 80.0 {
            AirQuality::Good
        } else if visibility > 3000.0 {
            AirQuality::Moderate
        } else {
            AirQuality::Poor
        }
    }
}

/// Day-of-week and short display date (`"Mon"`, `"OCT 16"`) for a local timestamp.
pub fn format_forecast_date(local: &NaiveDateTime) -> (String, String) {
    let day = local.format("%a").to_string();
    let date = local.format("%b %-d").to_string().to_uppercase();
    (day, date)
}

/// Half-up rounding for displayed integers. `-0` collapses to `0`, NaN stays NaN.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor() + 0.0
}
