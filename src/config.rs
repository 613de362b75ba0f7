use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Provider credential. `None` is reported per request, not at startup.
    #[serde(skip_serializing)]
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
    pub geo_base_url: String,
    pub cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            weather_api_key: None,
            weather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            geo_base_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            cache_ttl_secs: 5 * 60,
            http_timeout_secs: 30,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        Ok(Config {
            weather_api_key: env::var("WEATHER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            weather_base_url: env::var("WEATHER_API_URL")
                .unwrap_or(defaults.weather_base_url),
            geo_base_url: env::var("WEATHER_GEO_URL").unwrap_or(defaults.geo_base_url),
            cache_ttl_secs: parse_var("WEATHER_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_var(name: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
