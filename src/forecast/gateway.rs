use crate::config::Config;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const CREDENTIAL_PARAM: &str = "appid";

pub type ResponseCache = Cache<String, CachedResponse>;

/// Entries are keyed by the fully resolved request URL and only go stale by
/// age; nothing invalidates them early.
pub fn init_cache(ttl: Duration) -> ResponseCache {
    Cache::builder().time_to_live(ttl).build()
}

#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub data: Value,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Upstream {
    pub data: Value,
    pub from_cache: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (status {status})")]
pub struct UpstreamError {
    pub message: String,
    pub status: u16,
}

impl UpstreamError {
    fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    fn unreachable() -> Self {
        Self::new("Failed to connect to weather service", 500)
    }
}

pub struct UpstreamGateway {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    cache: ResponseCache,
}

impl UpstreamGateway {
    pub fn new(config: &Config, cache: ResponseCache) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("WeatherLookup/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.weather_api_key.clone(),
            base_url: config.weather_base_url.clone(),
            cache,
        })
    }

    /// Resolve one provider call, served from cache while the entry is fresh.
    ///
    /// Two concurrent misses on the same URL both go upstream; the later
    /// response simply overwrites the earlier cache entry.
    pub async fn fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        base_url: Option<&str>,
    ) -> Result<Upstream, UpstreamError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Weather API key is not configured");
            return Err(UpstreamError::new("API key not configured", 500));
        };

        let url = self.request_url(base_url, endpoint, params, api_key)?;

        if let Some(cached) = self.cache.get(url.as_str()).await {
            tracing::debug!(
                "Cache hit: {} {:?} (age {}s)",
                endpoint,
                params,
                (Utc::now() - cached.cached_at).num_seconds()
            );
            return Ok(Upstream {
                data: cached.data,
                from_cache: true,
            });
        }

        tracing::debug!("Fetching: {} {:?}", endpoint, params);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Upstream request to {} failed: {}", endpoint, e);
                return Err(UpstreamError::unreachable());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let message = body
                .as_ref()
                .and_then(|b| b.get("message"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or("API request failed")
                .to_string();

            tracing::warn!("Provider answered {} for {}: {}", status, endpoint, message);
            return Err(UpstreamError::new(message, status.as_u16()));
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Unreadable provider response for {}: {}", endpoint, e);
                return Err(UpstreamError::unreachable());
            }
        };

        self.cache
            .insert(
                url.into(),
                CachedResponse {
                    data: data.clone(),
                    cached_at: Utc::now(),
                },
            )
            .await;

        Ok(Upstream {
            data,
            from_cache: false,
        })
    }

    /// Caller parameters in the given order, then the credential.
    /// Identical inputs produce byte-identical URLs.
    fn request_url(
        &self,
        base_url: Option<&str>,
        endpoint: &str,
        params: &[(&str, &str)],
        api_key: &str,
    ) -> Result<Url, UpstreamError> {
        let base = base_url.unwrap_or(&self.base_url);
        let query = params
            .iter()
            .copied()
            .chain(std::iter::once((CREDENTIAL_PARAM, api_key)));

        Url::parse_with_params(&format!("{}{}", base, endpoint), query).map_err(|e| {
            tracing::error!("Invalid provider URL {}{}: {}", base, endpoint, e);
            UpstreamError::new("Invalid weather service URL", 500)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer, api_key: Option<&str>, ttl: Duration) -> UpstreamGateway {
        let config = Config {
            weather_api_key: api_key.map(str::to_string),
            weather_base_url: server.uri(),
            ..Config::default()
        };
        UpstreamGateway::new(&config, init_cache(ttl)).unwrap()
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_served_from_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Oslo"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Oslo"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = gateway_for(&mock_server, Some("test_key"), Duration::from_secs(300));
        let params = [("q", "Oslo"), ("units", "metric")];

        let first = gateway.fetch("/weather", &params, None).await.unwrap();
        let second = gateway.fetch("/weather", &params, None).await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.data, second.data);
        assert_eq!(second.data["name"], "Oslo");
    }

    #[tokio::test]
    async fn test_expired_entry_is_fetched_again() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": []
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let gateway = gateway_for(&mock_server, Some("test_key"), Duration::from_millis(100));
        let params = [("q", "Lima")];

        let first = gateway.fetch("/forecast", &params, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let second = gateway.fetch("/forecast", &params, None).await.unwrap();

        assert!(!first.from_cache);
        assert!(!second.from_cache);
    }

    #[tokio::test]
    async fn test_different_params_do_not_share_entries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let gateway = gateway_for(&mock_server, Some("test_key"), Duration::from_secs(300));

        gateway.fetch("/weather", &[("q", "Rome")], None).await.unwrap();
        gateway.fetch("/weather", &[("q", "Paris")], None).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_api_key_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let gateway = gateway_for(&mock_server, None, Duration::from_secs(300));
        let err = gateway
            .fetch("/weather", &[("q", "Oslo")], None)
            .await
            .unwrap_err();

        assert_eq!(err.status, 500);
        assert_eq!(err.message, "API key not configured");
    }

    #[tokio::test]
    async fn test_provider_error_is_passed_through_and_not_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let gateway = gateway_for(&mock_server, Some("test_key"), Duration::from_secs(300));

        for _ in 0..2 {
            let err = gateway
                .fetch("/weather", &[("q", "Atlantis")], None)
                .await
                .unwrap_err();
            assert_eq!(err.status, 404);
            assert_eq!(err.message, "city not found");
        }
    }

    #[tokio::test]
    async fn test_provider_error_without_message_uses_fallback() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let gateway = gateway_for(&mock_server, Some("test_key"), Duration::from_secs(300));
        let err = gateway.fetch("/weather", &[], None).await.unwrap_err();

        assert_eq!(err.status, 503);
        assert_eq!(err.message, "API request failed");
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_500_result() {
        let config = Config {
            weather_api_key: Some("test_key".to_string()),
            // Nothing listens on the discard port
            weather_base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let gateway = UpstreamGateway::new(&config, init_cache(Duration::from_secs(300))).unwrap();

        let err = gateway.fetch("/weather", &[("q", "Oslo")], None).await.unwrap_err();

        assert_eq!(err.status, 500);
        assert_eq!(err.message, "Failed to connect to weather service");
    }

    #[tokio::test]
    async fn test_base_url_override() {
        let weather_server = MockServer::start().await;
        let geo_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&geo_server)
            .await;

        let gateway = gateway_for(&weather_server, Some("test_key"), Duration::from_secs(300));
        let result = gateway
            .fetch("/direct", &[("q", "Oslo"), ("limit", "5")], Some(geo_server.uri().as_str()))
            .await
            .unwrap();

        assert_eq!(result.data, serde_json::json!([]));
    }

    #[test]
    fn test_request_url_is_stable_and_carries_credential() {
        let config = Config {
            weather_api_key: Some("k".to_string()),
            weather_base_url: "https://api.example.test/data/2.5".to_string(),
            ..Config::default()
        };
        let gateway = UpstreamGateway::new(&config, init_cache(Duration::from_secs(1))).unwrap();
        let params = [("q", "São Paulo"), ("units", "metric")];

        let first = gateway.request_url(None, "/weather", &params, "k").unwrap();
        let second = gateway.request_url(None, "/weather", &params, "k").unwrap();

        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(
            first.as_str(),
            "https://api.example.test/data/2.5/weather?q=S%C3%A3o+Paulo&units=metric&appid=k"
        );
    }
}
