use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod forecast;
mod routes;
mod utils;

use config::Config;
use forecast::gateway::{init_cache, UpstreamGateway};
use forecast::openweather::OpenWeatherClient;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_lookup_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if config.weather_api_key.is_none() {
        tracing::warn!("WEATHER_API_KEY is not set; every lookup will fail until it is configured");
    }

    // One cache for the whole process, handed to the gateway
    let cache = init_cache(Duration::from_secs(config.cache_ttl_secs));
    let gateway = Arc::new(UpstreamGateway::new(&config, cache)?);
    let weather_client = Arc::new(OpenWeatherClient::new(gateway, config.geo_base_url.clone()));

    let state = AppState { weather_client };

    let app = create_router(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        "Server starting on http://{} (cache TTL {}s)",
        config.bind_addr,
        config.cache_ttl_secs
    );

    axum::serve(listener, app).await?;

    Ok(())
}
