use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};

use crate::{
    cache::ResponseCache,
    error::{ForecastError, Result},
    model::{LocationQuery, WeatherSnapshot},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
    timeout: Duration,
    cache: Arc<ResponseCache>,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let http = Client::builder().build().map_err(|e| {
            ForecastError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
            timeout: REQUEST_TIMEOUT,
            cache: Arc::new(ResponseCache::default()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Arc::new(ResponseCache::new(ttl));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn fetch_current(&self, params: Vec<(&'static str, String)>) -> Result<WeatherSnapshot> {
        let cache_key = ResponseCache::key_for(&params);
        if let Some(hit) = self.cache.get(&cache_key) {
            tracing::debug!(name = %hit.name, "weather cache hit");
            return Ok(hit);
        }

        tracing::debug!(url = %self.base_url, "requesting current weather");
        let res = self
            .http
            .get(&self.base_url)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            // A body that fails to read still maps to an API error for this status.
            let body = match res.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to read error body");
                    None
                }
            };
            return Err(api_error(status.as_u16(), body.as_deref()));
        }

        let body = res.text().await?;
        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            ForecastError::Message(format!("Failed to parse OpenWeather response: {e}"))
        })?;

        let snapshot = parsed.into_snapshot(Utc::now().timestamp_millis());
        self.cache.insert(cache_key, snapshot.clone());

        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_weather(&self, query: &LocationQuery) -> Result<WeatherSnapshot> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(ForecastError::missing_api_key)?;

        let resolved = query.resolve()?;

        let mut params = resolved.params();
        params.push(("appid", api_key.to_string()));
        params.push(("units", "metric".to_string()));

        self.fetch_current(params).await
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    id: i64,
    name: String,
    sys: OwSys,
    main: OwMain,
    wind: OwWind,
    weather: Vec<OwWeather>,
}

impl OwCurrentResponse {
    fn into_snapshot(self, updated_at: i64) -> WeatherSnapshot {
        let (description, icon) = self
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_default();

        WeatherSnapshot {
            id: self.id,
            name: self.name,
            country: self.sys.country,
            description,
            icon,
            temp: self.main.temp,
            humidity: self.main.humidity,
            wind_speed: self.wind.speed,
            pressure: self.main.pressure,
            sunrise: self.sys.sunrise,
            sunset: self.sys.sunset,
            updated_at,
        }
    }
}

fn api_error(status: u16, body: Option<&str>) -> ForecastError {
    let message = body
        .and_then(|b| serde_json::from_str::<OwErrorBody>(b).ok())
        .and_then(|b| b.message);
    tracing::debug!(status, body = %truncate_body(body.unwrap_or_default()), "provider error");
    ForecastError::api(status, message)
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
