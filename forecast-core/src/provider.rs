use crate::{
    Config,
    error::Result,
    model::{LocationQuery, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions for `query`.
    ///
    /// Fails with `Validation` before any network call when the query is incomplete,
    /// `Transport` when no response arrives, `Api` on a non-2xx status.
    async fn fetch_weather(&self, query: &LocationQuery) -> Result<WeatherSnapshot>;

    /// Whether a credential is available. Fetches fail with `Configuration` otherwise.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Construct the OpenWeather provider from config.
///
/// A missing API key is not an error here: the provider is still built so the
/// dashboard can load and display saved entries, and every fetch reports the
/// missing credential instead.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::new(config.api_key().map(str::to_owned))?
        .with_base_url(config.base_url.clone())
        .with_cache_ttl(config.cache_ttl());

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_without_key_is_unconfigured() {
        let mut cfg = Config::default();
        cfg.api_key = None;
        let provider = provider_from_config(&cfg).expect("provider should build");
        assert!(!provider.is_configured());
    }

    #[test]
    fn provider_from_config_with_key_is_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg).expect("provider should build");
        assert!(provider.is_configured());
    }
}
