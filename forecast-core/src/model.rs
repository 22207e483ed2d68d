use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::{ForecastError, Result};

/// Strategy used to resolve a location with the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    City,
    Zip,
    Coords,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::City => "city",
            SearchMode::Zip => "zip",
            SearchMode::Coords => "coords",
        }
    }

    pub const fn all() -> &'static [SearchMode] {
        &[SearchMode::City, SearchMode::Zip, SearchMode::Coords]
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SearchMode {
    type Error = ForecastError;

    fn try_from(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "city" => Ok(SearchMode::City),
            "zip" => Ok(SearchMode::Zip),
            "coords" => Ok(SearchMode::Coords),
            _ => Err(ForecastError::validation(format!(
                "Unknown search mode '{value}'. Supported modes: city, zip, coords."
            ))),
        }
    }
}

/// Raw lookup input, as entered in the add form or rebuilt from a saved entry.
///
/// Nothing is validated at construction; see [`LocationQuery::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub mode: SearchMode,
    pub value: String,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl LocationQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::City,
            value: name.into(),
            country: None,
            lat: None,
            lon: None,
        }
    }

    pub fn zip(code: impl Into<String>, country: Option<String>) -> Self {
        Self {
            mode: SearchMode::Zip,
            value: code.into(),
            country,
            lat: None,
            lon: None,
        }
    }

    pub fn coords(lat: Option<f64>, lon: Option<f64>) -> Self {
        Self {
            mode: SearchMode::Coords,
            value: String::new(),
            country: None,
            lat,
            lon,
        }
    }

    /// Validate the fields required by `mode` and normalize them.
    pub fn resolve(&self) -> Result<ResolvedQuery> {
        match self.mode {
            SearchMode::City => {
                let city = self.value.trim();
                if city.is_empty() {
                    return Err(ForecastError::validation("Please enter a city name."));
                }
                Ok(ResolvedQuery::City(city.to_string()))
            }
            SearchMode::Zip => {
                let code = self.value.trim();
                if code.is_empty() {
                    return Err(ForecastError::validation("Please enter a ZIP / postal code."));
                }
                let country = self
                    .country
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string);
                Ok(ResolvedQuery::Zip { code: code.to_string(), country })
            }
            SearchMode::Coords => match (self.lat, self.lon) {
                (Some(lat), Some(lon)) if !lat.is_nan() && !lon.is_nan() => {
                    Ok(ResolvedQuery::Coords { lat, lon })
                }
                _ => Err(ForecastError::validation(
                    "Please enter both latitude and longitude.",
                )),
            },
        }
    }
}

/// A validated query, ready to become provider parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedQuery {
    City(String),
    Zip { code: String, country: Option<String> },
    Coords { lat: f64, lon: f64 },
}

impl ResolvedQuery {
    pub fn mode(&self) -> SearchMode {
        match self {
            ResolvedQuery::City(_) => SearchMode::City,
            ResolvedQuery::Zip { .. } => SearchMode::Zip,
            ResolvedQuery::Coords { .. } => SearchMode::Coords,
        }
    }

    /// City name, postal code, or `"{lat},{lon}"`.
    pub fn primary(&self) -> String {
        match self {
            ResolvedQuery::City(city) => city.clone(),
            ResolvedQuery::Zip { code, .. } => code.clone(),
            ResolvedQuery::Coords { lat, lon } => format!("{lat},{lon}"),
        }
    }

    /// Collection key: `{mode}-{primary}`, lower-cased.
    pub fn key(&self) -> String {
        derive_key(self.mode(), &self.primary())
    }

    /// Location parameters for the provider request (credential and units excluded).
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            ResolvedQuery::City(city) => vec![("q", city.clone())],
            ResolvedQuery::Zip { code, country: Some(country) } => {
                vec![("zip", format!("{code},{country}"))]
            }
            ResolvedQuery::Zip { code, country: None } => vec![("zip", code.clone())],
            ResolvedQuery::Coords { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

pub fn derive_key(mode: SearchMode, primary: &str) -> String {
    format!("{}-{}", mode.as_str(), primary).to_lowercase()
}

/// Normalized current conditions for one location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub description: String,
    pub icon: String,
    /// Degrees Celsius.
    pub temp: f64,
    /// Percent.
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
    /// Epoch seconds.
    pub sunrise: i64,
    /// Epoch seconds.
    pub sunset: i64,
    /// Epoch milliseconds of the last successful fetch.
    pub updated_at: i64,
}

impl WeatherSnapshot {
    pub fn rounded_temp(&self) -> i64 {
        self.temp.round() as i64
    }
}

/// A registered location plus its last-known weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedForecast {
    pub key: String,
    pub mode: SearchMode,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub weather: WeatherSnapshot,
}

impl SavedForecast {
    pub fn new(query: &ResolvedQuery, weather: WeatherSnapshot) -> Self {
        let (country, lat, lon) = match query {
            ResolvedQuery::City(_) => (None, None, None),
            ResolvedQuery::Zip { country, .. } => (country.clone(), None, None),
            ResolvedQuery::Coords { lat, lon } => (None, Some(*lat), Some(*lon)),
        };

        Self {
            key: query.key(),
            mode: query.mode(),
            value: query.primary(),
            country,
            lat,
            lon,
            weather,
        }
    }

    /// Rebuild the lookup used to refresh this entry. Coordinate entries use
    /// `lat`/`lon`, never `value`.
    pub fn query(&self) -> LocationQuery {
        match self.mode {
            SearchMode::City => LocationQuery::city(self.value.clone()),
            SearchMode::Zip => LocationQuery::zip(self.value.clone(), self.country.clone()),
            SearchMode::Coords => LocationQuery::coords(self.lat, self.lon),
        }
    }

    /// Check the per-mode field invariants and that `key` matches the stored fields.
    pub fn validate(&self) -> Result<()> {
        let resolved = self.query().resolve()?;
        let expected = resolved.key();
        if self.key != expected {
            return Err(ForecastError::validation(format!(
                "Saved entry key '{}' does not match its fields (expected '{expected}').",
                self.key
            )));
        }
        Ok(())
    }
}
