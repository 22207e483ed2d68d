//! Core library for the `forecast` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client with its short-lived response cache
//! - The saved-forecast store, its persistence and derived views
//! - Auto-refresh scheduling and user-facing notifications
//!
//! It is used by `forecast-cli`, but can also be reused by other front ends.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod notification;
pub mod persistence;
pub mod provider;
pub mod scheduler;
pub mod store;
pub mod view;

pub use app::Dashboard;
pub use config::Config;
pub use error::{ForecastError, Result};
pub use model::{LocationQuery, SavedForecast, SearchMode, WeatherSnapshot};
pub use notification::{AppNotification, NotificationCenter, NotificationKind, user_message};
pub use persistence::{FileKeyValueStore, ForecastRepository, KeyValueStore, MemoryKeyValueStore};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use scheduler::RefreshScheduler;
pub use store::{ForecastStore, RefreshReport};
pub use view::{Page, ViewState};
