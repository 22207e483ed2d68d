//! The authoritative in-memory collection of saved forecasts.

use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::{
    error::{ForecastError, Result},
    model::{LocationQuery, SavedForecast},
    notification::{NotificationCenter, user_message},
    persistence::ForecastRepository,
    provider::WeatherProvider,
    view::{self, Page},
};

/// Per-location outcome of a refresh batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshReport {
    /// Keys whose weather was replaced.
    pub updated: Vec<String>,
    /// Keys whose fetch failed, with the failure.
    pub failed: Vec<(String, ForecastError)>,
}

impl RefreshReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.updated.len() + self.failed.len()
    }
}

pub struct ForecastStore {
    provider: Arc<dyn WeatherProvider>,
    repository: ForecastRepository,
    notifications: Arc<NotificationCenter>,
    items: RwLock<Vec<SavedForecast>>,
}

impl ForecastStore {
    /// Build the store and load whatever the repository holds.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        repository: ForecastRepository,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        let items = repository.load();
        tracing::info!(count = items.len(), "forecast store loaded");

        Self {
            provider,
            repository,
            notifications,
            items: RwLock::new(items),
        }
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Snapshot of the collection, front first.
    pub fn items(&self) -> Vec<SavedForecast> {
        self.items.read().clone()
    }

    pub fn get(&self, key: &str) -> Option<SavedForecast> {
        self.items.read().iter().find(|i| i.key == key).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Fetch `query` and upsert it. An existing key keeps its position; a new
    /// key goes to the front.
    pub async fn add(&self, query: &LocationQuery) -> Result<SavedForecast> {
        match self.try_add(query).await {
            Ok((entry, replaced)) => {
                let verb = if replaced { "Updated" } else { "Added" };
                self.notifications
                    .success(format!("{verb} weather for {}.", display_name(&entry)));
                Ok(entry)
            }
            Err(e) => {
                tracing::warn!(error = %e, mode = %query.mode, "add failed");
                self.notifications.danger(user_message(&e));
                Err(e)
            }
        }
    }

    async fn try_add(&self, query: &LocationQuery) -> Result<(SavedForecast, bool)> {
        self.ensure_configured()?;
        let resolved = query.resolve()?;
        let snapshot = self.provider.fetch_weather(query).await?;

        let mut entry = SavedForecast::new(&resolved, snapshot);
        let mut items = self.items.write();

        let replaced = match items.iter().position(|i| i.key == entry.key) {
            Some(pos) => {
                entry.weather.updated_at = next_stamp(items[pos].weather.updated_at);
                items[pos] = entry.clone();
                true
            }
            None => {
                entry.weather.updated_at = next_stamp(0);
                items.insert(0, entry.clone());
                false
            }
        };

        tracing::info!(key = %entry.key, replaced, "saved forecast");
        self.repository.save(&items);
        Ok((entry, replaced))
    }

    /// Remove `key` if present. Absent keys are not an error.
    pub fn remove(&self, key: &str) -> Option<SavedForecast> {
        let mut items = self.items.write();
        let removed = items
            .iter()
            .position(|i| i.key == key)
            .map(|pos| items.remove(pos));

        self.repository.save(&items);
        drop(items);

        match &removed {
            Some(entry) => {
                tracing::info!(key, "removed forecast");
                self.notifications
                    .info(format!("Removed {}.", display_name(entry)));
            }
            None => {
                tracing::debug!(key, "remove: key not present");
                self.notifications.info("Location removed.");
            }
        }

        removed
    }

    /// Re-fetch every saved entry concurrently and apply each success on its own.
    ///
    /// Failures are collected and reported in one notification; successful
    /// updates are kept and persisted regardless.
    pub async fn refresh_all(&self, announce: bool) -> Result<RefreshReport> {
        if let Err(e) = self.ensure_configured() {
            self.notifications.danger(user_message(&e));
            return Err(e);
        }

        let targets: Vec<(String, LocationQuery)> = self
            .items
            .read()
            .iter()
            .map(|i| (i.key.clone(), i.query()))
            .collect();

        if targets.is_empty() {
            if announce {
                self.notifications.success("Nothing to refresh.");
            }
            return Ok(RefreshReport::default());
        }

        tracing::debug!(count = targets.len(), "refreshing saved forecasts");

        let provider = &self.provider;
        let outcomes = join_all(targets.into_iter().map(|(key, query)| async move {
            let result = provider.fetch_weather(&query).await;
            (key, result)
        }))
        .await;

        let mut report = RefreshReport::default();
        {
            let mut items = self.items.write();
            for (key, outcome) in outcomes {
                match outcome {
                    Ok(mut snapshot) => {
                        // Entries removed while the batch was in flight stay removed.
                        if let Some(item) = items.iter_mut().find(|i| i.key == key) {
                            snapshot.updated_at = next_stamp(item.weather.updated_at);
                            item.weather = snapshot;
                            report.updated.push(key);
                        }
                    }
                    Err(e) => report.failed.push((key, e)),
                }
            }

            if !report.updated.is_empty() {
                self.repository.save(&items);
            }
        }

        if let Some((key, first)) = report.failed.first() {
            tracing::warn!(
                failed = report.failed.len(),
                updated = report.updated.len(),
                first_key = %key,
                error = %first,
                "refresh finished with failures"
            );
            self.notifications.danger(format!(
                "Failed to refresh {} location(s): {}",
                report.failed.len(),
                user_message(first)
            ));
        } else {
            tracing::info!(updated = report.updated.len(), "refresh finished");
            if announce {
                self.notifications.success(format!(
                    "Refreshed weather for {} location(s).",
                    report.updated.len()
                ));
            }
        }

        Ok(report)
    }

    /// Convenience over [`view::search`] on the current collection.
    pub fn search(&self, term: &str) -> Vec<SavedForecast> {
        let items = self.items.read();
        view::search(&items, term).into_iter().cloned().collect()
    }

    /// Filter then paginate the current collection.
    /// Returns the visible entries, the effective page and the page count.
    pub fn page(
        &self,
        term: &str,
        page: usize,
        page_size: usize,
    ) -> (Vec<SavedForecast>, usize, usize) {
        let items = self.items.read();
        let filtered = view::search(&items, term);
        let Page { items: visible, page, total_pages, .. } =
            view::paginate(&filtered, page, page_size);
        (visible.into_iter().cloned().collect(), page, total_pages)
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.provider.is_configured() {
            Ok(())
        } else {
            Err(ForecastError::missing_api_key())
        }
    }
}

impl std::fmt::Debug for ForecastStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastStore")
            .field("provider", &self.provider)
            .field("items", &self.items.read().len())
            .finish()
    }
}

/// Wall-clock millis, bumped past `previous` so stamps strictly increase even
/// when a cached response is applied again.
fn next_stamp(previous: i64) -> i64 {
    Utc::now().timestamp_millis().max(previous + 1)
}

fn display_name(entry: &SavedForecast) -> &str {
    if entry.weather.name.is_empty() {
        &entry.value
    } else {
        &entry.weather.name
    }
}
