use std::{sync::Arc, time::Duration};

use crate::{
    Config,
    notification::NotificationCenter,
    persistence::{FileKeyValueStore, ForecastRepository},
    provider::{WeatherProvider, provider_from_config},
    scheduler::RefreshScheduler,
    store::ForecastStore,
};

/// Top-level application state and lifecycle.
///
/// Construction loads the saved collection; [`Dashboard::start`] kicks off the
/// startup refresh and the recurring timer; [`Dashboard::shutdown`] tears the
/// timer down.
pub struct Dashboard {
    store: Arc<ForecastStore>,
    notifications: Arc<NotificationCenter>,
    refresh_interval: Duration,
    scheduler: Option<RefreshScheduler>,
}

impl Dashboard {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        repository: ForecastRepository,
        refresh_interval: Duration,
    ) -> Self {
        let notifications = Arc::new(NotificationCenter::new());
        let store = Arc::new(ForecastStore::new(provider, repository, notifications.clone()));

        Self {
            store,
            notifications,
            refresh_interval,
            scheduler: None,
        }
    }

    /// Wire the OpenWeather provider and the on-disk repository from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let data_dir = config.data_dir()?;
        tracing::debug!(data_dir = %data_dir.display(), "using data directory");
        let repository = ForecastRepository::new(Box::new(FileKeyValueStore::new(data_dir)));

        Ok(Self::new(provider, repository, config.refresh_interval()))
    }

    pub fn store(&self) -> &Arc<ForecastStore> {
        &self.store
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.as_ref().is_some_and(RefreshScheduler::is_running)
    }

    /// Refresh once if there is anything to refresh and a credential, then
    /// start the recurring timer. Calling `start` twice is a no-op.
    pub async fn start(&mut self) {
        if self.scheduler.is_some() {
            return;
        }

        if !self.store.is_empty() && self.store.is_configured() {
            match self.store.refresh_all(false).await {
                Ok(report) if !report.is_success() => tracing::warn!(
                    failed = report.failed.len(),
                    updated = report.updated.len(),
                    "startup refresh incomplete"
                ),
                Ok(report) => {
                    tracing::debug!(updated = report.updated.len(), "startup refresh done")
                }
                Err(e) => tracing::warn!(error = %e, "startup refresh failed"),
            }
        }

        self.scheduler = Some(RefreshScheduler::start(
            self.store.clone(),
            self.refresh_interval,
        ));
        tracing::info!("dashboard started");
    }

    pub async fn shutdown(&mut self) {
        tracing::info!("shutting down dashboard");
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ForecastError, Result},
        model::{LocationQuery, WeatherSnapshot},
        persistence::MemoryKeyValueStore,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Provider {
        configured: bool,
        failing: bool,
        calls: AtomicUsize,
    }

    impl Provider {
        fn new(configured: bool) -> Arc<Self> {
            Arc::new(Self { configured, failing: false, calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { configured: true, failing: true, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl WeatherProvider for Provider {
        async fn fetch_weather(&self, query: &LocationQuery) -> Result<WeatherSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            query.resolve()?;
            if self.failing {
                return Err(ForecastError::Transport("connection reset".into()));
            }
            Ok(WeatherSnapshot { name: query.value.clone(), ..Default::default() })
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    fn seeded_repository() -> ForecastRepository {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let repo = ForecastRepository::new(Box::new(kv.clone()));

        let resolved = LocationQuery::city("London").resolve().unwrap();
        repo.save(&[crate::model::SavedForecast::new(&resolved, WeatherSnapshot::default())]);
        ForecastRepository::new(Box::new(kv))
    }

    #[tokio::test(start_paused = true)]
    async fn start_refreshes_saved_entries_once() {
        let provider = Provider::new(true);
        let mut dashboard =
            Dashboard::new(provider.clone(), seeded_repository(), Duration::from_secs(300));

        dashboard.start().await;
        assert!(dashboard.is_running());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        dashboard.start().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        dashboard.shutdown().await;
        assert!(!dashboard.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn start_skips_refresh_without_entries() {
        let provider = Provider::new(true);
        let mut dashboard = Dashboard::new(
            provider.clone(),
            ForecastRepository::in_memory(),
            Duration::from_secs(300),
        );

        dashboard.start().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        dashboard.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_skips_refresh_without_credential() {
        let provider = Provider::new(false);
        let mut dashboard =
            Dashboard::new(provider.clone(), seeded_repository(), Duration::from_secs(300));

        dashboard.start().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(dashboard.notifications().active().is_empty());

        let err = dashboard
            .store()
            .add(&LocationQuery::city("Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, ForecastError::Configuration(_)));
        dashboard.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_startup_refresh_still_starts_timer() {
        let provider = Provider::failing();
        let mut dashboard =
            Dashboard::new(provider.clone(), seeded_repository(), Duration::from_secs(300));

        dashboard.start().await;
        assert!(dashboard.is_running());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(dashboard.store().len(), 1);

        let notes = dashboard.notifications().drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, crate::notification::NotificationKind::Danger);
        dashboard.shutdown().await;
    }
}
