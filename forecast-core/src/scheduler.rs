//! Timer-driven auto-refresh.

use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;

use crate::store::ForecastStore;

/// Owns a background task that calls [`ForecastStore::refresh_all`] every
/// `period`. Ticks do not wait for one another: a slow refresh may overlap the
/// next one.
#[derive(Debug)]
pub struct RefreshScheduler {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawn the timer on the current tokio runtime. The first tick fires one
    /// `period` after start.
    pub fn start(store: Arc<ForecastStore>, period: Duration) -> Self {
        let token = CancellationToken::new();
        let child = token.clone();

        tracing::info!(period_secs = period.as_secs(), "starting refresh scheduler");

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let store = store.clone();
                        // Detached so a slow refresh never delays the next tick.
                        tokio::spawn(async move {
                            if let Err(e) = store.refresh_all(false).await {
                                tracing::warn!(error = %e, "scheduled refresh failed");
                            }
                        });
                    }
                }
            }

            tracing::debug!("refresh scheduler loop exited");
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the timer and wait for its task to end. Refreshes already in
    /// flight complete on their own.
    pub async fn stop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "refresh scheduler task panicked");
            }
            tracing::info!("refresh scheduler stopped");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Result,
        model::{LocationQuery, WeatherSnapshot},
        notification::NotificationCenter,
        persistence::ForecastRepository,
        provider::WeatherProvider,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn fetch_weather(&self, query: &LocationQuery) -> Result<WeatherSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherSnapshot {
                name: query.value.clone(),
                ..Default::default()
            })
        }
    }

    async fn store_with_one_entry(provider: Arc<CountingProvider>) -> Arc<ForecastStore> {
        let store = Arc::new(ForecastStore::new(
            provider,
            ForecastRepository::in_memory(),
            Arc::new(NotificationCenter::new()),
        ));
        store.add(&LocationQuery::city("London")).await.unwrap();
        store
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let provider = Arc::new(CountingProvider::default());
        let store = store_with_one_entry(provider.clone()).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        let mut scheduler = RefreshScheduler::start(store, Duration::from_secs(300));
        settle().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks() {
        let provider = Arc::new(CountingProvider::default());
        let store = store_with_one_entry(provider.clone()).await;

        let mut scheduler = RefreshScheduler::start(store, Duration::from_secs(60));
        assert!(scheduler.is_running());
        scheduler.stop().await;
        assert!(!scheduler.is_running());

        tokio::time::advance(Duration::from_secs(600)).await;
        settle().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
