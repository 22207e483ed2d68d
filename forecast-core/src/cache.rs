//! Short-lived response cache for provider GET requests.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::model::WeatherSnapshot;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: WeatherSnapshot,
    stored_at: Instant,
}

/// TTL map keyed by the effective request parameters.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Build a stable key from request parameters, independent of their order.
    pub fn key_for(params: &[(&str, String)]) -> String {
        let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();
        pairs.join("&")
    }

    pub fn get(&self, key: &str) -> Option<WeatherSnapshot> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<WeatherSnapshot> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if now.duration_since(entry.stored_at) < self.ttl => {
                Some(entry.snapshot.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, snapshot: WeatherSnapshot) {
        self.insert_at(key, snapshot, Instant::now());
    }

    /// Store `snapshot` and drop every entry that has outlived the TTL.
    fn insert_at(&self, key: String, snapshot: WeatherSnapshot, now: Instant) {
        let mut entries = self.entries.lock();
        entries.retain(|_, e| now.duration_since(e.stored_at) < self.ttl);
        entries.insert(key, CacheEntry { snapshot, stored_at: now });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
