//! User-facing notifications and error-to-message mapping.

use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::error::ForecastError;

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3500);

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: Could not reach the server. Check your connection.";
pub const INVALID_KEY_MESSAGE: &str = "Invalid API key. Check your configuration.";
pub const NOT_FOUND_MESSAGE: &str = "Location not found. Check the name or code and try again.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please wait a moment and try again.";
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Map a failure to the text shown to the user.
///
/// Order matters: plain messages win over transport detection, which wins over
/// status-based messages.
pub fn user_message(err: &ForecastError) -> String {
    match err {
        ForecastError::Validation(msg) | ForecastError::Configuration(msg) => msg.clone(),
        ForecastError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
        ForecastError::Api { status, message: Some(message) } => format!("[{status}] {message}"),
        ForecastError::Api { status, message: None } => match status {
            401 => INVALID_KEY_MESSAGE.to_string(),
            404 => NOT_FOUND_MESSAGE.to_string(),
            429 => RATE_LIMITED_MESSAGE.to_string(),
            other => format!("API error: {other}"),
        },
        ForecastError::Message(msg) | ForecastError::Persistence(msg)
            if !msg.trim().is_empty() =>
        {
            msg.clone()
        }
        _ => FALLBACK_MESSAGE.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Danger,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppNotification {
    pub id: u64,
    pub kind: NotificationKind,
    pub text: String,
    pub created_at: Instant,
}

impl AppNotification {
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.created_at) >= ttl
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    items: Vec<AppNotification>,
}

/// Ephemeral notification list; entries expire after a fixed TTL.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn push(&self, kind: NotificationKind, text: impl Into<String>) -> u64 {
        self.push_at(kind, text.into(), Instant::now())
    }

    fn push_at(&self, kind: NotificationKind, text: String, now: Instant) -> u64 {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        tracing::debug!(id, kind = kind.as_str(), %text, "notification");
        inner.items.push(AppNotification {
            id,
            kind,
            text,
            created_at: now,
        });
        id
    }

    pub fn success(&self, text: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, text)
    }

    pub fn info(&self, text: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, text)
    }

    pub fn danger(&self, text: impl Into<String>) -> u64 {
        self.push(NotificationKind::Danger, text)
    }

    /// Raise a `danger` notification carrying the mapped message for `err`.
    pub fn error(&self, err: &ForecastError) -> u64 {
        self.danger(user_message(err))
    }

    pub fn active(&self) -> Vec<AppNotification> {
        self.active_at(Instant::now())
    }

    /// Drop expired entries and return the rest, oldest first.
    pub fn active_at(&self, now: Instant) -> Vec<AppNotification> {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        inner.items.retain(|n| !n.is_expired(now, ttl));
        inner.items.clone()
    }

    pub fn dismiss(&self, id: u64) {
        self.inner.lock().items.retain(|n| n.id != id);
    }

    /// Remove and return everything raised since the last drain, expired or not.
    pub fn drain(&self) -> Vec<AppNotification> {
        std::mem::take(&mut self.inner.lock().items)
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_messages_are_returned_as_is() {
        let err = ForecastError::validation("Please enter a city name.");
        assert_eq!(user_message(&err), "Please enter a city name.");

        let err = ForecastError::Configuration("No API key configured.".into());
        assert_eq!(user_message(&err), "No API key configured.");
    }

    #[test]
    fn transport_error_message() {
        let err = ForecastError::Transport("connection refused".into());
        assert_eq!(user_message(&err), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn provider_message_wins_over_status_table() {
        let err = ForecastError::api(404, Some("city not found".into()));
        assert_eq!(user_message(&err), "[404] city not found");

        let err = ForecastError::api(401, Some("Invalid API key".into()));
        assert_eq!(user_message(&err), "[401] Invalid API key");
    }

    #[test]
    fn status_only_messages() {
        assert_eq!(user_message(&ForecastError::api(401, None)), INVALID_KEY_MESSAGE);
        assert_eq!(user_message(&ForecastError::api(404, None)), NOT_FOUND_MESSAGE);
        assert_eq!(user_message(&ForecastError::api(429, None)), RATE_LIMITED_MESSAGE);
        assert_eq!(user_message(&ForecastError::api(503, None)), "API error: 503");
    }

    #[test]
    fn generic_message_and_fallback() {
        let err = ForecastError::Message("Failed to parse response".into());
        assert_eq!(user_message(&err), "Failed to parse response");

        assert_eq!(user_message(&ForecastError::Message("  ".into())), FALLBACK_MESSAGE);
        assert_eq!(user_message(&ForecastError::Unknown), FALLBACK_MESSAGE);
    }

    #[test]
    fn notifications_expire_after_ttl() {
        let center = NotificationCenter::new();
        let start = Instant::now();
        center.push_at(NotificationKind::Success, "Added London".into(), start);
        center.push_at(
            NotificationKind::Info,
            "Removed".into(),
            start + Duration::from_millis(2000),
        );

        let active = center.active_at(start + Duration::from_millis(3000));
        assert_eq!(active.len(), 2);

        let active = center.active_at(start + Duration::from_millis(3500));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].text, "Removed");

        assert!(center.active_at(start + Duration::from_millis(6000)).is_empty());
    }

    #[test]
    fn dismiss_removes_single_notification() {
        let center = NotificationCenter::new();
        let a = center.info("a");
        let b = center.danger("b");

        center.dismiss(a);
        let active = center.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
        assert_eq!(active[0].kind, NotificationKind::Danger);
    }

    #[test]
    fn error_uses_mapped_message() {
        let center = NotificationCenter::new();
        center.error(&ForecastError::api(429, None));

        let drained = center.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].kind, NotificationKind::Danger);
        assert_eq!(drained[0].text, RATE_LIMITED_MESSAGE);
        assert!(center.active().is_empty());
    }
}
