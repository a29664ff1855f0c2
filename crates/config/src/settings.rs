//! In-memory settings store with per-key change streams.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::value::{SettingValue, Value};

/// Shared settings store.
///
/// Each key owns a watch channel, so readers always see the latest value and
/// intermediate writes may be coalesced. Cloning is cheap and clones share
/// state.
#[derive(Clone, Default)]
pub struct Settings {
    /// One channel per key ever written or subscribed.
    slots: Arc<Mutex<HashMap<String, watch::Sender<Option<Value>>>>>,
}

impl Settings {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw value of `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.slots.lock().get(key).and_then(|tx| tx.borrow().clone())
    }

    /// Store `value` under `key`, notifying subscribers when it changed.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut slots = self.slots.lock();
        match slots.get(key) {
            Some(tx) => {
                let changed = tx.send_if_modified(|cur| {
                    if cur.as_ref() == Some(&value) {
                        return false;
                    }
                    *cur = Some(value.clone());
                    true
                });
                if changed {
                    debug!(key, %value, "setting_changed");
                }
            }
            None => {
                debug!(key, %value, "setting_created");
                let (tx, _rx) = watch::channel(Some(value));
                slots.insert(key.to_string(), tx);
            }
        }
    }

    /// Clear `key`; subscribers fall back to their defaults.
    pub fn remove(&self, key: &str) {
        if let Some(tx) = self.slots.lock().get(key) {
            let changed = tx.send_if_modified(|cur| cur.take().is_some());
            if changed {
                debug!(key, "setting_removed");
            }
        }
    }

    /// All keys that currently hold a value.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.slots
            .lock()
            .iter()
            .filter_map(|(k, tx)| tx.borrow().clone().map(|v| (k.clone(), v)))
            .collect()
    }

    /// Watch `key`, reading it as `T` with `default` for absent or mistyped values.
    pub fn subscribe<T: SettingValue>(&self, key: &str, default: T) -> SettingStream<T> {
        let rx = self
            .slots
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();
        SettingStream {
            key: key.to_string(),
            rx,
            default,
            primed: false,
        }
    }

    /// Watch a boolean setting.
    pub fn subscribe_bool(&self, key: &str, default: bool) -> SettingStream<bool> {
        self.subscribe(key, default)
    }

    /// Watch an integer setting.
    pub fn subscribe_int(&self, key: &str, default: i64) -> SettingStream<i64> {
        self.subscribe(key, default)
    }

    /// Watch a string setting.
    pub fn subscribe_str(&self, key: &str, default: impl Into<String>) -> SettingStream<String> {
        self.subscribe(key, default.into())
    }
}

/// Stream of values for one key.
///
/// The first `next()` yields the current value immediately; later calls wait
/// for a change. Ends when the owning [`Settings`] is dropped.
pub struct SettingStream<T> {
    /// Watched key, for logging.
    key: String,
    /// Watch receiver for the key.
    rx: watch::Receiver<Option<Value>>,
    /// Substituted for absent or mistyped values.
    default: T,
    /// Whether the initial value was delivered.
    primed: bool,
}

impl<T: SettingValue> SettingStream<T> {
    /// Key this stream watches.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value without waiting.
    pub fn current(&self) -> T {
        self.decode(self.rx.borrow().as_ref())
    }

    /// Next value; `None` once the store is gone.
    pub async fn next(&mut self) -> Option<T> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        let raw = self.rx.borrow_and_update().clone();
        Some(self.decode(raw.as_ref()))
    }

    /// Map a raw value onto `T`.
    fn decode(&self, raw: Option<&Value>) -> T {
        match raw {
            Some(v) => T::from_value(v).unwrap_or_else(|| {
                trace!(key = %self.key, kind = v.kind(), "setting_type_mismatch");
                self.default.clone()
            }),
            None => self.default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn first_value_is_default_then_changes() {
        let s = Settings::new();
        let mut stream = s.subscribe_bool("app_enabled_com.a", true);
        assert_eq!(stream.next().await, Some(true));
        s.set("app_enabled_com.a", false);
        assert_eq!(stream.next().await, Some(false));
        s.remove("app_enabled_com.a");
        assert_eq!(stream.next().await, Some(true));
    }

    #[tokio::test]
    async fn existing_value_delivered_first() {
        let s = Settings::new();
        s.set("encryption_long_press_delay", 400i64);
        let mut stream = s.subscribe_int("encryption_long_press_delay", 250);
        assert_eq!(stream.current(), 400);
        assert_eq!(stream.next().await, Some(400));
    }

    #[tokio::test]
    async fn mistyped_value_yields_default() {
        let s = Settings::new();
        s.set("scan_btn_active", "yes");
        let mut stream = s.subscribe_bool("scan_btn_active", false);
        assert_eq!(stream.next().await, Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn identical_write_does_not_notify() {
        let s = Settings::new();
        s.set("custom_apps", "[]");
        let mut stream = s.subscribe_str("custom_apps", "[]");
        assert_eq!(stream.next().await.as_deref(), Some("[]"));
        s.set("custom_apps", "[]");
        assert!(
            timeout(Duration::from_millis(50), stream.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn stream_ends_when_store_dropped() {
        let s = Settings::new();
        let mut stream = s.subscribe_str("current_key", "");
        assert_eq!(stream.next().await.as_deref(), Some(""));
        drop(s);
        assert_eq!(stream.next().await, None);
    }

    #[test]
    fn snapshot_skips_cleared_keys() {
        let s = Settings::new();
        s.set("a", true);
        s.set("b", 3i64);
        let _watch = s.subscribe_bool("c", false);
        s.remove("a");
        let snap = s.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("b"), Some(&Value::Int(3)));
    }
}
