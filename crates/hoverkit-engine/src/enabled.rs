//! Per-package "listening enabled" cache and the watchers that fill it.

use std::{collections::HashMap, sync::Arc};

use config::{Settings, keys};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Shared enablement flags.
///
/// Written by background watchers, read by the dispatcher. Each key is
/// replaced atomically; absent keys read as enabled.
#[derive(Clone, Debug, Default)]
pub struct EnabledApps {
    /// Package → enabled.
    inner: Arc<RwLock<HashMap<String, bool>>>,
}

impl EnabledApps {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether events from `package` should be handled.
    pub fn is_enabled(&self, package: &str) -> bool {
        self.inner
            .read()
            .get(package)
            .copied()
            .unwrap_or(keys::APP_ENABLED_DEFAULT)
    }

    /// Replace one entry.
    pub fn set(&self, package: &str, enabled: bool) {
        let prev = self.inner.write().insert(package.to_string(), enabled);
        if prev != Some(enabled) {
            debug!(package, enabled, "enablement_updated");
        }
    }

    /// Known entries.
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.inner.read().clone()
    }
}

/// Keep `cache[package]` in sync with the `app_enabled_<package>` setting
/// until `token` is cancelled or the settings store goes away.
///
/// The current value is written before the task is spawned, so events
/// dispatched right after this call already see it.
pub fn spawn_enablement_watcher(
    settings: &Settings,
    package: &str,
    cache: EnabledApps,
    token: CancellationToken,
) -> JoinHandle<()> {
    let mut stream =
        settings.subscribe_bool(&keys::app_enabled_key(package), keys::APP_ENABLED_DEFAULT);
    let package = package.to_string();
    cache.set(&package, stream.current());
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = stream.next() => match next {
                    Some(enabled) => cache.set(&package, enabled),
                    None => break,
                },
            }
        }
        trace!(package = %package, "enablement_watcher_stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{task::yield_now, time::sleep};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn watcher_tracks_setting_until_cancelled() {
        let settings = Settings::new();
        let cache = EnabledApps::new();
        let token = CancellationToken::new();
        assert!(cache.is_enabled("com.a"));

        let task = spawn_enablement_watcher(&settings, "com.a", cache.clone(), token.clone());
        settings.set("app_enabled_com.a", false);
        sleep(Duration::from_millis(1)).await;
        assert!(!cache.is_enabled("com.a"));

        settings.set("app_enabled_com.a", true);
        sleep(Duration::from_millis(1)).await;
        assert!(cache.is_enabled("com.a"));

        token.cancel();
        token.cancel();
        task.await.unwrap();
        settings.set("app_enabled_com.a", false);
        sleep(Duration::from_millis(1)).await;
        assert!(cache.is_enabled("com.a"));
    }

    #[tokio::test]
    async fn initial_value_lands_without_a_change() {
        let settings = Settings::new();
        settings.set("app_enabled_com.b", false);
        let cache = EnabledApps::new();
        let token = CancellationToken::new();
        let _task = spawn_enablement_watcher(&settings, "com.b", cache.clone(), token.clone());
        for _ in 0..10 {
            yield_now().await;
        }
        assert!(!cache.is_enabled("com.b"));
        assert_eq!(cache.snapshot().get("com.b"), Some(&false));
        token.cancel();
    }
}
