//! The resolved configuration and its validation rules.

use std::{collections::HashSet, mem, time::Duration};

use hoverkit_scan::{DEFAULT_LIST_PATTERNS, ListPatterns};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, keys, profile::AppProfile, settings::Settings, value::Value};

/// Default package prefixes whose windows never deactivate a handler.
pub const DEFAULT_EXEMPT_PREFIXES: &[&str] = &["com.android.provider", "com.android.systemui"];

/// Top-level configuration.
///
/// Every field has a default, so an empty file `()` is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Regexes matched against class names to find list containers.
    pub list_patterns: Vec<String>,
    /// Foreground packages with these prefixes are treated as system noise.
    pub exempt_prefixes: Vec<String>,
    /// Drag threshold in pixels.
    pub touch_slop: f32,
    /// Overlay reposition animation length in milliseconds.
    pub animation_ms: u64,
    /// Screen size `(width, height)` in pixels.
    pub screen: (i32, i32),
    /// Built-in app registrations.
    pub apps: Vec<AppProfile>,
    /// Initial setting values.
    pub settings: Vec<(String, Value)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list_patterns: DEFAULT_LIST_PATTERNS.iter().map(|s| s.to_string()).collect(),
            exempt_prefixes: DEFAULT_EXEMPT_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            touch_slop: 8.0,
            animation_ms: 250,
            screen: (1080, 2340),
            apps: Vec::new(),
            settings: Vec::new(),
        }
    }
}

impl Config {
    /// Animation length as a [`Duration`].
    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    /// Write the configured initial values into `settings`.
    pub fn seed(&self, settings: &Settings) {
        for (key, value) in &self.settings {
            settings.set(key, value.clone());
        }
    }

    /// Check semantic constraints the parser cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if let Err(e) = ListPatterns::new(self.list_patterns.as_slice()) {
            return Err(Error::invalid(e.to_string()));
        }
        if !self.touch_slop.is_finite() || self.touch_slop < 0.0 {
            return Err(Error::invalid(format!(
                "touch_slop must be a non-negative number, got {}",
                self.touch_slop
            )));
        }
        if self.screen.0 <= 0 || self.screen.1 <= 0 {
            return Err(Error::invalid(format!(
                "screen size must be positive, got {:?}",
                self.screen
            )));
        }
        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.package_name.trim().is_empty() {
                return Err(Error::invalid(format!(
                    "app `{}` has an empty package name",
                    app.name
                )));
            }
            if !seen.insert(app.package_name.as_str()) {
                return Err(Error::invalid(format!(
                    "duplicate app registration for `{}`",
                    app.package_name
                )));
            }
        }
        for (key, value) in &self.settings {
            match keys::default_value(key) {
                Some(default) if mem::discriminant(&default) != mem::discriminant(value) => {
                    return Err(Error::invalid(format!(
                        "setting `{key}` expects a {}, got {} {value}",
                        default.kind(),
                        value.kind()
                    )));
                }
                Some(_) => {}
                None => warn!(key, "unknown setting key"),
            }
        }
        Ok(())
    }
}
