//! Configuration for hoverkit.
//!
//! Two halves live here. [`Config`] is the static, file-backed part (list
//! patterns, exempt packages, built-in app profiles, initial settings).
//! [`Settings`] is the live key/value store the engine subscribes to; every
//! key yields a [`SettingStream`] that falls back to a caller default.

use std::{
    env,
    path::{Path, PathBuf},
};

mod error;
pub mod keys;
mod loader;
mod profile;
mod settings;
mod types;
mod value;

#[cfg(test)]
mod test_load;

pub use error::Error;
pub use loader::{load_from_path, load_from_str};
pub use profile::{AppProfile, encode_custom_apps, parse_custom_apps};
pub use settings::{SettingStream, Settings};
pub use hoverkit_scan::DEFAULT_LIST_PATTERNS;
pub use types::{Config, DEFAULT_EXEMPT_PREFIXES};
pub use value::{SettingValue, Value};

/// Determine the preferred user config path (`~/.hoverkit/config.ron`).
pub fn default_config_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".hoverkit");
    p.push("config.ron");
    p
}

/// Resolve the effective config path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `~/.hoverkit/config.ron` when it exists.
/// 3) Else `None`: run on built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let preferred = default_config_path();
    preferred.exists().then_some(preferred)
}

/// Load the effective config: the resolved file, or defaults when none exists.
pub fn load(explicit: Option<&Path>) -> Result<Config, Error> {
    match resolve_config_path(explicit) {
        Some(path) => load_from_path(&path),
        None => Ok(Config::default()),
    }
}
