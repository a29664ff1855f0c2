//! Well-known setting keys and their defaults.

use crate::value::Value;

/// A setting key with its typed default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettingKey<T: 'static> {
    /// Storage key.
    pub name: &'static str,
    /// Value used when the key is unset or mistyped.
    pub default: T,
}

/// Prefix of per-package enablement keys.
pub const APP_ENABLED_PREFIX: &str = "app_enabled_";

/// Packages are listened to unless explicitly disabled.
pub const APP_ENABLED_DEFAULT: bool = true;

/// Key holding the enablement flag for `package`.
pub fn app_enabled_key(package: &str) -> String {
    format!("{APP_ENABLED_PREFIX}{package}")
}

/// Show the floating scanner button.
pub const SCAN_BTN_ACTIVE: SettingKey<bool> = SettingKey {
    name: "scan_btn_active",
    default: false,
};

/// JSON array of user-defined app profiles.
pub const CUSTOM_APPS: SettingKey<&str> = SettingKey {
    name: "custom_apps",
    default: "[]",
};

/// Encrypt outgoing text automatically.
pub const USE_AUTO_ENCRYPTION: SettingKey<bool> = SettingKey {
    name: "use_auto_encryption",
    default: false,
};

/// Decrypt incoming text automatically.
pub const USE_AUTO_DECRYPTION: SettingKey<bool> = SettingKey {
    name: "use_auto_decryption",
    default: false,
};

/// `standard` or `immersive`.
pub const ENCRYPTION_MODE: SettingKey<&str> = SettingKey {
    name: "encryption_mode",
    default: "standard",
};

/// `standard` or `immersive`.
pub const DECRYPTION_MODE: SettingKey<&str> = SettingKey {
    name: "decryption_mode",
    default: "standard",
};

/// Long-press duration (ms) that triggers sending in standard mode.
pub const ENCRYPTION_LONG_PRESS_DELAY: SettingKey<i64> = SettingKey {
    name: "encryption_long_press_delay",
    default: 250,
};

/// How long (ms) a decrypted popup stays visible.
pub const DECRYPTION_WINDOW_SHOW_TIME: SettingKey<i64> = SettingKey {
    name: "decryption_window_show_time",
    default: 1500,
};

/// Interval (ms) between popup position refreshes in immersive mode.
pub const DECRYPTION_WINDOW_POSITION_UPDATE_DELAY: SettingKey<i64> = SettingKey {
    name: "decryption_window_position_update_delay",
    default: 250,
};

/// ARGB colour of the send-button mask.
pub const SEND_BTN_OVERLAY_COLOR: SettingKey<&str> = SettingKey {
    name: "send_btn_overlay_color",
    default: "#5066ccff",
};

/// Max interval (ms) between taps of a double tap.
pub const SHOW_ATTACHMENT_VIEW_DOUBLE_CLICK_THRESHOLD: SettingKey<i64> = SettingKey {
    name: "show_attachment_view_double_click_threshold",
    default: 250,
};

/// Name of the active secret key.
pub const CURRENT_KEY: SettingKey<&str> = SettingKey {
    name: "current_key",
    default: "",
};

/// Default value for a well-known key, `None` for unknown keys.
///
/// Enablement keys are recognised by prefix.
pub fn default_value(name: &str) -> Option<Value> {
    if name.starts_with(APP_ENABLED_PREFIX) {
        return Some(Value::Bool(APP_ENABLED_DEFAULT));
    }
    let bools = [SCAN_BTN_ACTIVE, USE_AUTO_ENCRYPTION, USE_AUTO_DECRYPTION];
    let ints = [
        ENCRYPTION_LONG_PRESS_DELAY,
        DECRYPTION_WINDOW_SHOW_TIME,
        DECRYPTION_WINDOW_POSITION_UPDATE_DELAY,
        SHOW_ATTACHMENT_VIEW_DOUBLE_CLICK_THRESHOLD,
    ];
    let strs = [
        CUSTOM_APPS,
        ENCRYPTION_MODE,
        DECRYPTION_MODE,
        SEND_BTN_OVERLAY_COLOR,
        CURRENT_KEY,
    ];
    bools
        .iter()
        .find(|k| k.name == name)
        .map(|k| Value::Bool(k.default))
        .or_else(|| ints.iter().find(|k| k.name == name).map(|k| Value::Int(k.default)))
        .or_else(|| strs.iter().find(|k| k.name == name).map(|k| Value::from(k.default)))
}
