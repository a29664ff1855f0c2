//! Target app descriptions, built in or user defined.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Everything the engine needs to know about one target app.
///
/// Field names are camelCase on the wire to stay compatible with stored
/// `custom_apps` blobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppProfile {
    /// Display name of the app.
    pub name: String,
    /// Package identifier; the registry key.
    pub package_name: String,
    /// Resource id of the text input.
    pub input_id: String,
    /// Resource id of the send control.
    pub send_btn_id: String,
    /// Resource id of message text nodes.
    pub message_text_id: String,
    /// Class name of the message list container.
    pub message_list_class_name: String,
    /// User-chosen label; set only for user-defined entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
}

impl AppProfile {
    /// Label to show for this profile.
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether this profile came from user configuration.
    pub fn is_custom(&self) -> bool {
        self.custom_name.is_some()
    }
}

/// Parse the `custom_apps` JSON blob.
///
/// Malformed input yields an empty list. Entries without a custom label get
/// their app name as label so they are still recognised as custom.
pub fn parse_custom_apps(json: &str) -> Vec<AppProfile> {
    match serde_json::from_str::<Vec<AppProfile>>(json) {
        Ok(apps) => apps
            .into_iter()
            .map(|mut app| {
                if app.custom_name.is_none() {
                    app.custom_name = Some(app.name.clone());
                }
                app
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "custom_apps_parse_failed");
            Vec::new()
        }
    }
}

/// Serialize profiles into the `custom_apps` JSON form.
pub fn encode_custom_apps(apps: &[AppProfile]) -> String {
    serde_json::to_string(apps).unwrap_or_else(|e| {
        warn!(error = %e, "custom_apps_encode_failed");
        String::from("[]")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = r#"[{
        "customName": "My Chat",
        "name": "Chat",
        "packageName": "com.example.chat",
        "inputId": "com.example.chat:id/input",
        "sendBtnId": "com.example.chat:id/send",
        "messageTextId": "com.example.chat:id/msg",
        "messageListClassName": "androidx.recyclerview.widget.RecyclerView"
    }]"#;

    #[test]
    fn parses_stored_blob() {
        let apps = parse_custom_apps(BLOB);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].package_name, "com.example.chat");
        assert_eq!(apps[0].display_name(), "My Chat");
        assert!(apps[0].is_custom());
    }

    #[test]
    fn malformed_blob_is_empty() {
        assert!(parse_custom_apps("{not json").is_empty());
        assert!(parse_custom_apps("").is_empty());
        assert!(parse_custom_apps("[]").is_empty());
    }

    #[test]
    fn missing_label_defaults_to_name() {
        let blob = BLOB.replace(r#""customName": "My Chat","#, "");
        let apps = parse_custom_apps(&blob);
        assert_eq!(apps[0].custom_name.as_deref(), Some("Chat"));
    }

    #[test]
    fn encode_parses_back() {
        let apps = parse_custom_apps(BLOB);
        assert_eq!(parse_custom_apps(&encode_custom_apps(&apps)), apps);
    }
}
