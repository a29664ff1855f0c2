#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, process};

    use crate::{Config, Error, Value, load, load_from_path, load_from_str};

    const SAMPLE: &str = r#"(
        list_patterns: ["RecyclerView", "ListView", "^android\\.widget\\.GridView$"],
        touch_slop: 12.0,
        screen: (720, 1600),
        apps: [
            (
                name: "Chat",
                packageName: "com.example.chat",
                inputId: "com.example.chat:id/input",
                sendBtnId: "com.example.chat:id/send",
                messageTextId: "com.example.chat:id/msg",
                messageListClassName: "androidx.recyclerview.widget.RecyclerView",
            ),
        ],
        settings: [
            ("scan_btn_active", true),
            ("encryption_mode", "immersive"),
            ("app_enabled_com.example.chat", false),
        ],
    )"#;

    fn temp_file(name: &str, body: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("hoverkit-config-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn sample_parses_with_defaults_for_missing_fields() {
        let c = load_from_str(SAMPLE).unwrap();
        assert_eq!(c.list_patterns.len(), 3);
        assert_eq!(c.touch_slop, 12.0);
        assert_eq!(c.screen, (720, 1600));
        assert_eq!(c.animation_ms, Config::default().animation_ms);
        assert_eq!(c.exempt_prefixes, Config::default().exempt_prefixes);
        assert_eq!(c.apps[0].package_name, "com.example.chat");
        assert!(!c.apps[0].is_custom());
        assert_eq!(c.settings[1].1, Value::from("immersive"));
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(load_from_str("()").unwrap(), Config::default());
    }

    #[test]
    fn unknown_field_is_parse_error() {
        let err = load_from_str("(bogus: 1)").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn file_errors_carry_path() {
        let path = temp_file("bad.ron", "(touch_slop: -1.0)");
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(err.pretty().contains("bad.ron"));
    }

    #[test]
    fn wrong_extension_rejected() {
        let path = temp_file("config.toml", "()");
        assert!(matches!(
            load_from_path(&path).unwrap_err(),
            Error::Read { .. }
        ));
    }

    #[test]
    fn explicit_missing_file_is_read_error() {
        let missing = env::temp_dir().join("hoverkit-definitely-missing.ron");
        assert!(matches!(
            load(Some(&missing)).unwrap_err(),
            Error::Read { .. }
        ));
    }

    #[test]
    fn loads_from_disk() {
        let path = temp_file("good.ron", SAMPLE);
        let c = load(Some(&path)).unwrap();
        assert_eq!(c.apps.len(), 1);
    }
}
