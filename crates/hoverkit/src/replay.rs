//! Scenario replay against the headless host.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use config::{Config, Settings, Value};
use hoverkit_engine::{EventKind, HandlerRegistry, Host, HostEvent, Service, ServiceOptions};
use hoverkit_overlay::PointerEvent;
use hoverkit_scan::ScanResult;
use hoverkit_tree::{NodeSpec, NodeTree};
use serde::Deserialize;
use thiserror::Error;
use tokio::{runtime::Builder, time::sleep};
use tracing::{debug, info, warn};

use crate::headless::ReplayHost;

/// Errors from loading or running a scenario.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The scenario file could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Read {
        /// Scenario path.
        path: PathBuf,
        /// I/O detail.
        message: String,
    },
    /// The scenario file is not valid RON for a step list.
    #[error("invalid scenario {}: {message}", path.display())]
    Parse {
        /// Scenario path.
        path: PathBuf,
        /// Parser detail.
        message: String,
    },
    /// The engine refused the configuration or stopped early.
    #[error(transparent)]
    Engine(#[from] hoverkit_engine::Error),
    /// A scan result could not be encoded.
    #[error("failed to encode scan result: {0}")]
    Encode(#[from] serde_json::Error),
    /// Output or runtime setup failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// One scripted step.
#[derive(Clone, Debug, Deserialize)]
pub enum Step {
    /// Deliver a host event.
    ///
    /// `foreground` and `window` update the host before delivery and are
    /// left unchanged when omitted. `source` is a child-index path into the
    /// active window.
    Event {
        /// Event kind.
        #[serde(default)]
        kind: EventKind,
        /// Package that fired the event.
        #[serde(default)]
        package: Option<String>,
        /// New foreground package.
        #[serde(default)]
        foreground: Option<String>,
        /// New active window.
        #[serde(default)]
        window: Option<NodeSpec>,
        /// Path to the source node.
        #[serde(default)]
        source: Option<Vec<usize>>,
    },
    /// Deliver a pointer event to the scanner button.
    Pointer {
        /// The event.
        event: PointerEvent,
    },
    /// Show the scanner button.
    ShowScanner,
    /// Hide the scanner button.
    HideScanner,
    /// Write a setting.
    Set {
        /// Setting key.
        key: String,
        /// New value.
        value: Value,
    },
    /// Pause for this many milliseconds.
    Wait(u64),
}

/// Parse a scenario from RON text.
pub fn parse_scenario(source: &str) -> Result<Vec<Step>, String> {
    ron::from_str(source).map_err(|e| e.to_string())
}

/// Load `path` and replay it on a fresh single-threaded runtime.
pub fn run(cfg: &Config, path: &Path, report: bool) -> Result<(), ReplayError> {
    let text = fs::read_to_string(path).map_err(|e| ReplayError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let steps = parse_scenario(&text).map_err(|message| ReplayError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    runtime.block_on(play(cfg, &steps, &mut out, report))
}

/// Replay `steps` and write every scan result to `out` as one JSON line,
/// each followed by its text report when `report` is set.
pub async fn play(
    cfg: &Config,
    steps: &[Step],
    out: &mut impl Write,
    report: bool,
) -> Result<(), ReplayError> {
    let options = ServiceOptions::from_config(cfg)?;
    let settings = Settings::new();
    cfg.seed(&settings);
    let registry = HandlerRegistry::from_profiles(&cfg.apps, &options.overlay);
    let host = Arc::new(ReplayHost::new(cfg.screen));
    let (handle, mut scans) = Service::spawn(host.clone(), registry, settings.clone(), options);

    for (index, step) in steps.iter().enumerate() {
        debug!(index, ?step, "replay_step");
        match step {
            Step::Event {
                kind,
                package,
                foreground,
                window,
                source,
            } => {
                if let Some(fg) = foreground {
                    host.set_foreground(Some(fg.clone()));
                }
                if let Some(spec) = window {
                    host.set_window(Arc::new(NodeTree::from_spec(package.as_deref(), spec)));
                }
                handle.post_event(build_event(&host, *kind, package.clone(), source.as_deref()))?;
                // Host state for the next step must not be visible to this event.
                handle.status().await?;
            }
            Step::Pointer { event } => handle.post_pointer(*event)?,
            Step::ShowScanner => handle.show_scanner()?,
            Step::HideScanner => handle.hide_scanner()?,
            Step::Set { key, value } => settings.set(key, value.clone()),
            Step::Wait(ms) => sleep(Duration::from_millis(*ms)).await,
        }
    }

    let status = handle.status().await?;
    info!(
        active = ?status.active,
        scanner = status.scanner_shown,
        packages = status.packages.len(),
        "replay_finished"
    );
    handle.shutdown().await?;
    while let Ok(result) = scans.try_recv() {
        write_result(out, &result, report)?;
    }
    debug!(attached = host.layer().attached(), "replay_layer_state");
    Ok(())
}

/// Assemble the event for an `Event` step.
fn build_event(
    host: &ReplayHost,
    kind: EventKind,
    package: Option<String>,
    source: Option<&[usize]>,
) -> HostEvent {
    let mut event = HostEvent {
        kind,
        package,
        source: None,
    };
    let (Some(path), Some(window)) = (source, host.active_window()) else {
        return event;
    };
    match window.resolve_path(path) {
        Some(id) => event = event.with_source(window, id),
        None => warn!(?path, "source_path_unresolved"),
    }
    event
}

/// Write one result line, plus the report when asked.
fn write_result(out: &mut impl Write, result: &ScanResult, report: bool) -> Result<(), ReplayError> {
    writeln!(out, "{}", serde_json::to_string(result)?)?;
    if report {
        writeln!(out, "{}", result.render())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
#![enable(implicit_some)]
[
    Event(
        package: "com.chat",
        foreground: "com.chat",
        window: (
            class_name: "android.widget.FrameLayout",
            children: [
                (
                    class_name: "androidx.recyclerview.widget.RecyclerView",
                    resource_id: "list",
                    scrollable: true,
                    children: [
                        (class_name: "android.widget.TextView", text: "hi"),
                    ],
                ),
                (
                    class_name: "android.widget.Button",
                    resource_id: "send",
                    clickable: true,
                    bounds: (left: 900, top: 2000, right: 1000, bottom: 2100),
                ),
            ],
        ),
        source: [0, 0],
    ),
    ShowScanner,
    Pointer(event: Down(x: 1.0, y: 1.0)),
    Pointer(event: Up(x: 1.0, y: 1.0)),
    Wait(10),
]
"#;

    #[tokio::test(start_paused = true)]
    async fn each_event_sees_its_own_foreground() {
        let cfg = config::load_from_str(include_str!("../../../demos/config.ron")).unwrap();
        let steps = parse_scenario(
            r#"
#![enable(implicit_some)]
[
    Event(package: "com.example.chat", foreground: "com.example.chat"),
    Event(package: "com.example.launcher", foreground: "com.example.launcher"),
    Event(package: "com.example.keyboard", foreground: "com.example.chat"),
    ShowScanner,
    Pointer(event: Down(x: 1.0, y: 1.0)),
    Pointer(event: Up(x: 1.0, y: 1.0)),
]
"#,
        )
        .unwrap();
        let mut out = Vec::new();
        play(&cfg, &steps, &mut out, false).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let result: ScanResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(result.name, "Unknown");
        assert_eq!(result.package_name, "com.example.chat");
    }

    #[test]
    fn parses_every_step_kind() {
        let steps = parse_scenario(
            r#"[Event(package: Some("a")), ShowScanner, HideScanner, Set(key: "scan_btn_active", value: true), Wait(5), Pointer(event: Cancel)]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 6);
        assert!(matches!(steps[3], Step::Set { .. }));
        assert!(parse_scenario("[Jump]").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn demo_scenario_scans_active_profile() {
        let cfg = config::load_from_str(include_str!("../../../demos/config.ron")).unwrap();
        let steps = parse_scenario(include_str!("../../../demos/chat.ron")).unwrap();
        let mut out = Vec::new();
        play(&cfg, &steps, &mut out, false).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let result: ScanResult = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(result.name, "Chat");
        assert_eq!(result.package_name, "com.example.chat");
        assert_eq!(
            result.container.and_then(|c| c.resource_id).as_deref(),
            Some("com.example.chat:id/list")
        );
        assert_eq!(result.transcript.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn replay_emits_scan_line_and_report() {
        let cfg = Config::default();
        let steps = parse_scenario(SCENARIO).unwrap();
        let mut out = Vec::new();
        play(&cfg, &steps, &mut out, true).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        let json: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(json["package_name"], "com.chat");
        assert_eq!(json["name"], "Unknown");
        assert!(text.contains("Unknown (com.chat)"));
    }
}
