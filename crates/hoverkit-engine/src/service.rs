//! The serial service actor.
//!
//! One task owns the [`Dispatcher`] and the scanner button and processes
//! queued messages strictly in arrival order. Background watchers feed
//! the same queue, so every state change happens on that one path.

use std::{
    collections::{BTreeMap, HashSet},
    ops::ControlFlow,
    sync::Arc,
};

use config::{
    AppProfile, Config, DEFAULT_EXEMPT_PREFIXES, SettingStream, SettingValue, Settings, keys,
    parse_custom_apps,
};
use futures::future::join_all;
use hoverkit_overlay::{OverlayOptions, PointerEvent, PointerOutcome};
use hoverkit_scan::{ListPatterns, ScanResult, ScanTarget, Scanner};
use serde::Serialize;
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender},
        oneshot,
    },
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    Error, Result,
    dispatch::Dispatcher,
    enabled::{EnabledApps, spawn_enablement_watcher},
    host::{Host, HostEvent, SourceNode},
    registry::HandlerRegistry,
    scanner_button::ScannerButton,
};

/// Name reported for scans taken while no handler is active.
pub const UNKNOWN_APP: &str = "Unknown";

/// Tunables for a [`Service`].
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    /// Scanner used when the scanner button is tapped.
    pub scanner: Scanner,
    /// Foreground package prefixes that never deactivate a handler.
    pub exempt_prefixes: Vec<String>,
    /// Template for every overlay the service and its handlers create.
    pub overlay: OverlayOptions,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            scanner: Scanner::default(),
            exempt_prefixes: DEFAULT_EXEMPT_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            overlay: OverlayOptions::default(),
        }
    }
}

impl ServiceOptions {
    /// Options from a loaded [`Config`].
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let patterns = ListPatterns::new(cfg.list_patterns.as_slice())?;
        Ok(Self {
            scanner: Scanner::new(patterns),
            exempt_prefixes: cfg.exempt_prefixes.clone(),
            overlay: OverlayOptions {
                touch_slop: cfg.touch_slop,
                animation: cfg.animation(),
                ..OverlayOptions::default()
            },
        })
    }
}

/// Point-in-time view of the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    /// Package of the active handler.
    pub active: Option<String>,
    /// Whether the scanner button is on screen.
    pub scanner_shown: bool,
    /// Every registered package.
    pub packages: Vec<String>,
    /// Registered packages that come from the `custom_apps` setting.
    pub custom: Vec<String>,
    /// Enablement flags known so far.
    pub enabled: BTreeMap<String, bool>,
}

/// Messages processed by the service task.
enum ServiceMsg {
    /// A host UI event.
    Event(HostEvent),
    /// A pointer event on the scanner button surface.
    Pointer(PointerEvent),
    /// Show the scanner button.
    ShowScanner,
    /// Hide the scanner button.
    HideScanner,
    /// `scan_btn_active` changed.
    ScannerActive(bool),
    /// `custom_apps` changed.
    CustomApps(Vec<AppProfile>),
    /// Report status.
    Status(oneshot::Sender<ServiceStatus>),
    /// Tear down and acknowledge.
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running service.
#[derive(Clone, Debug)]
pub struct ServiceHandle {
    /// Queue into the service task.
    tx: UnboundedSender<ServiceMsg>,
}

impl ServiceHandle {
    /// Enqueue a message.
    fn send(&self, msg: ServiceMsg) -> Result<()> {
        self.tx.send(msg).map_err(|_| Error::ChannelClosed)
    }

    /// Deliver a host event.
    pub fn post_event(&self, event: HostEvent) -> Result<()> {
        self.send(ServiceMsg::Event(event))
    }

    /// Deliver a pointer event aimed at the scanner button.
    pub fn post_pointer(&self, event: PointerEvent) -> Result<()> {
        self.send(ServiceMsg::Pointer(event))
    }

    /// Show the scanner button.
    pub fn show_scanner(&self) -> Result<()> {
        self.send(ServiceMsg::ShowScanner)
    }

    /// Hide the scanner button.
    pub fn hide_scanner(&self) -> Result<()> {
        self.send(ServiceMsg::HideScanner)
    }

    /// Snapshot of the service state, taken after every message queued so far.
    pub async fn status(&self) -> Result<ServiceStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(ServiceMsg::Status(reply))?;
        rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Stop the service and wait for its background tasks.
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(ServiceMsg::Shutdown(reply)).is_err() {
            return Ok(());
        }
        if rx.await.is_err() {
            debug!("service_gone_before_ack");
        }
        Ok(())
    }

    /// Whether the service task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// State owned by the service task.
pub struct Service {
    /// Host queries and the window layer.
    host: Arc<dyn Host>,
    /// Configuration collaborator.
    settings: Settings,
    /// Tunables.
    options: ServiceOptions,
    /// Handler state machine.
    dispatcher: Dispatcher,
    /// Cache shared with the enablement watchers.
    enabled: EnabledApps,
    /// The floating scan trigger.
    scanner_button: ScannerButton,
    /// Source node of the most recent event that carried one.
    last_source: Option<SourceNode>,
    /// Parent of every background task's token.
    token: CancellationToken,
    /// Background tasks to join on shutdown.
    tasks: Vec<JoinHandle<()>>,
    /// Packages with an enablement watcher.
    watched: HashSet<String>,
    /// Queue back into this task for watchers.
    tx: WeakUnboundedSender<ServiceMsg>,
    /// Where scan results go.
    scans: UnboundedSender<ScanResult>,
}

impl Service {
    /// Start the service on the current Tokio runtime.
    ///
    /// Custom apps and the scanner button state are read from `settings`
    /// before this returns; their later changes arrive through watchers.
    pub fn spawn(
        host: Arc<dyn Host>,
        registry: HandlerRegistry,
        settings: Settings,
        options: ServiceOptions,
    ) -> (ServiceHandle, UnboundedReceiver<ScanResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (scans, scan_rx) = mpsc::unbounded_channel();
        let enabled = EnabledApps::new();
        let scanner_button =
            ScannerButton::new(host.window_layer(), host.screen_size(), &options.overlay);
        let dispatcher = Dispatcher::new(
            registry,
            enabled.clone(),
            options.exempt_prefixes.clone(),
        );
        let mut svc = Self {
            host,
            settings,
            options,
            dispatcher,
            enabled,
            scanner_button,
            last_source: None,
            token: CancellationToken::new(),
            tasks: Vec::new(),
            watched: HashSet::new(),
            tx: tx.downgrade(),
            scans,
        };
        svc.start();
        tokio::spawn(svc.run(rx));
        (ServiceHandle { tx }, scan_rx)
    }

    /// Apply current settings and start the background watchers.
    fn start(&mut self) {
        let custom = self
            .settings
            .subscribe_str(keys::CUSTOM_APPS.name, keys::CUSTOM_APPS.default);
        self.merge_custom(parse_custom_apps(&custom.current()));
        let token = self.token.child_token();
        self.tasks.push(forward_changes(
            custom,
            self.tx.clone(),
            token,
            |json| ServiceMsg::CustomApps(parse_custom_apps(&json)),
        ));

        let active = self
            .settings
            .subscribe_bool(keys::SCAN_BTN_ACTIVE.name, keys::SCAN_BTN_ACTIVE.default);
        if active.current() {
            self.show_scanner();
        }
        let token = self.token.child_token();
        self.tasks.push(forward_changes(
            active,
            self.tx.clone(),
            token,
            ServiceMsg::ScannerActive,
        ));

        let packages: Vec<String> = self
            .dispatcher
            .registry()
            .packages()
            .map(str::to_string)
            .collect();
        for package in &packages {
            self.watch_package(package);
        }
        info!(packages = packages.len(), "service_started");
    }

    /// Process messages until shutdown or until every handle is dropped.
    async fn run(mut self, mut rx: UnboundedReceiver<ServiceMsg>) {
        while let Some(msg) = rx.recv().await {
            if let ControlFlow::Break(reply) = self.handle(msg) {
                self.teardown().await;
                if reply.send(()).is_err() {
                    debug!("shutdown_ack_dropped");
                }
                return;
            }
        }
        self.teardown().await;
    }

    /// Handle one message. Breaks with the reply channel on shutdown.
    fn handle(&mut self, msg: ServiceMsg) -> ControlFlow<oneshot::Sender<()>> {
        match msg {
            ServiceMsg::Event(event) => self.on_event(&event),
            ServiceMsg::Pointer(event) => self.on_pointer(event),
            ServiceMsg::ShowScanner | ServiceMsg::ScannerActive(true) => self.show_scanner(),
            ServiceMsg::HideScanner | ServiceMsg::ScannerActive(false) => {
                self.scanner_button.hide();
            }
            ServiceMsg::CustomApps(profiles) => self.merge_custom(profiles),
            ServiceMsg::Status(reply) => {
                if reply.send(self.status()).is_err() {
                    trace!("status_reply_dropped");
                }
            }
            ServiceMsg::Shutdown(reply) => return ControlFlow::Break(reply),
        }
        ControlFlow::Continue(())
    }

    /// Dispatch a host event. Handler failures are logged and dropped.
    fn on_event(&mut self, event: &HostEvent) {
        if let Some(source) = &event.source {
            self.last_source = Some(source.clone());
        }
        match self.dispatcher.on_event(event, self.host.as_ref()) {
            Ok(transition) => trace!(?transition, "event_dispatched"),
            Err(e) => warn!(package = ?event.package, error = %e, "handler_failed"),
        }
    }

    /// Drive the scanner button; a click triggers a scan.
    fn on_pointer(&mut self, event: PointerEvent) {
        match self.scanner_button.on_pointer(event) {
            Ok(PointerOutcome::Clicked) => self.scan(),
            Ok(outcome) => trace!(?outcome, "scanner_button_pointer"),
            Err(e) => warn!(error = %e, "scanner_button_pointer_failed"),
        }
    }

    /// Show the scanner button, logging host failures.
    fn show_scanner(&mut self) {
        if let Err(e) = self.scanner_button.show() {
            warn!(error = %e, "scanner_button_show_failed");
        }
    }

    /// Scan the active window and publish the result.
    fn scan(&self) {
        let window = self.host.active_window();
        let (package, name) = match self.dispatcher.active_package() {
            Some(p) => {
                let name = self
                    .dispatcher
                    .registry()
                    .profile(p)
                    .map_or(p, AppProfile::display_name);
                (p.to_string(), name.to_string())
            }
            None => (
                self.host.foreground_package().unwrap_or_default(),
                UNKNOWN_APP.to_string(),
            ),
        };
        let source = self
            .last_source
            .as_ref()
            .filter(|s| s.tree.package() == Some(package.as_str()))
            .and_then(SourceNode::node);
        let result = self.options.scanner.scan(
            source,
            window.as_deref(),
            ScanTarget {
                package_name: &package,
                name: &name,
            },
        );
        if self.scans.send(result).is_err() {
            debug!("scan_receiver_dropped");
        }
    }

    /// Replace custom registrations and watch any new packages.
    fn merge_custom(&mut self, profiles: Vec<AppProfile>) {
        let added = self
            .dispatcher
            .registry_mut()
            .merge_custom(profiles, &self.options.overlay);
        for package in &added {
            self.watch_package(package);
        }
    }

    /// Start an enablement watcher for `package` unless one is running.
    fn watch_package(&mut self, package: &str) {
        if !self.watched.insert(package.to_string()) {
            return;
        }
        self.tasks.push(spawn_enablement_watcher(
            &self.settings,
            package,
            self.enabled.clone(),
            self.token.child_token(),
        ));
    }

    /// Current state for [`ServiceHandle::status`].
    fn status(&self) -> ServiceStatus {
        let registry = self.dispatcher.registry();
        ServiceStatus {
            active: self.dispatcher.active_package().map(str::to_string),
            scanner_shown: self.scanner_button.is_shown(),
            packages: registry.packages().map(str::to_string).collect(),
            custom: registry
                .packages()
                .filter(|p| registry.is_custom(p))
                .map(str::to_string)
                .collect(),
            enabled: self.enabled.snapshot().into_iter().collect(),
        }
    }

    /// Cancel watchers, deactivate the handler, and hide the button.
    async fn teardown(&mut self) {
        self.token.cancel();
        match self.dispatcher.shutdown() {
            Ok(Some(package)) => debug!(package = %package, "active_handler_released"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "handler_shutdown_failed"),
        }
        self.scanner_button.hide();
        for joined in join_all(self.tasks.drain(..)).await {
            if let Err(e) = joined {
                warn!(error = %e, "watcher_join_failed");
            }
        }
        info!("service_stopped");
    }
}

/// Forward each change of `stream` into the service queue as `wrap(value)`.
///
/// Values equal to the last one seen (starting with the current value) are
/// skipped. Stops on cancellation or once the service queue is gone.
fn forward_changes<T, F>(
    mut stream: SettingStream<T>,
    tx: WeakUnboundedSender<ServiceMsg>,
    token: CancellationToken,
    wrap: F,
) -> JoinHandle<()>
where
    T: SettingValue + PartialEq,
    F: Fn(T) -> ServiceMsg + Send + 'static,
{
    let mut last = stream.current();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                next = stream.next() => {
                    let Some(value) = next else { break };
                    if value == last {
                        continue;
                    }
                    last = value.clone();
                    let Some(tx) = tx.upgrade() else { break };
                    if tx.send(wrap(value)).is_err() {
                        break;
                    }
                }
            }
        }
        trace!(key = stream.key(), "setting_forwarder_stopped");
    })
}
