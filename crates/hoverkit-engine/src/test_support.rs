//! Fakes for exercising the engine without a real host.

use std::{sync::Arc, time::Duration};

use hoverkit_overlay::{MockWindowLayer, WindowLayer};
use hoverkit_tree::NodeTree;
use parking_lot::Mutex;
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};

use crate::{
    Error, Result,
    handler::Handler,
    host::{EventKind, Host, HostEvent},
    registry::HandlerRegistry,
};

/// One observed handler lifecycle call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    /// `on_activated` on the handler for this package.
    Activated(String),
    /// `on_deactivated` on the handler for this package.
    Deactivated(String),
    /// `on_event` on handler `.0` with an event from package `.1`.
    Event(String, Option<String>),
}

/// Shared record of handler calls, with failure switches.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    /// Calls in order.
    calls: Arc<Mutex<Vec<Call>>>,
    /// Make `on_activated` fail.
    fail_activate: Arc<Mutex<bool>>,
    /// Make `on_deactivated` fail.
    fail_deactivate: Arc<Mutex<bool>>,
}

impl Journal {
    /// Snapshot of recorded calls.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    /// Make subsequent activations fail (after being recorded).
    pub fn fail_activate(&self, fail: bool) {
        *self.fail_activate.lock() = fail;
    }

    /// Make subsequent deactivations fail (after being recorded).
    pub fn fail_deactivate(&self, fail: bool) {
        *self.fail_deactivate.lock() = fail;
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Append a call.
    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

/// Handler that only writes to a [`Journal`].
#[derive(Debug)]
pub struct RecordingHandler {
    /// Package served.
    package: String,
    /// Where calls go.
    journal: Journal,
}

impl RecordingHandler {
    /// Handler for `package` recording into `journal`.
    pub fn new(package: &str, journal: Journal) -> Self {
        Self {
            package: package.to_string(),
            journal,
        }
    }
}

impl Handler for RecordingHandler {
    fn package_name(&self) -> &str {
        &self.package
    }

    fn on_activated(&mut self, _host: &dyn Host) -> Result<()> {
        self.journal.push(Call::Activated(self.package.clone()));
        if *self.journal.fail_activate.lock() {
            return Err(Error::handler(&self.package, "activation refused"));
        }
        Ok(())
    }

    fn on_deactivated(&mut self) -> Result<()> {
        self.journal.push(Call::Deactivated(self.package.clone()));
        if *self.journal.fail_deactivate.lock() {
            return Err(Error::handler(&self.package, "deactivation refused"));
        }
        Ok(())
    }

    fn on_event(&mut self, event: &HostEvent, _host: &dyn Host) -> Result<()> {
        self.journal
            .push(Call::Event(self.package.clone(), event.package.clone()));
        Ok(())
    }
}

/// Registry with a [`RecordingHandler`] for each of `packages`.
pub fn recording_registry(packages: &[&str], journal: &Journal) -> HandlerRegistry {
    let mut reg = HandlerRegistry::new();
    for pkg in packages {
        let package = pkg.to_string();
        let journal = journal.clone();
        reg.register(
            package.clone(),
            Arc::new(move || {
                Box::new(RecordingHandler::new(&package, journal.clone())) as Box<dyn Handler>
            }),
        );
    }
    reg
}

/// A content-changed event from `package`.
pub fn event(package: &str) -> HostEvent {
    HostEvent::new(EventKind::WindowContentChanged, package)
}

/// Scriptable [`Host`].
pub struct FakeHost {
    /// Reported foreground package.
    foreground: Mutex<Option<String>>,
    /// Reported active window.
    window: Mutex<Option<Arc<NodeTree>>>,
    /// Overlay layer.
    layer: MockWindowLayer,
    /// Reported screen size.
    screen: (i32, i32),
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Host with no foreground app, no window, and a phone-sized screen.
    pub fn new() -> Self {
        Self {
            foreground: Mutex::new(None),
            window: Mutex::new(None),
            layer: MockWindowLayer::new(),
            screen: (1080, 2340),
        }
    }

    /// Change the reported foreground package.
    pub fn set_foreground(&self, package: Option<&str>) {
        *self.foreground.lock() = package.map(str::to_string);
    }

    /// Change the reported active window.
    pub fn set_window(&self, window: Option<Arc<NodeTree>>) {
        *self.window.lock() = window;
    }

    /// The mock layer overlays land on.
    pub fn layer(&self) -> &MockWindowLayer {
        &self.layer
    }
}

impl Host for FakeHost {
    fn foreground_package(&self) -> Option<String> {
        self.foreground.lock().clone()
    }

    fn active_window(&self) -> Option<Arc<NodeTree>> {
        self.window.lock().clone()
    }

    fn window_layer(&self) -> Arc<dyn WindowLayer> {
        Arc::new(self.layer.clone())
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}

/// Receive from `rx`, giving up after `wait`.
pub async fn recv_until<T>(rx: &mut UnboundedReceiver<T>, wait: Duration) -> Option<T> {
    timeout(wait, rx.recv()).await.ok().flatten()
}
