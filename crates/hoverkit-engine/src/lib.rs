//! hoverkit engine
//!
//! Decides, from a stream of host UI events, which single per-application
//! handler is active, and runs the service actor around that decision:
//! - [`Dispatcher`]: the `Idle` / `Active(package)` state machine
//! - [`HandlerRegistry`]: package → handler factory, built-in and custom
//! - [`EnabledApps`] and [`spawn_enablement_watcher`]: the enablement cache
//! - [`ScannerButton`]: the draggable overlay that triggers a scan
//! - [`Service`] and [`ServiceHandle`]: the serial actor tying it together
//!
//! The host is abstracted behind [`Host`]; [`test_support`] provides a
//! scriptable fake and a recording handler.

mod dispatch;
mod enabled;
mod error;
mod handler;
mod host;
mod registry;
mod scanner_button;
mod service;
pub mod test_support;

pub use dispatch::{DispatchState, Dispatcher, Transition};
pub use enabled::{EnabledApps, spawn_enablement_watcher};
pub use error::{Error, Result};
pub use handler::{Handler, HandlerFactory, ProfileHandler};
pub use host::{EventKind, Host, HostEvent, SourceNode};
pub use registry::HandlerRegistry;
pub use scanner_button::ScannerButton;
pub use service::{Service, ServiceHandle, ServiceOptions, ServiceStatus, UNKNOWN_APP};
