//! The handler dispatch state machine.

use std::{fmt, mem};

use tracing::{info, trace};

use crate::{
    Result,
    enabled::EnabledApps,
    handler::Handler,
    host::{Host, HostEvent},
    registry::HandlerRegistry,
};

/// Which handler, if any, is live.
#[derive(Default)]
pub enum DispatchState {
    /// No active handler.
    #[default]
    Idle,
    /// `handler` serves `package`.
    Active {
        /// Registry key of the active handler.
        package: String,
        /// The live instance.
        handler: Box<dyn Handler>,
    },
}

impl fmt::Debug for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active { package, .. } => write!(f, "Active({package})"),
        }
    }
}

/// What one event did to the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Same package as the active handler; the event was forwarded.
    Forwarded,
    /// A handler for `to` was activated, after deactivating `from`.
    Activated {
        /// Previously active package.
        from: Option<String>,
        /// Newly active package.
        to: String,
    },
    /// The user left `package`; state is now idle.
    Deactivated {
        /// Package whose handler was deactivated.
        package: String,
    },
    /// Noise; nothing changed.
    Ignored,
}

/// Decides, per event, which single handler is active.
///
/// Owned by one task and mutated only through [`Dispatcher::on_event`] and
/// [`Dispatcher::shutdown`], so no locking is needed around the state.
pub struct Dispatcher {
    /// Package → factory.
    registry: HandlerRegistry,
    /// Enablement flags, read-only here.
    enabled: EnabledApps,
    /// Foreground packages that never cause a deactivation.
    exempt_prefixes: Vec<String>,
    /// Current state.
    state: DispatchState,
}

impl Dispatcher {
    /// Idle dispatcher.
    pub fn new(
        registry: HandlerRegistry,
        enabled: EnabledApps,
        exempt_prefixes: Vec<String>,
    ) -> Self {
        Self {
            registry,
            enabled,
            exempt_prefixes,
            state: DispatchState::Idle,
        }
    }

    /// Registered handlers.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Mutable access for merging custom registrations.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Current state.
    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Package of the active handler.
    pub fn active_package(&self) -> Option<&str> {
        match &self.state {
            DispatchState::Active { package, .. } => Some(package),
            DispatchState::Idle => None,
        }
    }

    /// Whether a foreground package is system noise.
    fn is_exempt(&self, package: &str) -> bool {
        self.exempt_prefixes.iter().any(|p| package.starts_with(p))
    }

    /// Process one host event.
    ///
    /// Handler errors are returned as-is. A failed deactivation leaves the
    /// state untouched; a failed activation leaves the new handler installed.
    pub fn on_event(&mut self, event: &HostEvent, host: &dyn Host) -> Result<Transition> {
        let listening = event
            .package
            .as_deref()
            .filter(|p| self.registry.contains(p) && self.enabled.is_enabled(p));

        if let Some(pkg) = listening {
            if let DispatchState::Active { package, handler } = &mut self.state
                && package.as_str() == pkg
            {
                handler.on_event(event, host)?;
                return Ok(Transition::Forwarded);
            }
            let Some(factory) = self.registry.factory(pkg) else {
                return Ok(Transition::Ignored);
            };
            let from = self.deactivate_current()?;
            self.state = DispatchState::Active {
                package: pkg.to_string(),
                handler: factory(),
            };
            info!(package = pkg, from = ?from, "handler_activated");
            if let DispatchState::Active { handler, .. } = &mut self.state {
                handler.on_activated(host)?;
                handler.on_event(event, host)?;
            }
            return Ok(Transition::Activated {
                from,
                to: pkg.to_string(),
            });
        }

        let DispatchState::Active { package, .. } = &self.state else {
            trace!(package = ?event.package, "event_ignored_idle");
            return Ok(Transition::Ignored);
        };
        match host.foreground_package() {
            Some(fg) if fg != *package && !self.is_exempt(&fg) => {
                let Some(package) = self.deactivate_current()? else {
                    return Ok(Transition::Ignored);
                };
                info!(package = %package, foreground = %fg, "user_left_app");
                Ok(Transition::Deactivated { package })
            }
            fg => {
                trace!(package = ?event.package, foreground = ?fg, "event_ignored_noise");
                Ok(Transition::Ignored)
            }
        }
    }

    /// Deactivate the current handler and go idle.
    ///
    /// Returns the package that was active.
    fn deactivate_current(&mut self) -> Result<Option<String>> {
        let DispatchState::Active { handler, .. } = &mut self.state else {
            return Ok(None);
        };
        handler.on_deactivated()?;
        match mem::take(&mut self.state) {
            DispatchState::Active { package, .. } => {
                info!(package = %package, "handler_deactivated");
                Ok(Some(package))
            }
            DispatchState::Idle => Ok(None),
        }
    }

    /// Service teardown: deactivate any active handler.
    pub fn shutdown(&mut self) -> Result<Option<String>> {
        self.deactivate_current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Call, FakeHost, Journal, event, recording_registry};

    fn dispatcher(packages: &[&str], journal: &Journal) -> Dispatcher {
        Dispatcher::new(
            recording_registry(packages, journal),
            EnabledApps::new(),
            vec!["com.android.systemui".into()],
        )
    }

    #[test]
    fn first_event_activates() {
        let journal = Journal::default();
        let mut d = dispatcher(&["com.a"], &journal);
        let host = FakeHost::new();
        let t = d.on_event(&event("com.a"), &host).unwrap();
        assert_eq!(
            t,
            Transition::Activated {
                from: None,
                to: "com.a".into()
            }
        );
        assert_eq!(
            journal.calls(),
            vec![
                Call::Activated("com.a".into()),
                Call::Event("com.a".into(), Some("com.a".into()))
            ]
        );
        assert_eq!(d.active_package(), Some("com.a"));
    }

    #[test]
    fn disabled_package_is_not_activated() {
        let journal = Journal::default();
        let enabled = EnabledApps::new();
        enabled.set("com.a", false);
        let mut d = Dispatcher::new(recording_registry(&["com.a"], &journal), enabled, vec![]);
        let t = d.on_event(&event("com.a"), &FakeHost::new()).unwrap();
        assert_eq!(t, Transition::Ignored);
        assert!(journal.calls().is_empty());
    }

    #[test]
    fn exempt_foreground_keeps_handler() {
        let journal = Journal::default();
        let mut d = dispatcher(&["com.a"], &journal);
        let host = FakeHost::new();
        d.on_event(&event("com.a"), &host).unwrap();
        host.set_foreground(Some("com.android.systemui"));
        let t = d.on_event(&event("com.android.systemui"), &host).unwrap();
        assert_eq!(t, Transition::Ignored);
        assert_eq!(d.active_package(), Some("com.a"));
    }

    #[test]
    fn unknown_foreground_keeps_handler() {
        let journal = Journal::default();
        let mut d = dispatcher(&["com.a"], &journal);
        let host = FakeHost::new();
        d.on_event(&event("com.a"), &host).unwrap();
        host.set_foreground(None);
        assert_eq!(
            d.on_event(&event("com.other"), &host).unwrap(),
            Transition::Ignored
        );
        assert_eq!(d.active_package(), Some("com.a"));
    }

    #[test]
    fn failed_deactivation_leaves_state() {
        let journal = Journal::default();
        let mut d = dispatcher(&["com.a", "com.b"], &journal);
        let host = FakeHost::new();
        d.on_event(&event("com.a"), &host).unwrap();
        journal.fail_deactivate(true);
        assert!(d.on_event(&event("com.b"), &host).is_err());
        assert_eq!(d.active_package(), Some("com.a"));
    }

    #[test]
    fn failed_activation_installs_new_handler() {
        let journal = Journal::default();
        let mut d = dispatcher(&["com.a"], &journal);
        journal.fail_activate(true);
        assert!(d.on_event(&event("com.a"), &FakeHost::new()).is_err());
        assert_eq!(d.active_package(), Some("com.a"));
    }

    #[test]
    fn shutdown_deactivates_once() {
        let journal = Journal::default();
        let mut d = dispatcher(&["com.a"], &journal);
        d.on_event(&event("com.a"), &FakeHost::new()).unwrap();
        assert_eq!(d.shutdown().unwrap(), Some("com.a".into()));
        assert_eq!(d.shutdown().unwrap(), None);
        assert_eq!(journal.count(|c| matches!(c, Call::Deactivated(_))), 1);
        assert!(matches!(d.state(), DispatchState::Idle));
    }
}
