//! Per-application handlers.

use std::sync::Arc;

use config::AppProfile;
use hoverkit_overlay::{OverlayOptions, OverlayWindow, Position};
use tracing::{debug, trace};

use crate::{
    Result,
    host::{Host, HostEvent},
};

/// Strategy object for one target application.
///
/// At most one handler is active at a time. The dispatcher always calls
/// `on_deactivated` on the previous handler before `on_activated` on the next.
pub trait Handler: Send {
    /// Package this handler serves.
    fn package_name(&self) -> &str;

    /// Profile the handler was built from, if any.
    fn profile(&self) -> Option<&AppProfile> {
        None
    }

    /// The handler became active.
    fn on_activated(&mut self, host: &dyn Host) -> Result<()>;

    /// The handler is no longer active.
    fn on_deactivated(&mut self) -> Result<()>;

    /// An event for this handler's package arrived.
    fn on_event(&mut self, event: &HostEvent, host: &dyn Host) -> Result<()>;
}

/// Produces a fresh handler instance per activation.
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

/// Generic handler driven by an [`AppProfile`].
///
/// Keeps a mask overlay pinned over the app's send button: shown and moved
/// while the button is on screen, dismissed when it is not.
pub struct ProfileHandler {
    /// Target app description.
    profile: AppProfile,
    /// Template for the mask overlay.
    overlay: OverlayOptions,
    /// Created on activation.
    mask: Option<OverlayWindow>,
}

impl ProfileHandler {
    /// Handler for `profile`; `overlay` supplies animation settings.
    pub fn new(profile: AppProfile, overlay: OverlayOptions) -> Self {
        Self {
            profile,
            overlay,
            mask: None,
        }
    }

    /// Factory producing a new handler for `profile` on every call.
    pub fn factory(profile: AppProfile, overlay: OverlayOptions) -> HandlerFactory {
        Arc::new(move || {
            Box::new(Self::new(profile.clone(), overlay.clone())) as Box<dyn Handler>
        })
    }

    /// The send-button mask, once activated.
    pub fn mask(&self) -> Option<&OverlayWindow> {
        self.mask.as_ref()
    }
}

impl Handler for ProfileHandler {
    fn package_name(&self) -> &str {
        &self.profile.package_name
    }

    fn profile(&self) -> Option<&AppProfile> {
        Some(&self.profile)
    }

    fn on_activated(&mut self, host: &dyn Host) -> Result<()> {
        let options = OverlayOptions {
            anchor: None,
            draggable: false,
            ..self.overlay.clone()
        };
        self.mask = Some(OverlayWindow::new(
            host.window_layer(),
            options,
            Box::new(|| {}),
        ));
        debug!(package = %self.profile.package_name, "send_mask_ready");
        Ok(())
    }

    fn on_deactivated(&mut self) -> Result<()> {
        if let Some(mask) = self.mask.take() {
            mask.dismiss();
        }
        Ok(())
    }

    fn on_event(&mut self, event: &HostEvent, host: &dyn Host) -> Result<()> {
        let Some(mask) = &self.mask else {
            return Ok(());
        };
        let window = host.active_window();
        let bounds = window
            .as_deref()
            .and_then(|w| w.find_by_resource_id(&self.profile.send_btn_id))
            .and_then(|n| n.bounds());
        match bounds {
            Some(b) => {
                let target = Position::new(b.left, b.top);
                trace!(kind = ?event.kind, ?target, "send_button_located");
                if mask.is_shown() {
                    mask.update_position(target);
                } else {
                    mask.show_at(target)?;
                }
            }
            None => mask.dismiss(),
        }
        Ok(())
    }
}
