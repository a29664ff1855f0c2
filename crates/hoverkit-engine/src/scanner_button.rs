//! The floating, draggable button that triggers a scan when tapped.

use std::sync::{Arc, Weak};

use hoverkit_overlay::{
    OverlayOptions, OverlayWindow, PointerEvent, PointerOutcome, Position, WindowLayer,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::Result;

/// Current button window tagged with the show it belongs to.
type Slot = Arc<Mutex<Option<(u64, OverlayWindow)>>>;

/// Owner of the optional scanner button overlay.
///
/// Each `show` on a hidden button creates a fresh [`OverlayWindow`]; its
/// dismiss hook clears the slot so the next `show` starts over.
pub struct ScannerButton {
    /// Layer new windows are registered with.
    layer: Arc<dyn WindowLayer>,
    /// Template for every new window.
    options: OverlayOptions,
    /// The live window, if any.
    slot: Slot,
    /// Incremented per created window.
    generation: u64,
}

impl ScannerButton {
    /// Button anchored at the right edge of `screen`, vertically centred.
    pub fn new(layer: Arc<dyn WindowLayer>, screen: (i32, i32), overlay: &OverlayOptions) -> Self {
        let (w, h) = screen;
        Self {
            layer,
            options: OverlayOptions {
                anchor: Some(Position::new(w, h / 2)),
                draggable: true,
                ..overlay.clone()
            },
            slot: Arc::new(Mutex::new(None)),
            generation: 0,
        }
    }

    /// Whether the button is on screen.
    pub fn is_shown(&self) -> bool {
        self.slot.lock().as_ref().is_some_and(|(_, w)| w.is_shown())
    }

    /// The live window.
    pub fn window(&self) -> Option<OverlayWindow> {
        self.slot.lock().as_ref().map(|(_, w)| w.clone())
    }

    /// Show the button. Returns `false` if it was already shown.
    pub fn show(&mut self) -> Result<bool> {
        if self.is_shown() {
            return Ok(false);
        }
        self.generation += 1;
        let generation = self.generation;
        let window = OverlayWindow::new(self.layer.clone(), self.options.clone(), Box::new(|| {}));
        let weak: Weak<Mutex<Option<(u64, OverlayWindow)>>> = Arc::downgrade(&self.slot);
        window.set_on_dismiss(move || {
            if let Some(slot) = weak.upgrade() {
                let mut slot = slot.lock();
                if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
                    *slot = None;
                }
            }
        });
        *self.slot.lock() = Some((generation, window.clone()));
        if let Err(e) = window.show() {
            *self.slot.lock() = None;
            return Err(e.into());
        }
        debug!(generation, "scanner_button_shown");
        Ok(true)
    }

    /// Hide the button. Returns `false` if it was not shown.
    pub fn hide(&self) -> bool {
        let taken = self.slot.lock().take();
        match taken {
            Some((generation, window)) => {
                window.dismiss();
                debug!(generation, "scanner_button_hidden");
                true
            }
            None => false,
        }
    }

    /// Route a pointer event to the button.
    pub fn on_pointer(&self, event: PointerEvent) -> Result<PointerOutcome> {
        match self.window() {
            Some(window) => Ok(window.on_pointer(event)?),
            None => Ok(PointerOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use hoverkit_overlay::{LayerCall, MockWindowLayer};

    use super::*;

    fn button(layer: &MockWindowLayer) -> ScannerButton {
        ScannerButton::new(
            Arc::new(layer.clone()),
            (1080, 2340),
            &OverlayOptions::default(),
        )
    }

    #[test]
    fn show_twice_adds_once_at_right_edge() {
        let layer = MockWindowLayer::new();
        let mut b = button(&layer);
        assert!(b.show().unwrap());
        assert!(!b.show().unwrap());
        assert_eq!(layer.adds(), 1);
        match &layer.calls()[0] {
            LayerCall::Add(_, params) => {
                assert_eq!(params.position, Position::new(1080, 1170));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn tap_clicks_and_drag_moves() {
        let layer = MockWindowLayer::new();
        let mut b = button(&layer);
        b.show().unwrap();
        b.on_pointer(PointerEvent::Down { x: 5.0, y: 5.0 }).unwrap();
        assert_eq!(
            b.on_pointer(PointerEvent::Up { x: 6.0, y: 5.0 }).unwrap(),
            PointerOutcome::Clicked
        );
        b.on_pointer(PointerEvent::Down { x: 5.0, y: 5.0 }).unwrap();
        assert_eq!(
            b.on_pointer(PointerEvent::Move { x: 5.0, y: 105.0 }).unwrap(),
            PointerOutcome::Moved(Position::new(1080, 1270))
        );
        assert_eq!(
            b.on_pointer(PointerEvent::Up { x: 5.0, y: 105.0 }).unwrap(),
            PointerOutcome::Dragged
        );
    }

    #[test]
    fn hide_then_show_creates_new_surface() {
        let layer = MockWindowLayer::new();
        let mut b = button(&layer);
        b.show().unwrap();
        assert!(b.hide());
        assert!(!b.hide());
        assert!(b.window().is_none());
        b.show().unwrap();
        assert_eq!(layer.adds(), 2);
        assert_eq!(layer.attached().len(), 1);
    }

    #[test]
    fn external_dismiss_clears_slot() {
        let layer = MockWindowLayer::new();
        let mut b = button(&layer);
        b.show().unwrap();
        b.window().unwrap().dismiss();
        assert!(b.window().is_none());
        assert!(!b.is_shown());
        assert!(b.show().unwrap());
    }

    #[test]
    fn pointer_without_button_is_ignored() {
        let b = button(&MockWindowLayer::new());
        assert_eq!(
            b.on_pointer(PointerEvent::Cancel).unwrap(),
            PointerOutcome::Ignored
        );
    }

    #[test]
    fn failed_add_leaves_button_hidden() {
        let layer = MockWindowLayer::new();
        layer.set_fail_add(true);
        let mut b = button(&layer);
        assert!(b.show().is_err());
        assert!(b.window().is_none());
    }
}
