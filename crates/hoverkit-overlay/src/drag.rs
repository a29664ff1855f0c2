//! Drag-versus-click disambiguation for one touch sequence.

use serde::{Deserialize, Serialize};

use crate::layer::Position;

/// Default distance a pointer must travel before a touch becomes a drag.
pub const DEFAULT_TOUCH_SLOP: f32 = 8.0;

/// Raw pointer input in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Finger or button went down.
    Down {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
    },
    /// Pointer moved while down.
    Move {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
    },
    /// Finger or button released.
    Up {
        /// Screen x.
        x: f32,
        /// Screen y.
        y: f32,
    },
    /// The host aborted the sequence.
    Cancel,
}

/// How a completed touch sequence ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEnd {
    /// Never left the slop radius.
    Click,
    /// Moved the surface.
    Drag,
}

/// Per-sequence drag state.
#[derive(Clone, Debug)]
pub struct DragGesture {
    /// Threshold in pixels, compared per axis.
    touch_slop: f32,
    /// Surface position at touch-down.
    initial_window: Position,
    /// Pointer position at touch-down.
    initial_touch: (f32, f32),
    /// Set once the pointer leaves the slop radius.
    dragging: bool,
    /// A sequence is in progress.
    active: bool,
}

impl DragGesture {
    /// New idle gesture tracker.
    pub fn new(touch_slop: f32) -> Self {
        Self {
            touch_slop,
            initial_window: Position::default(),
            initial_touch: (0.0, 0.0),
            dragging: false,
            active: false,
        }
    }

    /// Whether the current sequence has become a drag.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Whether a touch sequence is in progress.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin a sequence at `touch` with the surface at `window`.
    pub fn down(&mut self, window: Position, touch: (f32, f32)) {
        self.initial_window = window;
        self.initial_touch = touch;
        self.dragging = false;
        self.active = true;
    }

    /// Pointer moved; returns the new surface position while dragging.
    pub fn moved(&mut self, touch: (f32, f32)) -> Option<Position> {
        if !self.active {
            return None;
        }
        let dx = touch.0 - self.initial_touch.0;
        let dy = touch.1 - self.initial_touch.1;
        if !self.dragging && dx.abs().max(dy.abs()) > self.touch_slop {
            self.dragging = true;
        }
        self.dragging.then(|| {
            Position::new(
                (self.initial_window.x as f32 + dx) as i32,
                (self.initial_window.y as f32 + dy) as i32,
            )
        })
    }

    /// End the sequence. `None` if no sequence was in progress.
    pub fn up(&mut self) -> Option<GestureEnd> {
        if !self.active {
            return None;
        }
        let end = if self.dragging {
            GestureEnd::Drag
        } else {
            GestureEnd::Click
        };
        self.reset();
        Some(end)
    }

    /// Abandon any sequence in progress.
    pub fn reset(&mut self) {
        self.active = false;
        self.dragging = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_jitter_is_a_click() {
        let mut g = DragGesture::new(8.0);
        g.down(Position::new(100, 100), (10.0, 10.0));
        assert_eq!(g.moved((13.0, 8.0)), None);
        assert_eq!(g.moved((18.0, 2.0)), None);
        assert_eq!(g.up(), Some(GestureEnd::Click));
    }

    #[test]
    fn crossing_slop_tracks_one_to_one() {
        let mut g = DragGesture::new(8.0);
        g.down(Position::new(100, 200), (10.0, 10.0));
        assert_eq!(g.moved((19.5, 10.0)), Some(Position::new(109, 200)));
        assert!(g.is_dragging());
        // Back inside the slop radius still moves: the drag latched.
        assert_eq!(g.moved((11.0, 12.0)), Some(Position::new(101, 202)));
        assert_eq!(g.up(), Some(GestureEnd::Drag));
        assert!(!g.is_dragging());
    }

    #[test]
    fn each_down_resets_state() {
        let mut g = DragGesture::new(8.0);
        g.down(Position::new(0, 0), (0.0, 0.0));
        let _ = g.moved((50.0, 0.0));
        g.down(Position::new(50, 0), (50.0, 0.0));
        assert!(!g.is_dragging());
        assert_eq!(g.up(), Some(GestureEnd::Click));
    }

    #[test]
    fn events_without_down_are_ignored() {
        let mut g = DragGesture::new(8.0);
        assert_eq!(g.moved((100.0, 100.0)), None);
        assert_eq!(g.up(), None);
    }
}
