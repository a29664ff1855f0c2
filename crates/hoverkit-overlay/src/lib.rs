//! Floating overlay surfaces.
//!
//! An [`OverlayWindow`] owns at most one surface registered with a host
//! [`WindowLayer`]. `show` and `dismiss` are idempotent, `update_position`
//! runs a cancellable ease-out tween on the Tokio clock, and draggable
//! overlays tell drags from clicks with a touch-slop threshold.

mod animation;
mod drag;
mod error;
mod layer;
mod window;

pub use animation::{DEFAULT_ANIMATION_MS, FRAME_INTERVAL_MS, ease_out, lerp};
pub use drag::{DEFAULT_TOUCH_SLOP, DragGesture, GestureEnd, PointerEvent};
pub use error::{Error, Result};
pub use layer::{
    Gravity, LayerCall, LayoutParams, MockWindowLayer, Position, SurfaceId, WindowLayer,
};
pub use window::{OverlayContent, OverlayOptions, OverlayWindow, PointerOutcome};
