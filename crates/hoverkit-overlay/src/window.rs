//! A single floating surface: lifecycle, drag handling and animated moves.

use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    Result,
    animation::{Animation, DEFAULT_ANIMATION_MS, Frame, spawn_tween},
    drag::{DEFAULT_TOUCH_SLOP, DragGesture, GestureEnd, PointerEvent},
    layer::{Gravity, LayoutParams, Position, SurfaceId, WindowLayer},
};

/// Renderable content hosted by an overlay.
///
/// The overlay never inspects its content; it only forwards synthesized
/// clicks.
pub trait OverlayContent: Send {
    /// A touch sequence ended without becoming a drag.
    fn perform_click(&mut self);
}

impl<F> OverlayContent for F
where
    F: FnMut() + Send,
{
    fn perform_click(&mut self) {
        self()
    }
}

/// Construction options for an [`OverlayWindow`].
#[derive(Clone, Debug)]
pub struct OverlayOptions {
    /// Top-left anchor; `None` centres the surface.
    pub anchor: Option<Position>,
    /// Install drag handling.
    pub draggable: bool,
    /// Whether the host should route pointer events to the surface.
    pub touchable: bool,
    /// Drag threshold in pixels.
    pub touch_slop: f32,
    /// Length of `update_position` animations.
    pub animation: Duration,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            anchor: None,
            draggable: false,
            touchable: true,
            touch_slop: DEFAULT_TOUCH_SLOP,
            animation: Duration::from_millis(DEFAULT_ANIMATION_MS),
        }
    }
}

/// What a pointer event did to the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    /// The event was not for us (hidden, not draggable, or no sequence).
    Ignored,
    /// A sequence is in progress but nothing moved yet.
    Pending,
    /// The surface followed the pointer.
    Moved(Position),
    /// The sequence ended as a click; content was notified.
    Clicked,
    /// The sequence ended as a drag.
    Dragged,
}

/// Callback run after every real dismissal.
type DismissHook = Arc<dyn Fn() + Send + Sync>;

/// Mutable window state, guarded by one lock.
struct Inner {
    /// `Some` while shown.
    surface: Option<SurfaceId>,
    /// Last position pushed to the host.
    position: Position,
    /// Touch sequence tracker.
    drag: DragGesture,
    /// In-flight tween, if any.
    animation: Option<Animation>,
    /// Bumped for every tween started.
    generation: u64,
}

impl Inner {
    /// Cancel and forget the in-flight tween.
    fn stop_animation(&mut self) {
        if let Some(anim) = self.animation.take() {
            anim.cancel();
        }
    }
}

/// State shared between the window handle and its animation tasks.
struct Shared {
    /// Host window layer.
    layer: Arc<dyn WindowLayer>,
    /// Immutable construction options.
    options: OverlayOptions,
    /// Lifecycle, position and gesture state.
    inner: Mutex<Inner>,
    /// Opaque content; only ever clicked.
    content: Mutex<Box<dyn OverlayContent>>,
    /// Run after each dismissal, outside the state lock.
    on_dismiss: Mutex<Option<DismissHook>>,
}

impl Shared {
    /// Apply one animation frame. Returns `false` to stop the tween.
    fn apply_frame(&self, surface: SurfaceId, generation: u64, frame: Frame) -> bool {
        let mut inner = self.inner.lock();
        let current = inner.animation.as_ref().map(Animation::generation);
        if inner.surface != Some(surface) || current != Some(generation) {
            return false;
        }
        if frame.last {
            inner.animation = None;
        }
        if frame.position == inner.position {
            return true;
        }
        if !self.layer.is_attached(surface) {
            trace!(%surface, "tween_surface_detached");
            inner.animation = None;
            return false;
        }
        inner.position = frame.position;
        if let Err(e) = self.layer.update_surface_position(surface, frame.position) {
            warn!(%surface, error = %e, "overlay_update_failed");
            inner.animation = None;
            return false;
        }
        true
    }
}

/// Handle to one overlay. Cheap to clone; clones share the same surface.
#[derive(Clone)]
pub struct OverlayWindow {
    /// State shared with clones and tween tasks.
    shared: Arc<Shared>,
}

impl fmt::Debug for OverlayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("OverlayWindow")
            .field("surface", &inner.surface)
            .field("position", &inner.position)
            .field("draggable", &self.shared.options.draggable)
            .finish()
    }
}

impl OverlayWindow {
    /// Create a hidden overlay bound to `layer`.
    pub fn new(
        layer: Arc<dyn WindowLayer>,
        options: OverlayOptions,
        content: Box<dyn OverlayContent>,
    ) -> Self {
        let inner = Inner {
            surface: None,
            position: options.anchor.unwrap_or_default(),
            drag: DragGesture::new(options.touch_slop),
            animation: None,
            generation: 0,
        };
        Self {
            shared: Arc::new(Shared {
                layer,
                options,
                inner: Mutex::new(inner),
                content: Mutex::new(content),
                on_dismiss: Mutex::new(None),
            }),
        }
    }

    /// Install the callback run after each dismissal.
    pub fn set_on_dismiss(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.shared.on_dismiss.lock() = Some(Arc::new(hook));
    }

    /// Whether a surface is registered with the host.
    pub fn is_shown(&self) -> bool {
        self.shared.inner.lock().surface.is_some()
    }

    /// Current surface id, if shown.
    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.shared.inner.lock().surface
    }

    /// Last position applied to the surface.
    pub fn position(&self) -> Position {
        self.shared.inner.lock().position
    }

    /// Whether a position tween is running.
    pub fn is_animating(&self) -> bool {
        self.shared.inner.lock().animation.is_some()
    }

    /// Register the surface with the host. No-op when already shown.
    ///
    /// A host failure is returned and the overlay stays hidden.
    pub fn show(&self) -> Result<()> {
        self.show_anchored(self.shared.options.anchor)
    }

    /// Like [`show`](Self::show), but anchored at `position` instead of the
    /// configured anchor. No-op when already shown.
    pub fn show_at(&self, position: Position) -> Result<()> {
        self.show_anchored(Some(position))
    }

    /// Shared body of `show` and `show_at`.
    fn show_anchored(&self, anchor: Option<Position>) -> Result<()> {
        let mut inner = self.shared.inner.lock();
        if inner.surface.is_some() {
            return Ok(());
        }
        let (gravity, position) = match anchor {
            Some(anchor) => (Gravity::TopStart, anchor),
            None => (Gravity::Center, Position::default()),
        };
        let params = LayoutParams {
            gravity,
            position,
            touchable: self.shared.options.touchable,
        };
        let id = SurfaceId::next();
        self.shared.layer.add_surface(id, &params)?;
        inner.surface = Some(id);
        inner.position = position;
        inner.drag.reset();
        debug!(surface = %id, ?position, "overlay_shown");
        Ok(())
    }

    /// Remove the surface. No-op when hidden.
    ///
    /// Local cleanup and the dismiss callback run even if the host refuses
    /// the removal.
    pub fn dismiss(&self) {
        let surface = {
            let mut inner = self.shared.inner.lock();
            let Some(id) = inner.surface.take() else {
                return;
            };
            inner.stop_animation();
            inner.drag.reset();
            id
        };
        match self.shared.layer.remove_surface(surface) {
            Ok(()) => debug!(%surface, "overlay_dismissed"),
            Err(e) => warn!(%surface, error = %e, "overlay_remove_failed"),
        }
        let hook = self.shared.on_dismiss.lock().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Cancel any in-flight tween, leaving the surface where it is.
    pub fn stop_animation(&self) {
        self.shared.inner.lock().stop_animation();
    }

    /// Animate the surface to `target`.
    ///
    /// Any running tween is cancelled first. Nothing starts when hidden or
    /// when `target` is the current position. Requires a Tokio runtime.
    pub fn update_position(&self, target: Position) {
        let mut inner = self.shared.inner.lock();
        let Some(surface) = inner.surface else {
            return;
        };
        inner.stop_animation();
        let from = inner.position;
        if from == target {
            return;
        }
        inner.generation += 1;
        let generation = inner.generation;
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let (anim, _task) = spawn_tween(
            generation,
            from,
            target,
            self.shared.options.animation,
            move |frame| {
                weak.upgrade()
                    .is_some_and(|shared| shared.apply_frame(surface, generation, frame))
            },
        );
        inner.animation = Some(anim);
    }

    /// Feed one pointer event through the drag handler.
    ///
    /// Moves past the touch slop reposition the surface immediately. A
    /// sequence that never crossed the slop ends in exactly one click.
    pub fn on_pointer(&self, event: PointerEvent) -> Result<PointerOutcome> {
        if !self.shared.options.draggable {
            return Ok(PointerOutcome::Ignored);
        }
        let mut inner = self.shared.inner.lock();
        let Some(surface) = inner.surface else {
            return Ok(PointerOutcome::Ignored);
        };
        match event {
            PointerEvent::Down { x, y } => {
                inner.stop_animation();
                let window = inner.position;
                inner.drag.down(window, (x, y));
                Ok(PointerOutcome::Pending)
            }
            PointerEvent::Move { x, y } => {
                if !inner.drag.is_active() {
                    return Ok(PointerOutcome::Ignored);
                }
                match inner.drag.moved((x, y)) {
                    Some(pos) => {
                        self.shared.layer.update_surface_position(surface, pos)?;
                        inner.position = pos;
                        Ok(PointerOutcome::Moved(pos))
                    }
                    None => Ok(PointerOutcome::Pending),
                }
            }
            PointerEvent::Up { .. } => match inner.drag.up() {
                Some(GestureEnd::Click) => {
                    drop(inner);
                    self.shared.content.lock().perform_click();
                    debug!(%surface, "overlay_clicked");
                    Ok(PointerOutcome::Clicked)
                }
                Some(GestureEnd::Drag) => {
                    debug!(%surface, position = ?inner.position, "overlay_dragged");
                    Ok(PointerOutcome::Dragged)
                }
                None => Ok(PointerOutcome::Ignored),
            },
            PointerEvent::Cancel => {
                inner.drag.reset();
                Ok(PointerOutcome::Ignored)
            }
        }
    }
}
