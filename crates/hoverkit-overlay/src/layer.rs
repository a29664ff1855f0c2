//! Host window layer abstraction and a recording mock.

use std::{
    collections::HashSet,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of one surface instance registered with the host.
///
/// Every `show()` allocates a fresh id, so a dismissed-then-reshown overlay
/// never aliases its previous surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocate the next process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Surface position in host pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset.
    pub x: i32,
    /// Vertical offset.
    pub y: i32,
}

impl Position {
    /// Construct a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// How the host interprets a surface's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gravity {
    /// Offsets are from the top-left corner of the screen.
    TopStart,
    /// Offsets are from the screen centre.
    Center,
}

/// Placement parameters handed to the host when a surface is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutParams {
    /// Reference point for `position`.
    pub gravity: Gravity,
    /// Initial position.
    pub position: Position,
    /// Whether the surface wants pointer events routed to it.
    pub touchable: bool,
}

/// Host window layer that owns overlay surfaces.
///
/// Implementations must be cheap to call; they are invoked from the event
/// path and from animation ticks.
pub trait WindowLayer: Send + Sync {
    /// Register a new surface.
    fn add_surface(&self, id: SurfaceId, params: &LayoutParams) -> Result<()>;
    /// Remove a surface. May fail if the host already detached it.
    fn remove_surface(&self, id: SurfaceId) -> Result<()>;
    /// Move an attached surface.
    fn update_surface_position(&self, id: SurfaceId, position: Position) -> Result<()>;
    /// Whether `id` is currently attached to the host.
    fn is_attached(&self, id: SurfaceId) -> bool;
}

/// A recorded call against [`MockWindowLayer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerCall {
    /// `add_surface`
    Add(SurfaceId, LayoutParams),
    /// `remove_surface`
    Remove(SurfaceId),
    /// `update_surface_position`
    Update(SurfaceId, Position),
}

/// In-memory window layer that records every call.
#[derive(Clone, Default)]
pub struct MockWindowLayer {
    /// Call journal in order.
    calls: Arc<Mutex<Vec<LayerCall>>>,
    /// Currently attached surfaces.
    attached: Arc<Mutex<HashSet<SurfaceId>>>,
    /// When set, `remove_surface` fails after detaching.
    fail_remove: Arc<AtomicBool>,
    /// When set, `add_surface` fails.
    fail_add: Arc<AtomicBool>,
}

impl MockWindowLayer {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<LayerCall> {
        self.calls.lock().clone()
    }

    /// Number of `add_surface` calls.
    pub fn adds(&self) -> usize {
        self.count(|c| matches!(c, LayerCall::Add(..)))
    }

    /// Number of `remove_surface` calls.
    pub fn removes(&self) -> usize {
        self.count(|c| matches!(c, LayerCall::Remove(_)))
    }

    /// Positions pushed via `update_surface_position`, in order.
    pub fn updates(&self) -> Vec<Position> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                LayerCall::Update(_, p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Surfaces currently attached.
    pub fn attached(&self) -> Vec<SurfaceId> {
        let mut v: Vec<SurfaceId> = self.attached.lock().iter().copied().collect();
        v.sort();
        v
    }

    /// Simulate the host detaching a surface behind our back.
    pub fn detach(&self, id: SurfaceId) {
        self.attached.lock().remove(&id);
    }

    /// Make subsequent removals fail.
    pub fn set_fail_remove(&self, v: bool) {
        self.fail_remove.store(v, Ordering::SeqCst);
    }

    /// Make subsequent additions fail.
    pub fn set_fail_add(&self, v: bool) {
        self.fail_add.store(v, Ordering::SeqCst);
    }

    /// Forget recorded calls (attachment state is kept).
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Count calls matching `pred`.
    fn count(&self, pred: impl Fn(&LayerCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

impl WindowLayer for MockWindowLayer {
    fn add_surface(&self, id: SurfaceId, params: &LayoutParams) -> Result<()> {
        self.calls.lock().push(LayerCall::Add(id, *params));
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(Error::layer("add", "mock add failure"));
        }
        self.attached.lock().insert(id);
        Ok(())
    }

    fn remove_surface(&self, id: SurfaceId) -> Result<()> {
        self.calls.lock().push(LayerCall::Remove(id));
        let was_attached = self.attached.lock().remove(&id);
        if self.fail_remove.load(Ordering::SeqCst) || !was_attached {
            return Err(Error::layer("remove", format!("{id} not attached")));
        }
        Ok(())
    }

    fn update_surface_position(&self, id: SurfaceId, position: Position) -> Result<()> {
        self.calls.lock().push(LayerCall::Update(id, position));
        if !self.attached.lock().contains(&id) {
            return Err(Error::layer("update", format!("{id} not attached")));
        }
        Ok(())
    }

    fn is_attached(&self, id: SurfaceId) -> bool {
        self.attached.lock().contains(&id)
    }
}
