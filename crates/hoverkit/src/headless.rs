//! A scripted host with no real screen.

use std::{collections::HashMap, sync::Arc};

use hoverkit_engine::Host;
use hoverkit_overlay::{Error, LayoutParams, Position, Result, SurfaceId, WindowLayer};
use hoverkit_tree::NodeTree;
use parking_lot::Mutex;
use tracing::info;

/// Window layer that only keeps track of surfaces and logs what happens.
#[derive(Debug, Default)]
pub struct HeadlessLayer {
    /// Attached surfaces and their last position.
    surfaces: Mutex<HashMap<SurfaceId, Position>>,
}

impl HeadlessLayer {
    /// Number of attached surfaces.
    pub fn attached(&self) -> usize {
        self.surfaces.lock().len()
    }
}

impl WindowLayer for HeadlessLayer {
    fn add_surface(&self, id: SurfaceId, params: &LayoutParams) -> Result<()> {
        self.surfaces.lock().insert(id, params.position);
        info!(surface = %id, gravity = ?params.gravity, position = ?params.position, "surface_added");
        Ok(())
    }

    fn remove_surface(&self, id: SurfaceId) -> Result<()> {
        match self.surfaces.lock().remove(&id) {
            Some(_) => {
                info!(surface = %id, "surface_removed");
                Ok(())
            }
            None => Err(Error::layer("remove", format!("{id} is not attached"))),
        }
    }

    fn update_surface_position(&self, id: SurfaceId, position: Position) -> Result<()> {
        match self.surfaces.lock().get_mut(&id) {
            Some(slot) => {
                *slot = position;
                info!(surface = %id, x = position.x, y = position.y, "surface_moved");
                Ok(())
            }
            None => Err(Error::layer("update", format!("{id} is not attached"))),
        }
    }

    fn is_attached(&self, id: SurfaceId) -> bool {
        self.surfaces.lock().contains_key(&id)
    }
}

/// Host whose foreground app and active window are set by scenario steps.
pub struct ReplayHost {
    /// Reported foreground package.
    foreground: Mutex<Option<String>>,
    /// Reported active window.
    window: Mutex<Option<Arc<NodeTree>>>,
    /// Overlay layer.
    layer: Arc<HeadlessLayer>,
    /// Reported screen size.
    screen: (i32, i32),
}

impl ReplayHost {
    /// Empty host for a `screen`-sized display.
    pub fn new(screen: (i32, i32)) -> Self {
        Self {
            foreground: Mutex::new(None),
            window: Mutex::new(None),
            layer: Arc::new(HeadlessLayer::default()),
            screen,
        }
    }

    /// Change the foreground package.
    pub fn set_foreground(&self, package: Option<String>) {
        *self.foreground.lock() = package;
    }

    /// Replace the active window.
    pub fn set_window(&self, window: Arc<NodeTree>) {
        *self.window.lock() = Some(window);
    }

    /// The headless layer.
    pub fn layer(&self) -> &HeadlessLayer {
        &self.layer
    }
}

impl Host for ReplayHost {
    fn foreground_package(&self) -> Option<String> {
        self.foreground.lock().clone()
    }

    fn active_window(&self) -> Option<Arc<NodeTree>> {
        self.window.lock().clone()
    }

    fn window_layer(&self) -> Arc<dyn WindowLayer> {
        self.layer.clone()
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }
}
