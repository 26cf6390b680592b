use std::sync::{Arc, Mutex};

use crate::error::CoordError;
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::render::ViewRenderer;
use crate::scheduler::{LoadHandle, RefreshScheduler};
use crate::view::{ViewId, ViewRegistry};

/// Owns the active-view pointer. Switching is synchronous: nothing here
/// awaits, so the pointer and target visibility are never half-updated.
pub struct NavigationController {
    registry: Arc<ViewRegistry>,
    renderer: Arc<ViewRenderer>,
    scheduler: Arc<RefreshScheduler>,
    active: Mutex<Option<ViewId>>,
}

impl NavigationController {
    pub fn new(
        registry: Arc<ViewRegistry>,
        renderer: Arc<ViewRenderer>,
        scheduler: Arc<RefreshScheduler>,
    ) -> Self {
        Self {
            registry,
            renderer,
            scheduler,
            active: Mutex::new(None),
        }
    }

    /// Makes `id` the active view and triggers its load.
    ///
    /// An unknown id (or one with no mounted target) fails before anything
    /// changes, leaving the previous view active and visible. Re-activating
    /// the current view reloads it.
    pub fn activate(&self, id: &ViewId) -> Result<LoadHandle, CoordError> {
        let view = self.registry.resolve(id)?;
        if !self.renderer.is_mounted(id) {
            log(
                Level::Warn,
                Domain::Nav,
                "activate_rejected",
                obj(&[("view_id", v_str(id.as_str())), ("msg", v_str("no render target"))]),
            );
            return Err(CoordError::UnknownView(id.clone()));
        }

        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        let previous = active.take();
        if let Some(prev) = &previous {
            if let Ok(prev_view) = self.registry.resolve(prev) {
                prev_view.detach_handlers();
            }
            self.scheduler.on_detached(prev);
        }

        self.renderer.show_only(id)?;
        view.attach_handlers();
        *active = Some(id.clone());
        drop(active);

        log(
            Level::Info,
            Domain::Nav,
            "activated",
            obj(&[
                ("view_id", v_str(id.as_str())),
                ("from", v_str(previous.as_ref().map(ViewId::as_str).unwrap_or(""))),
            ]),
        );
        self.scheduler.on_attached(id)
    }

    pub fn active(&self) -> Option<ViewId> {
        self.active.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}
