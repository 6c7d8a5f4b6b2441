//! Keeps at most one picker surface open within a group of selectors.
//!
//! A container that manages several selectors owns one
//! [`SurfaceCoordinator`] and hands it to each of them. Opening a selector
//! claims the coordinator, which closes whichever selector held it before.

use std::sync::{Mutex, MutexGuard, PoisonError, Weak};

/// Something with a surface the coordinator can close.
pub trait Surface: Send + Sync {
    fn close_surface(&self);
}

struct OpenSurface {
    id: String,
    surface: Weak<dyn Surface>,
}

#[derive(Default)]
pub struct SurfaceCoordinator {
    open: Mutex<Option<OpenSurface>>,
}

impl std::fmt::Debug for SurfaceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceCoordinator")
            .field("open", &self.open_id())
            .finish()
    }
}

impl SurfaceCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<OpenSurface>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ID of the surface currently open, if any.
    pub fn open_id(&self) -> Option<String> {
        self.lock().as_ref().map(|open| open.id.clone())
    }

    /// Register `id` as the open surface, closing the previous one.
    pub fn claim(&self, id: &str, surface: Weak<dyn Surface>) {
        let previous = {
            let mut open = self.lock();
            if open.as_ref().is_some_and(|current| current.id == id) {
                return;
            }
            open.replace(OpenSurface {
                id: id.to_string(),
                surface,
            })
        };

        // Closed outside the lock: closing calls back into `release`.
        if let Some(previous) = previous {
            log::debug!("[coordinator] {} opened, closing {}", id, previous.id);
            if let Some(surface) = previous.surface.upgrade() {
                surface.close_surface();
            }
        }
    }

    /// Forget `id` if it is the open surface.
    pub fn release(&self, id: &str) {
        let mut open = self.lock();
        if open.as_ref().is_some_and(|current| current.id == id) {
            log::debug!("[coordinator] {} closed", id);
            *open = None;
        }
    }
}
