use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

/// Display-only copy of a staged image, served back to the page.
#[derive(Clone)]
pub struct PreviewResource {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

/// Registry of live preview resources, keyed by staged image id.
///
/// Entries only exist while a [`PreviewHandle`] for them is alive.
#[derive(Default)]
pub struct PreviewRegistry {
    entries: Mutex<HashMap<Uuid, PreviewResource>>,
}

impl PreviewRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a preview and return the guard that owns it.
    pub fn acquire(self: &Arc<Self>, id: Uuid, mime_type: &str, bytes: Arc<[u8]>) -> PreviewHandle {
        self.lock().insert(
            id,
            PreviewResource {
                mime_type: mime_type.to_string(),
                bytes,
            },
        );
        tracing::trace!(%id, "Preview acquired");
        PreviewHandle {
            id,
            uri: preview_uri(&id),
            registry: Arc::clone(self),
        }
    }

    /// Look up a live preview.
    pub fn get(&self, id: &Uuid) -> Option<PreviewResource> {
        self.lock().get(id).cloned()
    }

    /// Number of preview resources currently held.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, id: &Uuid) {
        if self.lock().remove(id).is_some() {
            tracing::trace!(%id, "Preview released");
        }
    }

    // Release runs from Drop, so a poisoned lock must not panic again.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PreviewResource>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// URI under which a preview is served.
pub fn preview_uri(id: &Uuid) -> String {
    format!("/api/previews/{id}")
}

/// Scoped ownership of one preview resource. Dropping it releases the resource.
pub struct PreviewHandle {
    id: Uuid,
    uri: String,
    registry: Arc<PreviewRegistry>,
}

impl PreviewHandle {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("uri", &self.uri)
            .finish()
    }
}
