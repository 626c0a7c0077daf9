//! The surface node index: which surface element renders which document key.
//!
//! Entries are created on mount notifications and removed on unmount; an
//! entry may still go stale between the two (the renderer reuses arena slots),
//! so lookups always re-check existence and key agreement before handing an
//! id out. A stale entry is never dereferenced.

use rustc_hash::FxHashMap;
use vellum_traits::{Key, SurfaceNodeId};

use crate::surface::Surface;

#[derive(Default)]
pub struct SurfaceIndex {
    by_key: FxHashMap<Key, SurfaceNodeId>,
}

impl SurfaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `node` now renders the document node identified by `key`.
    pub fn note_mounted(&mut self, key: Key, node: SurfaceNodeId) {
        self.by_key.insert(key, node);
    }

    /// Forget the element rendering `key`.
    pub fn note_unmounted(&mut self, key: Key) {
        self.by_key.remove(&key);
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Resolve `key` to its currently-mounted element, or `None` when the
    /// entry is missing, the node is gone from the arena, or the arena slot
    /// was reused for something that no longer renders `key`.
    pub fn node_for_key(&self, surface: &Surface, key: Key) -> Option<SurfaceNodeId> {
        let id = *self.by_key.get(&key)?;
        let node = surface.get(id)?;
        let el = node.element_data()?;
        if el.key != Some(key) {
            return None;
        }
        Some(id)
    }
}
