//! Two-way selection reconciliation between the model and the surface.
//!
//! Either side can be the source of truth for a moment: the model after a
//! command ran, the surface after the user clicked or the platform moved the
//! caret. Each direction is idempotent, and two mechanisms stop the two
//! directions from feeding each other: the `is_updating` guard marks
//! notifications caused by our own programmatic update as self-inflicted, and
//! the raw snapshot filters notifications that did not actually change
//! anything.

use vellum_traits::{DocumentModel, RawPoint, Selection};

use crate::error::SyncError;
use crate::index::SurfaceIndex;
use crate::mapper;
use crate::surface::{NativeSelection, Surface};

/// Last-observed raw surface selection. Compared field-for-field against new
/// observations to skip redundant work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeSnapshot {
    pub anchor: Option<RawPoint>,
    pub focus: Option<RawPoint>,
    pub is_collapsed: bool,
    pub range_count: usize,
}

impl NativeSnapshot {
    fn capture(selection: &NativeSelection) -> Self {
        NativeSnapshot {
            anchor: selection.anchor,
            focus: selection.focus,
            is_collapsed: selection.is_collapsed(),
            range_count: selection.range_count(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectionSynchronizer {
    /// Set while a programmatic selection update is in flight; released by a
    /// deferred task after the current turn so that the notifications the
    /// update itself triggers are still classified as self-inflicted.
    is_updating: bool,
    snapshot: NativeSnapshot,
}

impl SelectionSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_updating(&self) -> bool {
        self.is_updating
    }

    pub fn release_guard(&mut self) {
        self.is_updating = false;
    }

    /// Record a new raw observation. Returns whether anything actually
    /// changed since the last one.
    pub fn observe(&mut self, surface: &Surface) -> bool {
        let snapshot = NativeSnapshot::capture(surface.selection());
        if snapshot == self.snapshot {
            return false;
        }
        self.snapshot = snapshot;
        true
    }

    /// Model → surface. Applies the model's selection to the surface's
    /// native selection. Never partially applied: if either endpoint fails to
    /// resolve the surface is left untouched. Returns whether the surface was
    /// mutated; `false` means the native range already matched.
    pub fn push(
        &mut self,
        doc: &dyn DocumentModel,
        index: &SurfaceIndex,
        surface: &mut Surface,
    ) -> Result<bool, SyncError> {
        let Some(model_selection) = doc.selection() else {
            // Unset model selection: drop whatever range the surface holds.
            if surface.selection().range_count() > 0 {
                surface.remove_all_ranges();
                self.snapshot = NativeSnapshot::capture(surface.selection());
                self.is_updating = true;
                return Ok(true);
            }
            return Ok(false);
        };

        let anchor = mapper::surface_point_for_position(index, surface, &model_selection.anchor)
            .ok_or(SyncError::mapping(
                "selection anchor",
                Some(model_selection.anchor.key),
            ))?;
        let focus = if model_selection.is_collapsed() {
            anchor
        } else {
            mapper::surface_point_for_position(index, surface, &model_selection.focus).ok_or(
                SyncError::mapping("selection focus", Some(model_selection.focus.key)),
            )?
        };

        // Native ranges have no inherent orientation, so equality holds in
        // either one.
        let current = surface.selection();
        if ranges_equal(current.anchor, current.focus, Some(anchor), Some(focus)) {
            return Ok(false);
        }

        surface.remove_all_ranges();
        // Applying anchor-then-focus preserves the model's backwardness as
        // base/extent order.
        surface.set_base_and_extent(anchor, focus);
        self.snapshot = NativeSnapshot::capture(surface.selection());
        self.is_updating = true;
        Ok(true)
    }

    /// Surface → model. Resolves the native selection and commits it to the
    /// model. On any resolution failure the model selection is left
    /// completely unchanged. Returns whether the model changed.
    pub fn pull(
        &mut self,
        doc: &mut dyn DocumentModel,
        surface: &Surface,
    ) -> Result<bool, SyncError> {
        let native = surface.selection();
        let (Some(raw_anchor), Some(raw_focus)) = (native.anchor, native.focus) else {
            // Natively blurred; not our call to change the model.
            return Ok(false);
        };

        let anchor =
            mapper::position_at_surface_point(doc, surface, raw_anchor.node, raw_anchor.offset)
                .ok_or(SyncError::mapping("selection anchor", None))?;
        let focus = if raw_focus == raw_anchor {
            anchor.clone()
        } else {
            mapper::position_at_surface_point(doc, surface, raw_focus.node, raw_focus.offset)
                .ok_or(SyncError::mapping("selection focus", None))?
        };

        let next = Selection::new(anchor, focus);
        if doc.selection().as_ref() == Some(&next) {
            return Ok(false);
        }

        // `set_selection` clears focus-mark state: marks cannot be inferred
        // from a native-origin selection change.
        doc.set_selection(next);
        Ok(true)
    }
}

fn ranges_equal(
    a_anchor: Option<RawPoint>,
    a_focus: Option<RawPoint>,
    b_anchor: Option<RawPoint>,
    b_focus: Option<RawPoint>,
) -> bool {
    (a_anchor == b_anchor && a_focus == b_focus) || (a_anchor == b_focus && a_focus == b_anchor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_equality_ignores_orientation() {
        let a = Some(RawPoint::new(1, 0));
        let b = Some(RawPoint::new(2, 3));
        assert!(ranges_equal(a, b, a, b));
        assert!(ranges_equal(a, b, b, a));
        assert!(!ranges_equal(a, b, a, Some(RawPoint::new(2, 4))));
    }

    #[test]
    fn observe_filters_unchanged_selections() {
        let mut surface = Surface::new();
        let text = surface.create_text("hi");
        let mut sync = SelectionSynchronizer::new();

        // Initial snapshot is the empty selection.
        assert!(!sync.observe(&surface));

        surface.collapse(text, 1);
        assert!(sync.observe(&surface));
        assert!(!sync.observe(&surface));

        surface.collapse(text, 2);
        assert!(sync.observe(&surface));
    }
}
