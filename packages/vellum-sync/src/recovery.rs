//! Divergence recovery: last-resort repair when the surface and the model
//! have drifted past what incremental diffing can fix.
//!
//! Recovery replaces the smallest enclosing structural unit (the block) and
//! never fails outward: whatever happens here is reported on the diagnostics
//! channel and swallowed, trading short-term structural accuracy for an
//! editor that keeps accepting input.

use vellum_traits::{
    DiagnosticsProvider, DocumentModel, Key, Position, RecoveryPolicy, Selection,
};

use crate::index::SurfaceIndex;
use crate::mapper::contains_node;
use crate::surface::Surface;
use crate::util::{char_len, strip_placeholders};

/// Replace the block enclosing `key`. Returns whether the model changed.
///
/// Preferred policy: when the damage is scoped to the single,
/// currently-selected, non-atomic leaf and the block renders exactly one
/// child holding the caret, the block is rebuilt *from the surface's observed
/// text* and the caret is re-resolved at its previously-observed offset, so
/// the user keeps what they typed. Otherwise the block is rebuilt from the
/// model's own last-known-good state and the unreconciled surface content is
/// discarded.
pub fn recover(
    doc: &mut dyn DocumentModel,
    index: &SurfaceIndex,
    surface: &Surface,
    diagnostics: &dyn DiagnosticsProvider,
    key: Option<Key>,
) -> bool {
    let Some(key) = key else {
        diagnostics.recovery_failed(None);
        return false;
    };
    let Some(block) = doc.closest_block(key) else {
        diagnostics.recovery_failed(None);
        return false;
    };

    if let Some((block_el, caret_offset)) = surface_scoped_divergence(doc, index, surface, key, block)
    {
        let mut observed = strip_placeholders(&surface.text_content(block_el));
        if observed.ends_with('\n') {
            observed.pop();
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(?block, "rebuilding block from observed surface text");

        match doc.replace_block_with_text(block, &observed) {
            Ok(new_leaf) => {
                diagnostics.recovery_applied(block, RecoveryPolicy::RebuildFromSurface);
                restore_caret(doc, new_leaf, caret_offset);
                return true;
            }
            Err(_) => {
                diagnostics.recovery_failed(Some(block));
                return false;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(?block, "rebuilding block from the model, discarding surface content");

    match doc.rebuild_block(block) {
        Ok(()) => {
            diagnostics.recovery_applied(block, RecoveryPolicy::RebuildFromModel);
            true
        }
        Err(_) => {
            // Even block-level replacement failed; swallowed after the report.
            diagnostics.recovery_failed(Some(block));
            false
        }
    }
}

/// Check the preconditions for rebuilding from the surface: a collapsed
/// selection on the diverged leaf itself, a non-atomic leaf, and a block
/// element rendering exactly one child that holds the native caret. Returns
/// the block element and the previously-observed caret offset.
fn surface_scoped_divergence(
    doc: &dyn DocumentModel,
    index: &SurfaceIndex,
    surface: &Surface,
    key: Key,
    block: Key,
) -> Option<(usize, usize)> {
    let selection = doc.selection()?;
    if !selection.is_collapsed() || selection.anchor.key != key || doc.is_atomic(key) {
        return None;
    }

    let block_el = index.node_for_key(surface, block)?;
    let block_node = surface.get(block_el)?;
    let [only_child] = block_node.children[..] else {
        return None;
    };

    let native_anchor = surface.selection().anchor?;
    let anchor_held = native_anchor.node == block_el
        || contains_node(surface, only_child, native_anchor.node);
    if !anchor_held {
        return None;
    }

    Some((block_el, native_anchor.offset))
}

fn restore_caret(doc: &mut dyn DocumentModel, leaf: Key, observed_offset: usize) {
    let Some(path) = doc.path_of(leaf) else {
        return;
    };
    let len = doc.leaf_text(leaf).map(char_len).unwrap_or(0);
    let offset = observed_offset.min(len);
    doc.set_selection(Selection::collapsed(Position::new(path, leaf, offset)));
}
