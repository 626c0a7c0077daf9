//! Notification handling: the built-in stage chain.
//!
//! Control flow per notification: gate stage (guards, snapshot dedupe,
//! composition bookkeeping, dirty recording) → any host stages → reconcile
//! stage (intent application, dirty drain → diff → model mutation → selection
//! pull, recovery on failure).

mod driver;

pub use driver::{Next, NoopStage, Outcome, StageContext, SyncStage};

use vellum_traits::{BeforeInputEvent, Key, Notification, Position, Selection, SurfaceNodeId};

use crate::context::Deferred;
use crate::diff::{LeafEdit, diff_leaf};
use crate::error::SyncError;
use crate::mapper;
use crate::recovery;

/// The first stage of every chain. Decides whether a notification is worth
/// acting on at all: self-inflicted selection changes, observations that
/// changed nothing, and edits the platform still owns (live composition) stop
/// here. Edits are recorded as dirty leaves either way so nothing is lost.
pub struct GateStage;

impl SyncStage for GateStage {
    fn on_notification(
        &mut self,
        cx: &mut StageContext<'_>,
        event: &Notification,
        next: Next<'_>,
    ) -> Outcome {
        let diagnostics = cx.state.diagnostics.clone();

        match event {
            Notification::SelectionChange => {
                // Triggered by our own programmatic update: self-inflicted.
                if cx.state.selection.is_updating() {
                    return Outcome::default();
                }
                if cx.state.composition.is_composing(cx.surface, &*diagnostics) {
                    return Outcome::default();
                }
                if !cx.state.selection.observe(cx.surface) {
                    return Outcome::default();
                }
                cx.state.user_action = true;

                if cx.state.debounce_selection {
                    cx.state.deferred.schedule(Deferred::PullSelection);
                    next.run(cx, event)
                } else {
                    let pulled = match cx.state.selection.pull(cx.doc, cx.surface) {
                        Ok(changed) => changed,
                        Err(err) => {
                            diagnostics.mapping_failed(err.key(), "selection pull");
                            false
                        }
                    };
                    Outcome::changed(pulled).merge(next.run(cx, event))
                }
            }

            Notification::CompositionStart => {
                cx.state.user_action = true;
                let anchor = cx.surface.selection().anchor.map(|point| point.node);
                cx.state.composition.start(anchor);

                // An expanded selection loses its wrapping spans on the first
                // composition keystroke; collapse it before that can happen.
                let mut changed = false;
                if let Some(selection) = cx.doc.selection() {
                    if !selection.is_collapsed() {
                        match cx.doc.delete_at(&selection) {
                            Ok(()) => changed = true,
                            Err(_) => diagnostics
                                .mapping_failed(Some(selection.anchor.key), "composition delete"),
                        }
                    }
                }
                Outcome::changed(changed).merge(next.run(cx, event))
            }

            Notification::CompositionUpdate(_) => {
                let anchor = cx.surface.selection().anchor.map(|point| point.node);
                cx.state.composition.update(anchor);
                record_dirty_at_selection(cx);
                // The platform owns the text until composition-end.
                Outcome::default()
            }

            Notification::CompositionEnd(_) => {
                cx.state.user_action = true;
                record_dirty_at_selection(cx);
                cx.state.composition.end();
                next.run(cx, event)
            }

            Notification::Input(input) => {
                match input.target {
                    Some(target) => record_dirty(cx, target),
                    None => record_dirty_at_selection(cx),
                }
                if cx.state.composition.is_composing(cx.surface, &*diagnostics) {
                    // Deliberately unsynchronized; reconciled when the
                    // session ends.
                    return Outcome::default();
                }
                cx.state.user_action = true;
                next.run(cx, event)
            }

            Notification::BeforeInput(_) => {
                if cx.state.composition.is_composing(cx.surface, &*diagnostics) {
                    return Outcome::default();
                }
                cx.state.user_action = true;
                next.run(cx, event)
            }

            Notification::MutationObserved(record) => {
                for node in &record.nodes {
                    record_dirty(cx, *node);
                }
                if cx.state.composition.is_composing(cx.surface, &*diagnostics) {
                    return Outcome::default();
                }
                next.run(cx, event)
            }
        }
    }
}

/// The last stage of every chain: applies before-input intents to the model
/// and runs the synchronization pass for edits the platform already made.
pub struct ReconcileStage;

impl SyncStage for ReconcileStage {
    fn on_notification(
        &mut self,
        cx: &mut StageContext<'_>,
        event: &Notification,
        next: Next<'_>,
    ) -> Outcome {
        let outcome = match event {
            Notification::BeforeInput(before_input) => apply_input_intent(cx, before_input),
            Notification::Input(_)
            | Notification::CompositionEnd(_)
            | Notification::MutationObserved(_) => run_sync_pass(cx),
            Notification::SelectionChange
            | Notification::CompositionStart
            | Notification::CompositionUpdate(_) => Outcome::default(),
        };
        outcome.merge(next.run(cx, event))
    }
}

fn record_dirty(cx: &mut StageContext<'_>, node: SurfaceNodeId) {
    if let Some(key) = cx.surface.enclosing_leaf_key(node) {
        cx.state.dirty.insert(key);
    }
}

fn record_dirty_at_selection(cx: &mut StageContext<'_>) {
    if let Some(anchor) = cx.surface.selection().anchor {
        record_dirty(cx, anchor.node);
    }
}

/// Drain the dirty set, folding each leaf's observed text back into the
/// model, then align the model selection with where the caret actually is.
/// Any failure hands the affected leaf to divergence recovery.
pub(crate) fn run_sync_pass(cx: &mut StageContext<'_>) -> Outcome {
    if cx.state.dirty.is_empty() {
        return Outcome::default();
    }
    let keys: Vec<Key> = cx.state.dirty.drain().collect();
    let diagnostics = cx.state.diagnostics.clone();

    let mut changed = false;
    for key in keys {
        match sync_leaf(cx, key) {
            Ok(did_change) => changed |= did_change,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%err, "leaf sync failed, entering recovery");
                changed |= recovery::recover(
                    cx.doc,
                    &cx.state.index,
                    cx.surface,
                    &*diagnostics,
                    err.key().or(Some(key)),
                );
            }
        }
    }

    match cx.state.selection.pull(cx.doc, cx.surface) {
        Ok(did_change) => changed |= did_change,
        Err(err) => {
            changed |= recovery::recover(
                cx.doc,
                &cx.state.index,
                cx.surface,
                &*diagnostics,
                err.key(),
            );
        }
    }

    Outcome::changed(changed)
}

fn sync_leaf(cx: &mut StageContext<'_>, key: Key) -> Result<bool, SyncError> {
    let leaf = cx
        .state
        .index
        .node_for_key(cx.surface, key)
        .ok_or(SyncError::Divergence { key })?;

    if cx.doc.is_atomic(key) {
        return Ok(false);
    }

    cx.surface.sanitize_sentinels(leaf);

    let mut observed = cx.surface.observed_leaf_text(leaf);
    if cx.doc.is_last_leaf_in_block(key) && observed.ends_with('\n') {
        // The renderer's trailing newline on a block's last leaf is not
        // document text.
        observed.pop();
    }

    let model = cx
        .doc
        .leaf_text(key)
        .ok_or(SyncError::Divergence { key })?
        .to_string();

    match diff_leaf(&observed, &model) {
        LeafEdit::Unchanged => Ok(false),
        LeafEdit::Insert { at, text } => {
            let path = cx.doc.path_of(key).ok_or(SyncError::Divergence { key })?;
            cx.doc.insert_text_at(&Position::new(path, key, at), &text)?;
            Ok(true)
        }
        LeafEdit::Replace { text } => {
            cx.doc.replace_leaf_text(key, &text)?;
            Ok(true)
        }
    }
}

/// Apply a before-input intent through the document model. Block-splitting
/// intents are left for the host's command layer; unmappable target ranges
/// are reported, never guessed at; the surface's own mutation will be picked
/// up by the next input pass instead.
fn apply_input_intent(cx: &mut StageContext<'_>, event: &BeforeInputEvent) -> Outcome {
    if event.input_type.splits_block() {
        return Outcome::default();
    }
    let diagnostics = cx.state.diagnostics.clone();

    let range = match event.target_range {
        Some(target) => {
            let anchor = mapper::position_at_surface_point(
                cx.doc,
                cx.surface,
                target.start.node,
                target.start.offset,
            );
            let focus = mapper::position_at_surface_point(
                cx.doc,
                cx.surface,
                target.end.node,
                target.end.offset,
            );
            match (anchor, focus) {
                (Some(anchor), Some(focus)) => Selection::new(anchor, focus),
                _ => {
                    diagnostics.mapping_failed(None, "beforeinput target range");
                    return Outcome::default();
                }
            }
        }
        None => match cx.doc.selection() {
            Some(selection) => selection,
            None => return Outcome::default(),
        },
    };

    if event.input_type.inserts_text() {
        let Some(text) = event.text.as_ref() else {
            return Outcome::default();
        };
        let mut changed = false;
        if !range.is_collapsed() {
            match cx.doc.delete_at(&range) {
                Ok(()) => changed = true,
                Err(_) => {
                    diagnostics.mapping_failed(Some(range.anchor.key), "insert-range delete");
                    return Outcome::changed(changed);
                }
            }
        }
        match cx.doc.insert_text_at(range.start(), text) {
            Ok(()) => changed = true,
            Err(_) => diagnostics.mapping_failed(Some(range.start().key), "text insert"),
        }
        Outcome::changed(changed)
    } else if event.input_type.deletes() {
        if range.is_collapsed() {
            // Unit deletes arrive with platform-expanded target ranges; a
            // collapsed range means there is nothing to delete.
            return Outcome::default();
        }
        match cx.doc.delete_at(&range) {
            Ok(()) => Outcome::changed(true),
            Err(_) => {
                diagnostics.mapping_failed(Some(range.anchor.key), "range delete");
                Outcome::default()
            }
        }
    } else {
        Outcome::default()
    }
}
