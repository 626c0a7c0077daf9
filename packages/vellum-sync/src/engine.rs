//! The engine facade: one synchronous entry point per notification kind,
//! mount/unmount bookkeeping, and the end-of-turn flush.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use vellum_traits::{DocumentModel, Key, NoopDiagnostics, Notification, SurfaceNodeId};

use crate::composition::CompositionMachine;
use crate::config::SyncConfig;
use crate::context::{Deferred, DeferredQueue, SyncState};
use crate::events::{GateStage, Next, ReconcileStage, StageContext, SyncStage};
use crate::index::SurfaceIndex;
use crate::selection::SelectionSynchronizer;
use crate::surface::Surface;

/// Keeps a structured document and a host-mutable editing surface in
/// agreement.
///
/// The engine is single-threaded and event-driven: the host forwards every
/// platform notification through [`dispatch`](SyncEngine::dispatch) in
/// arrival order, calls [`flush_turn`](SyncEngine::flush_turn) when the
/// current event-processing turn ends, and
/// [`apply_model_selection`](SyncEngine::apply_model_selection) after each
/// render. The document model and the surface are passed in per call: the
/// engine owns neither, only the synchronization state between them.
pub struct SyncEngine {
    stages: Vec<Box<dyn SyncStage>>,
    state: SyncState,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        let diagnostics = config
            .diagnostics
            .unwrap_or_else(|| Arc::new(NoopDiagnostics));

        SyncEngine {
            stages: vec![Box::new(GateStage), Box::new(ReconcileStage)],
            state: SyncState {
                index: SurfaceIndex::new(),
                composition: CompositionMachine::new(),
                selection: SelectionSynchronizer::new(),
                dirty: FxHashSet::default(),
                deferred: DeferredQueue::default(),
                user_action: false,
                debounce_selection: config.debounce_selection,
                diagnostics,
            },
        }
    }

    /// Insert a host stage into the chain, between the built-in gate and
    /// reconcile stages. Stages run in insertion order.
    pub fn insert_stage(&mut self, stage: Box<dyn SyncStage>) {
        let at = self.stages.len().saturating_sub(1);
        self.stages.insert(at, stage);
    }

    /// Process one platform notification. Returns whether the structured
    /// model was changed, so the host can decide whether to re-render.
    pub fn dispatch(
        &mut self,
        doc: &mut dyn DocumentModel,
        surface: &mut Surface,
        event: Notification,
    ) -> bool {
        let mut stages = std::mem::take(&mut self.stages);
        let outcome = Next::new(&mut stages).run(
            &mut StageContext {
                doc,
                surface,
                state: &mut self.state,
            },
            &event,
        );
        self.stages = stages;
        outcome.model_changed
    }

    /// Run the continuations deferred during this turn: selection guard
    /// release and the debounced selection pull. Returns whether the model
    /// changed.
    pub fn flush_turn(&mut self, doc: &mut dyn DocumentModel, surface: &mut Surface) -> bool {
        let diagnostics = self.state.diagnostics.clone();
        let mut changed = false;

        for task in self.state.deferred.take() {
            match task {
                Deferred::ReleaseSelectionGuard => self.state.selection.release_guard(),
                Deferred::PullSelection => {
                    // A live composition owns the caret; the composition-end
                    // pass reconciles selection along with the text.
                    if self.state.composition.is_composing(surface, &*diagnostics) {
                        continue;
                    }
                    match self.state.selection.pull(doc, surface) {
                        Ok(did_change) => changed |= did_change,
                        Err(err) => diagnostics.mapping_failed(err.key(), "selection pull"),
                    }
                }
            }
        }

        changed
    }

    /// Push the model's selection out to the surface's native selection,
    /// typically after a render. No-op when they already agree; mapping
    /// failures are reported and leave the surface untouched. Returns whether
    /// the surface was mutated.
    pub fn apply_model_selection(
        &mut self,
        doc: &mut dyn DocumentModel,
        surface: &mut Surface,
    ) -> bool {
        match self.state.selection.push(doc, &self.state.index, surface) {
            Ok(applied) => {
                if applied {
                    self.state
                        .deferred
                        .schedule(Deferred::ReleaseSelectionGuard);
                }
                applied
            }
            Err(err) => {
                self.state
                    .diagnostics
                    .mapping_failed(err.key(), "selection push");
                false
            }
        }
    }

    /// Renderer notification: `node` now renders the document node `key`.
    pub fn note_mounted(&mut self, key: Key, node: SurfaceNodeId) {
        self.state.index.note_mounted(key, node);
    }

    /// Renderer notification: the element rendering `key` was torn down.
    pub fn note_unmounted(&mut self, key: Key) {
        self.state.index.note_unmounted(key);
    }

    /// Whether the platform currently owns an input session (with the
    /// implicit-abort check applied).
    pub fn is_composing(&mut self, surface: &Surface) -> bool {
        let diagnostics = self.state.diagnostics.clone();
        self.state.composition.is_composing(surface, &*diagnostics)
    }

    /// Whether a genuine user action occurred since the last
    /// [`clear_user_action`](SyncEngine::clear_user_action).
    pub fn user_action_performed(&self) -> bool {
        self.state.user_action
    }

    pub fn clear_user_action(&mut self) {
        self.state.user_action = false;
    }

    /// Whether deferred continuations are waiting on
    /// [`flush_turn`](SyncEngine::flush_turn).
    pub fn has_deferred_work(&self) -> bool {
        !self.state.deferred.is_empty()
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Escape hatch for embedders with needs the methods above don't cover.
    /// Prefer exposing additional functionality on `SyncEngine` instead.
    pub fn state_mut(&mut self) -> &mut SyncState {
        &mut self.state
    }
}
