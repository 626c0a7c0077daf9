//! Engine-owned synchronization state.
//!
//! Everything the original kept in ambient mutable flags lives here as plain
//! fields with a per-turn lifecycle, threaded explicitly through dispatch.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use vellum_traits::{DiagnosticsProvider, Key};

use crate::composition::CompositionMachine;
use crate::index::SurfaceIndex;
use crate::selection::SelectionSynchronizer;

/// A continuation scheduled to run after the current event-processing turn,
/// once the host drains the queue via `flush_turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Release the `is_updating` selection guard. Deferred so that the
    /// selection-change our own update triggers is still suppressed when it
    /// re-enters the engine.
    ReleaseSelectionGuard,
    /// Pull the native selection into the model. Deferred to debounce the
    /// highest-frequency native notifications; the pull reads live state, so
    /// the final observation always wins.
    PullSelection,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: VecDeque<Deferred>,
}

impl DeferredQueue {
    pub fn schedule(&mut self, task: Deferred) {
        // One pending pull at a time is enough; that is the debounce.
        if task == Deferred::PullSelection && self.tasks.contains(&task) {
            return;
        }
        self.tasks.push_back(task);
    }

    pub fn take(&mut self) -> VecDeque<Deferred> {
        std::mem::take(&mut self.tasks)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// The mutable state behind a [`SyncEngine`](crate::engine::SyncEngine),
/// shared with stages during dispatch.
pub struct SyncState {
    pub index: SurfaceIndex,
    pub composition: CompositionMachine,
    pub selection: SelectionSynchronizer,
    /// Leaves whose rendered text may have changed under the model since the
    /// last sync point. Drained by the reconcile stage; only a live
    /// composition keeps entries parked here across notifications.
    pub dirty: FxHashSet<Key>,
    pub deferred: DeferredQueue,
    /// Whether a genuine user action happened since the host last cleared
    /// this. Hosts use it to gate scroll-into-view and similar follow-ups.
    pub user_action: bool,
    pub debounce_selection: bool,
    pub diagnostics: Arc<dyn DiagnosticsProvider>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_pulls_are_debounced() {
        let mut queue = DeferredQueue::default();
        queue.schedule(Deferred::PullSelection);
        queue.schedule(Deferred::ReleaseSelectionGuard);
        queue.schedule(Deferred::PullSelection);
        queue.schedule(Deferred::PullSelection);

        let tasks: Vec<_> = queue.take().into_iter().collect();
        assert_eq!(
            tasks,
            vec![Deferred::PullSelection, Deferred::ReleaseSelectionGuard]
        );
        assert!(queue.is_empty());
    }
}
