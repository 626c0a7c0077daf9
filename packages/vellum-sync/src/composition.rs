//! The composition state machine.
//!
//! While the platform owns a multi-keystroke input session (IME, dead keys,
//! some autocorrect flows), mutating the surface's text nodes aborts the
//! session out from under the user. The machine tracks whether a session is
//! live so the rest of the engine can defer structured synchronization until
//! it ends.
//!
//! The platform does not always say when it gives up: a re-render that tears
//! down the anchored node silently cancels the session with no
//! composition-end notification. Every `is_composing` check therefore
//! re-validates the anchor against the live tree and treats its absence as an
//! abort (a transition, not an error).

use vellum_traits::{DiagnosticsProvider, SurfaceNodeId};

use crate::surface::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionState {
    #[default]
    Idle,
    Composing {
        /// The surface node selected when the session (last) touched the
        /// surface. `None` when the platform started composing without a
        /// selection; treated as already aborted on the next check.
        anchor: Option<SurfaceNodeId>,
    },
}

#[derive(Debug, Default)]
pub struct CompositionMachine {
    state: CompositionState,
}

impl CompositionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CompositionState {
        self.state
    }

    /// Composition-start: record the currently-selected surface node as the
    /// session anchor.
    pub fn start(&mut self, anchor: Option<SurfaceNodeId>) {
        self.state = CompositionState::Composing { anchor };
    }

    /// Composition-update: the platform may move focus within the same
    /// session, so re-record the anchor.
    pub fn update(&mut self, anchor: Option<SurfaceNodeId>) {
        self.state = CompositionState::Composing { anchor };
    }

    /// Composition-end. Returns whether a session was actually live, i.e.
    /// whether deferred edits now need one reconciliation pass.
    pub fn end(&mut self) -> bool {
        let was_composing = matches!(self.state, CompositionState::Composing { .. });
        self.state = CompositionState::Idle;
        was_composing
    }

    /// Whether a session is live, re-validating the anchor against the
    /// surface. An anchor that is gone means the platform cancelled the
    /// session without notice; the machine reverts to `Idle` and reports the
    /// abort.
    pub fn is_composing(
        &mut self,
        surface: &Surface,
        diagnostics: &dyn DiagnosticsProvider,
    ) -> bool {
        let CompositionState::Composing { anchor } = self.state else {
            return false;
        };

        let anchor_live = anchor.is_some_and(|anchor| surface.is_attached(anchor));
        if !anchor_live {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                ?anchor,
                "aborting composition: anchored node is no longer in the surface"
            );
            diagnostics.composition_aborted(anchor);
            self.state = CompositionState::Idle;
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ElementData;
    use vellum_traits::{Key, NoopDiagnostics};

    #[test]
    fn update_re_records_the_anchor() {
        let mut surface = Surface::new();
        let root = surface.create_element(ElementData::root());
        surface.set_root(root);
        let a = surface.create_text("a");
        let b = surface.create_text("b");
        surface.append(root, a);
        surface.append(root, b);

        let mut machine = CompositionMachine::new();
        machine.start(Some(a));
        machine.update(Some(b));
        assert_eq!(
            machine.state(),
            CompositionState::Composing { anchor: Some(b) }
        );
        assert!(machine.is_composing(&surface, &NoopDiagnostics));
    }

    #[test]
    fn unmounted_anchor_aborts_silently() {
        let mut surface = Surface::new();
        let root = surface.create_element(ElementData::root());
        surface.set_root(root);
        let leaf = surface.create_element(ElementData::leaf(Key(1)));
        let text = surface.create_text("\u{FEFF}");
        surface.append(leaf, text);
        surface.append(root, leaf);

        let mut machine = CompositionMachine::new();
        machine.start(Some(text));
        assert!(machine.is_composing(&surface, &NoopDiagnostics));

        // An unrelated structural edit tears the anchored node down.
        surface.remove_node(leaf);
        assert!(!machine.is_composing(&surface, &NoopDiagnostics));
        assert_eq!(machine.state(), CompositionState::Idle);
    }

    #[test]
    fn missing_anchor_counts_as_aborted() {
        let surface = Surface::new();
        let mut machine = CompositionMachine::new();
        machine.start(None);
        assert!(!machine.is_composing(&surface, &NoopDiagnostics));
    }

    #[test]
    fn end_reports_whether_a_session_was_live() {
        let mut machine = CompositionMachine::new();
        assert!(!machine.end());
        machine.start(Some(3));
        assert!(machine.end());
        assert_eq!(machine.state(), CompositionState::Idle);
    }
}
