use crate::document::Key;
use crate::events::SurfaceNodeId;

/// Which divergence-recovery policy was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// The enclosing block was rebuilt from the surface's observed text.
    RebuildFromSurface,
    /// The enclosing block was rebuilt from the model's own serialized state.
    RebuildFromModel,
}

/// Receiver for recovery and unexpected-divergence reports.
///
/// Reports carry enough context to log but never alter control flow; every
/// method has a no-op default so embedders implement only what they care
/// about.
pub trait DiagnosticsProvider {
    /// The platform terminated a composition session without notice.
    fn composition_aborted(&self, anchor: Option<SurfaceNodeId>) {
        let _ = anchor;
    }

    /// A position or path could not be resolved against the live surface.
    fn mapping_failed(&self, key: Option<Key>, operation: &'static str) {
        let _ = (key, operation);
    }

    /// Divergence recovery replaced the block identified by `block`.
    fn recovery_applied(&self, block: Key, policy: RecoveryPolicy) {
        let _ = (block, policy);
    }

    /// Even block-level replacement could not be resolved; the editor is left
    /// in a best-effort state.
    fn recovery_failed(&self, block: Option<Key>) {
        let _ = block;
    }
}

pub struct NoopDiagnostics;
impl DiagnosticsProvider for NoopDiagnostics {}
