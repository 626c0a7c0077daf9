use std::sync::Arc;

use vellum_traits::DiagnosticsProvider;

/// Options used when constructing a [`SyncEngine`](crate::engine::SyncEngine).
pub struct SyncConfig {
    /// Receiver for recovery and divergence reports
    pub diagnostics: Option<Arc<dyn DiagnosticsProvider>>,
    /// Debounce native selection-change notifications through the deferred
    /// queue (the default). Disable to pull selection synchronously, e.g. in
    /// hosts that already throttle the notification source.
    pub debounce_selection: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            diagnostics: None,
            debounce_selection: true,
        }
    }
}
