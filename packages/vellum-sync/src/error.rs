use thiserror::Error;
use vellum_traits::{Key, ModelError};

/// Failures a synchronization attempt can hit.
///
/// `Mapping` is an expected, recoverable miss: it aborts only the current
/// attempt. `Divergence` means incremental diffing cannot repair the leaf and
/// hands control to divergence recovery. Model rejections are folded into the
/// same recovery path; composition aborts are state transitions, not errors,
/// and have no variant here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("could not map {operation} against the live surface")]
    Mapping {
        operation: &'static str,
        key: Option<Key>,
    },
    #[error("surface and model text for {key:?} cannot be reconciled incrementally")]
    Divergence { key: Key },
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl SyncError {
    pub fn mapping(operation: &'static str, key: Option<Key>) -> Self {
        SyncError::Mapping { operation, key }
    }

    /// The document key the failure is scoped to, when one is known.
    pub fn key(&self) -> Option<Key> {
        match self {
            SyncError::Mapping { key, .. } => *key,
            SyncError::Divergence { key } => Some(*key),
            SyncError::Model(ModelError::UnknownKey(key)) => Some(*key),
            SyncError::Model(_) => None,
        }
    }
}
