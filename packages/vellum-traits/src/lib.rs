//! Shared types and collaborator contracts for Vellum.
//!
//! This crate defines the seam between the synchronization engine
//! ([vellum-sync](https://docs.rs/vellum-sync)) and its external collaborators:
//! the structured document model, the renderer that mounts document nodes into
//! the editing surface, and the host's event dispatcher.

mod document;
pub use document::{DocumentModel, Key, ModelError, Path, Position, Selection};

mod events;
pub use events::{
    BeforeInputEvent, InputEvent, InputType, MutationRecord, Notification, RawPoint,
    SurfaceNodeId, TargetRange,
};

mod diagnostics;
pub use diagnostics::{DiagnosticsProvider, NoopDiagnostics, RecoveryPolicy};
