//! Bidirectional synchronization between a structured document model and a
//! live, host-mutable editing surface.
//!
//! The surface can be edited out-of-band by native input behaviors (IME
//! composition, spell-check, autocomplete, platform undo) and this crate
//! keeps the document model consistent with it without ever interrupting
//! those behaviors while they are in progress. The document model itself is
//! external: it is consumed through the narrow
//! [`DocumentModel`](vellum_traits::DocumentModel) contract from
//! [vellum-traits](https://docs.rs/vellum-traits), and the engine only ever
//! *requests* mutations.
//!
//! The pieces:
//!
//! - [`Surface`]: the arena-backed editable tree, with its native selection.
//! - [`SurfaceIndex`]: which surface element renders which document key,
//!   maintained from the renderer's mount/unmount notifications.
//! - [`mapper`]: document position ↔ surface point translation.
//! - [`diff_leaf`]: minimal per-leaf text diffing (insertion fast path,
//!   full-range replace fallback).
//! - [`CompositionMachine`]: defers structured sync while the platform owns
//!   an input session.
//! - [`SelectionSynchronizer`]: loop-suppressed two-way selection sync.
//! - [`SyncEngine`]: the facade that ties it together behind one synchronous
//!   procedure per notification kind.

/// The engine facade.
mod engine;

/// The editable surface tree.
pub mod surface;

mod composition;
mod config;
mod context;
mod diff;
mod error;
mod events;
mod index;
/// Coordinate mapping between document positions and surface points.
pub mod mapper;
mod recovery;
mod selection;
mod traversal;
mod util;

pub use composition::{CompositionMachine, CompositionState};
pub use config::SyncConfig;
pub use context::{Deferred, DeferredQueue, SyncState};
pub use diff::{LeafEdit, diff_leaf};
pub use engine::SyncEngine;
pub use error::SyncError;
pub use events::{GateStage, Next, NoopStage, Outcome, ReconcileStage, StageContext, SyncStage};
pub use index::SurfaceIndex;
pub use selection::{NativeSnapshot, SelectionSynchronizer};
pub use surface::{
    ElementData, ElementKind, NativeSelection, PLACEHOLDER, Sentinel, Surface, SurfaceNode,
    SurfaceNodeData, TextData,
};
pub use traversal::{AncestorTraverser, TreeTraverser};
pub use vellum_traits::{
    BeforeInputEvent, DiagnosticsProvider, DocumentModel, InputEvent, InputType, Key, ModelError,
    MutationRecord, NoopDiagnostics, Notification, Path, Position, RawPoint, RecoveryPolicy,
    Selection, SurfaceNodeId, TargetRange,
};
