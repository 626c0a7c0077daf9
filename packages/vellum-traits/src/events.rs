use smol_str::SmolStr;

/// Identifier of a node in the editing surface's arena.
pub type SurfaceNodeId = usize;

/// A raw point in the surface: a node plus a character offset within it.
///
/// When `node` is an element, `offset` addresses its children by index rather
/// than characters; the coordinate mapper normalizes such points down to a
/// concrete text node before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPoint {
    pub node: SurfaceNodeId,
    pub offset: usize,
}

impl RawPoint {
    pub fn new(node: SurfaceNodeId, offset: usize) -> Self {
        RawPoint { node, offset }
    }
}

/// The surface range a `beforeinput` notification is about to affect, as
/// reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRange {
    pub start: RawPoint,
    pub end: RawPoint,
}

/// A normalized platform notification.
///
/// Platform-specific quirks (synthetic vs. native events, vendor-prefixed
/// kinds, string-typed event names) are resolved by the embedder before a
/// notification is constructed; the engine only ever sees this enum and
/// matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The surface's native selection changed.
    SelectionChange,
    /// The platform is about to edit the surface.
    BeforeInput(BeforeInputEvent),
    /// The platform has edited the surface.
    Input(InputEvent),
    /// The platform opened a multi-keystroke input session (e.g. IME).
    CompositionStart,
    /// The in-progress session updated its preedit text.
    CompositionUpdate(Option<SmolStr>),
    /// The session ended, committing `Some(text)` or aborting with `None`.
    CompositionEnd(Option<SmolStr>),
    /// A mutation observer reported out-of-band changes to surface nodes.
    MutationObserved(MutationRecord),
}

impl Notification {
    /// The platform-facing name of the notification kind.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::SelectionChange => "selectionchange",
            Notification::BeforeInput(_) => "beforeinput",
            Notification::Input(_) => "input",
            Notification::CompositionStart => "compositionstart",
            Notification::CompositionUpdate(_) => "compositionupdate",
            Notification::CompositionEnd(_) => "compositionend",
            Notification::MutationObserved(_) => "mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeforeInputEvent {
    pub input_type: InputType,
    /// Text payload for the insert-text family of input types.
    pub text: Option<SmolStr>,
    /// The range the edit will affect, when the platform reports one.
    pub target_range: Option<TargetRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// The surface node the platform edited, when known. Absent for edits
    /// only discoverable through the current selection.
    pub target: Option<SurfaceNodeId>,
}

/// Out-of-band surface mutations, batched the way mutation observers deliver
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub nodes: Vec<SurfaceNodeId>,
}

/// The edit intent carried by a `beforeinput` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    InsertText,
    InsertReplacementText,
    InsertFromYank,
    InsertLineBreak,
    InsertParagraph,
    DeleteContent,
    DeleteContentBackward,
    DeleteContentForward,
    DeleteByCut,
    DeleteByDrag,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteSoftLineBackward,
    DeleteSoftLineForward,
    DeleteHardLineBackward,
    DeleteHardLineForward,
}

impl InputType {
    /// Input types that insert plain text at the target range.
    pub fn inserts_text(self) -> bool {
        matches!(
            self,
            InputType::InsertText | InputType::InsertReplacementText | InputType::InsertFromYank
        )
    }

    /// Input types that delete the target range (or a unit relative to it).
    pub fn deletes(self) -> bool {
        matches!(
            self,
            InputType::DeleteContent
                | InputType::DeleteContentBackward
                | InputType::DeleteContentForward
                | InputType::DeleteByCut
                | InputType::DeleteByDrag
                | InputType::DeleteWordBackward
                | InputType::DeleteWordForward
                | InputType::DeleteSoftLineBackward
                | InputType::DeleteSoftLineForward
                | InputType::DeleteHardLineBackward
                | InputType::DeleteHardLineForward
        )
    }

    /// Input types that introduce a block boundary. These are structural
    /// edits the engine classifies but leaves to the host's command layer.
    pub fn splits_block(self) -> bool {
        matches!(self, InputType::InsertLineBreak | InputType::InsertParagraph)
    }

    /// The DOM `inputType` string this variant was normalized from.
    pub fn name(self) -> &'static str {
        match self {
            InputType::InsertText => "insertText",
            InputType::InsertReplacementText => "insertReplacementText",
            InputType::InsertFromYank => "insertFromYank",
            InputType::InsertLineBreak => "insertLineBreak",
            InputType::InsertParagraph => "insertParagraph",
            InputType::DeleteContent => "deleteContent",
            InputType::DeleteContentBackward => "deleteContentBackward",
            InputType::DeleteContentForward => "deleteContentForward",
            InputType::DeleteByCut => "deleteByCut",
            InputType::DeleteByDrag => "deleteByDrag",
            InputType::DeleteWordBackward => "deleteWordBackward",
            InputType::DeleteWordForward => "deleteWordForward",
            InputType::DeleteSoftLineBackward => "deleteSoftLineBackward",
            InputType::DeleteSoftLineForward => "deleteSoftLineForward",
            InputType::DeleteHardLineBackward => "deleteHardLineBackward",
            InputType::DeleteHardLineForward => "deleteHardLineForward",
        }
    }
}
