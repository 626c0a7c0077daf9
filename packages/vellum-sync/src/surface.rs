//! The editing surface: a host-mutable tree of element and text records.
//!
//! The surface is what the user and the platform input system edit directly.
//! It is owned by the embedder (the engine only reads it and adjusts its
//! native selection); nodes live in an arena and are addressed by id, so a
//! stale id is a lookup miss rather than a dangling reference.

use slab::Slab;
use vellum_traits::{Key, RawPoint, SurfaceNodeId};

use crate::traversal::{AncestorTraverser, TreeTraverser};
use crate::util::strip_placeholders;

/// The placeholder character sentinel runs render to force a non-empty text
/// node. Never part of the document's own text.
pub const PLACEHOLDER: char = '\u{FEFF}';

/// What a surface element renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// A structural container rendering a document block.
    Block,
    /// The container rendering a single document leaf's content.
    Leaf,
    /// A rendered text run inside a leaf; its text children carry the
    /// characters the user sees.
    Run,
    /// Decoration or other wrapper with no document identity.
    Wrapper,
}

/// The kind of sentinel a placeholder run stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    /// Forces an empty leaf to render a selectable text node.
    ZeroWidth,
    /// Stands in for a trailing line break.
    LineBreak,
}

#[derive(Debug, Clone)]
pub struct ElementData {
    pub kind: ElementKind,
    /// The document node this element renders, for `Block` and `Leaf`.
    pub key: Option<Key>,
    pub editable: bool,
    /// Rendered as a single unit with no separately addressable interior.
    pub atomic: bool,
    /// For runs: the logical length the run contributes to its leaf's text
    /// when that differs from the rendered length. Sentinel runs declare 0.
    pub declared_len: Option<usize>,
    pub sentinel: Option<Sentinel>,
}

impl ElementData {
    pub fn root() -> Self {
        ElementData {
            kind: ElementKind::Wrapper,
            key: None,
            editable: true,
            atomic: false,
            declared_len: None,
            sentinel: None,
        }
    }

    pub fn block(key: Key) -> Self {
        ElementData {
            kind: ElementKind::Block,
            key: Some(key),
            editable: true,
            atomic: false,
            declared_len: None,
            sentinel: None,
        }
    }

    pub fn leaf(key: Key) -> Self {
        ElementData {
            kind: ElementKind::Leaf,
            key: Some(key),
            editable: true,
            atomic: false,
            declared_len: None,
            sentinel: None,
        }
    }

    pub fn atomic_leaf(key: Key) -> Self {
        ElementData {
            kind: ElementKind::Leaf,
            key: Some(key),
            editable: false,
            atomic: true,
            declared_len: None,
            sentinel: None,
        }
    }

    pub fn run() -> Self {
        ElementData {
            kind: ElementKind::Run,
            key: None,
            editable: true,
            atomic: false,
            declared_len: None,
            sentinel: None,
        }
    }

    pub fn sentinel_run(sentinel: Sentinel) -> Self {
        ElementData {
            kind: ElementKind::Run,
            key: None,
            editable: true,
            atomic: false,
            declared_len: Some(0),
            sentinel: Some(sentinel),
        }
    }

    pub fn wrapper() -> Self {
        ElementData {
            kind: ElementKind::Wrapper,
            key: None,
            editable: true,
            atomic: false,
            declared_len: None,
            sentinel: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextData {
    pub content: String,
}

#[derive(Debug, Clone)]
pub enum SurfaceNodeData {
    Element(ElementData),
    Text(TextData),
}

#[derive(Debug, Clone)]
pub struct SurfaceNode {
    pub id: SurfaceNodeId,
    pub parent: Option<SurfaceNodeId>,
    pub children: Vec<SurfaceNodeId>,
    pub data: SurfaceNodeData,
}

impl SurfaceNode {
    pub fn is_element(&self) -> bool {
        matches!(self.data, SurfaceNodeData::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, SurfaceNodeData::Text(_))
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        match &self.data {
            SurfaceNodeData::Element(data) => Some(data),
            SurfaceNodeData::Text(_) => None,
        }
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            SurfaceNodeData::Element(data) => Some(data),
            SurfaceNodeData::Text(_) => None,
        }
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.data {
            SurfaceNodeData::Text(data) => Some(data),
            SurfaceNodeData::Element(_) => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.data {
            SurfaceNodeData::Text(data) => Some(data),
            SurfaceNodeData::Element(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ElementKind> {
        self.element_data().map(|el| el.kind)
    }

    pub fn is_sentinel_run(&self) -> bool {
        self.element_data().is_some_and(|el| el.sentinel.is_some())
    }
}

/// The native selection the platform maintains over the surface.
///
/// Unlike the document selection, native ranges have no inherent orientation;
/// anchor/focus here reflect how the last mutation was applied, and equality
/// checks elsewhere compare both orientations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeSelection {
    pub anchor: Option<RawPoint>,
    pub focus: Option<RawPoint>,
}

impl NativeSelection {
    pub fn range_count(&self) -> usize {
        usize::from(self.anchor.is_some() && self.focus.is_some())
    }

    pub fn is_collapsed(&self) -> bool {
        self.range_count() == 0 || self.anchor == self.focus
    }
}

pub struct Surface {
    nodes: Slab<SurfaceNode>,
    root: Option<SurfaceNodeId>,
    selection: NativeSelection,
    selection_ops: u64,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Surface {
            nodes: Slab::new(),
            root: None,
            selection: NativeSelection::default(),
            selection_ops: 0,
        }
    }

    pub fn root(&self) -> Option<SurfaceNodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: SurfaceNodeId) {
        debug_assert!(self.nodes.contains(id));
        self.root = Some(id);
    }

    pub fn get(&self, id: SurfaceNodeId) -> Option<&SurfaceNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: SurfaceNodeId) -> Option<&mut SurfaceNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: SurfaceNodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Whether `id` exists and is reachable from the current root.
    pub fn is_attached(&self, id: SurfaceNodeId) -> bool {
        if !self.nodes.contains(id) {
            return false;
        }
        let Some(root) = self.root else {
            return false;
        };
        id == root || AncestorTraverser::new(self, id).any(|ancestor| ancestor == root)
    }

    pub fn create_element(&mut self, data: ElementData) -> SurfaceNodeId {
        self.create_node(SurfaceNodeData::Element(data))
    }

    pub fn create_text(&mut self, content: &str) -> SurfaceNodeId {
        self.create_node(SurfaceNodeData::Text(TextData {
            content: content.to_string(),
        }))
    }

    fn create_node(&mut self, data: SurfaceNodeData) -> SurfaceNodeId {
        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(SurfaceNode {
            id,
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn append(&mut self, parent_id: SurfaceNodeId, child_id: SurfaceNodeId) {
        let old_parent = self.nodes[child_id].parent.replace(parent_id);
        if let Some(old_parent_id) = old_parent {
            self.nodes[old_parent_id]
                .children
                .retain(|id| *id != child_id);
        }
        self.nodes[parent_id].children.push(child_id);
    }

    /// Remove `id` and its whole subtree from the arena. Native selection
    /// endpoints inside the removed subtree are cleared, as the platform does.
    pub fn remove_node(&mut self, id: SurfaceNodeId) {
        if !self.nodes.contains(id) {
            return;
        }
        let subtree: Vec<SurfaceNodeId> = TreeTraverser::new_with_root(self, id).collect();

        let references_subtree = |point: Option<RawPoint>| {
            point.is_some_and(|point| subtree.contains(&point.node))
        };
        if references_subtree(self.selection.anchor) || references_subtree(self.selection.focus) {
            self.remove_all_ranges();
        }

        if let Some(parent_id) = self.nodes[id].parent {
            self.nodes[parent_id].children.retain(|child| *child != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }
        for node_id in subtree {
            self.nodes.remove(node_id);
        }
    }

    pub fn set_text(&mut self, id: SurfaceNodeId, value: &str) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let Some(text) = node.text_data_mut() else {
            return;
        };
        text.content.clear();
        text.content.push_str(value);
    }

    /// The raw concatenated text of every text descendant of `id`.
    pub fn text_content(&self, id: SurfaceNodeId) -> String {
        let mut out = String::new();
        for node_id in TreeTraverser::new_with_root(self, id) {
            if let Some(text) = self.nodes[node_id].text_data() {
                out.push_str(&text.content);
            }
        }
        out
    }

    /// The text a leaf visibly renders: sentinel-run subtrees are skipped and
    /// stray placeholder characters are stripped.
    pub fn observed_leaf_text(&self, leaf: SurfaceNodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![leaf];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if id != leaf && node.is_sentinel_run() {
                continue;
            }
            if let Some(text) = node.text_data() {
                out.push_str(&text.content);
            }
            stack.extend(node.children.iter().rev());
        }
        strip_placeholders(&out)
    }

    /// The rendered text runs of `leaf`, in visual order (sentinel runs
    /// included; the mapper accounts for their declared lengths).
    pub fn runs_of_leaf(&self, leaf: SurfaceNodeId) -> Vec<SurfaceNodeId> {
        TreeTraverser::new_with_root(self, leaf)
            .filter(|id| self.nodes[*id].kind() == Some(ElementKind::Run))
            .collect()
    }

    pub fn first_text_descendant(&self, id: SurfaceNodeId) -> Option<SurfaceNodeId> {
        TreeTraverser::new_with_root(self, id).find(|node_id| self.nodes[*node_id].is_text())
    }

    /// The nearest self-or-ancestor element of `kind`.
    pub fn enclosing_of_kind(
        &self,
        start: SurfaceNodeId,
        kind: ElementKind,
    ) -> Option<SurfaceNodeId> {
        self.self_and_ancestors(start)
            .find(|id| self.nodes[*id].kind() == Some(kind))
    }

    /// The nearest self-or-ancestor element marked atomic.
    pub fn enclosing_atomic(&self, start: SurfaceNodeId) -> Option<SurfaceNodeId> {
        self.self_and_ancestors(start)
            .find(|id| self.nodes[*id].element_data().is_some_and(|el| el.atomic))
    }

    /// The document key of the leaf enclosing `node`, if any.
    pub fn enclosing_leaf_key(&self, node: SurfaceNodeId) -> Option<Key> {
        let leaf = self.enclosing_of_kind(node, ElementKind::Leaf)?;
        self.nodes[leaf].element_data().and_then(|el| el.key)
    }

    fn self_and_ancestors(
        &self,
        start: SurfaceNodeId,
    ) -> impl Iterator<Item = SurfaceNodeId> + '_ {
        self.nodes
            .get(start)
            .map(|node| node.id)
            .into_iter()
            .chain(AncestorTraverser::new(self, start))
    }

    /// Clean a leaf after the platform has typed into it. A sentinel run that
    /// now holds more than its placeholder loses both the placeholder
    /// characters and its sentinel marking; placeholder characters that leaked
    /// into ordinary runs are deleted.
    pub fn sanitize_sentinels(&mut self, leaf: SurfaceNodeId) {
        for run in self.runs_of_leaf(leaf) {
            let raw = self.text_content(run);
            let is_sentinel = self.nodes[run].is_sentinel_run();

            if is_sentinel && raw.chars().ne(std::iter::once(PLACEHOLDER)) {
                self.strip_placeholder_chars(run);
                if let Some(el) = self.nodes[run].element_data_mut() {
                    el.sentinel = None;
                    el.declared_len = None;
                }
            } else if !is_sentinel && raw.contains(PLACEHOLDER) {
                self.strip_placeholder_chars(run);
            }
        }
    }

    fn strip_placeholder_chars(&mut self, id: SurfaceNodeId) {
        let text_nodes: Vec<SurfaceNodeId> = TreeTraverser::new_with_root(self, id)
            .filter(|node_id| self.nodes[*node_id].is_text())
            .collect();
        for node_id in text_nodes {
            if let Some(text) = self.nodes[node_id].text_data_mut() {
                if text.content.contains(PLACEHOLDER) {
                    text.content = strip_placeholders(&text.content);
                }
            }
        }
    }

    pub fn selection(&self) -> &NativeSelection {
        &self.selection
    }

    /// Number of native-selection mutations applied so far. Lets embedders
    /// (and tests) verify that redundant synchronization performs none.
    pub fn selection_ops(&self) -> u64 {
        self.selection_ops
    }

    pub fn remove_all_ranges(&mut self) {
        self.selection = NativeSelection::default();
        self.selection_ops += 1;
    }

    pub fn collapse(&mut self, node: SurfaceNodeId, offset: usize) {
        let point = RawPoint::new(node, offset);
        self.selection = NativeSelection {
            anchor: Some(point),
            focus: Some(point),
        };
        self.selection_ops += 1;
    }

    pub fn set_base_and_extent(&mut self, anchor: RawPoint, focus: RawPoint) {
        self.selection = NativeSelection {
            anchor: Some(anchor),
            focus: Some(focus),
        };
        self.selection_ops += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_with_runs(surface: &mut Surface, texts: &[&str]) -> SurfaceNodeId {
        let leaf = surface.create_element(ElementData::leaf(Key(1)));
        for text in texts {
            let run = surface.create_element(ElementData::run());
            let text_node = surface.create_text(text);
            surface.append(run, text_node);
            surface.append(leaf, run);
        }
        leaf
    }

    #[test]
    fn observed_text_skips_sentinel_runs() {
        let mut surface = Surface::new();
        let leaf = surface.create_element(ElementData::leaf(Key(1)));
        let run = surface.create_element(ElementData::run());
        let text = surface.create_text("abc");
        surface.append(run, text);
        surface.append(leaf, run);

        let sentinel = surface.create_element(ElementData::sentinel_run(Sentinel::ZeroWidth));
        let placeholder = surface.create_text("\u{FEFF}");
        surface.append(sentinel, placeholder);
        surface.append(leaf, sentinel);

        assert_eq!(surface.observed_leaf_text(leaf), "abc");
    }

    #[test]
    fn observed_text_strips_stray_placeholders() {
        let mut surface = Surface::new();
        let leaf = leaf_with_runs(&mut surface, &["a\u{FEFF}b"]);
        assert_eq!(surface.observed_leaf_text(leaf), "ab");
    }

    #[test]
    fn sanitize_clears_sentinel_marking_once_typed_into() {
        let mut surface = Surface::new();
        let leaf = surface.create_element(ElementData::leaf(Key(1)));
        let sentinel = surface.create_element(ElementData::sentinel_run(Sentinel::ZeroWidth));
        let text = surface.create_text("a\u{FEFF}");
        surface.append(sentinel, text);
        surface.append(leaf, sentinel);

        surface.sanitize_sentinels(leaf);

        let run = surface.get(sentinel).unwrap();
        assert!(!run.is_sentinel_run());
        assert_eq!(run.element_data().unwrap().declared_len, None);
        assert_eq!(surface.text_content(sentinel), "a");
    }

    #[test]
    fn removing_a_subtree_clears_selection_inside_it() {
        let mut surface = Surface::new();
        let root = surface.create_element(ElementData::root());
        surface.set_root(root);
        let leaf = leaf_with_runs(&mut surface, &["hi"]);
        surface.append(root, leaf);
        let text = surface.first_text_descendant(leaf).unwrap();
        surface.collapse(text, 1);

        surface.remove_node(leaf);

        assert_eq!(surface.selection().range_count(), 0);
        assert!(!surface.contains(text));
        assert!(surface.contains(root));
    }
}
