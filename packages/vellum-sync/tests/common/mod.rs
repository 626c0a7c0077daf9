//! Shared fixtures: a small block/leaf document model and a renderer that
//! mounts it into a surface the way a real host would.

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::Arc;

use vellum_sync::{
    DiagnosticsProvider, DocumentModel, ElementData, Key, ModelError, Path, Position, RawPoint,
    RecoveryPolicy, Selection, Sentinel, Surface, SurfaceNodeId, SyncEngine,
};

#[derive(Debug, Clone)]
pub struct Leaf {
    pub key: Key,
    pub text: String,
    pub atomic: bool,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub key: Key,
    pub leaves: Vec<Leaf>,
}

/// Mutations the fixture applied, so tests can assert which path ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Insert { key: Key, at: usize, text: String },
    ReplaceLeaf { key: Key, text: String },
    Delete,
    ReplaceBlock { block: Key, text: String },
    RebuildBlock { block: Key },
}

#[derive(Default)]
pub struct FixtureDocument {
    pub blocks: Vec<Block>,
    pub selection: Option<Selection>,
    /// Pending focus marks; cleared whenever a selection is committed.
    pub focus_marks: Option<Vec<String>>,
    pub ops: Vec<Op>,
    pub fail_rebuild: bool,
    next_key: u64,
}

impl FixtureDocument {
    pub fn new() -> Self {
        FixtureDocument {
            next_key: 1,
            ..Default::default()
        }
    }

    pub fn fresh_key(&mut self) -> Key {
        let key = Key(self.next_key);
        self.next_key += 1;
        key
    }

    /// Append a block of plain leaves; returns the block key and leaf keys.
    pub fn push_block(&mut self, texts: &[&str]) -> (Key, Vec<Key>) {
        let block_key = self.fresh_key();
        let leaves: Vec<Leaf> = texts
            .iter()
            .map(|text| Leaf {
                key: {
                    let key = Key(self.next_key);
                    self.next_key += 1;
                    key
                },
                text: text.to_string(),
                atomic: false,
            })
            .collect();
        let keys = leaves.iter().map(|leaf| leaf.key).collect();
        self.blocks.push(Block {
            key: block_key,
            leaves,
        });
        (block_key, keys)
    }

    /// Append a block containing a single atomic leaf.
    pub fn push_atomic_block(&mut self) -> (Key, Key) {
        let block_key = self.fresh_key();
        let leaf_key = self.fresh_key();
        self.blocks.push(Block {
            key: block_key,
            leaves: vec![Leaf {
                key: leaf_key,
                text: " ".to_string(),
                atomic: true,
            }],
        });
        (block_key, leaf_key)
    }

    pub fn leaf(&self, key: Key) -> Option<&Leaf> {
        self.blocks
            .iter()
            .flat_map(|block| block.leaves.iter())
            .find(|leaf| leaf.key == key)
    }

    fn locate_leaf(&self, key: Key) -> Option<(usize, usize)> {
        self.blocks.iter().enumerate().find_map(|(bi, block)| {
            block
                .leaves
                .iter()
                .position(|leaf| leaf.key == key)
                .map(|li| (bi, li))
        })
    }

    fn locate_block(&self, key: Key) -> Option<usize> {
        self.blocks.iter().position(|block| block.key == key)
    }

    pub fn position(&self, key: Key, offset: usize) -> Position {
        Position::new(self.path_of(key).expect("fixture leaf exists"), key, offset)
    }

    pub fn collapse_selection(&mut self, key: Key, offset: usize) {
        self.selection = Some(Selection::collapsed(self.position(key, offset)));
    }
}

fn byte_at(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

impl DocumentModel for FixtureDocument {
    fn leaf_text(&self, key: Key) -> Option<&str> {
        self.leaf(key).map(|leaf| leaf.text.as_str())
    }

    fn path_of(&self, key: Key) -> Option<Path> {
        if let Some(bi) = self.locate_block(key) {
            return Some(Path::from_slice(&[bi]));
        }
        self.locate_leaf(key)
            .map(|(bi, li)| Path::from_slice(&[bi, li]))
    }

    fn key_at(&self, path: &[usize]) -> Option<Key> {
        match *path {
            [bi] => self.blocks.get(bi).map(|block| block.key),
            [bi, li] => self
                .blocks
                .get(bi)
                .and_then(|block| block.leaves.get(li))
                .map(|leaf| leaf.key),
            _ => None,
        }
    }

    fn closest_block(&self, key: Key) -> Option<Key> {
        if self.locate_block(key).is_some() {
            return Some(key);
        }
        self.locate_leaf(key).map(|(bi, _)| self.blocks[bi].key)
    }

    fn is_atomic(&self, key: Key) -> bool {
        self.leaf(key).is_some_and(|leaf| leaf.atomic)
    }

    fn is_last_leaf_in_block(&self, key: Key) -> bool {
        self.locate_leaf(key)
            .is_some_and(|(bi, li)| li + 1 == self.blocks[bi].leaves.len())
    }

    fn selection(&self) -> Option<Selection> {
        self.selection.clone()
    }

    fn set_selection(&mut self, selection: Selection) {
        self.focus_marks = None;
        self.selection = Some(selection);
    }

    fn insert_text_at(&mut self, position: &Position, text: &str) -> Result<(), ModelError> {
        let (bi, li) = self
            .locate_leaf(position.key)
            .ok_or(ModelError::UnknownKey(position.key))?;
        let leaf = &mut self.blocks[bi].leaves[li];
        let len = leaf.text.chars().count();
        if position.offset > len {
            return Err(ModelError::OffsetOutOfBounds {
                offset: position.offset,
                len,
            });
        }
        let at = byte_at(&leaf.text, position.offset);
        leaf.text.insert_str(at, text);
        self.ops.push(Op::Insert {
            key: position.key,
            at: position.offset,
            text: text.to_string(),
        });
        Ok(())
    }

    fn replace_leaf_text(&mut self, key: Key, text: &str) -> Result<(), ModelError> {
        let (bi, li) = self.locate_leaf(key).ok_or(ModelError::UnknownKey(key))?;
        self.blocks[bi].leaves[li].text = text.to_string();
        self.ops.push(Op::ReplaceLeaf {
            key,
            text: text.to_string(),
        });
        Ok(())
    }

    fn delete_at(&mut self, range: &Selection) -> Result<(), ModelError> {
        let start = range.start().clone();
        let end = range.end().clone();

        if start.key == end.key {
            let (bi, li) = self
                .locate_leaf(start.key)
                .ok_or(ModelError::UnknownKey(start.key))?;
            let leaf = &mut self.blocks[bi].leaves[li];
            let from = byte_at(&leaf.text, start.offset);
            let to = byte_at(&leaf.text, end.offset);
            leaf.text.replace_range(from..to, "");
        } else {
            // Fixture-grade cross-leaf delete: both endpoints in one block.
            let (bi, start_li) = self
                .locate_leaf(start.key)
                .ok_or(ModelError::UnknownKey(start.key))?;
            let (end_bi, end_li) = self
                .locate_leaf(end.key)
                .ok_or(ModelError::UnknownKey(end.key))?;
            if bi != end_bi {
                return Err(ModelError::UnknownPath);
            }
            let block = &mut self.blocks[bi];
            let from = byte_at(&block.leaves[start_li].text, start.offset);
            block.leaves[start_li].text.truncate(from);
            for leaf in &mut block.leaves[start_li + 1..end_li] {
                leaf.text.clear();
            }
            let to = byte_at(&block.leaves[end_li].text, end.offset);
            block.leaves[end_li].text.replace_range(..to, "");
        }

        self.ops.push(Op::Delete);
        Ok(())
    }

    fn replace_block_with_text(&mut self, block: Key, text: &str) -> Result<Key, ModelError> {
        let bi = self.locate_block(block).ok_or(ModelError::UnknownKey(block))?;
        let leaf_key = self.fresh_key();
        self.blocks[bi].leaves = vec![Leaf {
            key: leaf_key,
            text: text.to_string(),
            atomic: false,
        }];
        self.ops.push(Op::ReplaceBlock {
            block,
            text: text.to_string(),
        });
        Ok(leaf_key)
    }

    fn rebuild_block(&mut self, block: Key) -> Result<(), ModelError> {
        if self.fail_rebuild {
            return Err(ModelError::UnknownKey(block));
        }
        self.locate_block(block).ok_or(ModelError::UnknownKey(block))?;
        // Content is already the last-known-good state; a real model would
        // swap in a reconstructed node and force a remount here.
        self.ops.push(Op::RebuildBlock { block });
        Ok(())
    }
}

/// Mount the fixture document into a surface the way the renderer contract
/// describes: keyed block and leaf elements, text runs inside leaves, and
/// sentinel runs for empty or atomic leaves.
pub fn mount(doc: &FixtureDocument, surface: &mut Surface, engine: &mut SyncEngine) {
    let root = surface.create_element(ElementData::root());
    surface.set_root(root);

    for block in &doc.blocks {
        let block_el = surface.create_element(ElementData::block(block.key));
        surface.append(root, block_el);
        engine.note_mounted(block.key, block_el);

        for leaf in &block.leaves {
            let leaf_el = if leaf.atomic {
                surface.create_element(ElementData::atomic_leaf(leaf.key))
            } else {
                surface.create_element(ElementData::leaf(leaf.key))
            };

            if leaf.atomic || leaf.text.is_empty() {
                let run = surface.create_element(ElementData::sentinel_run(Sentinel::ZeroWidth));
                let text = surface.create_text("\u{FEFF}");
                surface.append(run, text);
                surface.append(leaf_el, run);
            } else {
                let run = surface.create_element(ElementData::run());
                let text = surface.create_text(&leaf.text);
                surface.append(run, text);
                surface.append(leaf_el, run);
            }

            surface.append(block_el, leaf_el);
            engine.note_mounted(leaf.key, leaf_el);
        }
    }
}

/// The concrete text node rendering `key`'s content.
pub fn text_node_of(surface: &Surface, engine: &SyncEngine, key: Key) -> SurfaceNodeId {
    let leaf = engine
        .state()
        .index
        .node_for_key(surface, key)
        .expect("leaf is mounted");
    surface
        .first_text_descendant(leaf)
        .expect("leaf renders a text node")
}

/// Simulate the platform replacing a text node's content and moving the
/// caret, as a native edit does before any notification fires.
pub fn platform_edit(surface: &mut Surface, text_node: SurfaceNodeId, text: &str, caret: usize) {
    surface.set_text(text_node, text);
    surface.collapse(text_node, caret);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagEvent {
    CompositionAborted(Option<SurfaceNodeId>),
    MappingFailed(&'static str),
    RecoveryApplied(Key, RecoveryPolicy),
    RecoveryFailed(Option<Key>),
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub events: RefCell<Vec<DiagEvent>>,
}

impl RecordingDiagnostics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<DiagEvent> {
        self.events.take()
    }
}

impl DiagnosticsProvider for RecordingDiagnostics {
    fn composition_aborted(&self, anchor: Option<SurfaceNodeId>) {
        self.events
            .borrow_mut()
            .push(DiagEvent::CompositionAborted(anchor));
    }

    fn mapping_failed(&self, _key: Option<Key>, operation: &'static str) {
        self.events
            .borrow_mut()
            .push(DiagEvent::MappingFailed(operation));
    }

    fn recovery_applied(&self, block: Key, policy: RecoveryPolicy) {
        self.events
            .borrow_mut()
            .push(DiagEvent::RecoveryApplied(block, policy));
    }

    fn recovery_failed(&self, block: Option<Key>) {
        self.events
            .borrow_mut()
            .push(DiagEvent::RecoveryFailed(block));
    }
}

/// Engine wired to a recording diagnostics provider.
pub fn engine_with_diagnostics() -> (SyncEngine, Arc<RecordingDiagnostics>) {
    let diagnostics = RecordingDiagnostics::shared();
    let provider: Arc<dyn DiagnosticsProvider> = diagnostics.clone();
    let engine = SyncEngine::new(vellum_sync::SyncConfig {
        diagnostics: Some(provider),
        ..Default::default()
    });
    (engine, diagnostics)
}

/// The raw point the surface's native selection currently collapses to.
pub fn native_caret(surface: &Surface) -> Option<RawPoint> {
    surface.selection().anchor
}
