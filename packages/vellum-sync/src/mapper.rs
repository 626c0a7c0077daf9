//! Coordinate mapping between document positions and surface points.
//!
//! Document coordinates are `(path, key, character offset)`; surface
//! coordinates are `(node, offset)` where the node may be an element whose
//! offset addresses children by index. Mapping normalizes the latter down to
//! concrete text nodes, accounts for sentinel runs (which render a
//! placeholder but contribute zero logical length), and fails with `None`
//! rather than guessing.

use vellum_traits::{DocumentModel, Position, RawPoint, SurfaceNodeId};

use crate::index::SurfaceIndex;
use crate::surface::{ElementKind, PLACEHOLDER, Surface};
use crate::traversal::{AncestorTraverser, TreeTraverser};
use crate::util::{byte_index_at, char_len};

/// Resolve the surface element currently rendering the document node at
/// `path`. `None` if any link in the chain is unmounted or stale.
pub fn surface_node_for_path(
    doc: &dyn DocumentModel,
    index: &SurfaceIndex,
    surface: &Surface,
    path: &[usize],
) -> Option<SurfaceNodeId> {
    let key = doc.key_at(path)?;
    index.node_for_key(surface, key)
}

/// Map a raw surface point to a document position.
///
/// Returns `None` when no enclosing leaf exists: the point sits inside an
/// opaque node's chrome and no rendered leaf can be found beneath it.
pub fn position_at_surface_point(
    doc: &dyn DocumentModel,
    surface: &Surface,
    node: SurfaceNodeId,
    raw_offset: usize,
) -> Option<Position> {
    let (target, local_offset) = normalize_point(surface, node, raw_offset)?;
    let target_node = surface.get(target)?;
    let search_from = if target_node.is_text() {
        target_node.parent?
    } else {
        target
    };

    if let Some(leaf) = surface.enclosing_of_kind(search_from, ElementKind::Leaf) {
        let leaf_el = surface.get(leaf)?.element_data()?;
        let key = leaf_el.key?;
        if leaf_el.atomic {
            // Anything inside an atomic leaf clamps to the start of its
            // representation.
            let path = doc.path_of(key)?;
            return Some(Position::new(path, key, 0));
        }
        let offset = visible_offset_within(surface, leaf, target, local_offset)?;
        let model_len = char_len(doc.leaf_text(key)?);
        let path = doc.path_of(key)?;
        return Some(Position::new(path, key, offset.min(model_len)));
    }

    // No leaf above the point: for atomic containers the leaf is a cousin,
    // not an ancestor, so descend from the nearest atomic ancestor.
    let atomic = surface.enclosing_atomic(search_from)?;
    let leaf = descendant_leaf(surface, atomic)?;
    let key = surface.get(leaf)?.element_data()?.key?;
    let path = doc.path_of(key)?;
    Some(Position::new(path, key, 0))
}

/// Map a document position to the concrete surface text node and local
/// offset that render it.
pub fn surface_point_for_position(
    index: &SurfaceIndex,
    surface: &Surface,
    position: &Position,
) -> Option<RawPoint> {
    let leaf = index.node_for_key(surface, position.key)?;

    let mut start = 0;
    for run in surface.runs_of_leaf(leaf) {
        let Some(text_node) = surface.first_text_descendant(run) else {
            continue;
        };
        let rendered_len = char_len(&surface.get(text_node)?.text_data()?.content);
        // Sentinel runs declare a logical length (0) that differs from what
        // they render.
        let logical_len = surface
            .get(run)?
            .element_data()?
            .declared_len
            .unwrap_or(rendered_len);

        let end = start + logical_len;
        if position.offset <= end {
            let local = position.offset.saturating_sub(start).min(rendered_len);
            return Some(RawPoint::new(text_node, local));
        }
        start = end;
    }

    None
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Normalize a raw point so that it always denotes a concrete node and a
/// offset within it, descending into element children by index when the raw
/// offset addresses children rather than characters.
fn normalize_point(
    surface: &Surface,
    node: SurfaceNodeId,
    offset: usize,
) -> Option<(SurfaceNodeId, usize)> {
    let node_ref = surface.get(node)?;
    if !node_ref.is_element() || node_ref.children.is_empty() {
        return Some((node, offset));
    }

    // Whether the original offset was at the start or the end of its element
    // decides which way ties are searched.
    let is_first = offset == 0;
    let direction = if is_first {
        Direction::Forward
    } else {
        Direction::Backward
    };
    let index = if is_first { 0 } else { offset - 1 };

    let mut current = editable_child_at(surface, node, index, direction)?;
    loop {
        let current_ref = surface.get(current)?;
        if current_ref.is_element() && !current_ref.children.is_empty() {
            let index = if is_first {
                0
            } else {
                current_ref.children.len() - 1
            };
            current = editable_child_at(surface, current, index, direction)?;
        } else {
            break;
        }
    }

    let current_ref = surface.get(current)?;
    let offset = if is_first {
        0
    } else {
        current_ref
            .text_data()
            .map(|text| char_len(&text.content))
            .unwrap_or(0)
    };
    Some((current, offset))
}

/// The nearest non-skippable child of `parent` at `index`, preferring
/// `direction`. Childless elements and non-editable elements are skipped,
/// bouncing off each end of the child list at most once.
fn editable_child_at(
    surface: &Surface,
    parent: SurfaceNodeId,
    index: usize,
    mut direction: Direction,
) -> Option<SurfaceNodeId> {
    let children = &surface.get(parent)?.children;
    if children.is_empty() {
        return None;
    }
    let index = index.min(children.len() - 1);

    let skippable = |id: SurfaceNodeId| match surface.get(id) {
        None => true,
        Some(node) => {
            node.is_element()
                && (node.children.is_empty()
                    || node.element_data().is_some_and(|el| !el.editable))
        }
    };

    let len = children.len() as isize;
    let mut i = index as isize;
    let mut tried_forward = false;
    let mut tried_backward = false;

    loop {
        if i >= len {
            if tried_backward {
                return None;
            }
            tried_forward = true;
            i = index as isize - 1;
            direction = Direction::Backward;
            continue;
        }
        if i < 0 {
            if tried_forward {
                return None;
            }
            tried_backward = true;
            i = index as isize + 1;
            direction = Direction::Forward;
            continue;
        }

        let child = children[i as usize];
        if !skippable(child) {
            return Some(child);
        }
        match direction {
            Direction::Forward => i += 1,
            Direction::Backward => i -= 1,
        }
    }
}

/// Character offset of `(target, local_offset)` within `leaf`'s visible text:
/// sentinel-run subtrees count for nothing and placeholder characters are
/// excluded.
fn visible_offset_within(
    surface: &Surface,
    leaf: SurfaceNodeId,
    target: SurfaceNodeId,
    local_offset: usize,
) -> Option<usize> {
    let visible_chars = |s: &str| s.chars().filter(|c| *c != PLACEHOLDER).count();

    let mut acc = 0;
    let mut stack = vec![leaf];
    while let Some(id) = stack.pop() {
        let Some(node) = surface.get(id) else {
            continue;
        };
        if id != leaf && node.is_sentinel_run() {
            // A caret parked inside a sentinel sits at the position the
            // sentinel stands in for.
            if contains_node(surface, id, target) {
                return Some(acc);
            }
            continue;
        }
        if let Some(text) = node.text_data() {
            if id == target {
                let upto = byte_index_at(&text.content, local_offset);
                return Some(acc + visible_chars(&text.content[..upto]));
            }
            acc += visible_chars(&text.content);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

pub(crate) fn contains_node(surface: &Surface, ancestor: SurfaceNodeId, node: SurfaceNodeId) -> bool {
    node == ancestor || AncestorTraverser::new(surface, node).any(|id| id == ancestor)
}

fn descendant_leaf(surface: &Surface, from: SurfaceNodeId) -> Option<SurfaceNodeId> {
    TreeTraverser::new_with_root(surface, from)
        .find(|id| surface.get(*id).and_then(|node| node.kind()) == Some(ElementKind::Leaf))
}
