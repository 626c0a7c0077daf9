use vellum_traits::SurfaceNodeId;

use crate::surface::Surface;

/// A pre-order tree traverser for a [`Surface`](crate::surface::Surface).
#[derive(Clone)]
pub struct TreeTraverser<'a> {
    surface: &'a Surface,
    stack: Vec<SurfaceNodeId>,
}

impl<'a> TreeTraverser<'a> {
    /// Creates a new tree traverser which starts at the surface root.
    pub fn new(surface: &'a Surface) -> Self {
        let mut stack = Vec::with_capacity(32);
        stack.extend(surface.root());
        TreeTraverser { surface, stack }
    }

    /// Creates a new tree traverser which starts at the specified node.
    pub fn new_with_root(surface: &'a Surface, root: SurfaceNodeId) -> Self {
        let mut stack = Vec::with_capacity(32);
        stack.push(root);
        TreeTraverser { surface, stack }
    }
}

impl Iterator for TreeTraverser<'_> {
    type Item = SurfaceNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.surface.get(id)?;
        self.stack.extend(node.children.iter().rev());
        Some(id)
    }
}

/// An ancestor traverser for a [`Surface`](crate::surface::Surface).
#[derive(Clone)]
pub struct AncestorTraverser<'a> {
    surface: &'a Surface,
    current: SurfaceNodeId,
}

impl<'a> AncestorTraverser<'a> {
    /// Creates a new ancestor traverser for the given surface and node id.
    pub fn new(surface: &'a Surface, node_id: SurfaceNodeId) -> Self {
        AncestorTraverser {
            surface,
            current: node_id,
        }
    }
}

impl Iterator for AncestorTraverser<'_> {
    type Item = SurfaceNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current_node = self.surface.get(self.current)?;
        self.current = current_node.parent?;
        Some(self.current)
    }
}
