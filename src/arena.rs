//! Index-addressed toolbox tree.
//!
//! The tree is an arena of nodes addressed by stable [`NodeId`] handles with
//! explicit parent/child index lists. Nodes are mutated in place during a
//! rebuild; cloning the whole arena is cheap enough for incremental rebuilds
//! that start from a skeleton tree. Detached subtrees simply become
//! unreachable; consumers walk from [`ToolboxTree::root`].

use serde::{Deserialize, Serialize};

use crate::descriptor::BlockDescriptor;

/// Stable handle to a node in the arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A category grouping node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryData {
    /// Lower-cased identifier, unique among siblings (case-insensitive).
    pub id: String,
    pub display_name: String,
    /// Sort key; higher sorts earlier among siblings.
    pub weight: f64,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_advanced: bool,
    /// Declared group order for the flyout grouping pass.
    pub group_order: Vec<String>,
    pub group_icons: Vec<String>,
    /// Set by the filter engine; kept but non-interactive.
    pub disabled: bool,
}

impl CategoryData {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, weight: f64) -> Self {
        let id: String = id.into();
        CategoryData {
            id: id.to_lowercase(),
            display_name: display_name.into(),
            weight,
            color: None,
            icon: None,
            is_advanced: false,
            group_order: Vec::new(),
            group_icons: Vec::new(),
            disabled: false,
        }
    }
}

/// A leaf block descriptor node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafData {
    pub block_id: String,
    pub weight: f64,
    pub group: Option<String>,
    /// Pinned leaves sort above ordinary leaves in builtin categories.
    pub pinned: bool,
    pub disabled: bool,
    pub descriptor: BlockDescriptor,
}

impl LeafData {
    pub fn new(descriptor: BlockDescriptor, weight: f64) -> Self {
        LeafData {
            block_id: descriptor.block_id.clone(),
            weight,
            group: None,
            pinned: false,
            disabled: false,
            descriptor,
        }
    }
}

/// A non-interactive text label (group headers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelData {
    pub text: String,
    pub icon: Option<String>,
}

/// An extension button placed at the top of a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonData {
    pub label: String,
    pub callback_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Category(CategoryData),
    Leaf(LeafData),
    Label(LabelData),
    Separator { weight: f64 },
    Button(ButtonData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The toolbox tree arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolboxTree {
    nodes: Vec<Node>,
}

impl Default for ToolboxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolboxTree {
    pub fn new() -> Self {
        ToolboxTree {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    // ── allocation and structural edits ─────────────────────────────────

    /// Allocate a detached node.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert `child` into `parent` directly before `anchor` (which must be
    /// a child of `parent`; appends otherwise).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, anchor: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        match children.iter().position(|&c| c == anchor) {
            Some(pos) => children.insert(pos, child),
            None => children.push(child),
        }
    }

    /// Unlink a node from its parent. The subtree below it stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Remove a node (and its subtree) from the reachable tree.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    // ── typed accessors ─────────────────────────────────────────────────

    pub fn category(&self, id: NodeId) -> Option<&CategoryData> {
        match &self.node(id).kind {
            NodeKind::Category(c) => Some(c),
            _ => None,
        }
    }

    pub fn category_mut(&mut self, id: NodeId) -> Option<&mut CategoryData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Category(c) => Some(c),
            _ => None,
        }
    }

    pub fn leaf(&self, id: NodeId) -> Option<&LeafData> {
        match &self.node(id).kind {
            NodeKind::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut LeafData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Leaf(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_category(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Category(_))
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Leaf(_))
    }

    // ── queries ─────────────────────────────────────────────────────────

    /// Direct child categories of `parent`, in sibling order.
    pub fn child_categories(&self, parent: NodeId) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&c| self.is_category(c))
            .collect()
    }

    /// Direct child leaves of `parent`, in sibling order.
    pub fn child_leaves(&self, parent: NodeId) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&c| self.is_leaf(c))
            .collect()
    }

    /// Direct child category with the given id (case-insensitive).
    pub fn find_child_category(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        let id = id.to_lowercase();
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.category(c).map(|cat| cat.id == id).unwrap_or(false))
    }

    /// All reachable categories in document (depth-first) order.
    pub fn all_categories(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root(), &mut |tree, id| {
            if tree.is_category(id) {
                out.push(id);
            }
        });
        out
    }

    /// All leaves in the subtree rooted at `id`, in document order.
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(id, &mut |tree, n| {
            if tree.is_leaf(n) {
                out.push(n);
            }
        });
        out
    }

    /// Whether any reachable leaf carries the given block id.
    pub fn contains_block(&self, block_id: &str) -> bool {
        self.find_leaf(block_id).is_some()
    }

    /// First reachable leaf with the given block id.
    pub fn find_leaf(&self, block_id: &str) -> Option<NodeId> {
        let mut found = None;
        self.walk(self.root(), &mut |tree, n| {
            if found.is_none()
                && tree
                    .leaf(n)
                    .map(|l| l.block_id == block_id)
                    .unwrap_or(false)
            {
                found = Some(n);
            }
        });
        found
    }

    /// Depth-first pre-order walk of the subtree rooted at `id`, excluding
    /// `id` itself when it is the root node.
    pub fn walk<F: FnMut(&ToolboxTree, NodeId)>(&self, id: NodeId, cb: &mut F) {
        if !matches!(self.node(id).kind, NodeKind::Root) {
            cb(self, id);
        }
        // children() borrows self; copy the id list so cb may borrow too.
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.walk(child, cb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BlockDescriptor;

    #[test]
    fn structural_edits_keep_sibling_order() {
        let mut tree = ToolboxTree::new();
        let root = tree.root();
        let a = tree.alloc(NodeKind::Category(CategoryData::new("a", "A", 50.0)));
        let b = tree.alloc(NodeKind::Category(CategoryData::new("b", "B", 50.0)));
        let c = tree.alloc(NodeKind::Category(CategoryData::new("c", "C", 50.0)));
        tree.append_child(root, a);
        tree.append_child(root, c);
        tree.insert_before(root, b, c);
        assert_eq!(tree.children(root), &[a, b, c]);

        tree.remove(b);
        assert_eq!(tree.children(root), &[a, c]);
        assert_eq!(tree.parent(b), None);
    }

    #[test]
    fn find_leaf_searches_all_depths() {
        let mut tree = ToolboxTree::new();
        let root = tree.root();
        let cat = tree.alloc(NodeKind::Category(CategoryData::new("math", "Math", 50.0)));
        tree.append_child(root, cat);
        let leaf = tree.alloc(NodeKind::Leaf(LeafData::new(
            BlockDescriptor::bare("math_sum"),
            50.0,
        )));
        tree.append_child(cat, leaf);
        assert!(tree.contains_block("math_sum"));
        assert_eq!(tree.find_leaf("math_sum"), Some(leaf));
        assert!(!tree.contains_block("missing"));
    }
}
