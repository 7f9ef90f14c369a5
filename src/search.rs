//! Search index over the placeable block set.
//!
//! Built after filtering, so hidden blocks never appear. Blocks that exist
//! only behind the collapsed advanced placeholder are recorded during the
//! build pass and indexed without a category location.

use indexmap::IndexMap;

use crate::arena::{NodeId, ToolboxTree};

/// Where a searchable block lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchLocation {
    /// Display name of the top-level category containing the block.
    Category(String),
    /// Placeable but not visible in any category (collapsed advanced).
    Uncategorized,
}

/// Block-id keyed search index, in tree document order.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: IndexMap<String, SearchLocation>,
}

impl SearchIndex {
    /// Index every leaf reachable in the tree, then the extra block ids
    /// recorded while collapsing advanced categories. Tree entries win when
    /// both mention an id.
    pub fn build(tree: &ToolboxTree, collapsed: &[String]) -> Self {
        let mut entries = IndexMap::new();
        tree.walk(tree.root(), &mut |t, id| {
            if let Some(leaf) = t.leaf(id) {
                let location = top_category_name(t, id)
                    .map(SearchLocation::Category)
                    .unwrap_or(SearchLocation::Uncategorized);
                entries.entry(leaf.block_id.clone()).or_insert(location);
            }
        });
        for block_id in collapsed {
            entries
                .entry(block_id.clone())
                .or_insert(SearchLocation::Uncategorized);
        }
        SearchIndex { entries }
    }

    pub fn contains(&self, block_id: &str) -> bool {
        self.entries.contains_key(block_id)
    }

    pub fn location(&self, block_id: &str) -> Option<&SearchLocation> {
        self.entries.get(block_id)
    }

    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Display name of the top-level category an ancestor chain ends in.
fn top_category_name(tree: &ToolboxTree, node: NodeId) -> Option<String> {
    let root = tree.root();
    let mut current = node;
    let mut top = None;
    while let Some(parent) = tree.parent(current) {
        if tree.is_category(current) {
            top = Some(current);
        }
        if parent == root {
            break;
        }
        current = parent;
    }
    if tree.is_category(current) {
        top = Some(current);
    }
    top.and_then(|c| tree.category(c).map(|d| d.display_name.clone()))
}
