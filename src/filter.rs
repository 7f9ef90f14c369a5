//! Visibility filtering over a built tree.
//!
//! Filters resolve per leaf as block override, then category state, then the
//! global default. Hidden prunes the node; Disabled keeps it grayed out and
//! inherits downward unless a block declares its own state. The dynamically
//! populated "variables" category has no synthesized leaves, so its state
//! derives from the three variable block ids instead.

use crate::arena::{NodeId, ToolboxTree};
use crate::builtins::{ADVANCED_CATEGORY_ID, MORE_CATEGORY_ID, VARIABLES_BLOCKS};
use crate::model::{FilterSpec, FilterState};

/// Categories that survive the empty prune: their content is populated by
/// the workspace at runtime, not by synthesis.
const PRUNE_EXEMPT: &[&str] = &["variables", "functions", ADVANCED_CATEGORY_ID];

/// Apply a filter specification to the tree in place. An empty specification
/// leaves the tree untouched.
pub fn apply_filters(tree: &mut ToolboxTree, filters: &FilterSpec) {
    if filters.is_empty() {
        return;
    }
    let root = tree.root();
    for cat in tree.child_categories(root) {
        filter_category(tree, filters, cat, None);
    }
    for leaf in tree.child_leaves(root) {
        filter_leaf(tree, filters, leaf, None);
    }
}

/// Resolved state of a category. The reserved "more" and "advanced" buckets
/// inherit from their parent; "variables" derives from its block ids.
fn category_state(
    tree: &ToolboxTree,
    filters: &FilterSpec,
    cat: NodeId,
    parent_state: Option<FilterState>,
) -> Option<FilterState> {
    let id = match tree.category(cat) {
        Some(c) => c.id.clone(),
        None => return parent_state,
    };
    if id == MORE_CATEGORY_ID || id == ADVANCED_CATEGORY_ID {
        return parent_state;
    }
    if id == "variables" {
        return variables_state(filters);
    }
    // An explicit entry wins; otherwise subcategories inherit their parent.
    filters
        .namespaces
        .get(&id)
        .copied()
        .or(parent_state)
        .or(filters.default_state)
}

fn variables_state(filters: &FilterSpec) -> Option<FilterState> {
    let ns = filters.namespace_state("variables");
    let states: Vec<Option<FilterState>> = VARIABLES_BLOCKS
        .iter()
        .map(|b| filters.block_state(b, ns))
        .collect();
    if !states.is_empty() && states.iter().all(|s| *s == Some(FilterState::Hidden)) {
        return Some(FilterState::Hidden);
    }
    if states.iter().any(|s| *s == Some(FilterState::Visible)) {
        return Some(FilterState::Visible);
    }
    if states.iter().any(|s| *s == Some(FilterState::Disabled)) {
        return Some(FilterState::Disabled);
    }
    ns
}

fn filter_category(
    tree: &mut ToolboxTree,
    filters: &FilterSpec,
    cat: NodeId,
    parent_state: Option<FilterState>,
) {
    let state = category_state(tree, filters, cat, parent_state);

    // Children resolve first: a block's own override beats the category
    // state, so a Hidden category keeps explicitly Visible leaves alive.
    for sub in tree.child_categories(cat) {
        filter_category(tree, filters, sub, state);
    }
    for leaf in tree.child_leaves(cat) {
        filter_leaf(tree, filters, leaf, state);
    }

    let remaining = tree.leaves_under(cat);
    if state == Some(FilterState::Hidden) {
        if remaining.is_empty() {
            tree.remove(cat);
        }
        return;
    }
    if state == Some(FilterState::Disabled) {
        // Disabled only when no enabled descendant survived.
        let all_disabled = remaining
            .iter()
            .all(|&l| tree.leaf(l).map(|d| d.disabled).unwrap_or(true));
        if all_disabled {
            if let Some(data) = tree.category_mut(cat) {
                data.disabled = true;
            }
        }
    }

    let id = tree.category(cat).map(|c| c.id.clone()).unwrap_or_default();
    let exempt = PRUNE_EXEMPT.contains(&id.as_str());
    let forced_visible = state == Some(FilterState::Visible);
    if !exempt && !forced_visible && remaining.is_empty() {
        tree.remove(cat);
    }
}

fn filter_leaf(
    tree: &mut ToolboxTree,
    filters: &FilterSpec,
    leaf: NodeId,
    parent_state: Option<FilterState>,
) {
    let block_id = match tree.leaf(leaf) {
        Some(l) => l.block_id.clone(),
        None => return,
    };
    match filters.block_state(&block_id, parent_state) {
        Some(FilterState::Hidden) => tree.remove(leaf),
        Some(FilterState::Disabled) => {
            if let Some(data) = tree.leaf_mut(leaf) {
                data.disabled = true;
            }
        }
        _ => {}
    }
}
