//! Visibility filter resolution and pruning.

use blockforge::arena::{CategoryData, LeafData, NodeId, NodeKind, ToolboxTree};
use blockforge::descriptor::BlockDescriptor;
use blockforge::filter::apply_filters;
use blockforge::model::{FilterSpec, FilterState};

fn category(tree: &mut ToolboxTree, id: &str) -> NodeId {
    let root = tree.root();
    let cat = tree.alloc(NodeKind::Category(CategoryData::new(id, id, 50.0)));
    tree.append_child(root, cat);
    cat
}

fn add_leaf(tree: &mut ToolboxTree, parent: NodeId, block_id: &str) -> NodeId {
    let leaf = tree.alloc(NodeKind::Leaf(LeafData::new(
        BlockDescriptor::bare(block_id),
        50.0,
    )));
    tree.append_child(parent, leaf);
    leaf
}

#[test]
fn empty_spec_leaves_the_tree_untouched() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "empty");
    apply_filters(&mut tree, &FilterSpec::default());
    assert_eq!(tree.parent(cat), Some(tree.root()));
}

#[test]
fn hidden_blocks_are_removed() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    add_leaf(&mut tree, cat, "motion_move");
    add_leaf(&mut tree, cat, "motion_turn");

    let mut filters = FilterSpec::default();
    filters
        .blocks
        .insert("motion_move".to_string(), FilterState::Hidden);
    apply_filters(&mut tree, &filters);

    assert!(!tree.contains_block("motion_move"));
    assert!(tree.contains_block("motion_turn"));
}

#[test]
fn hidden_namespaces_remove_the_whole_category() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    add_leaf(&mut tree, cat, "motion_move");

    let mut filters = FilterSpec::default();
    filters
        .namespaces
        .insert("motion".to_string(), FilterState::Hidden);
    apply_filters(&mut tree, &filters);

    assert!(tree.child_categories(tree.root()).is_empty());
}

#[test]
fn disabled_namespaces_cascade_but_block_overrides_win() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    let inherited = add_leaf(&mut tree, cat, "motion_move");
    let overridden = add_leaf(&mut tree, cat, "motion_turn");

    let mut filters = FilterSpec::default();
    filters
        .namespaces
        .insert("motion".to_string(), FilterState::Disabled);
    filters
        .blocks
        .insert("motion_turn".to_string(), FilterState::Visible);
    apply_filters(&mut tree, &filters);

    // A surviving enabled leaf keeps the category itself interactive.
    assert!(!tree.category(cat).unwrap().disabled);
    assert!(tree.leaf(inherited).unwrap().disabled);
    assert!(!tree.leaf(overridden).unwrap().disabled);
}

#[test]
fn fully_disabled_namespaces_disable_the_category_node() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    add_leaf(&mut tree, cat, "motion_move");

    let mut filters = FilterSpec::default();
    filters
        .namespaces
        .insert("motion".to_string(), FilterState::Disabled);
    apply_filters(&mut tree, &filters);

    assert!(tree.category(cat).unwrap().disabled);
}

#[test]
fn visible_block_overrides_survive_a_hidden_namespace() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    add_leaf(&mut tree, cat, "motion_move");
    add_leaf(&mut tree, cat, "motion_turn");

    let mut filters = FilterSpec::default();
    filters
        .namespaces
        .insert("motion".to_string(), FilterState::Hidden);
    filters
        .blocks
        .insert("motion_turn".to_string(), FilterState::Visible);
    apply_filters(&mut tree, &filters);

    assert!(!tree.contains_block("motion_move"));
    assert!(tree.contains_block("motion_turn"));
    assert_eq!(tree.parent(cat), Some(tree.root()));
}

#[test]
fn default_state_applies_when_nothing_more_specific_matches() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    add_leaf(&mut tree, cat, "motion_move");
    let kept = category(&mut tree, "screen");
    add_leaf(&mut tree, kept, "screen_fill");

    let mut filters = FilterSpec {
        default_state: Some(FilterState::Hidden),
        ..Default::default()
    };
    filters
        .namespaces
        .insert("screen".to_string(), FilterState::Visible);
    apply_filters(&mut tree, &filters);

    assert!(!tree.contains_block("motion_move"));
    assert!(tree.contains_block("screen_fill"));
}

#[test]
fn emptied_categories_are_pruned() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "motion");
    add_leaf(&mut tree, cat, "motion_move");

    let mut filters = FilterSpec::default();
    filters
        .blocks
        .insert("motion_move".to_string(), FilterState::Hidden);
    apply_filters(&mut tree, &filters);

    assert!(tree.child_categories(tree.root()).is_empty());
}

#[test]
fn runtime_populated_categories_survive_the_prune() {
    let mut tree = ToolboxTree::new();
    category(&mut tree, "variables");
    category(&mut tree, "functions");

    let mut filters = FilterSpec::default();
    filters
        .blocks
        .insert("unrelated".to_string(), FilterState::Hidden);
    apply_filters(&mut tree, &filters);

    let ids: Vec<String> = tree
        .child_categories(tree.root())
        .into_iter()
        .map(|c| tree.category(c).unwrap().id.clone())
        .collect();
    assert_eq!(ids, ["variables", "functions"]);
}

#[test]
fn explicitly_visible_empty_categories_are_kept() {
    let mut tree = ToolboxTree::new();
    category(&mut tree, "motion");

    let mut filters = FilterSpec::default();
    filters
        .namespaces
        .insert("motion".to_string(), FilterState::Visible);
    // Something else hidden so the spec is non-empty either way.
    filters
        .blocks
        .insert("unrelated".to_string(), FilterState::Hidden);
    apply_filters(&mut tree, &filters);

    assert_eq!(tree.child_categories(tree.root()).len(), 1);
}

#[test]
fn variables_category_follows_its_block_states() {
    let mut tree = ToolboxTree::new();
    category(&mut tree, "variables");

    let mut filters = FilterSpec::default();
    for id in ["variables_get", "variables_set", "variables_change"] {
        filters.blocks.insert(id.to_string(), FilterState::Hidden);
    }
    apply_filters(&mut tree, &filters);
    assert!(tree.child_categories(tree.root()).is_empty());

    // One visible variable block keeps the category alive.
    let mut tree = ToolboxTree::new();
    category(&mut tree, "variables");
    let mut filters = FilterSpec::default();
    filters
        .blocks
        .insert("variables_get".to_string(), FilterState::Hidden);
    filters
        .blocks
        .insert("variables_set".to_string(), FilterState::Visible);
    apply_filters(&mut tree, &filters);
    assert_eq!(tree.child_categories(tree.root()).len(), 1);
}

#[test]
fn nested_subcategories_inherit_the_parent_state() {
    let mut tree = ToolboxTree::new();
    let cat = category(&mut tree, "game");
    let sub = tree.alloc(NodeKind::Category(CategoryData::new("effects", "Effects", 90.0)));
    tree.append_child(cat, sub);
    let leaf = add_leaf(&mut tree, sub, "game_confetti");

    let mut filters = FilterSpec::default();
    filters
        .namespaces
        .insert("game".to_string(), FilterState::Disabled);
    apply_filters(&mut tree, &filters);

    assert!(tree.leaf(leaf).unwrap().disabled);
}
