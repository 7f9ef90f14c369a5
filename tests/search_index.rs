//! Search index construction.

mod common;

use blockforge::arena::{CategoryData, LeafData, NodeKind, ToolboxTree};
use blockforge::builder::ToolboxBuilder;
use blockforge::descriptor::BlockDescriptor;
use blockforge::model::FilterState;
use blockforge::search::{SearchIndex, SearchLocation};
use common::{block, request};

#[test]
fn leaves_index_under_their_top_level_category() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let game = tree.alloc(NodeKind::Category(CategoryData::new("game", "Game", 50.0)));
    tree.append_child(root, game);
    let sub = tree.alloc(NodeKind::Category(CategoryData::new(
        "effects", "Effects", 90.0,
    )));
    tree.append_child(game, sub);
    let nested = tree.alloc(NodeKind::Leaf(LeafData::new(
        BlockDescriptor::bare("game_confetti"),
        50.0,
    )));
    tree.append_child(sub, nested);
    let direct = tree.alloc(NodeKind::Leaf(LeafData::new(
        BlockDescriptor::bare("game_over"),
        50.0,
    )));
    tree.append_child(game, direct);

    let index = SearchIndex::build(&tree, &[]);
    // Nested leaves report the top-level category, not the subcategory.
    assert_eq!(
        index.location("game_confetti"),
        Some(&SearchLocation::Category("Game".to_string()))
    );
    assert_eq!(
        index.location("game_over"),
        Some(&SearchLocation::Category("Game".to_string()))
    );
    assert_eq!(index.len(), 2);
}

#[test]
fn collapsed_ids_index_without_a_location() {
    let tree = ToolboxTree::new();
    let index = SearchIndex::build(&tree, &["pins_read".to_string()]);
    assert_eq!(
        index.location("pins_read"),
        Some(&SearchLocation::Uncategorized)
    );
}

#[test]
fn tree_entries_win_over_collapsed_recordings() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let cat = tree.alloc(NodeKind::Category(CategoryData::new("pins", "Pins", 50.0)));
    tree.append_child(root, cat);
    let leaf = tree.alloc(NodeKind::Leaf(LeafData::new(
        BlockDescriptor::bare("pins_read"),
        50.0,
    )));
    tree.append_child(cat, leaf);

    let index = SearchIndex::build(&tree, &["pins_read".to_string()]);
    assert_eq!(
        index.location("pins_read"),
        Some(&SearchLocation::Category("Pins".to_string()))
    );
}

#[test]
fn filtered_out_blocks_never_reach_the_index() {
    let mut req = request(vec![
        block("motion.move", "motion_move", "50"),
        block("motion.turn", "motion_turn", "50"),
    ]);
    req.filters
        .blocks
        .insert("motion_turn".to_string(), FilterState::Hidden);

    let mut builder = ToolboxBuilder::new();
    builder.submit(req);
    let output = builder.pump().unwrap();
    assert!(output.search.contains("motion_move"));
    assert!(!output.search.contains("motion_turn"));
}

#[test]
fn hidden_collapsed_blocks_leave_the_index_and_the_advanced_section() {
    let mut adv_ns = blockforge::model::Symbol {
        qualified_name: "pins".to_string(),
        name: "pins".to_string(),
        namespace: String::new(),
        kind: blockforge::model::SymbolKind::Namespace,
        ret_type: String::new(),
        parameters: Vec::new(),
        attributes: Default::default(),
        extends_types: Vec::new(),
        combined_properties: Vec::new(),
    };
    adv_ns.attributes.advanced = true;

    let mut req = request(vec![block("pins.read", "pins_read", "50")]);
    req.catalog = blockforge::model::SymbolCatalog::new(vec![
        adv_ns,
        block("pins.read", "pins_read", "50"),
    ]);
    req.filters
        .namespaces
        .insert("pins".to_string(), FilterState::Hidden);

    let mut builder = ToolboxBuilder::new();
    builder.submit(req);
    let output = builder.pump().unwrap();

    assert!(!output.search.contains("pins_read"));
    // With nothing collapsed left, the advanced placeholder is gone too.
    assert!(output
        .tree
        .find_child_category(output.tree.root(), "advanced")
        .is_none());
}

#[test]
fn disabled_blocks_stay_searchable() {
    let mut req = request(vec![block("motion.move", "motion_move", "50")]);
    req.filters
        .blocks
        .insert("motion_move".to_string(), FilterState::Disabled);

    let mut builder = ToolboxBuilder::new();
    builder.submit(req);
    let output = builder.pump().unwrap();
    assert!(output.search.contains("motion_move"));
}
