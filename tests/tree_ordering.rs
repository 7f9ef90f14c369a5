//! Category and leaf ordering rules.

use blockforge::arena::{CategoryData, LeafData, NodeId, NodeKind, ToolboxTree};
use blockforge::descriptor::BlockDescriptor;

fn category(tree: &mut ToolboxTree, id: &str, weight: f64) -> NodeId {
    tree.alloc(NodeKind::Category(CategoryData::new(
        id,
        id.to_uppercase(),
        weight,
    )))
}

fn leaf(tree: &mut ToolboxTree, block_id: &str, weight: f64) -> NodeId {
    tree.alloc(NodeKind::Leaf(LeafData::new(
        BlockDescriptor::bare(block_id),
        weight,
    )))
}

fn category_ids(tree: &ToolboxTree, parent: NodeId) -> Vec<String> {
    tree.child_categories(parent)
        .into_iter()
        .map(|c| tree.category(c).unwrap().id.clone())
        .collect()
}

fn leaf_ids(tree: &ToolboxTree, parent: NodeId) -> Vec<String> {
    tree.child_leaves(parent)
        .into_iter()
        .map(|l| tree.leaf(l).unwrap().block_id.clone())
        .collect()
}

#[test]
fn top_categories_order_by_weight_descending() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    for (id, weight) in [("mid", 50.0), ("heavy", 90.0), ("light", 10.0)] {
        let cat = category(&mut tree, id, weight);
        tree.insert_top_category(root, cat, weight, false);
    }
    assert_eq!(category_ids(&tree, root), ["heavy", "mid", "light"]);
}

#[test]
fn equal_weights_keep_insertion_order() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    for id in ["first", "second", "third"] {
        let cat = category(&mut tree, id, 50.0);
        tree.insert_top_category(root, cat, 50.0, false);
    }
    assert_eq!(category_ids(&tree, root), ["first", "second", "third"]);
}

#[test]
fn advanced_categories_sort_after_all_others() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let adv = category(&mut tree, "adv", 99.0);
    tree.insert_top_category(root, adv, 99.0, true);
    let light = category(&mut tree, "light", 5.0);
    tree.insert_top_category(root, light, 5.0, false);
    let adv2 = category(&mut tree, "adv2", 1.0);
    tree.insert_top_category(root, adv2, 1.0, true);

    // Non-advanced at weight 5 still precedes advanced at weight 99.
    assert_eq!(category_ids(&tree, root), ["light", "adv", "adv2"]);
}

#[test]
fn advanced_categories_order_by_weight_among_themselves() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    for (id, weight) in [("a_low", 10.0), ("a_high", 80.0)] {
        let cat = category(&mut tree, id, weight);
        tree.insert_top_category(root, cat, weight, true);
    }
    assert_eq!(category_ids(&tree, root), ["a_high", "a_low"]);
}

#[test]
fn weighted_subcategory_reuses_existing_id_case_insensitively() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let parent = category(&mut tree, "sprites", 50.0);
    tree.append_child(root, parent);

    let first =
        tree.get_or_create_subcategory_weighted(parent, "Effects", "Effects", 9999.0, None, None);
    let second =
        tree.get_or_create_subcategory_weighted(parent, "effects", "EFFECTS", 10.0, None, None);
    assert_eq!(first, second);
    assert_eq!(tree.category(first).unwrap().weight, 9999.0);
}

#[test]
fn by_name_subcategories_insert_alphabetically_and_renumber() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let parent = category(&mut tree, "game", 50.0);
    tree.append_child(root, parent);

    for name in ["Delta", "Alpha", "Charlie", "Bravo"] {
        tree.get_or_create_subcategory_by_name(parent, name, name, None, None);
    }
    let names: Vec<String> = tree
        .child_categories(parent)
        .into_iter()
        .map(|c| tree.category(c).unwrap().display_name.clone())
        .collect();
    assert_eq!(names, ["Alpha", "Bravo", "Charlie", "Delta"]);

    // Renumbered band: descending from 200.
    let weights: Vec<f64> = tree
        .child_categories(parent)
        .into_iter()
        .map(|c| tree.category(c).unwrap().weight)
        .collect();
    assert_eq!(weights, [200.0, 199.0, 198.0, 197.0]);
}

#[test]
fn by_name_insertion_skips_pinned_band_and_stops_at_trailing_bucket() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let parent = category(&mut tree, "game", 50.0);
    tree.append_child(root, parent);

    // A declared (pinned) subcategory and the trailing "more" bucket.
    tree.get_or_create_subcategory_weighted(parent, "Zetas", "zetas", 10000.0, None, None);
    tree.get_or_create_subcategory_weighted(parent, "More", "more", 1.0, None, None);

    tree.get_or_create_subcategory_by_name(parent, "Alpha", "alpha", None, None);
    tree.get_or_create_subcategory_by_name(parent, "Beta", "beta", None, None);

    let ids = category_ids(&tree, parent);
    assert_eq!(ids, ["zetas", "alpha", "beta", "more"]);

    // Pinned and trailing weights are untouched by the renumber pass.
    let zetas = tree.find_child_category(parent, "zetas").unwrap();
    let more = tree.find_child_category(parent, "more").unwrap();
    assert_eq!(tree.category(zetas).unwrap().weight, 10000.0);
    assert_eq!(tree.category(more).unwrap().weight, 1.0);
}

#[test]
fn heavy_leaves_pin_above_ordinary_ones_in_builtin_categories() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let math = category(&mut tree, "math", 50.0);
    tree.append_child(root, math);

    let plain = leaf(&mut tree, "math_plain", 40.0);
    tree.insert_leaf(math, plain, 40.0, None);
    let pinned = leaf(&mut tree, "math_pinned", 60.0);
    tree.insert_leaf(math, pinned, 60.0, None);
    let later_plain = leaf(&mut tree, "math_later", 45.0);
    tree.insert_leaf(math, later_plain, 45.0, None);

    assert_eq!(leaf_ids(&tree, math), ["math_pinned", "math_plain", "math_later"]);
    assert!(tree.leaf(pinned).unwrap().pinned);
    assert!(!tree.leaf(plain).unwrap().pinned);
}

#[test]
fn heavy_leaves_do_not_pin_in_user_categories() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let custom = category(&mut tree, "sprites", 50.0);
    tree.append_child(root, custom);

    let a = leaf(&mut tree, "a", 40.0);
    tree.insert_leaf(custom, a, 40.0, None);
    let b = leaf(&mut tree, "b", 90.0);
    tree.insert_leaf(custom, b, 90.0, None);

    assert_eq!(leaf_ids(&tree, custom), ["a", "b"]);
}

#[test]
fn group_arrangement_orders_declared_then_alphabetical_with_labels() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let cat = category(&mut tree, "game", 50.0);
    tree.append_child(root, cat);
    tree.category_mut(cat).unwrap().group_order = vec!["Setup".to_string(), "Play".to_string()];

    for (id, group) in [
        ("g1", Some("Play")),
        ("g2", Some("Setup")),
        ("g3", None),
        ("g4", Some("Zoo")),
        ("g5", Some("Art")),
    ] {
        let l = leaf(&mut tree, id, 50.0);
        tree.insert_leaf(cat, l, 50.0, group.map(str::to_string));
    }
    tree.arrange_groups(cat);

    let mut sequence = Vec::new();
    for child in tree.children(cat) {
        match tree.kind(*child) {
            NodeKind::Label(l) => sequence.push(format!("label:{}", l.text)),
            NodeKind::Leaf(l) => sequence.push(l.block_id.clone()),
            _ => {}
        }
    }
    assert_eq!(
        sequence,
        [
            "label:Setup",
            "g2",
            "label:Play",
            "g1",
            "label:Art",
            "g5",
            "label:Zoo",
            "g4",
            "g3",
        ]
    );
}

#[test]
fn single_group_categories_are_left_untouched() {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    let cat = category(&mut tree, "game", 50.0);
    tree.append_child(root, cat);
    for id in ["a", "b"] {
        let l = leaf(&mut tree, id, 50.0);
        tree.insert_leaf(cat, l, 50.0, None);
    }
    tree.arrange_groups(cat);
    assert_eq!(leaf_ids(&tree, cat), ["a", "b"]);
    assert_eq!(tree.children(cat).len(), 2);
}
