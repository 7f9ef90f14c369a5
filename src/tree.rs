//! Category and leaf insertion rules.
//!
//! Ordering invariants enforced here:
//! - advanced categories always sort after every non-advanced sibling,
//!   irrespective of weight;
//! - siblings order weight-descending with a stable first-seen tie-break;
//! - subcategories unknown to the declared order list insert alphabetically
//!   below the pinned weight band (≥ 1000) and above the trailing "more"
//!   bucket (weight 1), after which the alphabetical band is renumbered to
//!   descending weights starting at 200;
//! - leaves with weight > 50 in builtin reorderable categories are pinned
//!   above ordinary leaves.

use indexmap::IndexMap;

use crate::arena::{CategoryData, LabelData, NodeId, NodeKind, ToolboxTree};
use crate::builtins::is_builtin_category;

/// Implicit group for leaves without a group tag; never gets a header.
pub const IMPLICIT_GROUP: &str = "other";

/// Weight assigned to freshly created by-name subcategories before the
/// renumbering pass.
const BY_NAME_INITIAL_WEIGHT: f64 = 100.0;

/// First weight of the renumbered alphabetical band.
const BY_NAME_BAND_START: f64 = 200.0;

/// Subcategories at or above this weight are pinned (declared order list).
const PINNED_BAND: f64 = 1000.0;

/// Weight of the reserved trailing "more" bucket.
const TRAILING_BUCKET_WEIGHT: f64 = 1.0;

impl ToolboxTree {
    /// Insert a node among the top-level (or any parent's) categories under
    /// the weighted-ordering rules. Advanced nodes skip past all
    /// non-advanced siblings first; otherwise the node lands before the
    /// first sibling whose weight is less than `weight`, or at the end.
    ///
    /// Also used for separators; only category siblings take part in the
    /// ordering scan.
    pub fn insert_top_category(
        &mut self,
        parent: NodeId,
        node: NodeId,
        weight: f64,
        is_advanced: bool,
    ) {
        if is_advanced {
            if let Some(cat) = self.category_mut(node) {
                cat.is_advanced = true;
            }
        }
        for sib in self.child_categories(parent) {
            let Some((sib_weight, sib_advanced)) =
                self.category(sib).map(|c| (c.weight, c.is_advanced))
            else {
                continue;
            };
            if is_advanced {
                if !sib_advanced {
                    continue;
                }
            } else if sib_advanced {
                // Advanced siblings always come last.
                self.insert_before(parent, node, sib);
                return;
            }
            if sib_weight < weight {
                self.insert_before(parent, node, sib);
                return;
            }
        }
        self.append_child(parent, node);
    }

    /// Return the existing subcategory with a matching id, or create one at
    /// the position dictated by `weight`. An existing category keeps its
    /// advanced flag and metadata (first registration wins).
    pub fn get_or_create_subcategory_weighted(
        &mut self,
        parent: NodeId,
        display_name: &str,
        id: &str,
        weight: f64,
        color: Option<String>,
        icon: Option<String>,
    ) -> NodeId {
        if let Some(existing) = self.find_child_category(parent, id) {
            return existing;
        }
        let mut data = CategoryData::new(id, display_name, weight);
        data.color = color;
        data.icon = icon;
        let node = self.alloc(NodeKind::Category(data));
        for sib in self.child_categories(parent) {
            if self.category(sib).map(|c| c.weight < weight).unwrap_or(false) {
                self.insert_before(parent, node, sib);
                return node;
            }
        }
        self.append_child(parent, node);
        node
    }

    /// Return the existing subcategory with a matching id, or create one
    /// inserted alphabetically: below the pinned weight band, above the
    /// trailing "more" bucket. After insertion the alphabetical band is
    /// renumbered to descending weights starting at 200, preserving the
    /// relative order of siblings (ties keep insertion order).
    pub fn get_or_create_subcategory_by_name(
        &mut self,
        parent: NodeId,
        display_name: &str,
        id: &str,
        color: Option<String>,
        icon: Option<String>,
    ) -> NodeId {
        if let Some(existing) = self.find_child_category(parent, id) {
            return existing;
        }
        let mut data = CategoryData::new(id, display_name, BY_NAME_INITIAL_WEIGHT);
        data.color = color;
        data.icon = icon;
        let node = self.alloc(NodeKind::Category(data));

        let mut band: Vec<NodeId> = Vec::new();
        let mut inserted = false;
        let mut trailing: Option<NodeId> = None;
        for sib in self.child_categories(parent) {
            let Some((sib_weight, sib_name)) = self
                .category(sib)
                .map(|c| (c.weight, c.display_name.clone()))
            else {
                continue;
            };
            if sib_weight >= PINNED_BAND {
                continue;
            }
            if sib_weight == TRAILING_BUCKET_WEIGHT {
                trailing = Some(sib);
                break;
            }
            band.push(sib);
            if !inserted && sib_name.as_str() >= display_name {
                self.insert_before(parent, node, sib);
                let pos = band.len() - 1;
                band.insert(pos, node);
                inserted = true;
            }
        }
        if !inserted {
            band.push(node);
            match trailing {
                Some(t) => self.insert_before(parent, node, t),
                None => self.append_child(parent, node),
            }
        }
        for (i, &member) in band.iter().enumerate() {
            if let Some(c) = self.category_mut(member) {
                c.weight = BY_NAME_BAND_START - i as f64;
            }
        }
        node
    }

    /// Insert a leaf into a category. In builtin reorderable categories a
    /// weight > 50 pins the leaf above every non-pinned leaf; everything
    /// else appends. The group tag is recorded for the later grouping pass.
    pub fn insert_leaf(
        &mut self,
        category: NodeId,
        leaf: NodeId,
        weight: f64,
        group: Option<String>,
    ) {
        if let Some(data) = self.leaf_mut(leaf) {
            data.weight = weight;
            if group.is_some() {
                data.group = group;
            }
        }
        let builtin = self
            .category(category)
            .map(|c| is_builtin_category(&c.id))
            .unwrap_or(false);
        if builtin && weight > 50.0 {
            if let Some(data) = self.leaf_mut(leaf) {
                data.pinned = true;
            }
            let first_unpinned = self
                .children(category)
                .iter()
                .copied()
                .find(|&n| self.leaf(n).map(|l| !l.pinned).unwrap_or(false));
            match first_unpinned {
                Some(anchor) => self.insert_before(category, leaf, anchor),
                None => self.append_child(category, leaf),
            }
        } else {
            self.append_child(category, leaf);
        }
    }

    /// Partition a category's direct leaves by group tag and re-append them
    /// in declared group order (missing groups appended alphabetically),
    /// inserting a label header before each non-empty group except the
    /// implicit "other" group. Only rearranges when more than one group is
    /// present.
    pub fn arrange_groups(&mut self, category: NodeId) {
        let leaves = self.child_leaves(category);
        let (declared, declared_icons) = match self.category(category) {
            Some(c) => (c.group_order.clone(), c.group_icons.clone()),
            None => return,
        };

        let mut groups: IndexMap<String, Vec<NodeId>> = IndexMap::new();
        for leaf in leaves {
            let group = self
                .leaf(leaf)
                .and_then(|l| l.group.clone())
                .unwrap_or_else(|| IMPLICIT_GROUP.to_string());
            groups.entry(group).or_default().push(leaf);
        }
        if groups.len() <= 1 {
            return;
        }

        let mut ordered = declared.clone();
        let mut missing: Vec<&String> = groups.keys().filter(|g| !ordered.contains(g)).collect();
        missing.sort();
        let missing: Vec<String> = missing.into_iter().cloned().collect();
        ordered.extend(missing);

        for group in &ordered {
            let Some(members) = groups.get(group) else {
                continue;
            };
            if members.is_empty() {
                continue;
            }
            if group != IMPLICIT_GROUP {
                let icon = declared
                    .iter()
                    .position(|g| g == group)
                    .and_then(|i| declared_icons.get(i))
                    .filter(|s| !s.is_empty())
                    .cloned();
                let label = self.alloc(NodeKind::Label(LabelData {
                    text: group.clone(),
                    icon,
                }));
                self.append_child(category, label);
            }
            for &member in members.clone().iter() {
                self.append_child(category, member);
            }
        }
    }
}
