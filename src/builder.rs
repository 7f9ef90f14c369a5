//! Rebuild orchestration.
//!
//! The builder owns the incremental cache and runs the full pipeline for a
//! submitted request: skeleton, catalog pre-sort, synthesis and placement,
//! extras and extension buttons, the advanced section, filtering, group
//! arrangement, and the search index. Requests submitted while one is
//! queued coalesce; only the most recent request is built, and search
//! resolutions against a superseded generation are discarded.

use anyhow::{bail, Result};

use crate::arena::{ButtonData, CategoryData, LeafData, NodeId, NodeKind, ToolboxTree};
use crate::builtins::{
    builtin_toolbox, category_color, ADVANCED_CATEGORY_ID, ADVANCED_CATEGORY_NAME,
    MORE_CATEGORY_ID, MORE_CATEGORY_NAME,
};
use crate::cache::IncrementalCache;
use crate::descriptor::{BlockDescriptor, FieldValue};
use crate::filter::apply_filters;
use crate::model::{
    parse_weight, CategoryMode, Diagnostic, ExtensionDescriptor, ExtraBlock, FilterSpec,
    FilterState, Symbol, SymbolCatalog, DEFAULT_WEIGHT,
};
use crate::search::SearchIndex;
use crate::synth::{capitalize, synthesize};

/// Weight of the separator preceding the advanced section.
const ADVANCED_SEPARATOR_WEIGHT: f64 = 1.5;

/// Weight of the collapsed "Advanced" placeholder category.
const ADVANCED_CATEGORY_WEIGHT: f64 = 1.0;

/// Weight of a category created only to host an extension button.
const EXTENSION_CATEGORY_WEIGHT: f64 = 55.0;

/// Weight of the reserved trailing "more" bucket.
const MORE_BUCKET_WEIGHT: f64 = 1.0;

/// Base weight of declared subcategories; index in the declared order list
/// is subtracted so earlier declarations sort first.
const DECLARED_SUBCATEGORY_BASE: f64 = 10000.0;

/// One full rebuild input. Submitting a new request supersedes any queued
/// one that has not started building yet.
#[derive(Debug, Clone, Default)]
pub struct RebuildRequest {
    pub catalog: SymbolCatalog,
    pub filters: FilterSpec,
    pub mode: CategoryMode,
    /// Pre-existing tree to extend instead of the builtin skeleton.
    pub skeleton: Option<ToolboxTree>,
    pub extensions: Vec<ExtensionDescriptor>,
    pub extra_blocks: Vec<ExtraBlock>,
}

/// Pipeline phase, observable between pumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildPhase {
    #[default]
    Idle,
    Building,
    Synthesizing,
    Filtering,
    Indexing,
    Ready,
}

/// Result of one completed rebuild.
#[derive(Debug, Clone)]
pub struct RebuildOutput {
    pub generation: u64,
    pub tree: ToolboxTree,
    pub search: SearchIndex,
    pub diagnostics: Vec<Diagnostic>,
}

/// Owns the cache and the coalescing request queue.
#[derive(Debug, Default)]
pub struct ToolboxBuilder {
    cache: IncrementalCache,
    phase: RebuildPhase,
    next_generation: u64,
    pending: Option<RebuildRequest>,
    latest: Option<RebuildOutput>,
}

impl ToolboxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a rebuild request, replacing any not-yet-started one.
    pub fn submit(&mut self, request: RebuildRequest) {
        if self.pending.replace(request).is_some() {
            log::debug!("superseding queued rebuild request");
        }
    }

    /// Run the most recent queued request to completion. Returns the fresh
    /// output, or `None` when nothing was queued.
    pub fn pump(&mut self) -> Option<&RebuildOutput> {
        let request = self.pending.take()?;
        let generation = self.next_generation;
        self.next_generation += 1;
        let output = self.rebuild(generation, request);
        self.phase = RebuildPhase::Ready;
        self.latest = Some(output);
        self.latest.as_ref()
    }

    pub fn phase(&self) -> RebuildPhase {
        self.phase
    }

    pub fn latest(&self) -> Option<&RebuildOutput> {
        self.latest.as_ref()
    }

    /// Total descriptor compilations performed so far; unchanged symbols
    /// reuse cached descriptors and do not bump this.
    pub fn compile_count(&self) -> u64 {
        self.cache.compile_count()
    }

    /// Resolve a search result set produced against `generation`. Returns
    /// the ids still placeable, or `None` when the generation has been
    /// superseded by a later rebuild.
    pub fn resolve_search(&self, generation: u64, block_ids: &[String]) -> Option<Vec<String>> {
        let latest = self.latest.as_ref()?;
        if latest.generation != generation {
            log::debug!(
                "discarding search resolution for superseded generation {}",
                generation
            );
            return None;
        }
        Some(
            block_ids
                .iter()
                .filter(|id| latest.search.contains(id))
                .cloned()
                .collect(),
        )
    }

    // ── pipeline ────────────────────────────────────────────────────────

    fn rebuild(&mut self, generation: u64, mut request: RebuildRequest) -> RebuildOutput {
        let mut diagnostics = Vec::new();
        // (block id, owning namespace) pairs recorded while collapsing
        // advanced content; they stay searchable without being shown.
        let mut collapsed: Vec<(String, String)> = Vec::new();

        self.phase = RebuildPhase::Building;
        let mut tree = match (request.mode, request.skeleton.take()) {
            (CategoryMode::Flat, _) => ToolboxTree::new(),
            (_, Some(skeleton)) => skeleton,
            _ => builtin_toolbox(),
        };
        if request.mode == CategoryMode::Basic {
            collapse_advanced_categories(&mut tree, &mut collapsed);
        }

        // Stale cache entries for removed symbols must not survive.
        {
            let known: Vec<String> = request
                .catalog
                .blocks()
                .filter_map(|s| s.attributes.block_id.clone())
                .collect();
            self.cache.purge_absent(|id| known.iter().any(|k| k == id));
        }

        self.phase = RebuildPhase::Synthesizing;
        let ordered = presort_catalog(&request.catalog);
        for symbol in ordered {
            self.place_symbol(
                &mut tree,
                symbol,
                &request,
                &mut collapsed,
                &mut diagnostics,
            );
        }

        insert_extra_blocks(&mut tree, &request.extra_blocks, &mut diagnostics);
        insert_extension_buttons(&mut tree, &request.extensions, &request.catalog, request.mode);

        if request.mode == CategoryMode::Basic && !collapsed.is_empty() {
            insert_advanced_section(&mut tree);
        }

        self.phase = RebuildPhase::Filtering;
        apply_filters(&mut tree, &request.filters);

        // Collapsed blocks obey the same filter resolution as placed ones,
        // and an advanced section with nothing left behind it disappears.
        if !request.filters.is_empty() {
            collapsed.retain(|(id, ns)| {
                request
                    .filters
                    .block_state(id, request.filters.namespace_state(ns))
                    != Some(FilterState::Hidden)
            });
        }
        prune_empty_advanced_section(&mut tree, &collapsed);

        for cat in tree.all_categories() {
            let advanced = tree
                .category(cat)
                .map(|c| c.id == ADVANCED_CATEGORY_ID)
                .unwrap_or(false);
            if !advanced {
                tree.arrange_groups(cat);
            }
        }

        self.phase = RebuildPhase::Indexing;
        let collapsed_ids: Vec<String> = collapsed.into_iter().map(|(id, _)| id).collect();
        let search = SearchIndex::build(&tree, &collapsed_ids);

        RebuildOutput {
            generation,
            tree,
            search,
            diagnostics,
        }
    }

    /// Synthesize one symbol's leaves and route them into the tree.
    fn place_symbol(
        &mut self,
        tree: &mut ToolboxTree,
        symbol: &Symbol,
        request: &RebuildRequest,
        collapsed: &mut Vec<(String, String)>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let leaves = synthesize(symbol, &request.catalog, &mut self.cache, diagnostics);
        if leaves.is_empty() {
            return;
        }
        // Hidden and deprecated blocks compile (and stay cached) but are
        // never placed.
        if symbol.attributes.hidden || symbol.attributes.deprecated {
            return;
        }
        // Ids already present in the supplied skeleton are not re-inserted.
        if leaves
            .first()
            .map(|l| tree.contains_block(&l.descriptor.block_id))
            .unwrap_or(false)
        {
            return;
        }

        let root = tree.root();
        if request.mode == CategoryMode::Flat {
            for leaf in leaves {
                let node = tree.alloc(NodeKind::Leaf(LeafData::new(leaf.descriptor, leaf.weight)));
                tree.insert_leaf(root, node, leaf.weight, leaf.group);
            }
            return;
        }

        let ns = symbol.effective_namespace().to_string();
        let ns_sym = request.catalog.lookup(&ns);
        let ns_advanced = ns_sym.map(|s| s.attributes.advanced).unwrap_or(false);

        if ns_advanced && request.mode == CategoryMode::Basic {
            for leaf in &leaves {
                collapsed.push((leaf.descriptor.block_id.clone(), ns.clone()));
            }
            return;
        }

        let category = self.top_category(tree, &ns, ns_sym, ns_advanced, diagnostics);
        let target = subcategory_target(tree, category, symbol, ns_sym);
        for leaf in leaves {
            let node = tree.alloc(NodeKind::Leaf(LeafData::new(leaf.descriptor, leaf.weight)));
            tree.insert_leaf(target, node, leaf.weight, leaf.group);
        }
    }

    /// Find or create the top-level category for a namespace.
    fn top_category(
        &mut self,
        tree: &mut ToolboxTree,
        ns: &str,
        ns_sym: Option<&Symbol>,
        ns_advanced: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> NodeId {
        let root = tree.root();
        if let Some(existing) = tree.find_child_category(root, ns) {
            apply_namespace_metadata(tree, existing, ns_sym);
            return existing;
        }
        let attrs = ns_sym.map(|s| &s.attributes);
        let weight = match attrs.and_then(|a| a.weight.as_deref()) {
            Some(raw) => parse_weight(Some(raw), ns, diagnostics),
            None => DEFAULT_WEIGHT,
        };
        let display_name = attrs
            .and_then(|a| a.block.clone())
            .unwrap_or_else(|| capitalize(ns));
        let mut data = CategoryData::new(ns, display_name, weight);
        data.color = attrs
            .and_then(|a| a.color.clone())
            .or_else(|| category_color(ns).map(str::to_string));
        data.icon = attrs.and_then(|a| a.icon.clone());
        let node = tree.alloc(NodeKind::Category(data));
        tree.insert_top_category(root, node, weight, ns_advanced);
        apply_namespace_metadata(tree, node, ns_sym);
        node
    }
}

/// Copy group declarations from the namespace symbol onto its category.
fn apply_namespace_metadata(tree: &mut ToolboxTree, category: NodeId, ns_sym: Option<&Symbol>) {
    let Some(ns_sym) = ns_sym else {
        return;
    };
    if let Some(data) = tree.category_mut(category) {
        if data.group_order.is_empty() {
            data.group_order = ns_sym.attributes.group_order.clone();
            data.group_icons = ns_sym.attributes.group_icons.clone();
        }
    }
}

/// Block symbols ordered by namespace weight descending, then block weight
/// descending, so heavier categories and heavier blocks are placed first.
fn presort_catalog(catalog: &SymbolCatalog) -> Vec<&Symbol> {
    fn lenient_weight(raw: Option<&str>) -> f64 {
        raw.and_then(|r| r.trim().parse::<f64>().ok())
            .filter(|w| w.is_finite())
            .unwrap_or(DEFAULT_WEIGHT)
    }
    let mut blocks: Vec<(&Symbol, f64, f64)> = catalog
        .blocks()
        .map(|s| {
            let ns_weight = lenient_weight(
                catalog
                    .lookup(s.effective_namespace())
                    .and_then(|n| n.attributes.weight.as_deref()),
            );
            let block_weight = lenient_weight(s.attributes.weight.as_deref());
            (s, ns_weight, block_weight)
        })
        .collect();
    blocks.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
    });
    blocks.into_iter().map(|(s, _, _)| s).collect()
}

/// Route a symbol below its top-level category: a declared subcategory gets
/// a pinned weight from its declaration index, an undeclared one inserts
/// alphabetically, and a symbol-level advanced flag lands in the trailing
/// "more" bucket.
fn subcategory_target(
    tree: &mut ToolboxTree,
    category: NodeId,
    symbol: &Symbol,
    ns_sym: Option<&Symbol>,
) -> NodeId {
    let inherited_color = tree.category(category).and_then(|c| c.color.clone());

    if let Some(sub) = symbol.attributes.subcategory.as_deref() {
        let declared_idx = ns_sym.and_then(|s| {
            s.attributes
                .subcategories
                .iter()
                .position(|d| d.eq_ignore_ascii_case(sub))
        });
        return match declared_idx {
            Some(idx) => tree.get_or_create_subcategory_weighted(
                category,
                sub,
                sub,
                DECLARED_SUBCATEGORY_BASE - idx as f64,
                inherited_color,
                None,
            ),
            None => tree.get_or_create_subcategory_by_name(category, sub, sub, inherited_color, None),
        };
    }

    if symbol.attributes.advanced {
        return tree.get_or_create_subcategory_weighted(
            category,
            MORE_CATEGORY_NAME,
            MORE_CATEGORY_ID,
            MORE_BUCKET_WEIGHT,
            inherited_color,
            None,
        );
    }

    category
}

/// Insert pre-registered blocks into their named categories.
fn insert_extra_blocks(
    tree: &mut ToolboxTree,
    extras: &[ExtraBlock],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let root = tree.root();
    for extra in extras {
        let Some(category) = tree.find_child_category(root, &extra.namespace) else {
            log::warn!(
                "extra block {} targets unknown category {}",
                extra.block_id,
                extra.namespace
            );
            diagnostics.push(Diagnostic::UnknownCategory {
                block_id: extra.block_id.clone(),
                category: extra.namespace.clone(),
            });
            continue;
        };
        let mut descriptor = BlockDescriptor::bare(&extra.block_id);
        descriptor.gap = extra.gap;
        descriptor.fields = extra
            .fields
            .iter()
            .map(|(name, value)| FieldValue {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        let weight = extra.weight.unwrap_or(DEFAULT_WEIGHT);
        let node = tree.alloc(NodeKind::Leaf(LeafData::new(descriptor, weight)));
        tree.insert_leaf(category, node, weight, None);
    }
}

/// Place one button at the top of each extension's category, creating the
/// category when the extension's namespace contributed no blocks.
fn insert_extension_buttons(
    tree: &mut ToolboxTree,
    extensions: &[ExtensionDescriptor],
    catalog: &SymbolCatalog,
    mode: CategoryMode,
) {
    let root = tree.root();
    for ext in extensions {
        if ext.advanced && mode == CategoryMode::Basic {
            continue;
        }
        let ns = ext.namespace.as_deref().unwrap_or(&ext.name).to_string();
        let category = match tree.find_child_category(root, &ns) {
            Some(cat) => cat,
            None => {
                let display_name = catalog
                    .lookup(&ns)
                    .and_then(|s| s.attributes.block.clone())
                    .unwrap_or_else(|| capitalize(&ns));
                let mut data = CategoryData::new(&ns, display_name, EXTENSION_CATEGORY_WEIGHT);
                data.color = ext.color.clone().or_else(|| category_color(&ns).map(str::to_string));
                let node = tree.alloc(NodeKind::Category(data));
                tree.insert_top_category(root, node, EXTENSION_CATEGORY_WEIGHT, ext.advanced);
                node
            }
        };
        let button = tree.alloc(NodeKind::Button(ButtonData {
            label: ext.label.clone().unwrap_or_else(|| ext.name.clone()),
            callback_key: ext.name.clone(),
        }));
        match tree.children(category).first().copied() {
            Some(first) => tree.insert_before(category, button, first),
            None => tree.append_child(category, button),
        }
    }
}

/// Collapse skeleton categories flagged advanced: remove them from the tree
/// and record their block ids so they stay searchable.
fn collapse_advanced_categories(tree: &mut ToolboxTree, collapsed: &mut Vec<(String, String)>) {
    let root = tree.root();
    for cat in tree.child_categories(root) {
        let Some((id, advanced)) = tree.category(cat).map(|c| (c.id.clone(), c.is_advanced))
        else {
            continue;
        };
        if !advanced {
            continue;
        }
        for leaf in tree.leaves_under(cat) {
            if let Some(data) = tree.leaf(leaf) {
                collapsed.push((data.block_id.clone(), id.clone()));
            }
        }
        tree.remove(cat);
    }
}

/// Drop the advanced placeholder and its separator when nothing is left
/// behind them after filtering.
fn prune_empty_advanced_section(tree: &mut ToolboxTree, collapsed: &[(String, String)]) {
    let root = tree.root();
    let Some(advanced) = tree.find_child_category(root, ADVANCED_CATEGORY_ID) else {
        return;
    };
    if !collapsed.is_empty() || !tree.leaves_under(advanced).is_empty() {
        return;
    }
    tree.remove(advanced);
    let separator = tree
        .children(root)
        .iter()
        .copied()
        .find(|&n| matches!(tree.kind(n), NodeKind::Separator { .. }));
    if let Some(separator) = separator {
        tree.remove(separator);
    }
}

/// Append the collapsed advanced section: a separator, then the "Advanced"
/// placeholder category, both below every ordinary category.
fn insert_advanced_section(tree: &mut ToolboxTree) {
    let root = tree.root();
    if tree.find_child_category(root, ADVANCED_CATEGORY_ID).is_some() {
        return;
    }
    let mut data = CategoryData::new(
        ADVANCED_CATEGORY_ID,
        ADVANCED_CATEGORY_NAME,
        ADVANCED_CATEGORY_WEIGHT,
    );
    data.color = category_color(ADVANCED_CATEGORY_ID).map(str::to_string);
    let advanced = tree.alloc(NodeKind::Category(data));
    tree.insert_top_category(root, advanced, ADVANCED_CATEGORY_WEIGHT, true);

    let separator = tree.alloc(NodeKind::Separator {
        weight: ADVANCED_SEPARATOR_WEIGHT,
    });
    tree.insert_top_category(root, separator, ADVANCED_SEPARATOR_WEIGHT, false);
}

/// Convenience entry point: build once from a request without managing a
/// builder. Fails when the request produced no placeable content at all.
pub fn build_once(request: RebuildRequest) -> Result<RebuildOutput> {
    let mut builder = ToolboxBuilder::new();
    builder.submit(request);
    let output = builder.pump().cloned();
    match output {
        Some(out) => Ok(out),
        None => bail!("no rebuild request queued"),
    }
}
