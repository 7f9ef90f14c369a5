//! Symbol catalog data model.
//!
//! These types describe the *input* side of the palette pipeline: callable
//! symbols with declarative block metadata, the filter specification, and the
//! diagnostic events a rebuild can emit. Parsing raw declarations into this
//! model is an external concern; everything here arrives pre-parsed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Symbols
// ────────────────────────────────────────────────────────────────────────────

/// Kind of a catalog symbol.
///
/// `Namespace` entries carry the category-level metadata (weight, color,
/// declared subcategories) for the namespace they name. `Enum` entries are
/// the enum *types*; their members are separate `EnumMember` symbols whose
/// `namespace` is the enum's qualified name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Method,
    Property,
    Variable,
    Enum,
    EnumMember,
    Namespace,
}

/// Numeric range declared on a parameter, rendered as a slider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub step: Option<f64>,
}

/// A single formal parameter of a symbol.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Parameter {
    /// Name used in the block definition template.
    pub definition_name: String,
    /// Name in the actual declaration (may differ from the template name).
    pub actual_name: String,
    /// Declared type (e.g. `"number"`, `"string"`, `"() => void"`, an enum
    /// qualified name, or `"@combined@"`).
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub is_optional: bool,
    /// Explicit placeholder block to nest into this parameter's slot.
    #[serde(default)]
    pub shadow_block_id: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub range: Option<Range>,
    /// Free-form field editor options (e.g. `step`, `color` for sliders).
    #[serde(default)]
    pub field_options: IndexMap<String, String>,
}

/// A named argument of a callback parameter, surfaced as a labeled slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Declarative block metadata attached to a symbol.
///
/// All fields are optional in the metadata source; lenient defaults apply.
/// `weight` is kept as the raw attribute string because malformed values must
/// degrade to the default weight with a diagnostic rather than fail parsing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SymbolAttributes {
    /// Raw weight attribute. Missing or malformed parses as 50.
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Block identifier; symbols without one produce no leaf.
    #[serde(default)]
    pub block_id: Option<String>,
    /// Explicit namespace override for categorization.
    #[serde(default)]
    pub block_namespace: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub advanced: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub hidden: bool,
    /// Mutation specification name; selects the `Mutated` synthesis strategy.
    #[serde(default)]
    pub mutate_spec: Option<String>,
    /// Semicolon-separated fixed variant tags (one leaf per tag).
    #[serde(default)]
    pub variant_tags: Option<String>,
    /// Semicolon-separated list of supported handler arities.
    #[serde(default)]
    pub variable_arity: Option<String>,
    #[serde(default)]
    pub handler_args: Vec<HandlerArg>,
    /// Whether the block remains chainable despite taking a callback.
    #[serde(default)]
    pub handler_statement: bool,
    #[serde(default)]
    pub shadow_block_id: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub range: Option<Range>,
    #[serde(default)]
    pub field_editor: Option<String>,
    /// Requests store-result wrapping; the value is the variable name
    /// override (may be empty, meaning "derive from the return type").
    #[serde(default)]
    pub store_result_as: Option<String>,
    /// Expandable-argument mode: `"enabled"`, `"toggle"` or `"disabled"`.
    #[serde(default)]
    pub expandable: Option<String>,
    /// Marks a fixed-instance value usable in fixed-instance dropdowns.
    #[serde(default)]
    pub fixed_instance: bool,
    /// Selects the `DefaultInstance` synthesis strategy.
    #[serde(default)]
    pub default_instance: bool,
    /// Block-identity tag linking a constant to the symbol it belongs to.
    #[serde(default)]
    pub constant_source: Option<String>,
    /// Group tag for the flyout grouping pass.
    #[serde(default)]
    pub group: Option<String>,
    /// Vertical gap after the block in the flyout.
    #[serde(default)]
    pub gap: Option<u32>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Declared subcategory order (namespace symbols only).
    #[serde(default)]
    pub subcategories: Vec<String>,
    /// Declared group order (namespace symbols only).
    #[serde(default)]
    pub group_order: Vec<String>,
    #[serde(default)]
    pub group_icons: Vec<String>,
    /// Parameter names referenced by the block definition template, in
    /// template order. Empty means "all parameters in declaration order".
    #[serde(default)]
    pub definition_params: Vec<String>,
    /// Display label override (on namespace symbols: the category display
    /// name).
    #[serde(default)]
    pub block: Option<String>,
}

/// A callable symbol (or namespace / enum descriptor) in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub qualified_name: String,
    /// Last segment of the qualified name.
    pub name: String,
    pub namespace: String,
    pub kind: SymbolKind,
    /// Declared return type (`"void"` for statements).
    #[serde(default)]
    pub ret_type: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub attributes: SymbolAttributes,
    /// Declared supertypes, used for output checks and fixed-instance
    /// subtype filtering.
    #[serde(default)]
    pub extends_types: Vec<String>,
    /// Qualified names backing the `@combined@` dropdown type.
    #[serde(default)]
    pub combined_properties: Vec<String>,
}

impl Symbol {
    /// Effective namespace for categorization: the explicit override if
    /// present, else the first segment of the declared namespace.
    pub fn effective_namespace(&self) -> &str {
        let ns = self
            .attributes
            .block_namespace
            .as_deref()
            .unwrap_or(&self.namespace);
        ns.split('.').next().unwrap_or(ns)
    }

    /// Whether any parameter is a callback (`(…) => …` shape).
    pub fn takes_callback(&self) -> bool {
        self.parameters.iter().any(|p| is_callback_type(&p.ty))
    }
}

/// Matches callback-typed parameters (`(…) => …` shapes).
pub fn is_callback_type(ty: &str) -> bool {
    let t = ty.trim_start();
    if !t.starts_with('(') {
        return false;
    }
    match t.find(')') {
        Some(close) => t[close + 1..].trim_start().starts_with("=>"),
        None => false,
    }
}

/// Matches arrays and tuple types (`Array<…>`, `T[]`, `[…]`).
pub fn is_array_type(ty: &str) -> bool {
    (ty.starts_with("Array<") && ty.ends_with('>'))
        || ty.ends_with("[]")
        || (ty.starts_with('[') && ty.ends_with(']'))
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

/// An ordered snapshot of all known symbols, indexed by qualified name.
///
/// Declaration order is semantic (enum dropdowns list members in catalog
/// order), so the index is an `IndexMap`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolCatalog {
    by_qname: IndexMap<String, Symbol>,
}

impl SymbolCatalog {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let mut by_qname = IndexMap::with_capacity(symbols.len());
        for sym in symbols {
            // First registration of a qualified name wins.
            by_qname.entry(sym.qualified_name.clone()).or_insert(sym);
        }
        SymbolCatalog { by_qname }
    }

    pub fn lookup(&self, qname: &str) -> Option<&Symbol> {
        self.by_qname.get(qname)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.by_qname.values()
    }

    /// Symbols that define a block (have a block id), in declaration order.
    pub fn blocks(&self) -> impl Iterator<Item = &Symbol> {
        self.by_qname
            .values()
            .filter(|s| s.attributes.block_id.is_some())
    }

    /// Whether `specific` names `general` or declares it as a supertype.
    pub fn is_subtype(&self, specific: &str, general: &str) -> bool {
        if specific == general {
            return true;
        }
        self.lookup(specific)
            .map(|s| s.extends_types.iter().any(|t| t == general))
            .unwrap_or(false)
    }

    /// Members of the enum type `enum_qname`, in declaration order.
    pub fn enum_members(&self, enum_qname: &str) -> Vec<&Symbol> {
        self.by_qname
            .values()
            .filter(|s| s.kind == SymbolKind::EnumMember && s.namespace == enum_qname)
            .collect()
    }

    /// Fixed-instance values whose type is compatible with `type_qname`.
    pub fn fixed_instances(&self, type_qname: &str) -> Vec<&Symbol> {
        self.by_qname
            .values()
            .filter(|s| s.attributes.fixed_instance && self.is_subtype(&s.ret_type, type_qname))
            .collect()
    }

    /// Constant values tagged with the block identity `owner_qname`.
    pub fn constants_for(&self, owner_qname: &str) -> Vec<&Symbol> {
        self.by_qname
            .values()
            .filter(|s| s.attributes.constant_source.as_deref() == Some(owner_qname))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filters
// ────────────────────────────────────────────────────────────────────────────

/// Three-state visibility for namespaces and individual blocks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FilterState {
    Hidden,
    Visible,
    Disabled,
}

/// Per-namespace and per-block visibility overrides plus a global default.
///
/// Resolution order for a leaf: block override, then namespace override, then
/// the global default. An unset state keeps the node but does not count as an
/// explicit `Visible` vote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub namespaces: IndexMap<String, FilterState>,
    #[serde(default)]
    pub blocks: IndexMap<String, FilterState>,
    #[serde(default)]
    pub default_state: Option<FilterState>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.blocks.is_empty() && self.default_state.is_none()
    }

    /// Resolved state for a block under a category whose own resolved state
    /// is `ns_state`.
    pub fn block_state(
        &self,
        block_id: &str,
        ns_state: Option<FilterState>,
    ) -> Option<FilterState> {
        self.blocks
            .get(block_id)
            .copied()
            .or(ns_state)
            .or(self.default_state)
    }

    /// Resolved state for a namespace (category id).
    pub fn namespace_state(&self, ns: &str) -> Option<FilterState> {
        self.namespaces.get(ns).copied().or(self.default_state)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder inputs
// ────────────────────────────────────────────────────────────────────────────

/// How categories are materialized in the output tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CategoryMode {
    /// Advanced namespaces are collapsed behind an "Advanced" placeholder.
    #[default]
    Basic,
    /// Every category is shown, advanced ones sorted last.
    All,
    /// No categories; leaves are appended directly at the root.
    Flat,
}

/// An add-on descriptor producing a button at the top of its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Target namespace; defaults to the extension name.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub advanced: bool,
}

/// A pre-registered block injected into a named category (e.g. an on-start
/// block), bypassing synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraBlock {
    pub block_id: String,
    pub namespace: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub gap: Option<u32>,
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ────────────────────────────────────────────────────────────────────────────

/// Recoverable and per-symbol-fatal conditions reported by a rebuild.
///
/// None of these abort the rebuild; a bad symbol never blocks the rest of
/// the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Diagnostic {
    /// A symbol tried to register an id owned by a builtin block or an
    /// earlier symbol. The earlier registration wins.
    BlockIdCollision {
        block_id: String,
        qualified_name: String,
        builtin: bool,
    },
    /// The definition template referenced a parameter that does not exist.
    UnknownParameter { block_id: String, parameter: String },
    /// A dropdown source (enum, fixed instances, constants, combined list)
    /// resolved to zero entries; the field is skipped.
    EmptyDropdownSource { block_id: String, source: String },
    /// Weight attribute failed to parse; 50 applied.
    MalformedWeight { qualified_name: String, raw: String },
    /// Store-result variable name override is a reserved identifier; the
    /// type-derived name applies instead.
    ReservedVariableName { block_id: String, name: String },
    /// An extra block targeted a category that does not exist.
    UnknownCategory { block_id: String, category: String },
}

/// Default weight applied when the attribute is missing or malformed.
pub const DEFAULT_WEIGHT: f64 = 50.0;

/// Parse a weight attribute leniently. Malformed values yield the default
/// and a diagnostic; a missing attribute yields the default silently.
pub fn parse_weight(
    raw: Option<&str>,
    qualified_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> f64 {
    match raw {
        None => DEFAULT_WEIGHT,
        Some(s) => match s.trim().parse::<f64>() {
            Ok(w) if w.is_finite() => w,
            _ => {
                log::warn!("malformed weight {:?} on {}", s, qualified_name);
                diagnostics.push(Diagnostic::MalformedWeight {
                    qualified_name: qualified_name.to_string(),
                    raw: s.to_string(),
                });
                DEFAULT_WEIGHT
            }
        },
    }
}
