//! Builtin category and block registration.
//!
//! The builtin toolbox skeleton (loops, logic, math, variables, text,
//! arrays, functions) exists before any catalog symbol is synthesized.
//! Tables are lazily initialized once per process and never mutated.

use once_cell::sync::Lazy;

use crate::arena::{CategoryData, LeafData, NodeKind, ToolboxTree};
use crate::descriptor::BlockDescriptor;

/// Well-known category ids recognized as "built-in reorderable": leaves
/// inserted into these with weight > 50 are pinned above ordinary leaves.
const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("loops", "#107c10"),
    ("logic", "#006970"),
    ("math", "#712672"),
    ("variables", "#a80000"),
    ("text", "#996600"),
    ("arrays", "#a94400"),
    ("functions", "#005a9e"),
    ("advanced", "#3c3c3c"),
];

/// Color of a builtin category, `None` for user-defined namespaces.
pub fn category_color(id: &str) -> Option<&'static str> {
    let id = id.to_lowercase();
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == id)
        .map(|(_, color)| *color)
}

/// Whether the category is one of the fixed builtin reorderable set.
pub fn is_builtin_category(id: &str) -> bool {
    category_color(id).is_some()
}

/// Block ids deciding the visibility of the dynamically populated
/// "variables" category.
pub const VARIABLES_BLOCKS: &[&str] = &["variables_get", "variables_set", "variables_change"];

/// Reserved id of the trailing "more" subcategory bucket (weight 1).
pub const MORE_CATEGORY_ID: &str = "more";
pub const MORE_CATEGORY_NAME: &str = "More";

/// Reserved id of the collapsed advanced section.
pub const ADVANCED_CATEGORY_ID: &str = "advanced";
pub const ADVANCED_CATEGORY_NAME: &str = "Advanced";

/// A builtin block registration: id, owning category, flyout weight.
#[derive(Debug, Clone)]
pub struct BuiltinBlock {
    pub block_id: &'static str,
    pub category: &'static str,
    pub weight: f64,
}

fn builtin(block_id: &'static str, category: &'static str, weight: f64) -> BuiltinBlock {
    BuiltinBlock {
        block_id,
        category,
        weight,
    }
}

/// The complete builtin block table, lazily initialized on first access.
pub fn builtin_blocks() -> &'static [BuiltinBlock] {
    static BLOCKS: Lazy<Vec<BuiltinBlock>> = Lazy::new(|| {
        vec![
            // ── Loops ────────────────────────────────────────────────
            builtin("controls_repeat_ext", "loops", 49.0),
            builtin("device_while", "loops", 48.0),
            builtin("controls_simple_for", "loops", 47.0),
            builtin("controls_for_of", "loops", 46.0),
            // ── Logic ────────────────────────────────────────────────
            builtin("controls_if", "logic", 49.0),
            builtin("logic_compare", "logic", 48.0),
            builtin("logic_operation", "logic", 47.0),
            builtin("logic_negate", "logic", 46.0),
            builtin("logic_boolean", "logic", 45.0),
            // ── Math ─────────────────────────────────────────────────
            builtin("math_arithmetic", "math", 49.0),
            builtin("math_modulo", "math", 48.0),
            builtin("math_op2", "math", 47.0),
            builtin("math_op3", "math", 46.0),
            builtin("math_number", "math", 45.0),
            // ── Variables ────────────────────────────────────────────
            builtin("variables_set", "variables", 49.0),
            builtin("variables_change", "variables", 48.0),
            builtin("variables_get", "variables", 47.0),
            // ── Text ─────────────────────────────────────────────────
            builtin("text", "text", 49.0),
            builtin("text_length", "text", 48.0),
            builtin("text_join", "text", 47.0),
            // ── Arrays ───────────────────────────────────────────────
            builtin("lists_create_with", "arrays", 49.0),
            builtin("lists_length", "arrays", 48.0),
            builtin("lists_index_get", "arrays", 47.0),
            builtin("lists_index_set", "arrays", 46.0),
            // ── Functions ────────────────────────────────────────────
            builtin("procedures_defnoreturn", "functions", 49.0),
            builtin("procedures_callnoreturn", "functions", 48.0),
        ]
    });
    &BLOCKS
}

/// Whether a block id is owned by a builtin block. Symbols may not
/// register over these.
pub fn is_builtin_block(block_id: &str) -> bool {
    builtin_blocks().iter().any(|b| b.block_id == block_id)
}

/// Weights of the builtin top-level categories.
const CATEGORY_WEIGHTS: &[(&str, &str, f64)] = &[
    ("loops", "Loops", 60.0),
    ("logic", "Logic", 55.0),
    ("variables", "Variables", 52.0),
    ("math", "Math", 50.0),
    ("text", "Text", 46.0),
    ("arrays", "Arrays", 45.0),
    ("functions", "Functions", 44.0),
];

/// Build the builtin skeleton tree: the fixed categories in weight order,
/// each populated with its builtin blocks.
pub fn builtin_toolbox() -> ToolboxTree {
    let mut tree = ToolboxTree::new();
    let root = tree.root();
    for &(id, name, weight) in CATEGORY_WEIGHTS {
        let mut cat = CategoryData::new(id, name, weight);
        cat.color = category_color(id).map(str::to_string);
        let cat_id = tree.alloc(NodeKind::Category(cat));
        tree.insert_top_category(root, cat_id, weight, false);
        for b in builtin_blocks().iter().filter(|b| b.category == id) {
            let leaf = LeafData::new(BlockDescriptor::bare(b.block_id), b.weight);
            let leaf_id = tree.alloc(NodeKind::Leaf(leaf));
            tree.insert_leaf(cat_id, leaf_id, b.weight, None);
        }
    }
    tree
}

/// Identifiers that may not be used as generated variable names.
pub fn is_reserved_word(word: &str) -> bool {
    static RESERVED: &[&str] = &[
        "abstract", "any", "as", "async", "await", "boolean", "break", "case", "catch", "class",
        "const", "continue", "constructor", "debugger", "declare", "default", "delete", "do",
        "else", "enum", "export", "extends", "false", "finally", "for", "from", "function", "get",
        "if", "implements", "import", "in", "instanceof", "interface", "is", "let", "module",
        "namespace", "new", "null", "number", "of", "package", "private", "protected", "public",
        "require", "return", "set", "static", "string", "super", "switch", "symbol", "this",
        "throw", "true", "try", "type", "typeof", "var", "void", "while", "with", "yield",
    ];
    RESERVED.contains(&word)
}
