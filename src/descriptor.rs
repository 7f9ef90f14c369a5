//! Synthesized block descriptors.
//!
//! A [`BlockDescriptor`] is the compiled, renderer-facing description of one
//! placeable block: its input slots with pre-filled placeholders, direct
//! field values, output/connection shape, and optional variant payload or
//! assignment wrapper. Descriptors are pure data; the rendering toolkit that
//! paints them is an external collaborator.

use serde::{Deserialize, Serialize};

/// One entry of a selectable dropdown list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DropdownOption {
    /// Display label (block label override, block id, or symbol name).
    pub label: String,
    /// Qualified name emitted when the entry is selected.
    pub value: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// A default nested value pre-filled into an input slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Placeholder {
    /// Text input, default `""`.
    Text { default: String },
    /// Numeric input, default `"0"`.
    Number { default: String },
    /// Numeric input constrained to a range, rendered as a slider.
    Slider {
        min: f64,
        max: f64,
        step: Option<f64>,
        color: Option<String>,
        /// Capitalized parameter name shown next to the slider.
        label: String,
        default: String,
    },
    /// Boolean token, upper-cased (`"FALSE"` / `"TRUE"`).
    Boolean { default: String },
    /// Ordered selectable list; the default entry, if any, is first.
    Dropdown { options: Vec<DropdownOption> },
    /// A variable reference.
    Variable { name: String },
    /// An explicit placeholder block, optionally pre-filling one field.
    Shadow {
        block_id: String,
        field: Option<FieldValue>,
    },
}

/// A value input slot of a block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputSlot {
    /// Definition name of the parameter this slot binds.
    pub name: String,
    /// Accepted connection types; `None` means unchecked.
    #[serde(default)]
    pub check: Option<Vec<String>>,
    #[serde(default)]
    pub placeholder: Option<Placeholder>,
}

/// A directly embedded field value (no nested block).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: String,
}

/// Output/connection shape derived from the return type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OutputShape {
    /// Produces a value; `checks` lists compatible connection types.
    /// An empty list means an unconstrained value output.
    Value { checks: Vec<String> },
    /// Produces no value; `chainable` controls previous/next connections.
    Statement { chainable: bool },
}

/// Variant-specific configuration payload embedded in a leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VariantPayload {
    /// One of several handler arities; carries the applicable argument names.
    Arity {
        num_args: usize,
        arg_names: Vec<String>,
    },
    /// A fixed alternate configuration tag.
    Tag { tag: String },
    /// Mutation driven by a named mutation specification.
    Mutation { spec: String },
    /// Default-instance mutation.
    DefaultInstance,
    /// Expandable optional-argument block; `toggle` collapses to a switch.
    Expandable { toggle: bool },
}

/// Wraps a value-producing leaf as the input of an assignment leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignWrapper {
    /// Variable name assigned to.
    pub variable: String,
    pub gap: u32,
    /// Shadow block kept beside the wrapped value so clearing the slot
    /// falls back to a plain editable value.
    #[serde(default)]
    pub fallback_shadow: Option<String>,
}

/// Compiled description of one placeable block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockDescriptor {
    pub block_id: String,
    #[serde(default)]
    pub gap: Option<u32>,
    pub inputs: Vec<InputSlot>,
    pub fields: Vec<FieldValue>,
    /// Whether the block has a statement body (callback or handler args).
    pub statement_input: bool,
    pub output: OutputShape,
    #[serde(default)]
    pub variant: Option<VariantPayload>,
    #[serde(default)]
    pub wrapper: Option<AssignWrapper>,
}

impl BlockDescriptor {
    /// A minimal descriptor for pre-registered blocks that bypass synthesis
    /// (builtins, extra blocks): no inputs, plain statement shape.
    pub fn bare(block_id: impl Into<String>) -> Self {
        BlockDescriptor {
            block_id: block_id.into(),
            gap: None,
            inputs: Vec::new(),
            fields: Vec::new(),
            statement_input: false,
            output: OutputShape::Statement { chainable: true },
            variant: None,
            wrapper: None,
        }
    }
}
