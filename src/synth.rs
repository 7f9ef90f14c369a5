//! Block synthesis: catalog symbols to compiled descriptors.
//!
//! One symbol normally produces one leaf, but variant attributes expand a
//! single symbol into several leaves (one per handler arity, or one per
//! fixed variant tag). Compilation consults the incremental cache first so
//! unchanged symbols skip the whole pipeline on a rebuild.

use crate::builtins::{is_builtin_block, is_reserved_word};
use crate::cache::{content_hash, CacheDecision, CacheEntry, IncrementalCache};
use crate::descriptor::{
    AssignWrapper, BlockDescriptor, DropdownOption, FieldValue, InputSlot, OutputShape,
    Placeholder, VariantPayload,
};
use crate::model::{
    is_array_type, is_callback_type, parse_weight, Diagnostic, Parameter, Symbol, SymbolCatalog,
    SymbolKind,
};

/// Flyout gap after an assignment wrapper.
const WRAPPER_GAP: u32 = 8;

/// Sentinel parameter type backed by `combined_properties`.
const COMBINED_TYPE: &str = "@combined@";

/// How a symbol's leaves are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthStrategy {
    /// One leaf, straight compilation.
    Plain,
    /// One leaf carrying a named mutation specification.
    Mutated,
    /// One leaf with a default-instance mutation.
    DefaultInstance,
    /// One leaf whose optional arguments collapse behind an expander.
    Expandable { toggle: bool },
    /// One leaf with a fixed statement body for its callback.
    FixedHandler,
    /// One leaf per declared handler arity.
    VariableArityHandler,
}

/// Pick the synthesis strategy for a symbol from its attributes.
pub fn strategy_for(symbol: &Symbol) -> SynthStrategy {
    let attrs = &symbol.attributes;
    if attrs.variable_arity.is_some() {
        return SynthStrategy::VariableArityHandler;
    }
    if attrs.mutate_spec.is_some() {
        return SynthStrategy::Mutated;
    }
    if attrs.default_instance {
        return SynthStrategy::DefaultInstance;
    }
    match attrs.expandable.as_deref() {
        Some("enabled") if has_optional_params(symbol) => {
            return SynthStrategy::Expandable { toggle: false };
        }
        Some("toggle") if has_optional_params(symbol) => {
            return SynthStrategy::Expandable { toggle: true };
        }
        _ => {}
    }
    if symbol.takes_callback() || !attrs.handler_args.is_empty() {
        return SynthStrategy::FixedHandler;
    }
    SynthStrategy::Plain
}

fn has_optional_params(symbol: &Symbol) -> bool {
    symbol.parameters.iter().any(|p| p.is_optional)
}

/// A compiled leaf ready for insertion, with its resolved placement inputs.
#[derive(Debug, Clone)]
pub struct SynthesizedLeaf {
    pub descriptor: BlockDescriptor,
    pub weight: f64,
    pub group: Option<String>,
}

/// Synthesize every leaf a symbol contributes. Returns an empty vector (with
/// diagnostics) for id collisions; panics never, bad symbols degrade.
pub fn synthesize(
    symbol: &Symbol,
    catalog: &SymbolCatalog,
    cache: &mut IncrementalCache,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<SynthesizedLeaf> {
    let Some(block_id) = symbol.attributes.block_id.as_deref() else {
        return Vec::new();
    };
    if is_builtin_block(block_id) {
        diagnostics.push(Diagnostic::BlockIdCollision {
            block_id: block_id.to_string(),
            qualified_name: symbol.qualified_name.clone(),
            builtin: true,
        });
        return Vec::new();
    }

    let hash = content_hash(symbol);
    let decision = cache.decide(block_id, &symbol.qualified_name, &hash);
    if decision == CacheDecision::Collision {
        log::warn!(
            "block id {} already registered, skipping {}",
            block_id,
            symbol.qualified_name
        );
        diagnostics.push(Diagnostic::BlockIdCollision {
            block_id: block_id.to_string(),
            qualified_name: symbol.qualified_name.clone(),
            builtin: false,
        });
        return Vec::new();
    }
    let reused = match (decision, cache.get(block_id)) {
        (CacheDecision::Reuse, Some(entry)) => Some(entry.descriptor.clone()),
        _ => None,
    };
    let descriptor = match reused {
        Some(descriptor) => descriptor,
        None => {
            let compiled = compile_descriptor(symbol, catalog, diagnostics);
            cache.store(
                block_id,
                CacheEntry {
                    content_hash: hash,
                    qualified_name: symbol.qualified_name.clone(),
                    descriptor: compiled.clone(),
                },
            );
            compiled
        }
    };

    let weight = parse_weight(
        symbol.attributes.weight.as_deref(),
        &symbol.qualified_name,
        diagnostics,
    );
    let group = symbol.attributes.group.clone();

    expand_variants(symbol, descriptor, weight, group, diagnostics)
}

/// Produce the final leaf set for a compiled descriptor: fixed tags take
/// precedence, then arity variants, then a single leaf (the only shape
/// eligible for store-result wrapping).
fn expand_variants(
    symbol: &Symbol,
    descriptor: BlockDescriptor,
    weight: f64,
    group: Option<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<SynthesizedLeaf> {
    let attrs = &symbol.attributes;

    // Fixed tags replace every other variant shape, including arities.
    if let Some(tags) = attrs.variant_tags.as_deref() {
        return tags
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|tag| {
                let mut variant = descriptor.clone();
                variant.variant = Some(VariantPayload::Tag {
                    tag: tag.to_string(),
                });
                SynthesizedLeaf {
                    descriptor: variant,
                    weight,
                    group: group.clone(),
                }
            })
            .collect();
    }

    if let Some(arities) = attrs.variable_arity.as_deref() {
        let arg_names: Vec<String> = attrs.handler_args.iter().map(|a| a.name.clone()).collect();
        let mut leaves = Vec::new();
        for part in arities.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Ok(num_args) = part.parse::<usize>() else {
                continue;
            };
            // Arities beyond the declared handler args are dropped.
            if num_args > arg_names.len() {
                continue;
            }
            let mut variant = descriptor.clone();
            variant.variant = Some(VariantPayload::Arity {
                num_args,
                arg_names: arg_names[..num_args].to_vec(),
            });
            leaves.push(SynthesizedLeaf {
                descriptor: variant,
                weight,
                group: group.clone(),
            });
        }
        return leaves;
    }

    let mut single = descriptor;
    if let Some(name_override) = attrs.store_result_as.as_deref() {
        if matches!(single.output, OutputShape::Value { .. }) {
            let variable = resolve_result_variable(symbol, name_override, diagnostics);
            single.wrapper = Some(AssignWrapper {
                variable,
                gap: attrs.gap.unwrap_or(WRAPPER_GAP),
                fallback_shadow: Some("math_number".to_string()),
            });
        }
    }
    vec![SynthesizedLeaf {
        descriptor: single,
        weight,
        group,
    }]
}

/// Variable name for a store-result wrapper: the explicit override unless it
/// is empty or a reserved identifier, else the lower-cased last segment of
/// the return type.
fn resolve_result_variable(
    symbol: &Symbol,
    name_override: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let derived = || {
        symbol
            .ret_type
            .rsplit('.')
            .next()
            .unwrap_or(&symbol.ret_type)
            .to_lowercase()
    };
    if name_override.is_empty() {
        return derived();
    }
    if is_reserved_word(name_override) {
        diagnostics.push(Diagnostic::ReservedVariableName {
            block_id: symbol.attributes.block_id.clone().unwrap_or_default(),
            name: name_override.to_string(),
        });
        return derived();
    }
    name_override.to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Descriptor compilation
// ────────────────────────────────────────────────────────────────────────────

/// Compile one symbol into its block descriptor.
pub fn compile_descriptor(
    symbol: &Symbol,
    catalog: &SymbolCatalog,
    diagnostics: &mut Vec<Diagnostic>,
) -> BlockDescriptor {
    let block_id = symbol.attributes.block_id.clone().unwrap_or_default();
    let attrs = &symbol.attributes;

    let mut inputs = Vec::new();
    let mut fields = Vec::new();

    for param in surfaced_params(symbol, &block_id, diagnostics) {
        if is_callback_type(&param.ty) {
            continue;
        }
        match resolve_placeholder(symbol, param, catalog, &block_id, diagnostics) {
            Resolved::Field(field) => fields.push(field),
            Resolved::Input(slot) => inputs.push(slot),
            Resolved::Skip => {}
        }
    }

    for arg in &attrs.handler_args {
        fields.push(FieldValue {
            name: format!("HANDLER_{}", arg.name),
            value: arg.name.clone(),
        });
    }

    let statement_input = symbol.takes_callback() || !attrs.handler_args.is_empty();
    let output = output_shape(symbol, catalog);

    let variant = match strategy_for(symbol) {
        SynthStrategy::Mutated => attrs
            .mutate_spec
            .clone()
            .map(|spec| VariantPayload::Mutation { spec }),
        SynthStrategy::DefaultInstance => Some(VariantPayload::DefaultInstance),
        SynthStrategy::Expandable { toggle } => Some(VariantPayload::Expandable { toggle }),
        _ => None,
    };

    BlockDescriptor {
        block_id,
        gap: attrs.gap,
        inputs,
        fields,
        statement_input,
        output,
        variant,
        wrapper: None,
    }
}

/// Parameters surfaced by the block definition template: the referenced
/// names in template order when declared, else every parameter in
/// declaration order. Unknown template names produce a diagnostic.
fn surfaced_params<'a>(
    symbol: &'a Symbol,
    block_id: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<&'a Parameter> {
    let declared = &symbol.attributes.definition_params;
    if declared.is_empty() {
        return symbol.parameters.iter().collect();
    }
    let mut out = Vec::with_capacity(declared.len());
    for name in declared {
        match symbol
            .parameters
            .iter()
            .find(|p| &p.definition_name == name)
        {
            Some(p) => out.push(p),
            None => diagnostics.push(Diagnostic::UnknownParameter {
                block_id: block_id.to_string(),
                parameter: name.clone(),
            }),
        }
    }
    out
}

enum Resolved {
    Input(InputSlot),
    Field(FieldValue),
    Skip,
}

/// Resolve the placeholder (or direct field) for one surfaced parameter.
fn resolve_placeholder(
    symbol: &Symbol,
    param: &Parameter,
    catalog: &SymbolCatalog,
    block_id: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Resolved {
    let default = param
        .default_value
        .clone()
        .or_else(|| symbol.attributes.default_value.clone());
    let shadow = param
        .shadow_block_id
        .clone()
        .or_else(|| symbol.attributes.shadow_block_id.clone());
    let range = param.range.or(symbol.attributes.range);

    // Optional parameters without a declared shadow or default stay empty
    // slots; expandable blocks reveal them on demand.
    if param.is_optional && shadow.is_none() && default.is_none() && range.is_none() {
        return Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: type_checks(&param.ty, catalog),
            placeholder: None,
        });
    }

    // Explicit shadow block wins over type-derived placeholders. A default
    // value pre-fills the shadow's first declared field.
    if let Some(shadow_id) = shadow {
        let field = default.map(|value| FieldValue {
            name: shadow_field_name(catalog, &shadow_id),
            value,
        });
        return Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: type_checks(&param.ty, catalog),
            placeholder: Some(Placeholder::Shadow {
                block_id: shadow_id,
                field,
            }),
        });
    }

    // A declared numeric range renders as a slider.
    if let Some(range) = range {
        let step = param
            .field_options
            .get("step")
            .and_then(|s| s.parse::<f64>().ok())
            .or(range.step);
        let color = param.field_options.get("color").cloned();
        return Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: Some(vec!["Number".to_string()]),
            placeholder: Some(Placeholder::Slider {
                min: range.min,
                max: range.max,
                step,
                color,
                label: capitalize(&param.actual_name),
                default: default.unwrap_or_else(|| "0".to_string()),
            }),
        });
    }

    // Dropdown-backed parameter types become direct fields.
    if let Some(options) = dropdown_options(symbol, param, catalog) {
        if options.is_empty() {
            diagnostics.push(Diagnostic::EmptyDropdownSource {
                block_id: block_id.to_string(),
                source: param.ty.clone(),
            });
            return Resolved::Skip;
        }
        let options = hoist_default(options, default.as_deref());
        return Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: None,
            placeholder: Some(Placeholder::Dropdown { options }),
        });
    }

    match param.ty.as_str() {
        "number" => Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: Some(vec!["Number".to_string()]),
            placeholder: Some(Placeholder::Number {
                default: default.unwrap_or_else(|| "0".to_string()),
            }),
        }),
        "string" => Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: Some(vec!["String".to_string()]),
            placeholder: Some(Placeholder::Text {
                default: default.unwrap_or_default(),
            }),
        }),
        "boolean" => Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: Some(vec!["Boolean".to_string()]),
            placeholder: Some(Placeholder::Boolean {
                default: default
                    .map(|d| d.to_uppercase())
                    .unwrap_or_else(|| "FALSE".to_string()),
            }),
        }),
        ty if is_array_type(ty) => Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: Some(vec!["Array".to_string()]),
            placeholder: None,
        }),
        // Object-typed parameters default to a variable reference named
        // after the parameter.
        _ => Resolved::Input(InputSlot {
            name: param.definition_name.clone(),
            check: type_checks(&param.ty, catalog),
            placeholder: Some(Placeholder::Variable {
                name: param.actual_name.clone(),
            }),
        }),
    }
}

/// Dropdown entries for a parameter, or `None` when the type has no dropdown
/// source. Priority: combined properties, enum members, fixed instances,
/// tagged constants.
fn dropdown_options(
    symbol: &Symbol,
    param: &Parameter,
    catalog: &SymbolCatalog,
) -> Option<Vec<DropdownOption>> {
    if param.ty == COMBINED_TYPE {
        let options = symbol
            .combined_properties
            .iter()
            .filter_map(|qname| catalog.lookup(qname))
            .map(|s| DropdownOption {
                label: s.name.clone(),
                value: s.qualified_name.clone(),
                icon: None,
            })
            .collect();
        return Some(options);
    }

    if let Some(ty_sym) = catalog.lookup(&param.ty) {
        if ty_sym.kind == SymbolKind::Enum {
            let options = catalog
                .enum_members(&param.ty)
                .into_iter()
                .map(|m| DropdownOption {
                    label: dropdown_label(m),
                    value: m.qualified_name.clone(),
                    icon: m.attributes.icon.clone(),
                })
                .collect();
            return Some(options);
        }
    }

    let instances = catalog.fixed_instances(&param.ty);
    if !instances.is_empty() {
        return Some(
            instances
                .into_iter()
                .map(|s| DropdownOption {
                    label: dropdown_label(s),
                    value: s.qualified_name.clone(),
                    icon: s.attributes.icon.clone(),
                })
                .collect(),
        );
    }

    let constants = catalog.constants_for(&param.ty);
    if !constants.is_empty() {
        return Some(
            constants
                .into_iter()
                .map(|s| DropdownOption {
                    label: dropdown_label(s),
                    value: s.qualified_name.clone(),
                    icon: s.attributes.icon.clone(),
                })
                .collect(),
        );
    }

    None
}

/// Display label of a dropdown entry: the block label override, then the
/// block id, then the symbol name.
fn dropdown_label(symbol: &Symbol) -> String {
    symbol
        .attributes
        .block
        .clone()
        .or_else(|| symbol.attributes.block_id.clone())
        .unwrap_or_else(|| symbol.name.clone())
}

/// Move the entry matching the declared default to the front.
fn hoist_default(mut options: Vec<DropdownOption>, default: Option<&str>) -> Vec<DropdownOption> {
    if let Some(default) = default {
        if let Some(pos) = options
            .iter()
            .position(|o| o.value == default || o.label == default)
        {
            let chosen = options.remove(pos);
            options.insert(0, chosen);
        }
    }
    options
}

/// First declared field name of a shadow block, for pre-filling a default.
/// Unknown shadow blocks fall back to the conventional single-field name.
fn shadow_field_name(catalog: &SymbolCatalog, shadow_block_id: &str) -> String {
    catalog
        .blocks()
        .find(|s| s.attributes.block_id.as_deref() == Some(shadow_block_id))
        .and_then(|s| s.parameters.first())
        .map(|p| p.definition_name.clone())
        .unwrap_or_else(|| "value".to_string())
}

/// Connection checks for a named parameter type: the type itself plus its
/// declared supertypes. Built-in value types map to the canonical checks.
fn type_checks(ty: &str, catalog: &SymbolCatalog) -> Option<Vec<String>> {
    match ty {
        "number" => return Some(vec!["Number".to_string()]),
        "string" => return Some(vec!["String".to_string()]),
        "boolean" => return Some(vec!["Boolean".to_string()]),
        "T" | "" => return None,
        _ => {}
    }
    let mut checks = vec![ty.to_string()];
    if let Some(sym) = catalog.lookup(ty) {
        checks.extend(sym.extends_types.iter().cloned());
    }
    Some(checks)
}

/// Output shape from the declared return type.
fn output_shape(symbol: &Symbol, catalog: &SymbolCatalog) -> OutputShape {
    let ret = symbol.ret_type.as_str();
    match ret {
        "" | "void" => {
            // Callback-taking blocks are top-level event shells unless
            // explicitly declared chainable.
            let chainable = !(symbol.takes_callback() && !symbol.attributes.handler_statement);
            OutputShape::Statement { chainable }
        }
        "number" => OutputShape::Value {
            checks: vec!["Number".to_string()],
        },
        "string" => OutputShape::Value {
            checks: vec!["String".to_string()],
        },
        "boolean" => OutputShape::Value {
            checks: vec!["Boolean".to_string()],
        },
        "T" => OutputShape::Value { checks: Vec::new() },
        ty if is_array_type(ty) => OutputShape::Value {
            checks: vec!["Array".to_string(), ty.to_string()],
        },
        ty => {
            let mut checks = vec![ty.to_string()];
            if let Some(sym) = catalog.lookup(ty) {
                checks.extend(sym.extends_types.iter().cloned());
            }
            OutputShape::Value { checks }
        }
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
