//! Shared catalog builders for the integration tests.
#![allow(dead_code)]

use blockforge::builder::RebuildRequest;
use blockforge::model::{Symbol, SymbolAttributes, SymbolCatalog, SymbolKind};

/// A namespace descriptor symbol carrying category metadata.
pub fn namespace(name: &str, weight: &str) -> Symbol {
    Symbol {
        qualified_name: name.to_string(),
        name: name.to_string(),
        namespace: String::new(),
        kind: SymbolKind::Namespace,
        ret_type: String::new(),
        parameters: Vec::new(),
        attributes: SymbolAttributes {
            weight: Some(weight.to_string()),
            ..Default::default()
        },
        extends_types: Vec::new(),
        combined_properties: Vec::new(),
    }
}

/// A plain void function symbol with a block id.
pub fn block(qname: &str, block_id: &str, weight: &str) -> Symbol {
    let (namespace, name) = qname.rsplit_once('.').unwrap_or(("", qname));
    Symbol {
        qualified_name: qname.to_string(),
        name: name.to_string(),
        namespace: namespace.to_string(),
        kind: SymbolKind::Function,
        ret_type: "void".to_string(),
        parameters: Vec::new(),
        attributes: SymbolAttributes {
            block_id: Some(block_id.to_string()),
            weight: Some(weight.to_string()),
            ..Default::default()
        },
        extends_types: Vec::new(),
        combined_properties: Vec::new(),
    }
}

pub fn catalog(symbols: Vec<Symbol>) -> SymbolCatalog {
    SymbolCatalog::new(symbols)
}

pub fn request(symbols: Vec<Symbol>) -> RebuildRequest {
    RebuildRequest {
        catalog: catalog(symbols),
        ..Default::default()
    }
}
