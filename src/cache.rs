//! Incremental synthesis cache.
//!
//! Keyed by block id; each entry remembers the owning symbol and a canonical
//! content hash of the symbol at compile time. On a rebuild, an unchanged
//! symbol reuses its compiled descriptor without recompiling; a changed
//! symbol with the same qualified name overwrites; a *different* symbol
//! claiming an already-owned id is rejected (first registration wins).

use indexmap::IndexMap;
use serde::Serialize;

use crate::descriptor::BlockDescriptor;
use crate::model::Symbol;

/// Canonical content hash of a symbol: its serialized form. Any metadata or
/// signature change produces a different string.
pub fn content_hash(symbol: &Symbol) -> String {
    #[derive(Serialize)]
    struct Key<'a> {
        symbol: &'a Symbol,
    }
    serde_json::to_string(&Key { symbol }).unwrap_or_default()
}

/// One cached compilation result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content_hash: String,
    pub qualified_name: String,
    pub descriptor: BlockDescriptor,
}

/// Outcome of a cache lookup for a (block id, symbol) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// No entry, or same symbol changed: compile (and store).
    Compile,
    /// Entry matches the current hash: reuse without recompiling.
    Reuse,
    /// Id owned by a different symbol: reject the newcomer.
    Collision,
}

/// Block-id keyed descriptor cache surviving across rebuilds.
#[derive(Debug, Clone, Default)]
pub struct IncrementalCache {
    entries: IndexMap<String, CacheEntry>,
    compile_count: u64,
}

impl IncrementalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to do for `symbol` claiming `block_id` with `hash`.
    pub fn decide(&self, block_id: &str, qualified_name: &str, hash: &str) -> CacheDecision {
        match self.entries.get(block_id) {
            None => CacheDecision::Compile,
            Some(entry) if entry.content_hash == hash => CacheDecision::Reuse,
            Some(entry) if entry.qualified_name == qualified_name => CacheDecision::Compile,
            Some(_) => CacheDecision::Collision,
        }
    }

    pub fn get(&self, block_id: &str) -> Option<&CacheEntry> {
        self.entries.get(block_id)
    }

    /// Store a freshly compiled descriptor, bumping the compile counter.
    pub fn store(&mut self, block_id: &str, entry: CacheEntry) {
        self.compile_count += 1;
        self.entries.insert(block_id.to_string(), entry);
    }

    /// Drop entries whose block id is not in the currently known set, so
    /// removed symbols do not pin stale descriptors.
    pub fn purge_absent<F: Fn(&str) -> bool>(&mut self, known: F) {
        self.entries.retain(|id, _| known(id));
    }

    /// Total number of compilations performed since construction. Rebuild
    /// tests use this to assert reuse.
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SymbolAttributes, SymbolKind};

    fn symbol(qname: &str, weight: Option<&str>) -> Symbol {
        Symbol {
            qualified_name: qname.to_string(),
            name: qname.rsplit('.').next().unwrap().to_string(),
            namespace: qname.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("").to_string(),
            kind: SymbolKind::Function,
            ret_type: "void".to_string(),
            parameters: Vec::new(),
            attributes: SymbolAttributes {
                weight: weight.map(str::to_string),
                block_id: Some("b1".to_string()),
                ..Default::default()
            },
            extends_types: Vec::new(),
            combined_properties: Vec::new(),
        }
    }

    #[test]
    fn hash_changes_with_metadata() {
        let a = content_hash(&symbol("ns.f", Some("10")));
        let b = content_hash(&symbol("ns.f", Some("20")));
        let c = content_hash(&symbol("ns.f", Some("10")));
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn decisions() {
        let mut cache = IncrementalCache::new();
        let sym = symbol("ns.f", Some("10"));
        let hash = content_hash(&sym);
        assert_eq!(cache.decide("b1", "ns.f", &hash), CacheDecision::Compile);

        cache.store(
            "b1",
            CacheEntry {
                content_hash: hash.clone(),
                qualified_name: "ns.f".to_string(),
                descriptor: crate::descriptor::BlockDescriptor::bare("b1"),
            },
        );
        assert_eq!(cache.decide("b1", "ns.f", &hash), CacheDecision::Reuse);

        let changed = content_hash(&symbol("ns.f", Some("20")));
        assert_eq!(cache.decide("b1", "ns.f", &changed), CacheDecision::Compile);
        assert_eq!(cache.decide("b1", "ns.g", &changed), CacheDecision::Collision);
    }

    #[test]
    fn purge_drops_unknown_ids() {
        let mut cache = IncrementalCache::new();
        cache.store(
            "b1",
            CacheEntry {
                content_hash: "h".to_string(),
                qualified_name: "ns.f".to_string(),
                descriptor: crate::descriptor::BlockDescriptor::bare("b1"),
            },
        );
        cache.purge_absent(|id| id == "b2");
        assert!(cache.is_empty());
    }
}
