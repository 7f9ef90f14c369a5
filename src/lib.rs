//! Block palette synthesis engine.
//!
//! Turns a catalog of annotated callable symbols into a categorized,
//! weight-ordered toolbox tree of placeable block descriptors:
//!
//! - [`model`] holds the symbol catalog, filter specification, and
//!   diagnostics;
//! - [`arena`] and [`tree`] implement the toolbox tree and its insertion
//!   rules;
//! - [`synth`] compiles symbols into [`descriptor::BlockDescriptor`]s,
//!   consulting the [`cache`] so unchanged symbols skip recompilation;
//! - [`builtins`] registers the fixed skeleton categories and blocks;
//! - [`filter`] applies visibility filtering, [`search`] indexes the
//!   placeable set;
//! - [`builder`] orchestrates a full rebuild with request coalescing.

pub mod arena;
pub mod builder;
pub mod builtins;
pub mod cache;
pub mod descriptor;
pub mod filter;
pub mod model;
pub mod search;
pub mod synth;
pub mod tree;

pub use arena::{NodeId, NodeKind, ToolboxTree};
pub use builder::{RebuildOutput, RebuildPhase, RebuildRequest, ToolboxBuilder};
pub use descriptor::{BlockDescriptor, OutputShape, Placeholder};
pub use model::{
    CategoryMode, Diagnostic, FilterSpec, FilterState, Symbol, SymbolAttributes, SymbolCatalog,
    SymbolKind,
};
pub use search::{SearchIndex, SearchLocation};
