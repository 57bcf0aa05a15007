//! Conversion module.
//!
//! - Builder: flat record → MODS tree (plus Dublin Core projection)
//! - Flattener: MODS tree → flat record
//! - Reorder: compound-object components after their parent
//! - Pipeline: batch conversion between files and directories

pub mod builder;
pub mod dublin_core;
pub mod flattener;
pub mod pipeline;
pub mod reorder;

pub use builder::{build, build_mods, output_name, BuildOptions, BuiltDocuments};
pub use dublin_core::build_dublin_core;
pub use flattener::{flatten, flatten_all, flatten_bytes, flatten_source, Diagnostic, FlattenBatch, SourceDocument};
pub use pipeline::*;
pub use reorder::{is_component_title, reorder, ReorderStrategy};
