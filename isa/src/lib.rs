//! # ISA - spreadsheet ⇄ MODS metadata conversion
//!
//! Catalogers describe archival objects in a spreadsheet, one row per object;
//! digital repositories exchange MODS 3.8 documents. ISA converts between the
//! two, and can also emit a Dublin Core projection of each row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV File   │────▶│   Parser    │────▶│   Builder   │────▶│  MODS (+DC) │
//! │ (ISO/UTF8)  │     │  (auto-enc) │     │  (catalog)  │     │  <pid>.xml  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ MODS *.xml  │────▶│  Flattener  │────▶│   Reorder   │────▶│  CSV File   │
//! │ (directory) │     │  (queries)  │     │ (compound)  │     │ (98 cols)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use isa::{convert, TransformOptions};
//! use std::path::Path;
//!
//! let report = convert(Path::new("records.csv"), Path::new("mods/"), &TransformOptions::default())?;
//! println!("Wrote {} documents", report.written);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - The field catalog shared by both directions
//! - [`models`] - Flat records and multi-value groups
//! - [`document`] - Element trees, XML parsing/writing and path queries
//! - [`parser`] - CSV reading/writing with auto-detection
//! - [`transform`] - Builder, flattener, reorder pass and pipeline
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Progress logging

// Core modules
pub mod catalog;
pub mod error;
pub mod models;

// Documents
pub mod document;

// Parsing
pub mod parser;

// Conversion
pub mod transform;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    BuildError, DocumentError, FlattenError, LoadError, PipelineError, QueryError,
};

// =============================================================================
// Re-exports - Catalog & Models
// =============================================================================

pub use catalog::{header, Field, FieldSpec, Multiplicity, Pairing, Presence};
pub use models::{join_values, split_values, FlatRecord, MultiValueGroup};

// =============================================================================
// Re-exports - Documents
// =============================================================================

pub use document::query::Query;
pub use document::{DescriptionDocument, Element, Escaped};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes_auto,
    parse_csv_file_auto,
    write_csv,
    CsvError,
    ParseResult,
};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use transform::{
    build, build_dublin_core, build_mods, flatten, flatten_all, flatten_bytes, flatten_source,
    output_name, reorder, BuildOptions, BuiltDocuments, Diagnostic, FlattenBatch,
    ReorderStrategy, SourceDocument,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_all,
    convert,
    csv_to_documents,
    documents_to_csv,
    documents_to_records,
    load_documents,
    ConversionReport,
    Direction,
    TransformOptions,
};
