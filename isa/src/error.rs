//! Error types for the conversion pipeline.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`LoadError`] - Reading spreadsheets and document directories
//! - [`QueryError`] - Malformed catalog path queries
//! - [`DocumentError`] - XML parsing and serialization
//! - [`BuildError`] - Spreadsheet row → MODS / Dublin Core
//! - [`FlattenError`] - MODS document → spreadsheet row
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

use crate::parser::CsvError;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading input data from disk.
///
/// A load error aborts the batch before any transform runs.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read a file or directory.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] CsvError),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Required columns are missing from the header.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The input path is neither a directory nor a readable file.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(PathBuf),
}

// =============================================================================
// Query Errors
// =============================================================================

/// A catalog path query that cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid query '{query}': {message}")]
pub struct QueryError {
    pub query: String,
    pub message: String,
}

impl QueryError {
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Document Errors
// =============================================================================

/// Errors while reading or writing description documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The input is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The document root is not the expected element.
    #[error("Unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot { found: String, expected: String },

    /// Serialization failed.
    #[error("Failed to write XML: {0}")]
    Write(String),
}

// =============================================================================
// Build Errors
// =============================================================================

/// Errors while building documents from a flat record.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The record has no usable `pid`, so its output cannot be named.
    #[error("Missing identifier: record '{title}' has no usable pid")]
    MissingIdentifier { title: String },

    /// Document serialization error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

// =============================================================================
// Flatten Errors
// =============================================================================

/// Errors while flattening a document into a record.
#[derive(Debug, Error)]
pub enum FlattenError {
    /// The source could not be parsed or is not a MODS document.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// The source bytes are not UTF-8.
    #[error("Not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by the batch functions in
/// [`crate::transform::pipeline`]. It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Document error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Writing output failed.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the output spreadsheet failed.
    #[error("CSV write error: {0}")]
    CsvWrite(#[from] csv::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Some records could not be built.
    #[error("{failed} of {total} records could not be converted")]
    BuildFailures { failed: usize, total: usize },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
