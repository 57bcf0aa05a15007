//! High-level pipeline API for spreadsheet ⇄ MODS conversion.
//!
//! This module combines all steps for both directions:
//!
//! ```text
//! directory of *.xml ──load──▶ flatten ──reorder──▶ write CSV
//! CSV file ──parse──▶ build (MODS [+ DC]) ──▶ write <name>.xml [<name>_dc.xml]
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use isa::{convert, TransformOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = convert(Path::new("mods/"), Path::new("records.csv"), &TransformOptions::default())?;
//!     println!("Wrote {} records", report.written);
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult, PipelineError, PipelineResult};
use crate::logs::{log_error_indent, log_info, log_success, log_warning, log_warning_indent};
use crate::models::FlatRecord;
use crate::parser::{parse_csv_file_auto, write_csv, ParseResult};

use super::builder::{build, BuildOptions, BuiltDocuments};
use super::flattener::{flatten_all, Diagnostic, FlattenBatch, SourceDocument};
use super::reorder::{reorder, ReorderStrategy};

/// Environment variable selecting the reorder strategy.
pub const ENV_REORDER: &str = "ISA_REORDER";
/// Environment variable enabling Dublin Core output.
pub const ENV_DUBLIN_CORE: &str = "ISA_DUBLIN_CORE";

// =============================================================================
// Options
// =============================================================================

/// Options for the conversion pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Compound-object reorder strategy (`None` skips the pass)
    pub reorder: Option<ReorderStrategy>,

    /// Also write a Dublin Core document per record
    pub dublin_core: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            reorder: Some(ReorderStrategy::Identifier),
            dublin_core: false,
        }
    }
}

impl TransformOptions {
    /// Load options from a JSON file. Absent keys keep their defaults.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Override with `ISA_REORDER` / `ISA_DUBLIN_CORE` when set.
    pub fn with_env(self) -> PipelineResult<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> PipelineResult<Self> {
        if let Some(value) = var(ENV_REORDER) {
            self.reorder = parse_reorder(&value)
                .map_err(|e| PipelineError::Config(format!("{}: {}", ENV_REORDER, e)))?;
        }
        if let Some(value) = var(ENV_DUBLIN_CORE) {
            self.dublin_core = parse_flag(&value)
                .map_err(|e| PipelineError::Config(format!("{}: {}", ENV_DUBLIN_CORE, e)))?;
        }
        Ok(self)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            dublin_core: self.dublin_core,
        }
    }
}

/// Parse a reorder setting; `none` turns the pass off.
pub fn parse_reorder(value: &str) -> Result<Option<ReorderStrategy>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" | "off" | "" => Ok(None),
        other => other.parse().map(Some),
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("expected true or false, got '{}'", other)),
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Which way a conversion ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    DocumentsToCsv,
    CsvToDocuments,
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub direction: Direction,
    /// Records (XML → CSV) or records converted to documents (CSV → XML)
    pub written: usize,
    /// Items that were skipped, with the reason
    pub skipped: Vec<Diagnostic>,
}

// =============================================================================
// Documents → CSV
// =============================================================================

/// Read every `*.xml` file of `dir`, sorted by file name.
pub fn load_documents(dir: &Path) -> LoadResult<Vec<SourceDocument>> {
    let io_error = |source: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_error))
        .collect::<LoadResult<_>>()?;
    paths.retain(|p| {
        p.is_file()
            && p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
    });
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let bytes = fs::read(&path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(SourceDocument::new(name, bytes))
        })
        .collect()
}

/// Flatten and reorder a batch of documents.
pub fn documents_to_records(sources: Vec<SourceDocument>, options: &TransformOptions) -> FlattenBatch {
    let total = sources.len();
    let mut batch = flatten_all(sources);

    log_success(format!("Flattened {} of {} documents", batch.records.len(), total));
    if !batch.diagnostics.is_empty() {
        log_warning(format!("{} documents skipped:", batch.diagnostics.len()));
        for d in &batch.diagnostics {
            log_warning_indent(format!("{}: {}", d.source, d.message), 1);
        }
    }

    if let Some(strategy) = options.reorder {
        log_info(format!("Reordering compound objects ({})", strategy));
    }
    batch.records = reorder(batch.records, options.reorder);
    batch
}

/// Convert a directory of MODS documents into one CSV file.
pub fn documents_to_csv(input_dir: &Path, output_csv: &Path, options: &TransformOptions) -> PipelineResult<ConversionReport> {
    log_info(format!("📂 Reading documents from {}", input_dir.display()));
    let sources = load_documents(input_dir)?;
    log_success(format!("Found {} XML files", sources.len()));

    let batch = documents_to_records(sources, options);
    write_csv_file(output_csv, &batch.records)?;
    log_success(format!("Wrote {} rows to {}", batch.records.len(), output_csv.display()));

    Ok(ConversionReport {
        direction: Direction::DocumentsToCsv,
        written: batch.records.len(),
        skipped: batch.diagnostics,
    })
}

/// Write records as CSV under the catalog header.
pub fn write_csv_file(path: &Path, records: &[FlatRecord]) -> PipelineResult<()> {
    let file = fs::File::create(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(BufWriter::new(file), records)?;
    Ok(())
}

// =============================================================================
// CSV → Documents
// =============================================================================

/// Build documents for every record.
///
/// Records that cannot be built are reported as diagnostics named after
/// their spreadsheet row; the others are still returned.
pub fn build_all(records: &[FlatRecord], options: &TransformOptions) -> (Vec<BuiltDocuments>, Vec<Diagnostic>) {
    let mut built = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (i, record) in records.iter().enumerate() {
        match build(record, options.build_options()) {
            Ok(documents) => built.push(documents),
            // +2: header line and 1-based rows
            Err(e) => failures.push(Diagnostic {
                source: format!("row {}", i + 2),
                message: e.to_string(),
            }),
        }
    }

    (built, failures)
}

/// Convert a CSV file into one MODS document (and optionally one Dublin
/// Core document) per row, written to `output_dir`.
///
/// Every buildable record is written even when others fail; any failure
/// then turns into [`PipelineError::BuildFailures`].
pub fn csv_to_documents(input_csv: &Path, output_dir: &Path, options: &TransformOptions) -> PipelineResult<ConversionReport> {
    log_info("📖 Reading CSV file...");
    let parsed = parse_csv_file_auto(input_csv)?;
    log_parse_result(&parsed);

    let (built, failures) = build_all(&parsed.records, options);

    fs::create_dir_all(output_dir).map_err(|source| PipelineError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let written = write_documents(&built, output_dir)?;
    log_success(format!("Wrote {} records to {}", written, output_dir.display()));

    if !failures.is_empty() {
        for f in &failures {
            log_error_indent(format!("{}: {}", f.source, f.message), 1);
        }
        return Err(PipelineError::BuildFailures {
            failed: failures.len(),
            total: parsed.records.len(),
        });
    }

    Ok(ConversionReport {
        direction: Direction::CsvToDocuments,
        written,
        skipped: failures,
    })
}

/// Write `<name>.xml` (and `<name>_dc.xml`) for every built record.
pub fn write_documents(built: &[BuiltDocuments], output_dir: &Path) -> PipelineResult<usize> {
    let mut seen = HashSet::new();

    for documents in built {
        if !seen.insert(documents.name.as_str()) {
            log_warning(format!("Duplicate output name '{}', overwriting", documents.name));
        }

        write_document(&output_dir.join(format!("{}.xml", documents.name)), &documents.structured.to_xml()?)?;
        if let Some(flat) = &documents.flat {
            write_document(&output_dir.join(format!("{}_dc.xml", documents.name)), &flat.to_xml()?)?;
        }
    }

    Ok(built.len())
}

fn write_document(path: &Path, xml: &str) -> PipelineResult<()> {
    fs::write(path, xml).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn log_parse_result(parsed: &ParseResult) {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.records.len()));
    for column in &parsed.unknown_columns {
        log_warning_indent(format!("Unknown column '{}' ignored", column), 1);
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

// =============================================================================
// Direction switch
// =============================================================================

/// Convert `input` to `output`, choosing the direction from the input:
/// a directory is read as MODS documents, a file as a spreadsheet.
pub fn convert(input: &Path, output: &Path, options: &TransformOptions) -> PipelineResult<ConversionReport> {
    if input.is_dir() {
        documents_to_csv(input, output, options)
    } else if input.is_file() {
        csv_to_documents(input, output, options)
    } else {
        Err(LoadError::UnsupportedInput(input.to_path_buf()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Field;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_default_options() {
        let options = TransformOptions::default();
        assert_eq!(options.reorder, Some(ReorderStrategy::Identifier));
        assert!(!options.dublin_core);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: TransformOptions = serde_json::from_str(r#"{"dublin_core": true}"#).unwrap();
        assert!(options.dublin_core);
        assert_eq!(options.reorder, Some(ReorderStrategy::Identifier));

        let options: TransformOptions = serde_json::from_str(r#"{"reorder": "pattern"}"#).unwrap();
        assert_eq!(options.reorder, Some(ReorderStrategy::Pattern));

        let options: TransformOptions = serde_json::from_str(r#"{"reorder": null}"#).unwrap();
        assert_eq!(options.reorder, None);
    }

    #[test]
    fn test_env_overrides() {
        let options = TransformOptions::default()
            .with_vars(vars(&[("ISA_REORDER", "none"), ("ISA_DUBLIN_CORE", "yes")]))
            .unwrap();
        assert_eq!(options.reorder, None);
        assert!(options.dublin_core);

        let untouched = TransformOptions::default().with_vars(vars(&[])).unwrap();
        assert_eq!(untouched, TransformOptions::default());
    }

    #[test]
    fn test_invalid_env_value() {
        let result = TransformOptions::default().with_vars(vars(&[("ISA_REORDER", "alphabetical")]));
        assert!(matches!(result, Err(PipelineError::Config(_))));

        let result = TransformOptions::default().with_vars(vars(&[("ISA_DUBLIN_CORE", "maybe")]));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_build_all_keeps_good_records() {
        let records = vec![
            FlatRecord::new().with(Field::Pid, "uofm:1").with(Field::Title, "Letter"),
            FlatRecord::new().with(Field::Title, "No pid"),
            FlatRecord::new().with(Field::Pid, "uofm:3").with(Field::Title, "Map"),
        ];
        let (built, failures) = build_all(&records, &TransformOptions::default());

        assert_eq!(built.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source, "row 3");
        assert!(failures[0].message.contains("No pid"));
    }

    #[test]
    fn test_unsupported_input() {
        let result = convert(
            Path::new("/nonexistent/isa-input"),
            Path::new("/tmp/out"),
            &TransformOptions::default(),
        );
        assert!(matches!(
            result,
            Err(PipelineError::Load(LoadError::UnsupportedInput(_)))
        ));
    }
}
