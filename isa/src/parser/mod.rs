//! Spreadsheet reading and writing with encoding and delimiter auto-detection.
//!
//! Rows are mapped onto the field catalog: catalog columns fill the
//! matching [`FlatRecord`] field, unknown columns are reported and ignored,
//! and missing catalog columns read as `""`.

use std::io::Write;
use std::path::Path;

use crate::catalog::{header, Field};
use crate::error::{LoadError, LoadResult};
use crate::models::FlatRecord;

/// Columns a spreadsheet must have.
pub const REQUIRED_COLUMNS: &[Field] = &[Field::Pid, Field::Title];

/// CSV parsing error with context
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            None => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One record per data row
    pub records: Vec<FlatRecord>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers, as found in the file
    pub headers: Vec<String>,
    /// Headers that are not catalog columns
    pub unknown_columns: Vec<String>,
}

// =============================================================================
// Detection
// =============================================================================

/// UTF-8 byte order mark.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always taken as UTF-8; `chardet` only guesses for
/// everything else.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        // Not valid UTF-8, so fall back to the usual spreadsheet export charset
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "windows-1252".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
///
/// `iso-8859-1` decodes with the WHATWG mapping (Windows-1252), which agrees
/// with Latin-1 on every printable character.
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, CsvError> {
    let content = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            std::str::from_utf8(bytes)
                .map_err(|e| CsvError::new(0, format!("Invalid UTF-8 at byte {}", e.valid_up_to())))?
                .to_string()
        }
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .map(|enc| enc.decode(bytes).0.into_owned())
            .ok_or_else(|| CsvError::new(0, format!("Unsupported encoding '{}'", other)))?,
    };

    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// Reading
// =============================================================================

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> LoadResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> LoadResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV text with an explicit delimiter.
///
/// Fails on an empty file, a missing `pid`/`title` column, a duplicated
/// header or a row whose length differs from the header's.
pub fn parse_string_with_metadata(content: &str, delimiter: char, encoding: String) -> LoadResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(false)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(e, 1))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|f| !headers.iter().any(|h| h == f.column()))
        .map(|f| f.column().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }

    for (i, h) in headers.iter().enumerate() {
        if headers[..i].contains(h) {
            return Err(CsvError::new(1, "Duplicate column").with_column(h.clone()).into());
        }
    }

    let fields: Vec<Option<Field>> = headers.iter().map(|h| Field::from_column(h)).collect();
    let unknown_columns: Vec<String> = headers
        .iter()
        .zip(&fields)
        .filter(|(h, f)| f.is_none() && !h.is_empty())
        .map(|(h, _)| h.clone())
        .collect();

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| csv_error(e, i + 2))?;
        let record = fields
            .iter()
            .zip(row.iter())
            .fold(FlatRecord::new(), |record, (field, value)| match field {
                Some(field) => record.with(*field, value.trim()),
                None => record,
            });
        records.push(record);
    }

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
        unknown_columns,
    })
}

/// Convert a `csv` error into a line-numbered [`CsvError`].
fn csv_error(err: csv::Error, fallback_line: usize) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);

    match err.kind() {
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => CsvError::new(
            line,
            format!("expected {} fields, found {}", expected_len, len),
        ),
        _ => CsvError::new(line, err.to_string()),
    }
}

// =============================================================================
// Writing
// =============================================================================

/// Write records under the catalog header.
///
/// The header is written even when there are no records.
pub fn write_csv<W: Write>(writer: W, records: &[FlatRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header())?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;
    Ok(())
}
