//! Flatten MODS documents into spreadsheet rows.
//!
//! Every catalog field is read with its anchor/select query pair:
//!
//! ```text
//! <mods>                                   anchor  subject[@authority='geonames']/geographic
//!   <subject authority="geonames">         select  @valueURI
//!     <geographic valueURI="u1">A</…>  ──▶  entries [u1, ""]  ──▶  "u1"
//!   <subject authority="geonames">
//!     <geographic>B</geographic>
//! ```
//!
//! Single fields take the first anchor's value. Repeated fields take one
//! entry per anchor, so a label list and its URI list stay aligned even when
//! some labels have no URI; trailing empty entries are dropped.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::catalog::Field;
use crate::document::query::Query;
use crate::document::{DescriptionDocument, Element};
use crate::error::{DocumentError, FlattenError};
use crate::models::{join_values, FlatRecord};

/// Local name of the root every flattened document must have.
pub const MODS_ROOT: &str = "mods";

/// Compiled anchor and select queries, indexed like [`Field::ALL`].
static QUERIES: Lazy<Vec<(Query, Query)>> = Lazy::new(|| {
    Field::ALL
        .iter()
        .map(|field| {
            let spec = field.spec();
            // The catalog is static and its queries are covered by tests.
            let anchor = Query::parse(spec.anchor).expect("catalog anchor query");
            let select = Query::parse(spec.select).expect("catalog select query");
            (anchor, select)
        })
        .collect()
});

/// One input document, named after its source.
///
/// Content is kept as raw bytes; it must be UTF-8 to be flattened.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub content: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A skipped document and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub source: String,
    pub message: String,
}

/// Records flattened from a batch, plus the documents that were skipped.
#[derive(Debug, Clone, Default)]
pub struct FlattenBatch {
    pub records: Vec<FlatRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Flatten one parsed document.
pub fn flatten(doc: &DescriptionDocument) -> Result<FlatRecord, FlattenError> {
    let root = doc.root();
    if root.local_name() != MODS_ROOT {
        return Err(DocumentError::UnexpectedRoot {
            found: root.name().to_string(),
            expected: MODS_ROOT.to_string(),
        }
        .into());
    }

    let record = Field::ALL
        .iter()
        .zip(QUERIES.iter())
        .fold(FlatRecord::new(), |record, (field, (anchor, select))| {
            record.with(*field, extract(root, *field, anchor, select))
        });
    Ok(record)
}

/// Parse and flatten one source text.
pub fn flatten_source(content: &str) -> Result<FlatRecord, FlattenError> {
    let doc = DescriptionDocument::parse(content.trim_start_matches('\u{feff}'))?;
    flatten(&doc)
}

/// Flatten raw bytes, rejecting anything that is not UTF-8.
pub fn flatten_bytes(content: &[u8]) -> Result<FlatRecord, FlattenError> {
    flatten_source(std::str::from_utf8(content)?)
}

/// Flatten every source, skipping the ones that cannot be read.
///
/// The batch never fails as a whole; each skipped document leaves a
/// [`Diagnostic`] naming its source.
pub fn flatten_all(sources: Vec<SourceDocument>) -> FlattenBatch {
    let mut batch = FlattenBatch::default();

    for source in sources {
        match flatten_bytes(&source.content) {
            Ok(record) => batch.records.push(record),
            Err(e) => batch.diagnostics.push(Diagnostic {
                source: source.name,
                message: e.to_string(),
            }),
        }
    }

    batch
}

fn extract(root: &Element, field: Field, anchor: &Query, select: &Query) -> String {
    let anchors = anchor.elements(root);

    if field.is_repeated() {
        join_values(anchors.into_iter().map(|a| select.first_value(a)))
    } else {
        anchors
            .first()
            .map(|a| select.first_value(a))
            .unwrap_or_default()
    }
}
