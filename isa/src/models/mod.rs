//! Domain models for the conversion pipeline.
//!
//! - [`FlatRecord`] - One spreadsheet row, keyed by the field catalog
//! - [`MultiValueGroup`] - Parallel `;`-separated columns zipped into rows
//!
//! Both directions agree on the multi-value conventions defined here:
//! values are split on `;` and trimmed when read, and joined with `"; "`
//! when written back.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::Field;

/// Separator between values of a repeated field, on the read side.
pub const VALUE_SEPARATOR: char = ';';

/// Separator used when re-joining values extracted from a document.
pub const JOINED_SEPARATOR: &str = "; ";

// =============================================================================
// Multi-value helpers
// =============================================================================

/// Split a repeated field into trimmed values.
///
/// A blank field (empty, whitespace or only separators) yields no values at
/// all, so it never contributes rows to a [`MultiValueGroup`].
pub fn split_values(raw: &str) -> Vec<String> {
    if raw.split(VALUE_SEPARATOR).all(|v| v.trim().is_empty()) {
        return Vec::new();
    }
    raw.split(VALUE_SEPARATOR)
        .map(|v| v.trim().to_string())
        .collect()
}

/// Join values with `"; "`, dropping trailing empty values.
///
/// Interior empty values are kept so that parallel columns stay aligned.
pub fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut values: Vec<String> = values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .collect();
    while values.last().is_some_and(|v| v.is_empty()) {
        values.pop();
    }
    values.join(JOINED_SEPARATOR)
}

// =============================================================================
// Flat Record
// =============================================================================

/// One spreadsheet row.
///
/// Every catalog field is always present (missing input columns read as
/// `""`) and iteration follows the catalog column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatRecord {
    values: Vec<String>,
}

impl FlatRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self {
            values: vec![String::new(); Field::COUNT],
        }
    }

    /// Return this record with `field` set to `value`.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.values[field.index()] = value.into();
        self
    }

    /// Build a record from `(column, value)` pairs.
    ///
    /// Columns that are not in the catalog are ignored.
    pub fn from_columns<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .fold(Self::new(), |record, (column, value)| match Field::from_column(column) {
                Some(field) => record.with(field, value),
                None => record,
            })
    }

    /// Raw value of a field.
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Trimmed values of a repeated field (see [`split_values`]).
    pub fn split(&self, field: Field) -> Vec<String> {
        split_values(self.get(field))
    }

    /// Does the field hold at least one non-blank value?
    pub fn is_present(&self, field: Field) -> bool {
        self.get(field)
            .split(VALUE_SEPARATOR)
            .any(|v| !v.trim().is_empty())
    }

    /// Does any of the fields hold a non-blank value?
    pub fn any_present(&self, fields: &[Field]) -> bool {
        fields.iter().any(|f| self.is_present(*f))
    }

    /// Does the record carry its own file-level identifier (`pid`)?
    pub fn has_identifier(&self) -> bool {
        !self.get(Field::Pid).trim().is_empty()
    }

    /// `(field, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        Field::ALL
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    /// Values in column order, ready to be written as a CSV row.
    pub fn to_row(&self) -> Vec<&str> {
        self.values.iter().map(String::as_str).collect()
    }
}

impl Default for FlatRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for FlatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Field::COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.column(), value)?;
        }
        map.end()
    }
}

// =============================================================================
// Multi-value Groups
// =============================================================================

/// `N` parallel value lists aligned by position.
///
/// Shorter lists are padded with `""`; the group is as long as its longest
/// list. Unequal lengths are expected and never an error.
///
/// ```text
/// names  A ; B ; C          rows  [A, u1]
/// uris   u1                  →     [B, ""]
///                                  [C, ""]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultiValueGroup<const N: usize> {
    lists: [Vec<String>; N],
}

impl<const N: usize> MultiValueGroup<N> {
    pub fn new(lists: [Vec<String>; N]) -> Self {
        Self { lists }
    }

    /// Split `fields` of `record` into parallel lists.
    pub fn from_record(record: &FlatRecord, fields: [Field; N]) -> Self {
        Self::new(fields.map(|f| record.split(f)))
    }

    /// Number of rows (the longest list).
    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every row, padded with `""`.
    pub fn rows(&self) -> impl Iterator<Item = [&str; N]> + '_ {
        (0..self.len()).map(move |i| {
            std::array::from_fn(|k| self.lists[k].get(i).map(String::as_str).unwrap_or(""))
        })
    }

    /// Rows with at least one non-empty slot.
    pub fn filled_rows(&self) -> impl Iterator<Item = [&str; N]> + '_ {
        self.rows().filter(|row| row.iter().any(|v| !v.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_split_trims_values() {
        assert_eq!(split_values(" eng ;spa; fre"), strings(&["eng", "spa", "fre"]));
        assert_eq!(split_values("a;;b"), strings(&["a", "", "b"]));
    }

    #[test]
    fn test_split_blank_field_has_no_values() {
        assert!(split_values("").is_empty());
        assert!(split_values("  ").is_empty());
        assert!(split_values(" ; ;").is_empty());
    }

    #[test]
    fn test_join_drops_trailing_empties_only() {
        assert_eq!(join_values(["u1", "", ""]), "u1");
        assert_eq!(join_values(["", "u2"]), "; u2");
        assert_eq!(join_values(["", ""]), "");
        assert_eq!(join_values(Vec::<String>::new()), "");
    }

    #[test]
    fn test_pad_semantics() {
        let group = MultiValueGroup::new([strings(&["A", "B", "C"]), strings(&["u1"])]);
        let rows: Vec<_> = group.rows().collect();

        assert_eq!(group.len(), 3);
        assert_eq!(rows, vec![["A", "u1"], ["B", ""], ["C", ""]]);
    }

    #[test]
    fn test_longer_uri_list_is_not_truncated() {
        let group = MultiValueGroup::new([strings(&["A"]), strings(&["u1", "u2"])]);
        let rows: Vec<_> = group.rows().collect();
        assert_eq!(rows, vec![["A", "u1"], ["", "u2"]]);
    }

    #[test]
    fn test_filled_rows_skip_all_empty_rows() {
        let group = MultiValueGroup::new([strings(&["A", "", "C"]), strings(&["", "", "u3"])]);
        let rows: Vec<_> = group.filled_rows().collect();
        assert_eq!(rows, vec![["A", ""], ["C", "u3"]]);
    }

    #[test]
    fn test_group_from_record() {
        let record = FlatRecord::new()
            .with(Field::PersonalCreator, "Doe, Jane; Roe, Rick")
            .with(Field::PersonalCreatorValueUri, "http://id.loc.gov/n1");
        let group =
            MultiValueGroup::from_record(&record, [Field::PersonalCreator, Field::PersonalCreatorValueUri]);
        let rows: Vec<_> = group.rows().collect();
        assert_eq!(rows, vec![["Doe, Jane", "http://id.loc.gov/n1"], ["Roe, Rick", ""]]);
    }

    #[test]
    fn test_record_exposes_every_field() {
        let record = FlatRecord::from_columns([("title", "Letter"), ("cmodel", "ignored")]);
        assert_eq!(record.get(Field::Title), "Letter");
        assert_eq!(record.get(Field::Pid), "");
        assert_eq!(record.to_row().len(), Field::COUNT);
    }

    #[test]
    fn test_presence_checks_every_sub_value() {
        let record = FlatRecord::new()
            .with(Field::TopicalSubjectLcsh, " ; Birds")
            .with(Field::TopicalSubjectFast, " ; ");
        assert!(record.is_present(Field::TopicalSubjectLcsh));
        assert!(!record.is_present(Field::TopicalSubjectFast));
        assert!(record.any_present(&[Field::TopicalSubjectFast, Field::TopicalSubjectLcsh]));
    }

    #[test]
    fn test_serializes_in_column_order() {
        let record = FlatRecord::new().with(Field::Pid, "uofm:1").with(Field::Title, "Map");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"pid":"uofm:1","title":"Map","#));
    }
}
