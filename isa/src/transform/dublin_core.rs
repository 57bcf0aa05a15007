//! Dublin Core projection of a flat record.
//!
//! A flat `oai_dc:dc` document: every element is a direct child of the root
//! and repeats as needed. Label/URI pairs are interleaved (label, then URI)
//! using the same zipping as the MODS builder.

use crate::catalog::Field;
use crate::document::{DescriptionDocument, Element};
use crate::models::{FlatRecord, MultiValueGroup};

use super::builder::{labelled, text, GEOGRAPHIC_SUBJECTS, IDENTIFIERS};

const OAI_DC_NS: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const OAI_DC_SCHEMA: &str =
    "http://www.openarchives.org/OAI/2.0/oai_dc/ http://www.openarchives.org/OAI/2.0/oai_dc.xsd";

const CREATORS: &[Field] = &[Field::PersonalCreator, Field::CorporateCreator];

const CONTRIBUTORS: &[Field] = &[
    Field::ContributingInstitution,
    Field::Interviewee,
    Field::Interviewer,
    Field::PersonalContributor,
    Field::CorporateContributor,
];

const SUBJECTS: &[Field] = &[
    Field::TopicalSubjectLcsh,
    Field::TopicalSubjectFast,
    Field::TopicalSubjectLocal,
    Field::BirdsSubject,
    Field::PersonalNameSubject,
    Field::CorporateNameSubject,
    Field::EventSubject,
];

const TYPES: &[Field] = &[Field::AatGenre, Field::AatType, Field::DcmiType];

/// Accumulates `dc:*` children in emission order.
struct DcWriter<'a> {
    record: &'a FlatRecord,
    root: Element,
}

impl<'a> DcWriter<'a> {
    fn new(record: &'a FlatRecord) -> Self {
        let root = Element::new("oai_dc:dc")
            .with_attr("xmlns:oai_dc", OAI_DC_NS)
            .with_attr("xmlns:dc", DC_NS)
            .with_attr("xmlns:xsi", XSI_NS)
            .with_attr("xsi:schemaLocation", OAI_DC_SCHEMA);
        Self { record, root }
    }

    /// `dc:{name}` with `value`, skipped when blank.
    fn value(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.root.push(text(&format!("dc:{}", name), value));
        }
    }

    fn field(&mut self, name: &str, field: Field) {
        let record = self.record;
        self.value(name, record.get(field));
    }

    /// One element per value of a repeated field.
    fn each(&mut self, name: &str, field: Field) {
        for value in self.record.split(field) {
            self.value(name, &value);
        }
    }

    /// Label then URI, tuple by tuple, across `fields`.
    fn interleaved(&mut self, name: &str, fields: &[Field]) {
        for field in fields {
            let group = if field.is_repeated() {
                labelled(self.record, *field)
            } else {
                single_pair(self.record, *field)
            };
            for [label, uri] in group.filled_rows() {
                self.value(name, label);
                self.value(name, uri);
            }
        }
    }

    fn finish(self) -> DescriptionDocument {
        DescriptionDocument::new(self.root)
    }
}

/// A single-valued column and its URI as a one-row group.
fn single_pair(record: &FlatRecord, field: Field) -> MultiValueGroup<2> {
    let uri = field.uri_partner().map(|u| record.get(u).trim().to_string());
    MultiValueGroup::new([
        vec![record.get(field).trim().to_string()],
        uri.into_iter().collect(),
    ])
}

/// Build the Dublin Core document for one record.
pub fn build_dublin_core(record: &FlatRecord) -> DescriptionDocument {
    let mut dc = DcWriter::new(record);

    dc.root.push(text("dc:title", record.get(Field::Title)));

    dc.field("source", Field::ArchivalCollection);
    let context: Vec<&str> = [
        Field::ArchivalSeriesTitle,
        Field::FolderTitle,
        Field::BoxNumber,
        Field::Folder,
    ]
    .iter()
    .map(|f| record.get(*f).trim())
    .filter(|v| !v.is_empty())
    .collect();
    dc.value("source", &context.join(", "));
    dc.field("source", Field::FindingAidArk);
    dc.field("source", Field::ArchivalCallNumber);

    dc.field("relation", Field::DigitalCollection);
    dc.field("relation", Field::DigitalCollectionArk);

    dc.field("publisher", Field::Publisher);

    dc.interleaved("creator", CREATORS);

    for field in CONTRIBUTORS {
        for [name, uri] in labelled(record, *field).filled_rows() {
            let contributor = match (name.is_empty(), uri.is_empty()) {
                (false, false) => format!("{}; {}", name, uri),
                (false, true) => name.to_string(),
                _ => uri.to_string(),
            };
            dc.value("contributor", &contributor);
        }
    }

    dc.field("date", Field::DateOriginal);
    dc.field("description", Field::Description);
    dc.field("description", Field::Annotation);
    dc.each("language", Field::Language);

    dc.interleaved("subject", SUBJECTS);
    dc.interleaved("coverage", GEOGRAPHIC_SUBJECTS);
    dc.each("coverage", Field::ChronologicalSubject);

    dc.interleaved("type", TYPES);
    dc.field("type", Field::TypeOfResource);

    for [rights, uri] in labelled(record, Field::RightsManagement).filled_rows() {
        dc.value("rights", uri);
        dc.value("rights", rights);
    }

    dc.each("format", Field::Extent);

    for (field, _) in IDENTIFIERS {
        dc.field("identifier", *field);
    }

    dc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::query::Query;

    fn values(doc: &DescriptionDocument, name: &str) -> Vec<String> {
        Query::parse(name).unwrap().values(doc.root())
    }

    #[test]
    fn test_root_and_namespaces() {
        let doc = build_dublin_core(&FlatRecord::new().with(Field::Title, "Map"));
        let xml = doc.to_xml().unwrap();

        assert_eq!(doc.root().name(), "oai_dc:dc");
        assert!(xml.contains(r#"xmlns:dc="http://purl.org/dc/elements/1.1/""#));
        assert!(xml.contains("<dc:title>Map</dc:title>"));
    }

    #[test]
    fn test_source_joins_hierarchy_context() {
        let record = FlatRecord::new()
            .with(Field::ArchivalCollection, "Tribune fonds")
            .with(Field::ArchivalSeriesTitle, "Series 2")
            .with(Field::BoxNumber, "14")
            .with(Field::Folder, "3")
            .with(Field::ArchivalCallNumber, "MSS 24");
        let doc = build_dublin_core(&record);

        assert_eq!(values(&doc, "source"), vec!["Tribune fonds", "Series 2, 14, 3", "MSS 24"]);
    }

    #[test]
    fn test_creators_interleave_name_and_uri() {
        let record = FlatRecord::new()
            .with(Field::PersonalCreator, "Doe, Jane; Roe, Rick")
            .with(Field::PersonalCreatorValueUri, "http://id/1")
            .with(Field::CorporateCreator, "Tribune");
        let doc = build_dublin_core(&record);

        assert_eq!(
            values(&doc, "creator"),
            vec!["Doe, Jane", "http://id/1", "Roe, Rick", "Tribune"]
        );
    }

    #[test]
    fn test_contributor_carries_uri_inline() {
        let record = FlatRecord::new()
            .with(Field::Interviewee, "Smith, Ann; Lee, Bo")
            .with(Field::IntervieweeValueUri, "http://id/9");
        let doc = build_dublin_core(&record);

        assert_eq!(values(&doc, "contributor"), vec!["Smith, Ann; http://id/9", "Lee, Bo"]);
    }

    #[test]
    fn test_coverage_and_rights_order() {
        let record = FlatRecord::new()
            .with(Field::GeographicSubjectFast, "Manitoba")
            .with(Field::GeographicSubjectFastValueUri, "http://fast/1")
            .with(Field::ChronologicalSubject, "1950s; 1960s")
            .with(Field::RightsManagement, "In Copyright")
            .with(Field::RightsManagementValueUri, "http://rightsstatements.org/vocab/InC/1.0/");
        let doc = build_dublin_core(&record);

        assert_eq!(values(&doc, "coverage"), vec!["Manitoba", "http://fast/1", "1950s", "1960s"]);
        assert_eq!(
            values(&doc, "rights"),
            vec!["http://rightsstatements.org/vocab/InC/1.0/", "In Copyright"]
        );
    }

    #[test]
    fn test_blank_fields_emit_nothing() {
        let doc = build_dublin_core(&FlatRecord::new().with(Field::Title, "Map"));
        assert_eq!(doc.root().children().len(), 1);
    }
}
