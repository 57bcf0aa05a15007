//! End-to-end conversions through the filesystem.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use isa::{
    build_mods, csv_to_documents, documents_to_csv, flatten, flatten_source, header,
    parse_csv_file_auto, reorder, write_csv, Field, FlatRecord, PipelineError, ReorderStrategy,
    TransformOptions,
};
use tempfile::TempDir;

fn letter() -> FlatRecord {
    FlatRecord::new()
        .with(Field::Pid, "uofm:100")
        .with(Field::Title, "Letter & envelope")
        .with(Field::ArchivalCollection, "Tribune fonds")
        .with(Field::BoxNumber, "14")
        .with(Field::Folder, "3")
        .with(Field::PersonalCreator, "Doe, Jane; Roe, Rick")
        .with(Field::PersonalCreatorValueUri, "http://id.loc.gov/authorities/names/n1")
        .with(Field::Description, "Lettre écrite à Montréal, 1912.")
        .with(Field::LocationInterview, "Saint-Boniface (Québec)")
        .with(Field::Language, "eng; fre")
        .with(Field::TopicalSubjectLcsh, "Newspapers; Winnipeg (Man.)")
        .with(Field::TopicalSubjectLcshValueUri, "; http://id.loc.gov/authorities/subjects/sh2")
        .with(Field::GeographicSubjectLcsh, "Manitoba")
        .with(Field::GeographicSubjectGeonames, "Winnipeg; Brandon")
        .with(Field::GeographicSubjectGeonamesValueUri, "http://sws.geonames.org/6183235")
        .with(Field::Coordinates, "; 49.88,-97.14; 49.84,-99.95")
        .with(Field::AatGenre, "letters (correspondence)")
        .with(Field::AatGenreValueUri, "http://vocab.getty.edu/aat/300026879")
        .with(Field::DcmiType, "Text")
        .with(Field::DcmiTypeValueUri, "http://purl.org/dc/dcmitype/Text")
        .with(Field::TypeOfResource, "text")
        .with(Field::RightsManagement, "In Copyright")
        .with(Field::RightsManagementValueUri, "http://rightsstatements.org/vocab/InC/1.0/")
        .with(Field::DateOriginal, "1912-05-01")
        .with(Field::Extent, "2 pages; 8½ x 11 in.")
        .with(Field::LocalId, "MSS-24-14-3")
        .with(Field::FileName, "letter.tif")
}

fn map() -> FlatRecord {
    FlatRecord::new()
        .with(Field::Pid, "uofm:101")
        .with(Field::Title, "Map of the Red River")
        .with(Field::CorporateCreator, "Hudson's Bay Company")
        .with(Field::DateOriginal, "1870")
}

fn write_records(path: &Path, records: &[FlatRecord]) {
    let file = fs::File::create(path).unwrap();
    write_csv(BufWriter::new(file), records).unwrap();
}

fn no_reorder() -> TransformOptions {
    TransformOptions {
        reorder: None,
        ..TransformOptions::default()
    }
}

#[test]
fn test_record_survives_build_and_flatten() {
    for record in [letter(), map()] {
        let xml = build_mods(&record).to_xml().unwrap();
        assert_eq!(flatten_source(&xml).unwrap(), record);
    }
}

#[test]
fn test_special_characters_escaped_once() {
    let xml = build_mods(&letter()).to_xml().unwrap();
    assert!(xml.contains("Letter &amp; envelope"));
    assert!(!xml.contains("&amp;amp;"));

    let record = flatten_source(&xml).unwrap();
    assert_eq!(record.get(Field::Title), "Letter & envelope");
}

#[test]
fn test_empty_sections_are_omitted() {
    let xml = build_mods(&map()).to_xml().unwrap();
    assert!(!xml.contains("<subject"));
    assert!(!xml.contains("<relatedItem"));
    assert!(!xml.contains("<abstract"));
    assert!(xml.contains(r#"<identifier type="islandora">uofm:101</identifier>"#));
}

#[test]
fn test_directory_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input_csv = tmp.path().join("records.csv");
    let documents = tmp.path().join("mods");
    let output_csv = tmp.path().join("flattened.csv");
    write_records(&input_csv, &[letter(), map()]);

    let report = csv_to_documents(&input_csv, &documents, &no_reorder()).unwrap();
    assert_eq!(report.written, 2);
    assert!(documents.join("100.xml").is_file());
    assert!(documents.join("101.xml").is_file());
    assert!(!documents.join("100_dc.xml").exists());

    let report = documents_to_csv(&documents, &output_csv, &no_reorder()).unwrap();
    assert_eq!(report.written, 2);
    assert!(report.skipped.is_empty());

    let parsed = parse_csv_file_auto(&output_csv).unwrap();
    assert_eq!(parsed.delimiter, ',');
    assert_eq!(parsed.records, vec![letter(), map()]);
}

#[test]
fn test_dublin_core_documents_are_skipped_when_flattening() {
    let tmp = TempDir::new().unwrap();
    let input_csv = tmp.path().join("records.csv");
    let documents = tmp.path().join("out");
    write_records(&input_csv, &[letter()]);

    let options = TransformOptions {
        dublin_core: true,
        ..no_reorder()
    };
    csv_to_documents(&input_csv, &documents, &options).unwrap();

    let dc = fs::read_to_string(documents.join("100_dc.xml")).unwrap();
    assert!(dc.contains("<dc:title>Letter &amp; envelope</dc:title>"));

    let report = documents_to_csv(&documents, &tmp.path().join("back.csv"), &options).unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].source, "100_dc.xml");
}

#[test]
fn test_missing_identifier_still_writes_others() {
    let tmp = TempDir::new().unwrap();
    let input_csv = tmp.path().join("records.csv");
    let documents = tmp.path().join("mods");
    let orphan = FlatRecord::new().with(Field::Title, "Untitled photograph");
    write_records(&input_csv, &[letter(), orphan, map()]);

    let result = csv_to_documents(&input_csv, &documents, &no_reorder());
    assert!(matches!(
        result,
        Err(PipelineError::BuildFailures { failed: 1, total: 3 })
    ));
    assert!(documents.join("100.xml").is_file());
    assert!(documents.join("101.xml").is_file());
    assert_eq!(fs::read_dir(&documents).unwrap().count(), 2);
}

#[test]
fn test_malformed_document_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    for (name, record) in [("d1.xml", letter()), ("d3.xml", map())] {
        fs::write(dir.join(name), build_mods(&record).to_xml().unwrap()).unwrap();
    }
    fs::write(dir.join("d2.xml"), "<mods><titleInfo><title>Broken</titleInfo>").unwrap();
    fs::write(dir.join("notes.txt"), "not a document").unwrap();

    let output_csv = dir.join("out.csv");
    let report = documents_to_csv(dir, &output_csv, &no_reorder()).unwrap();

    assert_eq!(report.written, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].source, "d2.xml");
    assert_eq!(parse_csv_file_auto(&output_csv).unwrap().records, vec![letter(), map()]);
}

#[test]
fn test_non_utf8_document_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.xml"), build_mods(&letter()).to_xml().unwrap()).unwrap();
    fs::write(
        dir.join("b.xml"),
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<mods><titleInfo><title>Qu\xE9bec</title></titleInfo></mods>".as_slice(),
    )
    .unwrap();

    let output_csv = dir.join("out.csv");
    let report = documents_to_csv(dir, &output_csv, &no_reorder()).unwrap();

    assert_eq!(report.written, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].source, "b.xml");

    let parsed = parse_csv_file_auto(&output_csv).unwrap();
    assert_eq!(parsed.encoding, "utf-8");
    assert_eq!(parsed.records, vec![letter()]);
}

#[test]
fn test_coordinates_beyond_geographic_terms_survive() {
    let record = FlatRecord::new()
        .with(Field::Pid, "uofm:300")
        .with(Field::Title, "Survey points")
        .with(Field::GeographicSubjectLcsh, "Manitoba")
        .with(Field::Coordinates, "49.0,-97.0; 50.0,-98.0; ; 51.0,-99.0");

    let xml = build_mods(&record).to_xml().unwrap();
    assert_eq!(flatten_source(&xml).unwrap(), record);
}

#[test]
fn test_empty_directory_writes_header_only() {
    let tmp = TempDir::new().unwrap();
    let documents = tmp.path().join("empty");
    fs::create_dir(&documents).unwrap();
    let output_csv = tmp.path().join("out.csv");

    let report = documents_to_csv(&documents, &output_csv, &TransformOptions::default()).unwrap();
    assert_eq!(report.written, 0);

    let content = fs::read_to_string(&output_csv).unwrap();
    assert_eq!(content.trim_end(), header().join(","));
}

#[test]
fn test_components_follow_their_parent() {
    let parent = |pid: &str, local_id: &str| {
        FlatRecord::new()
            .with(Field::Pid, pid)
            .with(Field::Title, format!("Scrapbook {}", local_id))
            .with(Field::LocalId, local_id)
    };
    let page = |local_id: &str, file: &str| {
        FlatRecord::new()
            .with(Field::Title, format!("Page {}", file))
            .with(Field::LocalId, local_id)
            .with(Field::FileName, file)
    };

    let records = vec![
        parent("uofm:1", "SB-1"),
        parent("uofm:2", "SB-2"),
        page("", "SB-1.tif"),
        page("SB-2", "p1.tif"),
        page("SB-1", "p2.tif"),
    ];
    let ordered = reorder(records.clone(), Some(ReorderStrategy::Identifier));

    let titles: Vec<&str> = ordered.iter().map(|r| r.get(Field::Title)).collect();
    assert_eq!(
        titles,
        vec![
            "Scrapbook SB-1",
            "Page SB-1.tif",
            "Page p2.tif",
            "Scrapbook SB-2",
            "Page p1.tif",
        ]
    );

    // A permutation, and stable under a second pass
    let mut sorted_in = records;
    let mut sorted_out = ordered.clone();
    sorted_in.sort();
    sorted_out.sort();
    assert_eq!(sorted_in, sorted_out);
    assert_eq!(reorder(ordered.clone(), Some(ReorderStrategy::Identifier)), ordered);
}

#[test]
fn test_flatten_accepts_prefixed_root() {
    let xml = r#"<m:mods xmlns:m="http://www.loc.gov/mods/v3">
  <m:titleInfo><m:title>Prefixed</m:title></m:titleInfo>
  <m:identifier type="islandora">uofm:7</m:identifier>
</m:mods>"#;
    let doc = isa::DescriptionDocument::parse(xml).unwrap();
    let record = flatten(&doc).unwrap();
    assert_eq!(record.get(Field::Title), "Prefixed");
    assert_eq!(record.get(Field::Pid), "uofm:7");
}
