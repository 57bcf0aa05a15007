//! Build MODS (and optionally Dublin Core) documents from flat records.
//!
//! # Architecture
//!
//! ```text
//! FlatRecord                         MODS tree
//! ┌──────────────────────────┐       ┌──────────────────────────────────┐
//! │ personal_creator  A ; B  │       │ <name type="personal">           │
//! │ personal_creator_        │  →    │   <namePart>A</namePart> (u1)    │
//! │   valueURI        u1     │       │ <name type="personal">           │
//! └──────────────────────────┘       │   <namePart>B</namePart>         │
//!                                    └──────────────────────────────────┘
//! ```
//!
//! Each section checks its feeding fields first and is omitted when none of
//! them has a non-blank value. Inside a section, optional fields are emitted
//! only when non-empty. Title and identifiers are always emitted.

use crate::catalog::{Field, NameRole};
use crate::document::{DescriptionDocument, Element};
use crate::error::{BuildError, BuildResult};
use crate::models::{FlatRecord, MultiValueGroup};

use super::dublin_core::build_dublin_core;

const MODS_NS: &str = "http://www.loc.gov/mods/v3";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const MODS_SCHEMA: &str = "http://www.loc.gov/mods/v3 http://www.loc.gov/standards/mods/v3/mods-3-8.xsd";

// =============================================================================
// Sections
// =============================================================================

const PHYSICAL_COLLECTION: &[Field] = &[
    Field::ArchivalCallNumber,
    Field::ArchivalCollection,
    Field::FindingAidArk,
    Field::PhysicalLocation,
    Field::ArchivalSeriesTitle,
    Field::FolderTitle,
    Field::BoxNumber,
    Field::Folder,
];

const DIGITAL_COLLECTION: &[Field] = &[Field::DigitalCollection, Field::DigitalCollectionArk];

const RELATED_EXHIBIT: &[Field] = &[Field::RelatedExhibit, Field::RelatedExhibitUrl];

/// Name columns in emission order.
const NAMES: &[Field] = &[
    Field::ContributingInstitution,
    Field::PersonalCreator,
    Field::CorporateCreator,
    Field::Interviewee,
    Field::Interviewer,
    Field::PersonalContributor,
    Field::CorporateContributor,
];

const ORIGIN_INFO: &[Field] = &[
    Field::Publisher,
    Field::PublisherValueUri,
    Field::LocationInterview,
    Field::DateOriginal,
    Field::DateDigital,
    Field::Issuance,
    Field::IssuanceStart,
    Field::IssuanceEnd,
    Field::Frequency,
];

const TOPICAL_SUBJECTS: &[Field] = &[
    Field::TopicalSubjectLcsh,
    Field::TopicalSubjectFast,
    Field::TopicalSubjectLocal,
];

/// Geographic columns in the order they consume `coordinates`.
pub(crate) const GEOGRAPHIC_SUBJECTS: &[Field] = &[
    Field::GeographicSubjectLcsh,
    Field::GeographicSubjectFast,
    Field::GeographicSubjectGeonames,
    Field::GeographicSubjectLocal,
];

const NAME_SUBJECTS: &[Field] = &[Field::PersonalNameSubject, Field::CorporateNameSubject];

const RECORD_INFO: &[Field] = &[Field::DateCreated, Field::DateModified];

const PHYSICAL_DESCRIPTION: &[Field] = &[
    Field::Extent,
    Field::DigitalOrigin,
    Field::ReformattingQuality,
    Field::ImageManipulation,
    Field::BitsPerSample,
    Field::SamplesPerPixel,
    Field::Colorspace,
    Field::Resolution,
    Field::FileSize,
    Field::Height,
    Field::Width,
];

/// Technical notes inside `physicalDescription`, with their `note/@type`.
const TECHNICAL_NOTES: &[(Field, &str)] = &[
    (Field::ImageManipulation, "image-manipulation"),
    (Field::BitsPerSample, "bits-per-sample"),
    (Field::SamplesPerPixel, "samples-per-pixel"),
    (Field::Colorspace, "colorspace"),
    (Field::Resolution, "resolution"),
    (Field::FileSize, "file-size"),
    (Field::Height, "height"),
    (Field::Width, "width"),
];

/// Identifiers with their `identifier/@type` (`None` = bare filename).
pub(crate) const IDENTIFIERS: &[(Field, Option<&str>)] = &[
    (Field::LocalId, Some("local")),
    (Field::Ark, Some("ark")),
    (Field::AvianId, Some("avian-id")),
    (Field::Uid, Some("uid")),
    (Field::ProjectNumber, Some("project-number")),
    (Field::FileName, None),
    (Field::Pid, Some("islandora")),
];

// =============================================================================
// Public API
// =============================================================================

/// Options for building documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Also build the Dublin Core projection.
    pub dublin_core: bool,
}

/// The documents built from one record.
#[derive(Debug, Clone)]
pub struct BuiltDocuments {
    /// Output file stem, derived from `pid`.
    pub name: String,
    /// The MODS document.
    pub structured: DescriptionDocument,
    /// The Dublin Core document, when requested.
    pub flat: Option<DescriptionDocument>,
}

/// Build the documents for one record.
pub fn build(record: &FlatRecord, options: BuildOptions) -> BuildResult<BuiltDocuments> {
    let name = output_name(record)?;
    let structured = build_mods(record);
    let flat = options.dublin_core.then(|| build_dublin_core(record));

    Ok(BuiltDocuments {
        name,
        structured,
        flat,
    })
}

/// Output file stem: the part of `pid` after its last `:`.
///
/// `uofm:2440814` → `2440814`; a `pid` without a colon is used whole.
pub fn output_name(record: &FlatRecord) -> BuildResult<String> {
    let pid = record.get(Field::Pid).trim();
    let name = pid.rsplit(':').next().unwrap_or_default().trim();

    if name.is_empty() {
        return Err(BuildError::MissingIdentifier {
            title: record.get(Field::Title).trim().to_string(),
        });
    }
    Ok(name.to_string())
}

/// Build the MODS tree for one record.
pub fn build_mods(record: &FlatRecord) -> DescriptionDocument {
    let mut mods = Element::new("mods")
        .with_attr("xmlns", MODS_NS)
        .with_attr("xmlns:xsi", XSI_NS)
        .with_attr("xsi:schemaLocation", MODS_SCHEMA)
        .with_attr("version", "3.8");

    mods.push(Element::new("titleInfo").with_child(text("title", record.get(Field::Title))));

    let sections = [
        section(record, PHYSICAL_COLLECTION, physical_collection),
        section(record, DIGITAL_COLLECTION, digital_collection),
        section(record, RELATED_EXHIBIT, related_exhibit),
    ];
    mods = mods.with_children(sections.into_iter().flatten());

    for field in NAMES {
        mods = mods.with_children(names(record, *field));
    }

    let notes = [
        optional(record, Field::Description, |v| text("abstract", v)),
        optional(record, Field::Disclaimer, |v| text("note", v).with_attr("type", "Disclaimer")),
        optional(record, Field::Annotation, |v| text("note", v).with_attr("type", "annotation")),
        optional(record, Field::TableOfContents, |v| text("tableOfContents", v)),
    ];
    mods = mods
        .with_children(section(record, ORIGIN_INFO, origin_info))
        .with_children(notes.into_iter().flatten())
        .with_children(languages(record))
        .with_children(optional(record, Field::Url, |v| {
            Element::new("location").with_child(text("url", v))
        }))
        .with_children(subjects(record))
        .with_children(genres(record))
        .with_children(optional(record, Field::TypeOfResource, |v| text("typeOfResource", v)))
        .with_children(access_conditions(record))
        .with_children(section(record, RECORD_INFO, record_info))
        .with_children(section(record, PHYSICAL_DESCRIPTION, physical_description))
        .with_children(identifiers(record))
        .with_children(optional(record, Field::HardwareSoftware, |v| {
            text("note", v).with_attr("type", "hardware/software")
        }));

    DescriptionDocument::new(mods)
}

// =============================================================================
// Shared helpers
// =============================================================================

/// A leaf element with trimmed text.
pub(crate) fn text(name: &str, value: &str) -> Element {
    Element::new(name).with_text(value.trim())
}

/// `make(value)` when the field holds a non-blank value.
fn optional(record: &FlatRecord, field: Field, make: impl FnOnce(&str) -> Element) -> Option<Element> {
    record
        .is_present(field)
        .then(|| make(record.get(field).trim()))
}

/// `make(record)` when any of `fields` holds a non-blank value.
fn section(record: &FlatRecord, fields: &[Field], make: fn(&FlatRecord) -> Element) -> Option<Element> {
    record.any_present(fields).then(|| make(record))
}

/// A value column zipped with its URI column.
pub(crate) fn labelled(record: &FlatRecord, field: Field) -> MultiValueGroup<2> {
    let values = record.split(field);
    let uris = field.uri_partner().map(|uri| record.split(uri)).unwrap_or_default();
    MultiValueGroup::new([values, uris])
}

// =============================================================================
// Related items
// =============================================================================

fn title_info(value: &str) -> Element {
    Element::new("titleInfo").with_child(text("title", value))
}

fn physical_collection(record: &FlatRecord) -> Element {
    let mut collection = Element::new("relatedItem")
        .with_attr("type", "original")
        .with_attr("displayLabel", "Collection");

    let leaves = [
        optional(record, Field::ArchivalCallNumber, |v| {
            text("identifier", v).with_attr("displayLabel", "Call Number")
        }),
        optional(record, Field::ArchivalCollection, title_info),
        optional(record, Field::FindingAidArk, |v| text("identifier", v).with_attr("type", "ark")),
        optional(record, Field::PhysicalLocation, |v| {
            Element::new("location").with_child(text("physicalLocation", v))
        }),
    ];
    collection = collection.with_children(leaves.into_iter().flatten());

    if record.any_present(&[Field::ArchivalSeriesTitle, Field::FolderTitle]) {
        let series = Element::new("relatedItem")
            .with_attr("type", "series")
            .with_children(optional(record, Field::ArchivalSeriesTitle, |v| {
                title_info(v).with_attr("displayLabel", "Archival series title")
            }))
            .with_children(optional(record, Field::FolderTitle, |v| {
                Element::new("relatedItem")
                    .with_attr("type", "constituent")
                    .with_child(title_info(v).with_attr("displayLabel", "Folder title"))
            }));
        collection.push(series);
    }

    if record.any_present(&[Field::BoxNumber, Field::Folder]) {
        let container = Element::new("relatedItem")
            .with_attr("type", "constituent")
            .with_children(optional(record, Field::BoxNumber, |v| {
                title_info(v).with_attr("displayLabel", "Box")
            }))
            .with_children(optional(record, Field::Folder, |v| {
                Element::new("relatedItem")
                    .with_attr("type", "constituent")
                    .with_child(title_info(v).with_attr("displayLabel", "Folder"))
            }));
        collection.push(container);
    }

    collection
}

fn digital_collection(record: &FlatRecord) -> Element {
    Element::new("relatedItem")
        .with_attr("type", "host")
        .with_attr("displayLabel", "Digital Collection")
        .with_children(optional(record, Field::DigitalCollection, title_info))
        .with_children(optional(record, Field::DigitalCollectionArk, |v| {
            text("identifier", v).with_attr("type", "ark")
        }))
}

fn related_exhibit(record: &FlatRecord) -> Element {
    Element::new("relatedItem")
        .with_attr("type", "isReferencedBy")
        .with_children(optional(record, Field::RelatedExhibit, title_info))
        .with_children(optional(record, Field::RelatedExhibitUrl, |v| {
            Element::new("location").with_child(text("url", v))
        }))
}

// =============================================================================
// Names and origin
// =============================================================================

/// One `<name>` per filled (name, uri) tuple of a name column.
fn names(record: &FlatRecord, field: Field) -> Vec<Element> {
    let spec = field.spec();
    let Some(NameRole { name_type, role }) = spec.role else {
        return Vec::new();
    };

    labelled(record, field)
        .filled_rows()
        .map(|[name, uri]| {
            let mut element = Element::new("name")
                .with_attr("type", name_type)
                .with_attr("authority", spec.authority.unwrap_or_default())
                .with_attr("valueURI", uri)
                .with_child(text("namePart", name));
            if let Some(role) = role {
                element.push(Element::new("role").with_child(
                    text("roleTerm", role)
                        .with_attr("type", "text")
                        .with_attr("authority", "marcrelator"),
                ));
            }
            element
        })
        .collect()
}

fn origin_info(record: &FlatRecord) -> Element {
    let publisher = record
        .any_present(&[Field::Publisher, Field::PublisherValueUri])
        .then(|| {
            text("publisher", record.get(Field::Publisher))
                .with_attr("valueURI", record.get(Field::PublisherValueUri).trim())
        });

    let children = [
        publisher,
        optional(record, Field::LocationInterview, |v| {
            Element::new("place").with_child(text("placeTerm", v).with_attr("type", "text"))
        }),
        optional(record, Field::DateOriginal, |v| {
            text("dateCreated", v)
                .with_attr("keyDate", "yes")
                .with_attr("encoding", "iso8601")
        }),
        optional(record, Field::DateDigital, |v| {
            text("dateCaptured", v).with_attr("encoding", "iso8601")
        }),
        optional(record, Field::Issuance, |v| text("issuance", v)),
        optional(record, Field::IssuanceStart, |v| {
            text("dateIssued", v)
                .with_attr("encoding", "iso8601")
                .with_attr("point", "start")
        }),
        optional(record, Field::IssuanceEnd, |v| {
            text("dateIssued", v)
                .with_attr("encoding", "iso8601")
                .with_attr("point", "end")
        }),
        optional(record, Field::Frequency, |v| {
            text("frequency", v).with_attr("authority", "marcfrequency")
        }),
    ];

    Element::new("originInfo").with_children(children.into_iter().flatten())
}

fn languages(record: &FlatRecord) -> Vec<Element> {
    let authority = Field::Language.spec().authority.unwrap_or_default();
    record
        .split(Field::Language)
        .iter()
        .filter(|code| !code.is_empty())
        .map(|code| {
            Element::new("language").with_child(
                text("languageTerm", code)
                    .with_attr("type", "code")
                    .with_attr("authority", authority),
            )
        })
        .collect()
}

// =============================================================================
// Subjects
// =============================================================================

fn subjects(record: &FlatRecord) -> Vec<Element> {
    let mut subjects: Vec<Element> = TOPICAL_SUBJECTS
        .iter()
        .chain([&Field::BirdsSubject])
        .filter_map(|field| {
            let terms = terms(record, *field, "topic");
            (!terms.is_empty()).then(|| {
                Element::new("subject")
                    .with_attr("authority", field.spec().authority.unwrap_or_default())
                    .with_children(terms)
            })
        })
        .collect();

    subjects.extend(geographic_subjects(record));

    for field in NAME_SUBJECTS {
        let Some(role) = field.spec().role else { continue };
        let names: Vec<Element> = labelled(record, *field)
            .filled_rows()
            .map(|[name, uri]| {
                Element::new("name")
                    .with_attr("type", role.name_type)
                    .with_attr("valueURI", uri)
                    .with_child(text("namePart", name))
            })
            .collect();
        if !names.is_empty() {
            subjects.push(
                Element::new("subject")
                    .with_attr("authority", field.spec().authority.unwrap_or_default())
                    .with_children(names),
            );
        }
    }

    let events = terms(record, Field::EventSubject, "topic");
    if !events.is_empty() {
        subjects.push(Element::new("subject").with_children(events));
    }

    let periods = terms(record, Field::ChronologicalSubject, "temporal");
    if !periods.is_empty() {
        subjects.push(Element::new("subject").with_children(periods));
    }

    subjects
}

/// One `<{name} valueURI>` per filled tuple of `field`.
fn terms(record: &FlatRecord, field: Field, name: &str) -> Vec<Element> {
    labelled(record, field)
        .filled_rows()
        .map(|[term, uri]| text(name, term).with_attr("valueURI", uri))
        .collect()
}

/// One `<subject authority>` per geographic term.
///
/// The `coordinates` column is a single list shared by all four geographic
/// columns, consumed positionally in [`GEOGRAPHIC_SUBJECTS`] order.
/// Coordinates left over once every term has its own are kept in bare
/// `<subject><cartographics>` elements.
fn geographic_subjects(record: &FlatRecord) -> Vec<Element> {
    let coordinates = record.split(Field::Coordinates);
    let mut offset = 0;
    let mut subjects = Vec::new();

    for field in GEOGRAPHIC_SUBJECTS {
        let group = labelled(record, *field);
        let authority = field.spec().authority.unwrap_or_default();

        for (i, [place, uri]) in group.rows().enumerate() {
            let coordinate = coordinates.get(offset + i).map(String::as_str).unwrap_or("");
            if place.is_empty() && uri.is_empty() && coordinate.is_empty() {
                continue;
            }

            let mut subject = Element::new("subject")
                .with_attr("authority", authority)
                .with_child(text("geographic", place).with_attr("valueURI", uri));
            if !coordinate.is_empty() {
                subject.push(cartographics(coordinate));
            }
            subjects.push(subject);
        }
        offset += group.len();
    }

    let leftover = coordinates.get(offset..).unwrap_or_default();
    let filled = leftover.iter().rposition(|c| !c.is_empty()).map_or(0, |last| last + 1);
    subjects.extend(
        leftover[..filled]
            .iter()
            .map(|c| Element::new("subject").with_child(cartographics(c))),
    );

    subjects
}

fn cartographics(coordinate: &str) -> Element {
    Element::new("cartographics")
        .with_child(text("projection", "WGS84"))
        .with_child(text("coordinates", coordinate))
}

// =============================================================================
// Genres, rights, record info
// =============================================================================

fn genres(record: &FlatRecord) -> Vec<Element> {
    let mut genres: Vec<Element> = labelled(record, Field::AatGenre)
        .filled_rows()
        .map(|[term, uri]| {
            text("genre", term)
                .with_attr("authority", "aat")
                .with_attr("type", "genre")
                .with_attr("valueURI", uri)
        })
        .collect();

    genres.extend(labelled(record, Field::AatType).filled_rows().map(|[term, uri]| {
        text("genre", term)
            .with_attr("authority", "aat")
            .with_attr("valueURI", uri)
    }));

    genres.extend(optional(record, Field::CcoDescription, |v| {
        text("genre", v).with_attr("authority", "cco")
    }));

    if record.any_present(&[Field::DcmiType, Field::DcmiTypeValueUri]) {
        genres.push(
            text("genre", record.get(Field::DcmiType))
                .with_attr("authority", "dct")
                .with_attr("valueURI", record.get(Field::DcmiTypeValueUri).trim()),
        );
    }

    genres.extend(optional(record, Field::ImtType, |v| {
        text("genre", v).with_attr("authority", "imt")
    }));

    genres
}

fn access_conditions(record: &FlatRecord) -> Vec<Element> {
    labelled(record, Field::RightsManagement)
        .filled_rows()
        .map(|[rights, uri]| {
            text("accessCondition", rights)
                .with_attr("type", "use and reproduction")
                .with_attr("valueURI", uri)
        })
        .collect()
}

fn record_info(record: &FlatRecord) -> Element {
    Element::new("recordInfo")
        .with_children(optional(record, Field::DateCreated, |v| {
            text("recordCreationDate", v).with_attr("encoding", "iso8601")
        }))
        .with_children(optional(record, Field::DateModified, |v| {
            text("recordChangeDate", v).with_attr("encoding", "iso8601")
        }))
}

fn physical_description(record: &FlatRecord) -> Element {
    let non_empty = |field: Field| {
        record
            .split(field)
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
    };

    let mut description = Element::new("physicalDescription")
        .with_children(non_empty(Field::Extent).iter().map(|v| text("extent", v)))
        .with_children(optional(record, Field::DigitalOrigin, |v| text("digitalOrigin", v)))
        .with_children(
            non_empty(Field::ReformattingQuality)
                .iter()
                .map(|v| text("reformattingQuality", v)),
        );

    for (field, note_type) in TECHNICAL_NOTES {
        description = description.with_children(optional(record, *field, |v| {
            text("note", v).with_attr("type", note_type)
        }));
    }
    description
}

/// Every identifier, always emitted (empty elements included).
fn identifiers(record: &FlatRecord) -> Vec<Element> {
    IDENTIFIERS
        .iter()
        .map(|(field, id_type)| {
            let element = text("identifier", record.get(*field));
            match id_type {
                Some(t) => element.with_attr("type", t),
                None => element,
            }
        })
        .collect()
}
