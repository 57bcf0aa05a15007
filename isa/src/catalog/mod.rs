//! The field catalog shared by both conversion directions.
//!
//! Every spreadsheet column is a [`Field`]. Its [`FieldSpec`] records how many
//! values it holds, whether the builder always emits it, which URI and
//! coordinate columns are paired with it, its default authority, and the
//! query the flattener uses to read it back out of a MODS document.
//!
//! The declaration order below is the spreadsheet column order.
//!
//! # Queries
//!
//! A query is an `anchor` path evaluated from the `<mods>` root plus a
//! `select` path evaluated from each anchor (see [`crate::document::query`]).
//! Paired columns share their anchor, which keeps a label and its URI on the
//! same logical row even when some labels have no URI:
//!
//! ```text
//! personal_creator            name[@type='personal'][role/roleTerm='creator']  →  namePart
//! personal_creator_valueURI   name[@type='personal'][role/roleTerm='creator']  →  @valueURI
//! ```

use std::fmt;
use std::str::FromStr;

// =============================================================================
// Field metadata
// =============================================================================

/// How many values a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// One value, copied verbatim.
    Single,
    /// Several values separated by `;` (written back joined with `"; "`).
    Repeated,
}

/// Whether the builder emits the column when it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Always emitted, possibly as an empty element.
    Required,
    /// Emitted only when non-empty.
    Optional,
}

/// The parallel columns aligned positionally with a value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    None,
    Uri(Field),
    UriCoordinates(Field, Field),
}

/// MODS `name/@type` and marcrelator role of a name column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRole {
    pub name_type: &'static str,
    /// `None` for names used as subjects.
    pub role: Option<&'static str>,
}

/// Static description of one column.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub column: &'static str,
    pub multiplicity: Multiplicity,
    pub presence: Presence,
    pub pairing: Pairing,
    pub authority: Option<&'static str>,
    pub role: Option<NameRole>,
    /// Path from the `<mods>` root to the anchor element(s).
    pub anchor: &'static str,
    /// Path from each anchor to the value (`.` = the anchor's own text).
    pub select: &'static str,
}

impl FieldSpec {
    const fn new(column: &'static str, multiplicity: Multiplicity, anchor: &'static str) -> Self {
        Self {
            column,
            multiplicity,
            presence: Presence::Optional,
            pairing: Pairing::None,
            authority: None,
            role: None,
            anchor,
            select: ".",
        }
    }

    const fn single(column: &'static str, anchor: &'static str) -> Self {
        Self::new(column, Multiplicity::Single, anchor)
    }

    const fn repeated(column: &'static str, anchor: &'static str) -> Self {
        Self::new(column, Multiplicity::Repeated, anchor)
    }

    const fn required(self) -> Self {
        Self {
            presence: Presence::Required,
            ..self
        }
    }

    const fn select(self, select: &'static str) -> Self {
        Self { select, ..self }
    }

    const fn uri(self, partner: Field) -> Self {
        Self {
            pairing: Pairing::Uri(partner),
            ..self
        }
    }

    const fn uri_coordinates(self, uri: Field, coordinates: Field) -> Self {
        Self {
            pairing: Pairing::UriCoordinates(uri, coordinates),
            ..self
        }
    }

    const fn authority(self, authority: &'static str) -> Self {
        Self {
            authority: Some(authority),
            ..self
        }
    }

    const fn role(self, name_type: &'static str, role: &'static str) -> Self {
        Self {
            role: Some(NameRole {
                name_type,
                role: Some(role),
            }),
            ..self
        }
    }

    const fn name_type(self, name_type: &'static str) -> Self {
        Self {
            role: Some(NameRole {
                name_type,
                role: None,
            }),
            ..self
        }
    }
}

// =============================================================================
// Shared anchors
// =============================================================================

const ORIGINAL: &str = "relatedItem[@type='original']";
const SERIES: &str = "relatedItem[@type='original']/relatedItem[@type='series']";
const BOX: &str = "relatedItem[@type='original']/relatedItem[@type='constituent']";
const HOST: &str = "relatedItem[@type='host']";
const EXHIBIT: &str = "relatedItem[@type='isReferencedBy']";

const CURATOR: &str = "name[@type='corporate'][role/roleTerm='curator']";
const PERSONAL_CREATOR: &str = "name[@type='personal'][role/roleTerm='creator']";
const CORPORATE_CREATOR: &str = "name[@type='corporate'][role/roleTerm='creator']";
const INTERVIEWEE: &str = "name[@type='personal'][role/roleTerm='interviewee']";
const INTERVIEWER: &str = "name[@type='personal'][role/roleTerm='interviewer']";
const PERSONAL_CONTRIBUTOR: &str = "name[@type='personal'][role/roleTerm='contributor']";
const CORPORATE_CONTRIBUTOR: &str = "name[@type='corporate'][role/roleTerm='contributor']";

const TOPIC_FAST: &str = "subject[@authority='fast']/topic";
const TOPIC_LCSH: &str = "subject[@authority='lcsh']/topic";
const TOPIC_LOCAL: &str = "subject[@authority='local']/topic";
const TOPIC_GBIF: &str = "subject[@authority='gbif']/topic";
const GEOGRAPHIC_FAST: &str = "subject[@authority='fast']/geographic";
const GEOGRAPHIC_LCSH: &str = "subject[@authority='lcsh']/geographic";
const GEOGRAPHIC_LOCAL: &str = "subject[@authority='local']/geographic";
const GEOGRAPHIC_GEONAMES: &str = "subject[@authority='geonames']/geographic";
const PERSONAL_NAME_SUBJECT: &str = "subject[@authority='naf']/name[@type='personal']";
const CORPORATE_NAME_SUBJECT: &str = "subject[@authority='naf']/name[@type='corporate']";
const EVENT: &str = "subject[!@authority]/topic";

const AAT_GENRE: &str = "genre[@authority='aat'][@type='genre']";
const AAT_TYPE: &str = "genre[@authority='aat'][!@type]";
const DCMI: &str = "genre[@authority='dct']";

const URI: &str = "@valueURI";

// =============================================================================
// The catalog
// =============================================================================

macro_rules! catalog {
    ($($variant:ident => $spec:expr,)+) => {
        /// A column of the flat record schema, in column order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Field {
            $($variant,)+
        }

        impl Field {
            /// Every field, in column order.
            pub const ALL: &'static [Field] = &[$(Field::$variant,)+];
        }

        static SPECS: &[FieldSpec] = &[$($spec,)+];
    };
}

catalog! {
    Pid => FieldSpec::single("pid", "identifier[@type='islandora']").required(),
    Title => FieldSpec::single("title", "titleInfo/title").required(),
    ArchivalCallNumber => FieldSpec::single("archival_call_number", "relatedItem[@type='original']/identifier[@displayLabel='Call Number']"),
    ArchivalCollection => FieldSpec::single("archival_collection", ORIGINAL).select("titleInfo/title"),
    FindingAidArk => FieldSpec::single("finding_aid_ark", ORIGINAL).select("identifier[@type='ark']"),
    PhysicalLocation => FieldSpec::single("physical_location", ORIGINAL).select("location/physicalLocation"),
    ArchivalSeriesTitle => FieldSpec::single("archival_series_title", SERIES).select("titleInfo/title"),
    FolderTitle => FieldSpec::single("folder_title", SERIES).select("relatedItem[@type='constituent']/titleInfo/title"),
    BoxNumber => FieldSpec::single("box", BOX).select("titleInfo/title"),
    Folder => FieldSpec::single("folder", BOX).select("relatedItem[@type='constituent']/titleInfo/title"),
    ContributingInstitution => FieldSpec::repeated("contributing_institution", CURATOR).select("namePart").uri(Field::ContributingInstitutionValueUri).authority("naf").role("corporate", "curator"),
    ContributingInstitutionValueUri => FieldSpec::repeated("contributing_institution_valueURI", CURATOR).select(URI),
    PersonalCreator => FieldSpec::repeated("personal_creator", PERSONAL_CREATOR).select("namePart").uri(Field::PersonalCreatorValueUri).authority("naf").role("personal", "creator"),
    PersonalCreatorValueUri => FieldSpec::repeated("personal_creator_valueURI", PERSONAL_CREATOR).select(URI),
    CorporateCreator => FieldSpec::repeated("corporate_creator", CORPORATE_CREATOR).select("namePart").uri(Field::CorporateCreatorValueUri).authority("naf").role("corporate", "creator"),
    CorporateCreatorValueUri => FieldSpec::repeated("corporate_creator_valueURI", CORPORATE_CREATOR).select(URI),
    Interviewee => FieldSpec::repeated("interviewee", INTERVIEWEE).select("namePart").uri(Field::IntervieweeValueUri).authority("naf").role("personal", "interviewee"),
    IntervieweeValueUri => FieldSpec::repeated("interviewee_valueURI", INTERVIEWEE).select(URI),
    Interviewer => FieldSpec::repeated("interviewer", INTERVIEWER).select("namePart").uri(Field::InterviewerValueUri).authority("naf").role("personal", "interviewer"),
    InterviewerValueUri => FieldSpec::repeated("interviewer_valueURI", INTERVIEWER).select(URI),
    PersonalContributor => FieldSpec::repeated("personal_contributor", PERSONAL_CONTRIBUTOR).select("namePart").uri(Field::PersonalContributorValueUri).authority("naf").role("personal", "contributor"),
    PersonalContributorValueUri => FieldSpec::repeated("personal_contributor_valueURI", PERSONAL_CONTRIBUTOR).select(URI),
    CorporateContributor => FieldSpec::repeated("corporate_contributor", CORPORATE_CONTRIBUTOR).select("namePart").uri(Field::CorporateContributorValueUri).authority("naf").role("corporate", "contributor"),
    CorporateContributorValueUri => FieldSpec::repeated("corporate_contributor_valueURI", CORPORATE_CONTRIBUTOR).select(URI),
    Description => FieldSpec::single("description", "abstract"),
    Disclaimer => FieldSpec::single("disclaimer", "note[@type='Disclaimer']"),
    TableOfContents => FieldSpec::single("table_of_contents", "tableOfContents"),
    Annotation => FieldSpec::single("annotation", "note[@type='annotation']"),
    Url => FieldSpec::single("url", "location/url"),
    Language => FieldSpec::repeated("language", "language/languageTerm").authority("iso639-3"),
    TopicalSubjectFast => FieldSpec::repeated("topical_subject_fast", TOPIC_FAST).uri(Field::TopicalSubjectFastValueUri).authority("fast"),
    TopicalSubjectFastValueUri => FieldSpec::repeated("topical_subject_fast_valueURI", TOPIC_FAST).select(URI),
    GeographicSubjectFast => FieldSpec::repeated("geographic_subject_fast", GEOGRAPHIC_FAST).uri_coordinates(Field::GeographicSubjectFastValueUri, Field::Coordinates).authority("fast"),
    GeographicSubjectFastValueUri => FieldSpec::repeated("geographic_subject_fast_valueURI", GEOGRAPHIC_FAST).select(URI),
    TopicalSubjectLcsh => FieldSpec::repeated("topical_subject_lcsh", TOPIC_LCSH).uri(Field::TopicalSubjectLcshValueUri).authority("lcsh"),
    TopicalSubjectLcshValueUri => FieldSpec::repeated("topical_subject_lcsh_valueURI", TOPIC_LCSH).select(URI),
    TopicalSubjectLocal => FieldSpec::repeated("topical_subject_local", TOPIC_LOCAL).uri(Field::TopicalSubjectLocalValueUri).authority("local"),
    TopicalSubjectLocalValueUri => FieldSpec::repeated("topical_subject_local_valueURI", TOPIC_LOCAL).select(URI),
    GeographicSubjectLcsh => FieldSpec::repeated("geographic_subject_lcsh", GEOGRAPHIC_LCSH).uri_coordinates(Field::GeographicSubjectLcshValueUri, Field::Coordinates).authority("lcsh"),
    GeographicSubjectLcshValueUri => FieldSpec::repeated("geographic_subject_lcsh_valueURI", GEOGRAPHIC_LCSH).select(URI),
    GeographicSubjectLocal => FieldSpec::repeated("geographic_subject_local", GEOGRAPHIC_LOCAL).uri_coordinates(Field::GeographicSubjectLocalValueUri, Field::Coordinates).authority("local"),
    GeographicSubjectLocalValueUri => FieldSpec::repeated("geographic_subject_local_valueURI", GEOGRAPHIC_LOCAL).select(URI),
    GeographicSubjectGeonames => FieldSpec::repeated("geographic_subject_geonames", GEOGRAPHIC_GEONAMES).uri_coordinates(Field::GeographicSubjectGeonamesValueUri, Field::Coordinates).authority("geonames"),
    GeographicSubjectGeonamesValueUri => FieldSpec::repeated("geographic_subject_geonames_valueURI", GEOGRAPHIC_GEONAMES).select(URI),
    Coordinates => FieldSpec::repeated("coordinates", "subject[geographic|cartographics]").select("cartographics/coordinates"),
    PersonalNameSubject => FieldSpec::repeated("personal_name_subject", PERSONAL_NAME_SUBJECT).select("namePart").uri(Field::PersonalNameSubjectValueUri).authority("naf").name_type("personal"),
    PersonalNameSubjectValueUri => FieldSpec::repeated("personal_name_subject_valueURI", PERSONAL_NAME_SUBJECT).select(URI),
    CorporateNameSubject => FieldSpec::repeated("corporate_name_subject", CORPORATE_NAME_SUBJECT).select("namePart").uri(Field::CorporateNameSubjectValueUri).authority("naf").name_type("corporate"),
    CorporateNameSubjectValueUri => FieldSpec::repeated("corporate_name_subject_valueURI", CORPORATE_NAME_SUBJECT).select(URI),
    BirdsSubject => FieldSpec::repeated("birds_subject", TOPIC_GBIF).uri(Field::BirdsSubjectValueUri).authority("gbif"),
    BirdsSubjectValueUri => FieldSpec::repeated("birds_subject_valueURI", TOPIC_GBIF).select(URI),
    ChronologicalSubject => FieldSpec::repeated("chronological_subject", "subject[!@authority]/temporal"),
    EventSubject => FieldSpec::repeated("event_subject", EVENT).uri(Field::EventSubjectValueUri),
    EventSubjectValueUri => FieldSpec::repeated("event_subject_valueURI", EVENT).select(URI),
    Extent => FieldSpec::repeated("extent", "physicalDescription/extent"),
    AatGenre => FieldSpec::repeated("aat_genre", AAT_GENRE).uri(Field::AatGenreValueUri).authority("aat"),
    AatGenreValueUri => FieldSpec::repeated("aat_genre_valueURI", AAT_GENRE).select(URI),
    AatType => FieldSpec::repeated("aat_type", AAT_TYPE).uri(Field::AatTypeValueUri).authority("aat"),
    AatTypeValueUri => FieldSpec::repeated("aat_type_valueURI", AAT_TYPE).select(URI),
    DcmiType => FieldSpec::single("dcmi_type", DCMI).uri(Field::DcmiTypeValueUri).authority("dct"),
    DcmiTypeValueUri => FieldSpec::single("dcmi_type_valueURI", DCMI).select(URI),
    TypeOfResource => FieldSpec::single("type_of_resource", "typeOfResource"),
    ImtType => FieldSpec::single("imt_type", "genre[@authority='imt']").authority("imt"),
    CcoDescription => FieldSpec::single("cco_description", "genre[@authority='cco']").authority("cco"),
    RightsManagement => FieldSpec::repeated("rights_management", "accessCondition").uri(Field::RightsManagementValueUri),
    RightsManagementValueUri => FieldSpec::repeated("rights_management_valueURI", "accessCondition").select(URI),
    DateOriginal => FieldSpec::single("date_original", "originInfo/dateCreated"),
    DateDigital => FieldSpec::single("date_digital", "originInfo/dateCaptured"),
    LocationInterview => FieldSpec::single("location_interview", "originInfo/place/placeTerm"),
    Publisher => FieldSpec::single("publisher", "originInfo/publisher").uri(Field::PublisherValueUri),
    PublisherValueUri => FieldSpec::single("publisher_valueURI", "originInfo/publisher").select(URI),
    Ark => FieldSpec::single("ark", "identifier[@type='ark']").required(),
    LocalId => FieldSpec::single("local_id", "identifier[@type='local']").required(),
    FileName => FieldSpec::single("file_name", "identifier[!@*]").required(),
    Uid => FieldSpec::single("uid", "identifier[@type='uid']").required(),
    AvianId => FieldSpec::single("avian_id", "identifier[@type='avian-id']").required(),
    ProjectNumber => FieldSpec::single("project_number", "identifier[@type='project-number']").required(),
    DateCreated => FieldSpec::single("date_created", "recordInfo/recordCreationDate"),
    DateModified => FieldSpec::single("date_modified", "recordInfo/recordChangeDate"),
    Issuance => FieldSpec::single("issuance", "originInfo/issuance"),
    IssuanceStart => FieldSpec::single("issuance_start", "originInfo/dateIssued[@point='start']"),
    IssuanceEnd => FieldSpec::single("issuance_end", "originInfo/dateIssued[@point='end']"),
    Frequency => FieldSpec::single("frequency", "originInfo/frequency").authority("marcfrequency"),
    DigitalCollection => FieldSpec::single("digital_collection", HOST).select("titleInfo/title"),
    DigitalCollectionArk => FieldSpec::single("digital_collection_ark", HOST).select("identifier[@type='ark']"),
    RelatedExhibit => FieldSpec::single("related_exhibit", EXHIBIT).select("titleInfo/title"),
    RelatedExhibitUrl => FieldSpec::single("related_exhibit_url", EXHIBIT).select("location/url"),
    HardwareSoftware => FieldSpec::single("hardware_software", "note[@type='hardware/software']"),
    ImageManipulation => FieldSpec::single("image_manipulation", "physicalDescription/note[@type='image-manipulation']"),
    FileSize => FieldSpec::single("file_size", "physicalDescription/note[@type='file-size']"),
    Resolution => FieldSpec::single("resolution", "physicalDescription/note[@type='resolution']"),
    Colorspace => FieldSpec::single("colorspace", "physicalDescription/note[@type='colorspace']"),
    BitsPerSample => FieldSpec::single("bits_per_sample", "physicalDescription/note[@type='bits-per-sample']"),
    SamplesPerPixel => FieldSpec::single("samples_per_pixel", "physicalDescription/note[@type='samples-per-pixel']"),
    Height => FieldSpec::single("height", "physicalDescription/note[@type='height']"),
    Width => FieldSpec::single("width", "physicalDescription/note[@type='width']"),
    DigitalOrigin => FieldSpec::single("digital_origin", "physicalDescription/digitalOrigin"),
    ReformattingQuality => FieldSpec::repeated("reformatting_quality", "physicalDescription/reformattingQuality"),
}

impl Field {
    /// Number of columns in the catalog.
    pub const COUNT: usize = Field::ALL.len();

    /// The static description of this field.
    pub fn spec(self) -> &'static FieldSpec {
        &SPECS[self as usize]
    }

    /// Spreadsheet column name.
    pub fn column(self) -> &'static str {
        self.spec().column
    }

    /// Position of this field in the column order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_repeated(self) -> bool {
        self.spec().multiplicity == Multiplicity::Repeated
    }

    pub fn is_required(self) -> bool {
        self.spec().presence == Presence::Required
    }

    /// The URI column paired with this one, if any.
    pub fn uri_partner(self) -> Option<Field> {
        match self.spec().pairing {
            Pairing::None => None,
            Pairing::Uri(uri) | Pairing::UriCoordinates(uri, _) => Some(uri),
        }
    }

    /// Look a field up by its column name.
    pub fn from_column(column: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.column() == column)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_column(s).ok_or_else(|| format!("Unknown column: {}", s))
    }
}

/// The spreadsheet header, in column order.
pub fn header() -> Vec<&'static str> {
    Field::ALL.iter().map(|f| f.column()).collect()
}
