//! Description document trees (MODS and Dublin Core).
//!
//! A [`DescriptionDocument`] is an ordered tree of [`Element`]s. It is built
//! by the builder, parsed from disk for the flattener, and serialized with
//! `quick-xml`.
//!
//! # Escaping
//!
//! Text and attribute values are escaped exactly once, when they enter the
//! tree, and are stored as [`Escaped`] markup. Serialization writes that
//! markup verbatim, so a value can never be escaped twice.
//!
//! ```text
//! "Cats & Dogs <1>"  ──Escaped::text──▶  "Cats &amp; Dogs &lt;1&gt;"  ──write──▶  file
//! ```

pub mod query;

use std::borrow::Cow;
use std::fmt;

use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{DocumentError, DocumentResult};

// =============================================================================
// Escaped markup
// =============================================================================

/// A value that has already been escaped for XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Escaped(String);

impl Escaped {
    /// Escape element text (`&`, `<`, `>`).
    pub fn text(raw: &str) -> Self {
        Self(partial_escape(raw).into_owned())
    }

    /// Escape an attribute value (`&`, `<`, `>`, `"`, `'`).
    pub fn attribute(raw: &str) -> Self {
        Self(escape(raw).into_owned())
    }

    /// The escaped markup.
    pub fn as_markup(&self) -> &str {
        &self.0
    }

    /// The original value.
    pub fn unescape(&self) -> Cow<'_, str> {
        unescape(&self.0).unwrap_or(Cow::Borrowed(self.0.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Elements
// =============================================================================

/// One element: qualified name, ordered attributes, text and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, Escaped)>,
    text: Option<Escaped>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute. Empty values are never emitted.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.attributes.push((name.to_string(), Escaped::attribute(value)));
        }
        self
    }

    /// Set the text content.
    pub fn with_text(mut self, value: &str) -> Self {
        self.text = (!value.is_empty()).then(|| Escaped::text(value));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Qualified name as written (`dc:title`, `mods`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Unescaped value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.unescape())
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Unescaped text content (`""` when there is none).
    pub fn text(&self) -> Cow<'_, str> {
        self.text
            .as_ref()
            .map(Escaped::unescape)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |c| c.local_name() == local_name)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.children.is_empty()
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> DocumentResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            // Values are already escaped; the raw-bytes form writes them as-is.
            start.push_attribute(Attribute::from((key.as_bytes(), value.as_markup().as_bytes())));
        }

        if self.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::from_escaped(text.as_markup())))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(write_error)
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let tag = node.tag_name();
        let mut element = Element::new(qualified_name(node, tag.namespace(), tag.name()));

        for attr in node.attributes() {
            let name = qualified_name(node, attr.namespace(), attr.name());
            element.attributes.push((name, Escaped::attribute(attr.value())));
        }

        let mut text = String::new();
        for child in node.children() {
            if child.is_element() {
                element.children.push(Element::from_node(child));
            } else if let Some(t) = child.is_text().then(|| child.text()).flatten() {
                text.push_str(t);
            }
        }
        let text = text.trim();
        if !text.is_empty() {
            element.text = Some(Escaped::text(text));
        }

        element
    }
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

fn write_error<E: fmt::Display>(err: E) -> DocumentError {
    DocumentError::Write(err.to_string())
}

// =============================================================================
// Documents
// =============================================================================

/// A complete description document.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionDocument {
    root: Element,
}

impl DescriptionDocument {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Parse well-formed XML into a document tree.
    ///
    /// Element and attribute names keep the prefix declared in the source;
    /// queries match on local names.
    pub fn parse(source: &str) -> DocumentResult<Self> {
        let xml = roxmltree::Document::parse(source)?;
        Ok(Self::new(Element::from_node(xml.root_element())))
    }

    /// Serialize with an XML declaration and two-space indentation.
    pub fn to_xml(&self) -> DocumentResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        self.root.write(&mut writer)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped_once() {
        let doc = DescriptionDocument::new(
            Element::new("mods").with_child(Element::new("title").with_text("Cats & Dogs <1>")),
        );
        let xml = doc.to_xml().unwrap();

        assert_eq!(xml.matches("Cats &amp; Dogs &lt;1&gt;").count(), 1);
        assert!(!xml.contains("&amp;amp;"));
    }

    #[test]
    fn test_attribute_quotes_are_escaped() {
        let doc = DescriptionDocument::new(
            Element::new("mods").with_child(Element::new("name").with_attr("valueURI", r#"http://x/?q="a"&b"#)),
        );
        let xml = doc.to_xml().unwrap();
        assert!(xml.contains(r#"valueURI="http://x/?q=&quot;a&quot;&amp;b""#));
    }

    #[test]
    fn test_empty_attribute_is_not_emitted() {
        let element = Element::new("name").with_attr("valueURI", "");
        assert!(!element.has_attributes());
    }

    #[test]
    fn test_empty_element_is_self_closing() {
        let doc = DescriptionDocument::new(Element::new("mods").with_child(Element::new("identifier")));
        let xml = doc.to_xml().unwrap();
        assert!(xml.contains("<identifier/>"));
    }

    #[test]
    fn test_parse_round_trip_unescapes() {
        let doc = DescriptionDocument::new(
            Element::new("mods").with_child(
                Element::new("title")
                    .with_attr("lang", "en & fr")
                    .with_text("Tom & Jerry"),
            ),
        );
        let parsed = DescriptionDocument::parse(&doc.to_xml().unwrap()).unwrap();
        let title = &parsed.root().children()[0];

        assert_eq!(title.text(), "Tom & Jerry");
        assert_eq!(title.attribute("lang").as_deref(), Some("en & fr"));
    }

    #[test]
    fn test_parse_keeps_prefixes() {
        let source = r#"<oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Map</dc:title></oai_dc:dc>"#;
        let doc = DescriptionDocument::parse(source).unwrap();

        assert_eq!(doc.root().name(), "oai_dc:dc");
        assert_eq!(doc.root().local_name(), "dc");
        assert_eq!(doc.root().children()[0].name(), "dc:title");
    }

    #[test]
    fn test_parse_default_namespace_has_no_prefix() {
        let source = r#"<mods xmlns="http://www.loc.gov/mods/v3"><titleInfo><title> Map </title></titleInfo></mods>"#;
        let doc = DescriptionDocument::parse(source).unwrap();

        assert_eq!(doc.root().name(), "mods");
        let title = &doc.root().children()[0].children()[0];
        assert_eq!(title.text(), "Map");
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        assert!(matches!(
            DescriptionDocument::parse("<mods><title></mods>"),
            Err(DocumentError::Parse(_))
        ));
    }
}
