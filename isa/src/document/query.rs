//! Path queries over [`Element`] trees.
//!
//! A small XPath-like language, just large enough for the field catalog:
//!
//! ```text
//! path       := '.' | step ('/' step)* ('/' '@' attr)? | '@' attr
//! step       := name predicate*
//! predicate  := '[' '@' attr '=' 'value' ']'        attribute equals
//!             | '[' '!@' attr ']'                   attribute absent
//!             | '[' '!@*' ']'                       no attributes at all
//!             | '[' path '=' 'value' ']'            descendant text equals
//!             | '[' path ('|' path)* ']'            any descendant exists
//! ```
//!
//! Steps always walk child elements and match on local names, so
//! `relatedItem[@type='host']/titleInfo/title` selects
//! `<relatedItem type="host"><titleInfo><title>` regardless of prefixes.

use crate::document::Element;
use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    AttributeEquals { name: String, value: String },
    AttributeAbsent(String),
    NoAttributes,
    TextEquals { path: Vec<String>, value: String },
    /// Any of the alternative paths reaches an element.
    Exists(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    name: String,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
enum Target {
    Text,
    Attribute(String),
}

/// A compiled path query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    steps: Vec<Step>,
    target: Target,
}

impl Query {
    /// Compile a query string.
    pub fn parse(source: &str) -> Result<Self, QueryError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(QueryError::new(source, "empty query"));
        }

        let segments = split_top_level(source, '/', source)?;
        let mut steps = Vec::new();
        let mut target = Target::Text;

        for (i, segment) in segments.iter().enumerate() {
            let segment = segment.trim();
            if let Some(attr) = segment.strip_prefix('@') {
                if i + 1 != segments.len() {
                    return Err(QueryError::new(source, "attribute selector must come last"));
                }
                if attr.is_empty() {
                    return Err(QueryError::new(source, "missing attribute name"));
                }
                target = Target::Attribute(attr.to_string());
            } else if segment == "." {
                if segments.len() != 1 {
                    return Err(QueryError::new(source, "'.' must stand alone"));
                }
            } else {
                steps.push(parse_step(segment, source)?);
            }
        }

        Ok(Self { steps, target })
    }

    /// Elements reached by the steps, in document order.
    pub fn elements<'a>(&self, context: &'a Element) -> Vec<&'a Element> {
        self.steps.iter().fold(vec![context], |current, step| {
            current
                .into_iter()
                .flat_map(|e| e.children())
                .filter(|e| e.local_name() == step.name)
                .filter(|e| step.predicates.iter().all(|p| p.matches(e)))
                .collect()
        })
    }

    /// Every value selected from `context`, in document order.
    ///
    /// Attribute queries skip elements without the attribute.
    pub fn values(&self, context: &Element) -> Vec<String> {
        self.elements(context)
            .into_iter()
            .filter_map(|e| match &self.target {
                Target::Text => Some(e.text().into_owned()),
                Target::Attribute(name) => e.attribute(name).map(|v| v.into_owned()),
            })
            .collect()
    }

    /// The first selected value, or `""` when nothing matches.
    pub fn first_value(&self, context: &Element) -> String {
        self.values(context).into_iter().next().unwrap_or_default()
    }
}

impl Predicate {
    fn matches(&self, element: &Element) -> bool {
        match self {
            Predicate::AttributeEquals { name, value } => {
                element.attribute(name).is_some_and(|v| v == value.as_str())
            }
            Predicate::AttributeAbsent(name) => element.attribute(name).is_none(),
            Predicate::NoAttributes => !element.has_attributes(),
            Predicate::TextEquals { path, value } => {
                descendants(element, path).iter().any(|e| e.text() == value.as_str())
            }
            Predicate::Exists(paths) => paths.iter().any(|p| !descendants(element, p).is_empty()),
        }
    }
}

fn descendants<'a>(element: &'a Element, path: &[String]) -> Vec<&'a Element> {
    path.iter().fold(vec![element], |current, name| {
        current
            .into_iter()
            .flat_map(|e| e.children())
            .filter(|e| e.local_name() == name.as_str())
            .collect()
    })
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_step(segment: &str, source: &str) -> Result<Step, QueryError> {
    let (name, mut rest) = match segment.find('[') {
        Some(pos) => (&segment[..pos], &segment[pos..]),
        None => (segment, ""),
    };
    if name.is_empty() {
        return Err(QueryError::new(source, "missing element name"));
    }

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let close = closing_bracket(rest)
            .ok_or_else(|| QueryError::new(source, format!("unclosed predicate in '{}'", segment)))?;
        predicates.push(parse_predicate(&rest[1..close], source)?);
        rest = &rest[close + 1..];
        if !rest.is_empty() && !rest.starts_with('[') {
            return Err(QueryError::new(source, format!("unexpected '{}'", rest)));
        }
    }

    Ok(Step {
        name: name.to_string(),
        predicates,
    })
}

fn parse_predicate(body: &str, source: &str) -> Result<Predicate, QueryError> {
    let body = body.trim();

    if let Some(attr) = body.strip_prefix("!@") {
        return Ok(match attr {
            "*" => Predicate::NoAttributes,
            name => Predicate::AttributeAbsent(name.to_string()),
        });
    }

    let split = split_top_level(body, '=', source)?;
    match split.as_slice() {
        [lhs] => Ok(Predicate::Exists(lhs.split('|').map(child_path).collect())),
        [lhs, rhs] => {
            let value = unquote(rhs)
                .ok_or_else(|| QueryError::new(source, format!("unquoted value in '{}'", body)))?;
            match lhs.trim().strip_prefix('@') {
                Some(name) => Ok(Predicate::AttributeEquals {
                    name: name.to_string(),
                    value,
                }),
                None => Ok(Predicate::TextEquals {
                    path: child_path(lhs),
                    value,
                }),
            }
        }
        _ => Err(QueryError::new(source, format!("bad predicate '{}'", body))),
    }
}

fn child_path(path: &str) -> Vec<String> {
    path.trim().split('/').map(|s| s.trim().to_string()).collect()
}

fn unquote(value: &str) -> Option<String> {
    let value = value.trim();
    ['\'', '"'].iter().find_map(|q| {
        value
            .strip_prefix(*q)
            .and_then(|v| v.strip_suffix(*q))
            .map(str::to_string)
    })
}

/// Index of the `]` closing the predicate that starts at `s[0] == '['`.
fn closing_bracket(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside brackets and quotes.
fn split_top_level(s: &str, sep: char, source: &str) -> Result<Vec<String>, QueryError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote = None;

    for c in s.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| QueryError::new(source, "unbalanced ']'"))?;
            }
            (None, c) if c == sep && depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }

    if quote.is_some() || depth != 0 {
        return Err(QueryError::new(source, "unbalanced quotes or brackets"));
    }
    parts.push(current);
    Ok(parts)
}
