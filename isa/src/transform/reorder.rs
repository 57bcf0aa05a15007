//! Place compound-object components directly after their parent record.
//!
//! Repositories export a compound object (a letter and its pages, a book and
//! its covers) as one parent row plus one row per component, often in an
//! arbitrary order. This pass moves each component after its parent.
//!
//! # Strategies
//!
//! ```text
//! identifier                             pattern
//! ┌──────────────────────────────┐       ┌──────────────────────────────┐
//! │ pid=uofm:1  local_id=A-1     │       │ "Letter to the editor"       │
//! │ pid=uofm:2  local_id=B-7     │       │   "Page 1"                   │
//! │ pid=        file_name=A-1.tif│ ──▶   │   "Page 2"                   │
//! └──────────────────────────────┘       │ "Scrapbook"                  │
//!   component joins parent A-1           │   "Front cover"              │
//!                                        └──────────────────────────────┘
//! ```
//!
//! Both strategies return a permutation of their input and are idempotent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Field;
use crate::models::FlatRecord;

/// How components are linked to their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorderStrategy {
    /// Components share the parent's `local_id` (or it is their file stem).
    Identifier,
    /// Components have page/cover/drawing/side titles.
    Pattern,
}

impl FromStr for ReorderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identifier" => Ok(Self::Identifier),
            "pattern" => Ok(Self::Pattern),
            other => Err(format!(
                "Unknown reorder strategy '{}' (expected identifier, pattern or none)",
                other
            )),
        }
    }
}

impl fmt::Display for ReorderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => f.write_str("identifier"),
            Self::Pattern => f.write_str("pattern"),
        }
    }
}

/// Reorder `records`. `None` leaves them untouched.
pub fn reorder(records: Vec<FlatRecord>, strategy: Option<ReorderStrategy>) -> Vec<FlatRecord> {
    match strategy {
        Some(ReorderStrategy::Identifier) => by_identifier(records),
        Some(ReorderStrategy::Pattern) => by_title_pattern(records),
        None => records,
    }
}

// =============================================================================
// Identifier linking
// =============================================================================

fn by_identifier(records: Vec<FlatRecord>) -> Vec<FlatRecord> {
    let mut placed: Vec<FlatRecord> = Vec::with_capacity(records.len());
    // Position of the most recently placed parent.
    let mut boundary: Option<usize> = None;

    for record in records {
        if record.has_identifier() {
            placed.push(record);
            boundary = Some(placed.len() - 1);
            continue;
        }

        let parent = boundary.and_then(|end| {
            placed[..=end]
                .iter()
                .rposition(|p| p.has_identifier() && is_component_of(&record, p))
        });

        match parent {
            Some(at) => {
                let end = placed[at + 1..]
                    .iter()
                    .position(FlatRecord::has_identifier)
                    .map_or(placed.len(), |offset| at + 1 + offset);
                placed.insert(end, record);
                if boundary.is_some_and(|b| b >= end) {
                    boundary = boundary.map(|b| b + 1);
                }
            }
            None => placed.push(record),
        }
    }

    placed
}

/// Does `component` name `parent` by local id or file stem?
fn is_component_of(component: &FlatRecord, parent: &FlatRecord) -> bool {
    let parent_id = parent.get(Field::LocalId).trim();
    if parent_id.is_empty() {
        return false;
    }

    let local_id = component.get(Field::LocalId).trim();
    let stem = file_stem(component.get(Field::FileName));
    local_id == parent_id || stem == parent_id
}

/// File name up to its first `.`.
fn file_stem(file_name: &str) -> &str {
    let file_name = file_name.trim();
    file_name.split('.').next().unwrap_or(file_name)
}

// =============================================================================
// Title patterns
// =============================================================================

static CHILD_TITLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^\s*(page|pg\.?|p\.)\s*[0-9ivxlc]+\b",
        r"(?i)\b(front|back|inside)\s+cover\b",
        r"(?i)^\s*cover\b",
        r"(?i)\bdrawing\b",
        r"(?i)\bside\s+[a-z0-9]\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid title pattern"))
    .collect()
});

/// Is this the title of a component (a page, cover, drawing or side)?
pub fn is_component_title(title: &str) -> bool {
    CHILD_TITLES.iter().any(|re| re.is_match(title))
}

fn by_title_pattern(records: Vec<FlatRecord>) -> Vec<FlatRecord> {
    let mut orphans = Vec::new();
    let mut groups: Vec<Vec<FlatRecord>> = Vec::new();

    for record in records {
        if is_component_title(record.get(Field::Title)) {
            match groups.last_mut() {
                Some(group) => group.push(record),
                None => orphans.push(record),
            }
        } else {
            groups.push(vec![record]);
        }
    }

    // Components that precede every parent join the first group.
    if let Some(first) = groups.first_mut() {
        let children = first.split_off(1);
        first.append(&mut orphans);
        first.extend(children);
    }

    groups.into_iter().flatten().chain(orphans).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(pid: &str, local_id: &str) -> FlatRecord {
        FlatRecord::new()
            .with(Field::Pid, pid)
            .with(Field::LocalId, local_id)
            .with(Field::Title, pid)
    }

    fn component(title: &str, local_id: &str, file_name: &str) -> FlatRecord {
        FlatRecord::new()
            .with(Field::Title, title)
            .with(Field::LocalId, local_id)
            .with(Field::FileName, file_name)
    }

    fn titles(records: &[FlatRecord]) -> Vec<&str> {
        records.iter().map(|r| r.get(Field::Title)).collect()
    }

    fn titled(titles: &[&str]) -> Vec<FlatRecord> {
        titles
            .iter()
            .map(|t| FlatRecord::new().with(Field::Title, *t))
            .collect()
    }

    #[test]
    fn test_component_moves_after_parent() {
        let records = vec![
            parent("uofm:1", "A-1"),
            parent("uofm:2", "B-7"),
            component("p1", "", "A-1.tif"),
            component("p2", "A-1", ""),
        ];
        let ordered = reorder(records, Some(ReorderStrategy::Identifier));
        assert_eq!(titles(&ordered), vec!["uofm:1", "p1", "p2", "uofm:2"]);
    }

    #[test]
    fn test_unmatched_component_stays_in_scan_order() {
        let records = vec![
            component("loose", "Z-9", "z.tif"),
            parent("uofm:1", "A-1"),
            component("stray", "Q-1", ""),
        ];
        let ordered = reorder(records, Some(ReorderStrategy::Identifier));
        assert_eq!(titles(&ordered), vec!["loose", "uofm:1", "stray"]);
    }

    #[test]
    fn test_nearest_parent_wins() {
        let records = vec![
            parent("uofm:1", "A-1"),
            parent("uofm:2", "A-1"),
            component("p1", "A-1", ""),
        ];
        let ordered = reorder(records, Some(ReorderStrategy::Identifier));
        assert_eq!(titles(&ordered), vec!["uofm:1", "uofm:2", "p1"]);
    }

    #[test]
    fn test_identifier_strategy_is_idempotent() {
        let records = vec![
            component("p0", "B-7", ""),
            parent("uofm:1", "A-1"),
            parent("uofm:2", "B-7"),
            component("p1", "", "A-1.jp2"),
            parent("uofm:3", "C-3"),
            component("p2", "B-7", ""),
            component("p3", "A-1", ""),
        ];
        let once = reorder(records.clone(), Some(ReorderStrategy::Identifier));
        let twice = reorder(once.clone(), Some(ReorderStrategy::Identifier));

        assert_eq!(
            titles(&once),
            vec!["p0", "uofm:1", "p1", "p3", "uofm:2", "p2", "uofm:3"]
        );
        assert_eq!(once, twice);

        let mut sorted_in = records;
        let mut sorted_out = once;
        sorted_in.sort();
        sorted_out.sort();
        assert_eq!(sorted_in, sorted_out);
    }

    #[test]
    fn test_title_patterns() {
        for title in ["Page 1", "pg. 12", "p. iv", "Front cover", "inside cover", "Cover", "Drawing of a heron", "Side A"] {
            assert!(is_component_title(title), "{}", title);
        }
        for title in ["Letter to the editor", "Pages from history", "Covered wagon", "Inside story"] {
            assert!(!is_component_title(title), "{}", title);
        }
    }

    #[test]
    fn test_pattern_groups_children_in_place() {
        let records = titled(&["Page 1", "Letter", "Page 2", "Scrapbook", "Front cover", "Page 3"]);
        let ordered = reorder(records.clone(), Some(ReorderStrategy::Pattern));

        assert_eq!(
            titles(&ordered),
            vec!["Letter", "Page 1", "Page 2", "Scrapbook", "Front cover", "Page 3"]
        );
        let again = reorder(ordered.clone(), Some(ReorderStrategy::Pattern));
        assert_eq!(ordered, again);

        let mut sorted_in = records;
        let mut sorted_out = ordered;
        sorted_in.sort();
        sorted_out.sort();
        assert_eq!(sorted_in, sorted_out);
    }

    #[test]
    fn test_pattern_places_leading_components_after_first_parent() {
        let records = titled(&[
            "Cover",
            "Side A",
            "Album",
            "Page 1",
            "Letter",
            "Back cover",
            "Drawing of a heron",
            "Map",
        ]);
        let ordered = reorder(records.clone(), Some(ReorderStrategy::Pattern));

        assert_eq!(
            titles(&ordered),
            vec![
                "Album",
                "Cover",
                "Side A",
                "Page 1",
                "Letter",
                "Back cover",
                "Drawing of a heron",
                "Map",
            ]
        );
        assert_eq!(reorder(ordered.clone(), Some(ReorderStrategy::Pattern)), ordered);

        let mut sorted_in = records;
        let mut sorted_out = ordered;
        sorted_in.sort();
        sorted_out.sort();
        assert_eq!(sorted_in, sorted_out);
    }

    #[test]
    fn test_pattern_without_parents_is_unchanged() {
        let records = titled(&["Page 1", "Page 2"]);
        let ordered = reorder(records.clone(), Some(ReorderStrategy::Pattern));
        assert_eq!(ordered, records);
    }

    #[test]
    fn test_none_skips_the_pass() {
        let records = vec![component("p1", "A-1", ""), parent("uofm:1", "A-1")];
        assert_eq!(reorder(records.clone(), None), records);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("identifier".parse::<ReorderStrategy>(), Ok(ReorderStrategy::Identifier));
        assert_eq!("Pattern".parse::<ReorderStrategy>(), Ok(ReorderStrategy::Pattern));
        assert!("alphabetical".parse::<ReorderStrategy>().is_err());
        assert_eq!(serde_json::to_string(&ReorderStrategy::Identifier).unwrap(), r#""identifier""#);
    }
}
