//! Bookmark path parsing.
//!
//! Every Han-Ji page opens with a breadcrumb anchor naming its place in the
//! corpus, e.g.
//!
//! ```text
//! 史部／正史／宋書／列傳　傳記／卷六十三　列傳第二十三／王華(P.1675)
//! ```
//!
//! Fields are separated by a full-width slash. Field 3 is the category,
//! field 4 holds the scroll and category number separated by an ideographic
//! space, and everything from field 5 on is the title.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Field delimiter (FULLWIDTH SOLIDUS).
pub const DELIMITER: char = '／';

/// Separator inside the category and scroll fields (IDEOGRAPHIC SPACE).
pub const FIELD_SEPARATOR: char = '\u{3000}';

/// A bookmark needs at least this many fields to carry a title.
pub const MIN_FIELDS: usize = 6;

/// Edition note appended to titles in the Song shu pages.
pub const DEFAULT_EDITION_NOTE: &str = "..[底本：宋元明三朝遞修本]";

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([Pp]\.\d+\)$").unwrap());

/// A bookmark with too few fields to identify its page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "MalformedBookmarkError: expected at least {min} fields, found {fields} in {bookmark:?}",
    min = MIN_FIELDS
)]
pub struct MalformedBookmarkError {
    pub fields: usize,
    pub bookmark: String,
}

/// Bibliographic location of one page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct MetadataRecord {
    pub category: String,
    pub category_number: String,
    pub scroll: String,
    pub title: String,
}

/// A bookmark string split into its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkPath {
    raw: String,
    fields: Vec<String>,
}

impl BookmarkPath {
    /// Split a bookmark. Fails when it has fewer than [`MIN_FIELDS`] fields.
    pub fn parse(raw: &str) -> Result<Self, MalformedBookmarkError> {
        let raw = raw.trim();
        let fields: Vec<String> = raw.split(DELIMITER).map(str::to_string).collect();
        if fields.len() < MIN_FIELDS {
            return Err(MalformedBookmarkError {
                fields: fields.len(),
                bookmark: raw.to_string(),
            });
        }
        Ok(Self {
            raw: raw.to_string(),
            fields,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Field 3 up to the first ideographic space.
    pub fn category(&self) -> &str {
        first_part(&self.fields[3])
    }

    /// Field 4 up to the first ideographic space.
    pub fn scroll(&self) -> &str {
        first_part(&self.fields[4])
    }

    /// Second part of field 4, empty when the field has only one part.
    pub fn category_number(&self) -> &str {
        self.fields[4].split(FIELD_SEPARATOR).nth(1).unwrap_or("")
    }

    /// Fields 5 and on, rejoined with the delimiter.
    pub fn raw_title(&self) -> String {
        self.fields[5..].join(&DELIMITER.to_string())
    }

    /// The last field with its trailing `(p.N)` page marker removed.
    ///
    /// A last field without a marker is returned as it is; the whole
    /// bookmark path is never used as a title candidate.
    pub fn title_candidate(&self) -> String {
        let last = self.fields.last().map(String::as_str).unwrap_or("");
        PAGE_MARKER_RE.replace(last, "").trim().to_string()
    }
}

fn first_part(field: &str) -> &str {
    field.split(FIELD_SEPARATOR).next().unwrap_or("")
}

/// Turns bookmark strings into [`MetadataRecord`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkParser {
    edition_notes: Vec<String>,
}

impl Default for BookmarkParser {
    fn default() -> Self {
        Self {
            edition_notes: vec![DEFAULT_EDITION_NOTE.to_string()],
        }
    }
}

impl BookmarkParser {
    /// A parser that strips nothing from titles.
    pub fn empty() -> Self {
        Self {
            edition_notes: Vec::new(),
        }
    }

    /// Also strip this editorial note from titles.
    pub fn with_edition_note(mut self, note: impl Into<String>) -> Self {
        self.edition_notes.push(note.into());
        self
    }

    pub fn edition_notes(&self) -> &[String] {
        &self.edition_notes
    }

    pub fn parse(&self, raw: &str) -> Result<MetadataRecord, MalformedBookmarkError> {
        let path = BookmarkPath::parse(raw)?;
        Ok(self.record(&path))
    }

    pub fn record(&self, path: &BookmarkPath) -> MetadataRecord {
        let title = self
            .edition_notes
            .iter()
            .fold(path.raw_title(), |title, note| title.replace(note.as_str(), ""));

        MetadataRecord {
            category: path.category().to_string(),
            category_number: path.category_number().to_string(),
            scroll: path.scroll().to_string(),
            title,
        }
    }
}
