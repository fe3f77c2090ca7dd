//! The extracted work: per-page metadata and passages.

use std::collections::BTreeSet;
use std::fmt;

use crate::bookmark::MetadataRecord;
use crate::segment::Passage;

/// Why a page lost part of its structure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(tag = "kind", rename_all = "snake_case"))]
pub enum WarningKind {
    /// No paragraph opened before the first continuation line; the page
    /// is a single paragraph.
    Degraded { nodes: usize },
    /// Page-divider breaks were found but splicing them failed
    /// verification, so the page kept its breaks.
    ReconnectRejected { splices: usize },
}

/// A recoverable problem on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct PageWarning {
    pub index: usize,
    pub page: String,
    #[cfg_attr(feature = "cli", serde(flatten))]
    pub kind: WarningKind,
}

impl fmt::Display for PageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::Degraded { nodes } => write!(
                f,
                "page {} ({}): no opening line, {} nodes kept as one paragraph",
                self.index, self.page, nodes
            ),
            WarningKind::ReconnectRejected { splices } => write!(
                f,
                "page {} ({}): {} page-divider breaks left unspliced",
                self.index, self.page, splices
            ),
        }
    }
}

/// Everything extracted from one work.
///
/// `metadata`, `passages`, `paths` and `title_candidates` all have one entry
/// per input page, at the page's index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct WorkCollection {
    pub metadata: Vec<MetadataRecord>,
    pub passages: Vec<Passage>,
    /// Raw bookmark text of each page.
    pub paths: Vec<String>,
    pub title_candidates: Vec<String>,
    pub warnings: Vec<PageWarning>,
}

impl WorkCollection {
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Pages that fell back to a single paragraph.
    pub fn degraded_pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.warnings.iter().filter_map(|w| match w.kind {
            WarningKind::Degraded { .. } => Some(w.index),
            WarningKind::ReconnectRejected { .. } => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.passages.iter().map(Vec::len).sum()
    }

    /// Distinct categories, in sorted order.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.metadata.iter().map(|m| m.category.as_str()).collect()
    }

    /// Distinct scrolls, in sorted order.
    pub fn scrolls(&self) -> BTreeSet<&str> {
        self.metadata.iter().map(|m| m.scroll.as_str()).collect()
    }

    /// Metadata and passage of each page, in page order.
    pub fn pages(&self) -> impl Iterator<Item = (&MetadataRecord, &Passage)> {
        self.metadata.iter().zip(&self.passages)
    }
}

impl fmt::Display for WorkCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pages:       {}", self.len())?;
        writeln!(f, "Paragraphs:  {}", self.paragraph_count())?;
        writeln!(f, "Degraded:    {}", self.degraded_pages().count())?;
        writeln!(f, "Categories:  {}", self.categories().len())?;
        write!(f, "Scrolls:     {}", self.scrolls().len())
    }
}
