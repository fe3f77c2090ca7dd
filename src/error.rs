//! Error types for hanji operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::bookmark::MalformedBookmarkError;

/// Errors that can occur while loading or extracting scroll pages.
///
/// Only conditions that abort a run are errors. Pages that merely lose
/// their paragraph structure are reported as [`crate::PageWarning`]s.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: source document is not valid UTF-8")]
    Encoding { path: PathBuf },

    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("parsing backend `{0}` is not available in this build")]
    BackendUnavailable(&'static str),

    #[error("no parsing backend could handle the document: {0}")]
    NoBackend(String),

    #[error("page {index} ({page}): no bookmark anchor in body")]
    MissingBookmark { page: String, index: usize },

    #[error("page {index} ({page}): {source}")]
    MalformedBookmark {
        page: String,
        index: usize,
        #[source]
        source: MalformedBookmarkError,
    },

    #[error("page {index} ({page}): {source}")]
    Page {
        page: String,
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("no pages named {work}_<serial>.html in {}", dir.display())]
    NoPages { dir: PathBuf, work: String },
}

pub type Result<T> = std::result::Result<T, Error>;
