//! # hanji
//!
//! Structure extraction for scraped Han-Ji (漢籍全文資料庫) scroll pages.
//!
//! Each scraped page is an HTML file holding one printed page of a classical
//! work. `hanji` turns an ordered list of such pages into a
//! [`WorkCollection`]: the bibliographic location of every page and its text
//! split into paragraphs.
//!
//! ## Features
//!
//! - Removes page furniture (page numbers, dividers, hidden annotations)
//! - Heals paragraphs split across a page break
//! - Parses the breadcrumb bookmark into category, scroll and title
//! - Recovers paragraph boundaries from line indentation
//! - Falls back between HTML parsing backends transparently
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use hanji::{BackendChain, LoadOptions, Pipeline, load_pages};
//!
//! let backends = BackendChain::default();
//! let pages = load_pages(Path::new("data"), &LoadOptions::new("SongShu"), &backends).unwrap();
//! let work = Pipeline::default().run(pages).unwrap();
//!
//! for (meta, passage) in work.pages() {
//!     println!("{} {}: {} paragraphs", meta.scroll, meta.title, passage.len());
//! }
//! ```
//!
//! ## Configuration
//!
//! ```
//! use hanji::{BackendChain, BackendKind, BookmarkParser, PipelineOptions};
//!
//! let options = PipelineOptions::default()
//!     .with_reconnect_lines(false)
//!     .with_bookmark_parser(BookmarkParser::default().with_edition_note("[校]"))
//!     .with_backends(BackendChain::from_kinds(&[BackendKind::Xml]));
//! ```

pub mod backend;
pub mod bookmark;
pub mod clean;
pub mod collection;
pub mod dom;
pub mod error;
pub mod loader;
pub mod page;
pub mod pipeline;
pub mod segment;
pub mod style;
pub(crate) mod util;

pub use backend::{BackendChain, BackendKind, Html5everBackend, ParseBackend, XmlBackend};
pub use bookmark::{BookmarkParser, BookmarkPath, MalformedBookmarkError, MetadataRecord};
pub use clean::{AttrMatcher, Reconnection, RemovalRule, Sanitizer};
pub use collection::{PageWarning, WarningKind, WorkCollection};
pub use error::{Error, Result};
pub use loader::{LoadOptions, load_pages, read_page, read_pages, scan};
pub use page::Page;
pub use pipeline::{Pipeline, PipelineOptions, extract};
pub use segment::{ContentNode, Paragraph, Passage, Segmenter, segment};
pub use style::Layout;
