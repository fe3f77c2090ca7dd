//! A single loaded scroll page.

use crate::backend::BackendChain;
use crate::dom::{ArenaDom, ArenaNodeId, to_html};
use crate::error::Result;

/// One parsed source document.
///
/// The `label` identifies the page in logs and errors: the source path
/// when loaded from disk, otherwise whatever the caller supplied.
#[derive(Debug, Clone)]
pub struct Page {
    pub label: String,
    pub dom: ArenaDom,
}

impl Page {
    pub fn new(label: impl Into<String>, dom: ArenaDom) -> Self {
        Self {
            label: label.into(),
            dom,
        }
    }

    /// Parse HTML text through a backend chain.
    pub fn parse(label: impl Into<String>, html: &str, backends: &BackendChain) -> Result<Self> {
        Ok(Self::new(label, backends.parse(html)?))
    }

    /// The page's textual form.
    pub fn to_html(&self) -> String {
        to_html(&self.dom)
    }

    /// Replace the tree by re-parsing the page's own serialization.
    pub fn reparse(&mut self, backends: &BackendChain) -> Result<()> {
        self.dom = backends.parse(&self.to_html())?;
        Ok(())
    }

    /// The bookmark anchor: the first `<a>` inside `<body>`.
    pub fn bookmark_anchor(&self) -> Option<ArenaNodeId> {
        let body = self.dom.body()?;
        self.dom.find_tag_in(body, "a")
    }

    /// The bookmark anchor's text, trimmed.
    pub fn bookmark_text(&self) -> Option<String> {
        self.bookmark_anchor()
            .map(|a| self.dom.full_text(a).trim().to_string())
    }
}
