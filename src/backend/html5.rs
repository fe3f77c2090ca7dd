//! Primary backend: html5ever tree builder.

use crate::dom::ArenaDom;
use crate::error::Result;

use super::ParseBackend;

/// Browser-grade HTML parsing via html5ever.
///
/// Without the `html5ever` feature this backend reports itself
/// unavailable, and the chain moves on to the next backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Html5everBackend;

impl ParseBackend for Html5everBackend {
    fn name(&self) -> &'static str {
        "html5ever"
    }

    #[cfg(feature = "html5ever")]
    fn parse(&self, html: &str) -> Result<ArenaDom> {
        use html5ever::driver::ParseOpts;
        use html5ever::parse_document;
        use html5ever::tendril::TendrilSink;

        use crate::dom::ArenaSink;

        let sink = parse_document(ArenaSink::new(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes());
        Ok(sink.into_dom())
    }

    #[cfg(not(feature = "html5ever"))]
    fn parse(&self, _html: &str) -> Result<ArenaDom> {
        Err(crate::error::Error::BackendUnavailable("html5ever"))
    }
}
