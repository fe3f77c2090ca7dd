//! Runs the extraction stages over an ordered page list.
//!
//! ## Stages
//!
//! 1. **Bookmarks** - read each page's breadcrumb before anything is
//!    removed, and parse it. A missing or malformed bookmark aborts the run.
//! 2. **Sanitize** - every page, before any segmentation.
//! 3. **Reconnect** - every page, after all sanitizing is done.
//! 4. **Segment** - per page; a degraded page is kept with a warning.
//!
//! With the `rayon` feature the per-page work of stages 2-4 runs in
//! parallel. Results are always written back at the page's own index.

use tracing::{debug, info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::backend::BackendChain;
use crate::bookmark::{BookmarkParser, BookmarkPath, MetadataRecord};
use crate::clean::{Reconnection, Sanitizer, reconnect};
use crate::collection::{PageWarning, WarningKind, WorkCollection};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::segment::{ContentNode, Segmented, segment};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Splice paragraphs broken by page dividers.
    pub reconnect_lines: bool,
    pub sanitizer: Sanitizer,
    pub bookmark: BookmarkParser,
    pub backends: BackendChain,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            reconnect_lines: true,
            sanitizer: Sanitizer::default(),
            bookmark: BookmarkParser::default(),
            backends: BackendChain::default(),
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the sanitizer's re-serialization pass.
    pub fn with_reserialize(mut self, reserialize: bool) -> Self {
        self.sanitizer = self.sanitizer.with_reserialize(reserialize);
        self
    }

    pub fn with_reconnect_lines(mut self, reconnect_lines: bool) -> Self {
        self.reconnect_lines = reconnect_lines;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_bookmark_parser(mut self, bookmark: BookmarkParser) -> Self {
        self.bookmark = bookmark;
        self
    }

    pub fn with_backends(mut self, backends: BackendChain) -> Self {
        self.backends = backends;
        self
    }
}

/// Page extraction pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Extract a work from its pages, given in reading order.
    ///
    /// The returned collection has exactly one entry per page in each of
    /// its per-page lists. Errors name the page that caused them.
    pub fn run(&self, mut pages: Vec<Page>) -> Result<WorkCollection> {
        let mut collection = WorkCollection::default();

        for (index, page) in pages.iter().enumerate() {
            let (path, record) = self.read_bookmark(index, page)?;
            collection.title_candidates.push(path.title_candidate());
            collection.paths.push(path.as_str().to_string());
            collection.metadata.push(record);
        }

        self.sanitize_all(&mut pages)?;

        if self.options.reconnect_lines {
            collection.warnings.extend(self.reconnect_all(&mut pages)?);
        }

        for (index, (page, segmented)) in pages.iter().zip(segment_all(&pages)).enumerate() {
            let nodes = segmented.nodes;
            let Segmented { passage, degraded } = segmented.result;
            if degraded {
                warn!(page = %page.label, nodes, "no paragraph opening line, page kept as one paragraph");
                collection.warnings.push(PageWarning {
                    index,
                    page: page.label.clone(),
                    kind: WarningKind::Degraded { nodes },
                });
            }
            debug!(page = %page.label, paragraphs = passage.len(), "segmented page");
            collection.passages.push(passage);
        }

        collection.warnings.sort_by_key(|w| w.index);

        info!(
            pages = collection.len(),
            paragraphs = collection.paragraph_count(),
            warnings = collection.warnings.len(),
            "extracted work"
        );
        Ok(collection)
    }

    fn read_bookmark(&self, index: usize, page: &Page) -> Result<(BookmarkPath, MetadataRecord)> {
        let text = page.bookmark_text().ok_or_else(|| Error::MissingBookmark {
            page: page.label.clone(),
            index,
        })?;
        let path = BookmarkPath::parse(&text).map_err(|source| Error::MalformedBookmark {
            page: page.label.clone(),
            index,
            source,
        })?;
        let record = self.options.bookmark.record(&path);
        Ok((path, record))
    }

    fn sanitize_all(&self, pages: &mut [Page]) -> Result<()> {
        let sanitizer = &self.options.sanitizer;
        let backends = &self.options.backends;

        let removed = for_each_page(pages, |page| sanitizer.sanitize(page, backends))
            .into_iter()
            .enumerate()
            .map(|(index, result)| result.map_err(|e| in_page(e, index, &pages[index])))
            .sum::<Result<usize>>()?;

        info!(
            removed,
            pages = pages.len(),
            reserialized = sanitizer.reserializes(),
            "removed page furniture"
        );
        Ok(())
    }

    fn reconnect_all(&self, pages: &mut [Page]) -> Result<Vec<PageWarning>> {
        let backends = &self.options.backends;
        let outcomes = for_each_page(pages, |page| reconnect(page, backends));

        let mut spliced = 0;
        let mut warnings = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome.map_err(|e| in_page(e, index, &pages[index]))? {
                Reconnection::Unchanged => {}
                Reconnection::Spliced(count) => spliced += count,
                Reconnection::Rejected(splices) => warnings.push(PageWarning {
                    index,
                    page: pages[index].label.clone(),
                    kind: WarningKind::ReconnectRejected { splices },
                }),
            }
        }

        info!(spliced, rejected = warnings.len(), "reconnected page-divider breaks");
        Ok(warnings)
    }
}

fn in_page(error: Error, index: usize, page: &Page) -> Error {
    Error::Page {
        page: page.label.clone(),
        index,
        source: Box::new(error),
    }
}

struct PageSegments {
    nodes: usize,
    result: Segmented,
}

fn segment_page(page: &Page) -> PageSegments {
    let nodes = ContentNode::collect(page);
    PageSegments {
        nodes: nodes.len(),
        result: segment(&nodes),
    }
}

#[cfg(feature = "rayon")]
fn for_each_page<T, F>(pages: &mut [Page], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&mut Page) -> T + Sync + Send,
{
    pages.par_iter_mut().map(f).collect()
}

#[cfg(not(feature = "rayon"))]
fn for_each_page<T, F>(pages: &mut [Page], f: F) -> Vec<T>
where
    F: Fn(&mut Page) -> T,
{
    pages.iter_mut().map(f).collect()
}

#[cfg(feature = "rayon")]
fn segment_all(pages: &[Page]) -> Vec<PageSegments> {
    pages.par_iter().map(segment_page).collect()
}

#[cfg(not(feature = "rayon"))]
fn segment_all(pages: &[Page]) -> Vec<PageSegments> {
    pages.iter().map(segment_page).collect()
}

/// Run the default pipeline.
pub fn extract(pages: Vec<Page>) -> Result<WorkCollection> {
    Pipeline::default().run(pages)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backend::ParseBackend;
    use crate::dom::ArenaDom;

    const BOOKMARK: &str = "史部／正史／宋書／列傳／卷六十三　列傳第二十三／王華(P.1675)";

    fn page(label: &str, bookmark: &str, body: &str) -> Page {
        let html = format!(
            r#"<html><head></head><body><a class="gobookmark" href="b.html">{bookmark}</a>{body}</body></html>"#
        );
        Page::parse(label, &html, &BackendChain::default()).unwrap()
    }

    #[test]
    fn test_run_aligns_outputs() {
        let pages = vec![
            page(
                "p1",
                BOOKMARK,
                r#"<div style="text-indent:2em;padding-left:0em;">臣聞</div><center>1</center>"#,
            ),
            page("p2", BOOKMARK, r#"<div style="text-indent:0em;padding-left:0em;">之</div>"#),
            page("p3", BOOKMARK, ""),
        ];

        let collection = extract(pages).unwrap();

        assert_eq!(collection.len(), 3);
        assert_eq!(collection.passages.len(), 3);
        assert_eq!(collection.paths.len(), 3);
        assert_eq!(collection.title_candidates, vec!["王華"; 3]);
        assert_eq!(collection.passages[0], vec!["臣聞"]);
        assert_eq!(collection.passages[1], vec!["之"]);
        assert!(collection.passages[2].is_empty());
        assert_eq!(collection.degraded_pages().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_malformed_bookmark_is_fatal() {
        let pages = vec![
            page("p1", BOOKMARK, ""),
            page("p2", "宋書／列傳／卷六十三／陳群", ""),
        ];

        let err = extract(pages).unwrap_err();

        match err {
            Error::MalformedBookmark { page, index, source } => {
                assert_eq!(page, "p2");
                assert_eq!(index, 1);
                assert_eq!(source.fields, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_bookmark_is_fatal() {
        let pages = vec![
            Page::parse("bare", "<html><body><div>文</div></body></html>", &BackendChain::default())
                .unwrap(),
        ];

        assert!(matches!(
            extract(pages),
            Err(Error::MissingBookmark { index: 0, .. })
        ));
    }

    #[test]
    fn test_bookmark_read_before_placeholder_anchor_removal() {
        let pages = vec![
            Page::parse(
                "hash",
                &format!(
                    r##"<html><body><a href="#">{BOOKMARK}</a><div style="text-indent:2em;padding-left:0em;">文</div></body></html>"##
                ),
                &BackendChain::default(),
            )
            .unwrap(),
        ];

        let collection = extract(pages).unwrap();

        assert_eq!(collection.metadata[0].category, "列傳");
        assert_eq!(collection.passages[0], vec!["文"]);
    }

    #[test]
    fn test_reconnect_can_be_disabled() {
        let body = r#"<div style="text-indent:2em;padding-left:0em;">甲</div><div style="text-indent:0em;padding-left:0em;">乙</div><center>2</center><div style="text-indent:0em;padding-left:0em;">丙</div>"#;
        let options = PipelineOptions::default().with_reconnect_lines(false);

        let collection = Pipeline::new(options)
            .run(vec![page("p", BOOKMARK, body)])
            .unwrap();

        assert_eq!(collection.passages[0], vec!["甲乙丙"]);
        assert!(collection.warnings.is_empty());
    }

    /// Parses with the default chain and counts calls.
    #[derive(Default)]
    struct CountingBackend {
        parses: Arc<AtomicUsize>,
    }

    impl ParseBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn parse(&self, html: &str) -> Result<ArenaDom> {
            self.parses.fetch_add(1, Ordering::SeqCst);
            BackendChain::default().parse(html)
        }
    }

    /// Parses with the default chain, then adds an empty `<div>` to the body.
    struct ExtraDivBackend;

    impl ParseBackend for ExtraDivBackend {
        fn name(&self) -> &'static str {
            "extra-div"
        }

        fn parse(&self, html: &str) -> Result<ArenaDom> {
            let mut dom = BackendChain::default().parse(html)?;
            if let Some(body) = dom.body() {
                let div = dom.create_element("div", Vec::new());
                dom.append(body, div);
            }
            Ok(dom)
        }
    }

    fn count_parses(options: PipelineOptions, pages: usize) -> usize {
        let backend = CountingBackend::default();
        let parses = Arc::clone(&backend.parses);
        let options = options
            .with_reconnect_lines(false)
            .with_backends(BackendChain::empty().with_backend(backend));
        let pages = (0..pages)
            .map(|i| page(&format!("p{i}"), BOOKMARK, "<center>1</center>"))
            .collect();

        Pipeline::new(options).run(pages).unwrap();
        parses.load(Ordering::SeqCst)
    }

    #[test]
    fn test_reserialize_reparses_each_page() {
        assert_eq!(count_parses(PipelineOptions::default(), 3), 3);
    }

    #[test]
    fn test_sanitizer_reserialize_setting_is_honoured() {
        let options = PipelineOptions::default().with_sanitizer(Sanitizer::default().with_reserialize(false));

        assert_eq!(count_parses(options, 3), 0);
    }

    #[test]
    fn test_with_reserialize_sets_sanitizer() {
        let options = PipelineOptions::default().with_reserialize(false);

        assert!(!options.sanitizer.reserializes());
        assert_eq!(count_parses(options, 2), 0);
    }

    #[test]
    fn test_rejected_reconnection_is_reported() {
        let body = r#"<div style="text-indent:2em;padding-left:0em;">甲</div><div style="text-indent:0em;padding-left:0em;">乙</div><div style="text-indent:0em;padding-left:0em;">丙</div>"#;
        let options = PipelineOptions::default()
            .with_reserialize(false)
            .with_backends(BackendChain::empty().with_backend(ExtraDivBackend));

        let collection = Pipeline::new(options)
            .run(vec![page("p0", BOOKMARK, ""), page("p1", BOOKMARK, body)])
            .unwrap();

        assert_eq!(
            collection.warnings,
            vec![PageWarning {
                index: 1,
                page: "p1".to_string(),
                kind: WarningKind::ReconnectRejected { splices: 1 },
            }]
        );
        assert_eq!(collection.passages[1], vec!["甲乙丙"]);
        assert_eq!(collection.degraded_pages().count(), 0);
    }
}
