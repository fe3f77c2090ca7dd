//! Line reconnector: heals paragraphs split by page dividers.
//!
//! A paragraph that runs across two physical pages arrives as two flush
//! (`text-indent:0; padding-left:0`) containers: the tail of the first page
//! and the head of the next. Once the sanitizer has removed the divider
//! between them, the closing tag of the first and the opening tag of the
//! second are separated only by whitespace or punctuation. Deleting both
//! markers, and the gap between them, splices the two fragments into one
//! container.
//!
//! The edit is made on the serialized page because the two fragments are
//! frequently not siblings in the parsed tree. The spliced text is
//! re-parsed and accepted only if it still yields exactly one fewer `<div>`
//! per splice and the same text, ignoring whitespace and punctuation.
//!
//! Quoted or nested paragraphs that cross a page break are not healed.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::backend::BackendChain;
use crate::dom::ArenaDom;
use crate::error::Result;
use crate::page::Page;
use crate::style::Layout;

static DIV_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<div\b(?:[^>"']|"[^"]*"|'[^']*')*>|</div\s*>"#).unwrap());
static STYLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sstyle\s*=\s*"([^"]*)""#).unwrap());
static GAP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\W*$").unwrap());

/// What the reconnector did to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnection {
    /// No page-divider break found.
    Unchanged,
    /// This many breaks were spliced.
    Spliced(usize),
    /// Splices were found but the result failed verification; the page
    /// was left as it was.
    Rejected(usize),
}

/// Find every page-divider break in serialized HTML.
///
/// Each range covers a closing `</div>` of a flush container, the gap after
/// it, and the opening tag of the flush container that follows.
pub fn find_breaks(html: &str) -> Vec<Range<usize>> {
    let mut breaks = Vec::new();
    // Layout of each open div; None when it has no inline style
    let mut open: Vec<Option<Layout>> = Vec::new();
    // The most recent closing tag, if nothing has opened since
    let mut last_close: Option<(usize, usize, Option<Layout>)> = None;

    for tag in DIV_TAG_RE.find_iter(html) {
        let text = tag.as_str();

        if text.starts_with("</") {
            let closed = open.pop().flatten();
            last_close = Some((tag.start(), tag.end(), closed));
            continue;
        }

        let layout = STYLE_ATTR_RE
            .captures(text)
            .map(|caps| Layout::from_style(&caps[1]));

        match last_close.take() {
            Some((start, end, Some(closed)))
                if closed.is_flush()
                    && layout.is_some_and(|l| l.is_flush())
                    && GAP_RE.is_match(&html[end..tag.start()]) =>
            {
                breaks.push(start..tag.end());
                // The closed container stays open and absorbs the new one
                open.push(Some(closed));
            }
            _ => open.push(layout),
        }
    }

    breaks
}

/// Delete every break found by [`find_breaks`]. Returns the spliced text
/// and the number of splices.
pub fn splice(html: &str) -> (String, usize) {
    let breaks = find_breaks(html);
    if breaks.is_empty() {
        return (html.to_string(), 0);
    }

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;
    for range in &breaks {
        out.push_str(&html[cursor..range.start]);
        cursor = range.end;
    }
    out.push_str(&html[cursor..]);

    (out, breaks.len())
}

fn count_divs(dom: &ArenaDom) -> usize {
    dom.descendants(dom.document())
        .filter(|&id| dom.element_name(id) == Some("div"))
        .count()
}

/// Page text without whitespace or punctuation, the part a splice must keep.
fn word_text(dom: &ArenaDom) -> String {
    dom.full_text(dom.document())
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Reconnect broken lines on a sanitized page.
///
/// Must run after the sanitizer: a surviving page-number block or divider
/// sits between the two fragments and hides the break.
pub fn reconnect(page: &mut Page, backends: &BackendChain) -> Result<Reconnection> {
    let html = page.to_html();
    let (spliced, count) = splice(&html);
    if count == 0 {
        return Ok(Reconnection::Unchanged);
    }

    let healed = backends.parse(&spliced)?;
    let expected = count_divs(&page.dom).checked_sub(count);

    if Some(count_divs(&healed)) != expected || word_text(&healed) != word_text(&page.dom) {
        warn!(
            page = %page.label,
            splices = count,
            "reconnected page failed verification, keeping original"
        );
        return Ok(Reconnection::Rejected(count));
    }

    debug!(page = %page.label, splices = count, "reconnected page-divider breaks");
    page.dom = healed;
    Ok(Reconnection::Spliced(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ParseBackend;
    use crate::dom::ArenaNodeId;

    const FLUSH: &str = r#"<div style="text-indent:0em;padding-left:0em;">"#;
    const OPEN: &str = r#"<div style="text-indent:2em;padding-left:0em;">"#;

    #[test]
    fn test_finds_break_between_flush_containers() {
        let html = format!("{FLUSH}text1</div>   {FLUSH}text2</div>");

        let (spliced, count) = splice(&html);

        assert_eq!(count, 1);
        assert_eq!(spliced, format!("{FLUSH}text1text2</div>"));
    }

    #[test]
    fn test_gap_with_word_characters_is_not_a_break() {
        let html = format!("{FLUSH}甲</div>乙{FLUSH}丙</div>");
        assert!(find_breaks(&html).is_empty());

        let html = format!("{FLUSH}甲</div><br>{FLUSH}丙</div>");
        assert!(find_breaks(&html).is_empty());
    }

    #[test]
    fn test_punctuation_gap_is_absorbed() {
        let html = format!("{FLUSH}甲</div>\n 。\n{FLUSH}乙</div>");
        assert_eq!(splice(&html).0, format!("{FLUSH}甲乙</div>"));
    }

    #[test]
    fn test_paragraph_opening_is_not_spliced() {
        let html = format!("{FLUSH}甲</div>{OPEN}乙</div>");
        assert!(find_breaks(&html).is_empty());
    }

    #[test]
    fn test_closing_container_must_be_flush() {
        let html = format!("{OPEN}甲</div>{FLUSH}乙</div>");
        assert!(find_breaks(&html).is_empty());
    }

    #[test]
    fn test_chained_breaks() {
        let html = format!("{FLUSH}一</div> {FLUSH}二</div> {FLUSH}三</div>");

        let (spliced, count) = splice(&html);

        assert_eq!(count, 2);
        assert_eq!(spliced, format!("{FLUSH}一二三</div>"));
    }

    #[test]
    fn test_reconnect_page() {
        let html = format!(
            "<html><head></head><body><a href=\"b.html\">史</a>{OPEN}臣聞</div>\n{FLUSH}之</div>   {FLUSH}矣</div></body></html>"
        );
        let backends = BackendChain::default();
        let mut page = Page::parse("t", &html, &backends).unwrap();

        let outcome = reconnect(&mut page, &backends).unwrap();

        assert_eq!(outcome, Reconnection::Spliced(1));
        let body = page.dom.body().unwrap();
        let divs: Vec<_> = page
            .dom
            .children(body)
            .filter(|&c| page.dom.element_name(c) == Some("div"))
            .collect();
        assert_eq!(divs.len(), 2);
        assert_eq!(page.dom.direct_text(divs[1]), "之矣");
    }

    #[test]
    fn test_reconnect_without_breaks_is_unchanged() {
        let html = format!("<html><head></head><body>{OPEN}甲</div>{OPEN}乙</div></body></html>");
        let backends = BackendChain::default();
        let mut page = Page::parse("t", &html, &backends).unwrap();
        let before = page.to_html();

        assert_eq!(reconnect(&mut page, &backends).unwrap(), Reconnection::Unchanged);
        assert_eq!(page.to_html(), before);
    }

    #[test]
    fn test_quoted_angle_bracket_stays_inside_tag() {
        let tail = r#"<div style="text-indent:0em;padding-left:0em;" title="a>b">丙</div>"#;
        let html = format!("{FLUSH}乙</div> {tail}");

        let (spliced, count) = splice(&html);

        assert_eq!(count, 1);
        assert_eq!(spliced, format!("{FLUSH}乙丙</div>"));
    }

    #[test]
    fn test_reconnect_with_angle_bracket_attribute() {
        let html = format!(
            r#"<html><head></head><body>{OPEN}甲</div>{FLUSH}乙</div> <div style="text-indent:0em;padding-left:0em;" title="a>b">丙</div></body></html>"#
        );
        let backends = BackendChain::default();
        let mut page = Page::parse("t", &html, &backends).unwrap();

        assert_eq!(reconnect(&mut page, &backends).unwrap(), Reconnection::Spliced(1));
        let body = page.dom.body().unwrap();
        assert_eq!(page.dom.full_text(body), "甲乙丙");
    }

    /// Parses with the default chain, then edits the result.
    struct Tampering(fn(&mut ArenaDom, ArenaNodeId));

    impl ParseBackend for Tampering {
        fn name(&self) -> &'static str {
            "tampering"
        }

        fn parse(&self, html: &str) -> Result<ArenaDom> {
            let mut dom = BackendChain::default().parse(html)?;
            if let Some(body) = dom.body() {
                (self.0)(&mut dom, body);
            }
            Ok(dom)
        }
    }

    fn reconnect_with(tamper: fn(&mut ArenaDom, ArenaNodeId)) -> (Reconnection, Page, String) {
        let html = format!(
            "<html><head></head><body>{OPEN}甲</div>{FLUSH}乙</div> {FLUSH}丙</div></body></html>"
        );
        let mut page = Page::parse("t", &html, &BackendChain::default()).unwrap();
        let before = page.to_html();
        let backends = BackendChain::empty().with_backend(Tampering(tamper));

        let outcome = reconnect(&mut page, &backends).unwrap();
        (outcome, page, before)
    }

    #[test]
    fn test_wrong_div_count_is_rejected() {
        let (outcome, page, before) = reconnect_with(|dom, body| {
            let div = dom.create_element("div", Vec::new());
            dom.append(body, div);
        });

        assert_eq!(outcome, Reconnection::Rejected(1));
        assert_eq!(page.to_html(), before);
    }

    #[test]
    fn test_changed_text_is_rejected() {
        let (outcome, page, before) = reconnect_with(|dom, body| dom.append_text(body, "b"));

        assert_eq!(outcome, Reconnection::Rejected(1));
        assert_eq!(page.to_html(), before);
    }
}
