//! Markup sanitizer: removes page furniture from a scroll page.
//!
//! Han-Ji pages interleave the text with page-number tables, placeholder
//! anchors, hidden editorial annotations and centred page dividers. None of
//! it is content. Each kind is described by a [`RemovalRule`]; a matching
//! element is removed together with its subtree.

use tracing::debug;

use crate::backend::BackendChain;
use crate::dom::{ArenaDom, ArenaNodeId};
use crate::error::Result;
use crate::page::Page;

use super::pass::collect_outermost;

/// Inline style of the hidden red annotation spans.
pub const HIDDEN_ANNOTATION_STYLE: &str = "display:none;width:;height:;color:red;font-size:13px";

/// How a rule inspects an element's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatcher {
    /// Any element with the rule's tag.
    Any,
    /// Attribute present with exactly this value.
    Equals { name: String, value: String },
    /// Attribute present with one of these values.
    OneOf { name: String, values: Vec<String> },
    /// `class` list contains this class.
    HasClass(String),
    /// `style` equal to this declaration text, ignoring whitespace.
    Style(String),
}

impl AttrMatcher {
    fn matches(&self, dom: &ArenaDom, id: ArenaNodeId) -> bool {
        match self {
            AttrMatcher::Any => true,
            AttrMatcher::Equals { name, value } => dom.get_attr(id, name) == Some(value.as_str()),
            AttrMatcher::OneOf { name, values } => dom
                .get_attr(id, name)
                .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
            AttrMatcher::HasClass(class) => dom.element_classes(id).any(|c| c == class),
            AttrMatcher::Style(style) => dom
                .get_attr(id, "style")
                .is_some_and(|v| squash(v) == squash(style)),
        }
    }
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// A (tag name, attribute matcher) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRule {
    pub tag: String,
    pub matcher: AttrMatcher,
}

impl RemovalRule {
    pub fn new(tag: impl Into<String>, matcher: AttrMatcher) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            matcher,
        }
    }

    /// Every `<tag>` element.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(tag, AttrMatcher::Any)
    }

    pub fn matches(&self, dom: &ArenaDom, id: ArenaNodeId) -> bool {
        dom.element_name(id) == Some(self.tag.as_str()) && self.matcher.matches(dom, id)
    }
}

/// Ordered set of removal rules plus the re-serialization switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitizer {
    rules: Vec<RemovalRule>,
    reserialize: bool,
}

impl Default for Sanitizer {
    /// The Han-Ji page furniture rules, with re-serialization on.
    fn default() -> Self {
        Self {
            rules: vec![
                RemovalRule::new("table", AttrMatcher::HasClass("page".to_string())),
                RemovalRule::new(
                    "a",
                    AttrMatcher::OneOf {
                        name: "href".to_string(),
                        values: vec!["#".to_string(), String::new()],
                    },
                ),
                RemovalRule::new("span", AttrMatcher::Style(HIDDEN_ANNOTATION_STYLE.to_string())),
                RemovalRule::tag("center"),
            ],
            reserialize: true,
        }
    }
}

impl Sanitizer {
    /// A sanitizer with no rules.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            reserialize: false,
        }
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: RemovalRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Toggle the re-serialization pass.
    pub fn with_reserialize(mut self, reserialize: bool) -> Self {
        self.reserialize = reserialize;
        self
    }

    pub fn rules(&self) -> &[RemovalRule] {
        &self.rules
    }

    pub fn reserializes(&self) -> bool {
        self.reserialize
    }

    /// Remove every element matching a rule. Returns the number of
    /// subtrees removed. Running it again on the result removes nothing.
    pub fn strip(&self, dom: &mut ArenaDom) -> usize {
        let doomed = collect_outermost(dom, dom.document(), |dom, id| {
            self.rules.iter().any(|rule| rule.matches(dom, id))
        });

        for &id in &doomed {
            dom.detach(id);
        }
        doomed.len()
    }

    /// Sanitize a page in place: optionally normalize it by re-parsing its
    /// own serialization, then strip.
    pub fn sanitize(&self, page: &mut Page, backends: &BackendChain) -> Result<usize> {
        if self.reserialize {
            page.reparse(backends)?;
        }
        let removed = self.strip(&mut page.dom);
        debug!(page = %page.label, removed, "sanitized page");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::to_html;

    fn page(body: &str) -> Page {
        Page::parse(
            "test",
            &format!("<html><head></head><body>{body}</body></html>"),
            &BackendChain::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_removes_page_furniture() {
        let mut p = page(&format!(
            r##"<a class="gobookmark" href="x.html">史</a>
            <table class="page"><tr><td>12</td></tr></table>
            <div style="text-indent:2em;padding-left:0em;">臣<a href="#">註</a>聞<span style="{HIDDEN_ANNOTATION_STYLE}">校勘</span>之</div>
            <center>13</center>"##
        ));

        let removed = Sanitizer::default().sanitize(&mut p, &BackendChain::default()).unwrap();

        assert_eq!(removed, 4);
        let body = p.dom.body().unwrap();
        assert_eq!(p.dom.full_text(body).split_whitespace().collect::<String>(), "史臣聞之");
        assert!(p.dom.find_by_tag("table").is_none());
        assert!(p.dom.find_by_tag("center").is_none());
    }

    #[test]
    fn test_keeps_non_matching_elements() {
        let mut p = page(
            r#"<table class="layout"><tr><td>表</td></tr></table>
            <span style="color:red">紅</span><a href="note.html">連結</a>"#,
        );

        let removed = Sanitizer::default().strip(&mut p.dom);

        assert_eq!(removed, 0);
        assert!(p.dom.find_by_tag("table").is_some());
        assert!(p.dom.find_by_tag("span").is_some());
    }

    #[test]
    fn test_style_match_ignores_whitespace() {
        let mut p = page(
            r#"<span style="display: none; width:; height:; color: red; font-size: 13px">x</span>"#,
        );

        assert_eq!(Sanitizer::default().strip(&mut p.dom), 1);
    }

    #[test]
    fn test_strip_is_idempotent() {
        let mut p = page(
            r#"<center>頁</center><div style="text-indent:2em;padding-left:0em;">文</div>"#,
        );
        let sanitizer = Sanitizer::default();

        sanitizer.sanitize(&mut p, &BackendChain::default()).unwrap();
        let once = to_html(&p.dom);
        let removed_again = sanitizer.sanitize(&mut p, &BackendChain::default()).unwrap();

        assert_eq!(removed_again, 0);
        assert_eq!(to_html(&p.dom), once);
    }

    #[test]
    fn test_custom_rule() {
        let mut p = page(r#"<div class="ad">廣告</div><div>文</div>"#);
        let sanitizer = Sanitizer::empty().with_rule(RemovalRule::new(
            "div",
            AttrMatcher::Equals {
                name: "class".to_string(),
                value: "ad".to_string(),
            },
        ));

        assert_eq!(sanitizer.strip(&mut p.dom), 1);
        let body = p.dom.body().unwrap();
        assert_eq!(p.dom.full_text(body), "文");
    }
}
