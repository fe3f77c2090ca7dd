//! Paragraph segmentation.
//!
//! Han-Ji pages have no paragraph markup. Each printed line is a styled
//! `<div>`, and a line indented by 2 with no padding starts a new paragraph;
//! every other line continues the one before it. [`Segmenter`] is a
//! two-state machine over those lines.

use crate::page::Page;
use crate::style::Layout;

/// One paragraph's text.
pub type Paragraph = String;

/// The paragraphs of one page, in order.
pub type Passage = Vec<Paragraph>;

/// A styled line container on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub layout: Layout,
    /// Text children only; nested markup is dropped.
    pub runs: String,
    /// All descendant text, used when the page degrades.
    pub text: String,
}

impl ContentNode {
    pub fn new(layout: Layout, runs: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            layout,
            runs: runs.into(),
            text: text.into(),
        }
    }

    /// A node whose direct and full text are the same.
    pub fn plain(layout: Layout, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(layout, text.clone(), text)
    }

    /// Every `<div>` with a `style` attribute on the page, in document order.
    pub fn collect(page: &Page) -> Vec<ContentNode> {
        let dom = &page.dom;
        let root = dom.body().unwrap_or(dom.document());

        dom.descendants(root)
            .filter(|&id| dom.element_name(id) == Some("div"))
            .filter_map(|id| {
                let style = dom.get_attr(id, "style")?;
                Some(ContentNode::new(
                    Layout::from_style(style),
                    dom.direct_text(id),
                    dom.full_text(id),
                ))
            })
            .collect()
    }
}

/// Segmentation result for one page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segmented {
    pub passage: Passage,
    /// A continuation line arrived before any paragraph opened, so the
    /// whole page was folded into one paragraph.
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    NoOpenParagraph,
    ParagraphOpen(Paragraph),
}

/// Groups content nodes into paragraphs.
#[derive(Debug)]
pub struct Segmenter {
    state: State,
    passage: Passage,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// A continuation line with no open paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoOpenParagraph;

impl Segmenter {
    pub fn new() -> Self {
        Self {
            state: State::NoOpenParagraph,
            passage: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::ParagraphOpen(_))
    }

    /// Feed one node.
    pub fn push(&mut self, node: &ContentNode) -> Result<(), NoOpenParagraph> {
        if node.layout.opens_paragraph() {
            let previous = std::mem::replace(&mut self.state, State::ParagraphOpen(node.runs.clone()));
            if let State::ParagraphOpen(paragraph) = previous {
                self.passage.push(paragraph);
            }
            return Ok(());
        }

        match &mut self.state {
            State::ParagraphOpen(paragraph) => {
                paragraph.push_str(&node.runs);
                Ok(())
            }
            State::NoOpenParagraph => Err(NoOpenParagraph),
        }
    }

    /// Flush the open paragraph and return the passage.
    pub fn finish(mut self) -> Passage {
        if let State::ParagraphOpen(paragraph) = self.state {
            self.passage.push(paragraph);
        }
        self.passage
    }
}

/// Segment a page's content nodes.
///
/// If a continuation line arrives before any paragraph has opened, the
/// page degrades to a single paragraph holding every node's full text.
/// A page with no content nodes yields an empty passage.
pub fn segment(nodes: &[ContentNode]) -> Segmented {
    let mut segmenter = Segmenter::new();

    for node in nodes {
        if segmenter.push(node).is_err() {
            return Segmented {
                passage: vec![nodes.iter().map(|n| n.text.as_str()).collect()],
                degraded: true,
            };
        }
    }

    Segmented {
        passage: segmenter.finish(),
        degraded: false,
    }
}
