//! Render an [`ArenaDom`] back to HTML text.
//!
//! The output is what the re-serialization pass and the line reconnector
//! operate on. Attribute values are written exactly as parsed (only `&`
//! and `"` are escaped), so inline style declarations survive a round trip
//! byte for byte.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Elements that never have content or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the whole document.
pub fn to_html(dom: &ArenaDom) -> String {
    let mut out = String::with_capacity(dom.len() * 16);
    for child in dom.children(dom.document()) {
        write_node(dom, child, false, &mut out);
    }
    out
}

/// Serialize a single node and its subtree.
pub fn node_to_html(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

fn write_node(dom: &ArenaDom, id: ArenaNodeId, raw_text: bool, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
        ArenaNodeData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(if name.is_empty() { "html" } else { name });
            out.push('>');
        }
        ArenaNodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        ArenaNodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        ArenaNodeData::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attr(&attr.value, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
            for child in dom.children(id) {
                write_node(dom, child, raw, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
