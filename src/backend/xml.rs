//! Secondary backend: lenient quick-xml event reader.
//!
//! Scraped pages are HTML, not XML, so the reader is configured to accept
//! mismatched and stray end tags, and HTML void elements are never left
//! open. The resulting tree is normalized to the same document shape
//! html5ever produces.

use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};

use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute, VOID_ELEMENTS};
use crate::error::{Error, Result};

use super::ParseBackend;

/// Fallback parsing via quick-xml.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlBackend;

impl ParseBackend for XmlBackend {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn parse(&self, html: &str) -> Result<ArenaDom> {
        let mut reader = Reader::from_str(html);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut dom = ArenaDom::new();
        // Open elements, innermost last
        let mut stack: Vec<(String, ArenaNodeId)> = Vec::new();

        loop {
            let parent = stack.last().map(|(_, id)| *id).unwrap_or(dom.document());

            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let (tag, attrs) = read_start(&e);
                    let id = dom.create_element(&tag, attrs);
                    dom.append(parent, id);
                    if !VOID_ELEMENTS.contains(&tag.as_str()) {
                        stack.push((tag, id));
                    }
                }
                Ok(Event::Empty(e)) => {
                    let (tag, attrs) = read_start(&e);
                    let id = dom.create_element(&tag, attrs);
                    dom.append(parent, id);
                }
                Ok(Event::End(e)) => {
                    let name = e.name();
                    let tag = String::from_utf8_lossy(local_name(name.as_ref())).to_ascii_lowercase();
                    // Close up to the nearest matching open element; stray end tags are dropped
                    if let Some(pos) = stack.iter().rposition(|(open, _)| *open == tag) {
                        stack.truncate(pos);
                    }
                }
                Ok(Event::Text(e)) => {
                    dom.append_text(parent, &String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::GeneralRef(e)) => {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    match resolve_entity(&entity) {
                        Some(resolved) => dom.append_text(parent, &resolved),
                        None => dom.append_text(parent, &format!("&{entity};")),
                    }
                }
                Ok(Event::CData(e)) => {
                    dom.append_text(parent, &String::from_utf8_lossy(&e));
                }
                Ok(Event::Comment(e)) => {
                    let id = dom.create_comment(String::from_utf8_lossy(&e).into_owned());
                    dom.append(parent, id);
                }
                Ok(Event::DocType(e)) => {
                    let text = String::from_utf8_lossy(&e);
                    let name = text.split_whitespace().next().unwrap_or("html");
                    let id = dom.create_doctype(name.to_ascii_lowercase());
                    dom.append(parent, id);
                }
                Ok(Event::Eof) => break,
                // Unclosed elements at end of input are closed implicitly
                Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(_))) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "at byte {}: {e}",
                        reader.error_position()
                    )));
                }
            }
        }

        normalize_shape(&mut dom);
        Ok(dom)
    }
}

fn read_start(e: &BytesStart<'_>) -> (String, Vec<Attribute>) {
    let name = e.name();
    let tag = String::from_utf8_lossy(local_name(name.as_ref())).to_ascii_lowercase();

    let attrs = e
        .html_attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&attr.value));
            Attribute::new(key, value)
        })
        .collect();

    (tag, attrs)
}

/// Give the tree the `document > html > (head, body)` shape.
fn normalize_shape(dom: &mut ArenaDom) {
    let doc = dom.document();

    let html = match child_element(dom, doc, "html") {
        Some(html) => html,
        None => {
            let html = dom.create_element("html", Vec::new());
            let content: Vec<_> = dom
                .children(doc)
                .filter(|&c| !matches!(dom.get(c).map(|n| &n.data), Some(ArenaNodeData::Doctype { .. })))
                .collect();
            for child in content {
                dom.detach(child);
                dom.append(html, child);
            }
            dom.append(doc, html);
            html
        }
    };

    let head = child_element(dom, html, "head");

    if child_element(dom, html, "body").is_none() {
        let body = dom.create_element("body", Vec::new());
        let content: Vec<_> = dom.children(html).filter(|&c| Some(c) != head).collect();
        for child in content {
            dom.detach(child);
            dom.append(body, child);
        }
        dom.append(html, body);
    }

    if head.is_none() {
        let head = dom.create_element("head", Vec::new());
        match dom.children(html).next() {
            Some(first) => dom.insert_before(first, head),
            None => dom.append(html, head),
        }
    }
}

fn child_element(dom: &ArenaDom, parent: ArenaNodeId, tag: &str) -> Option<ArenaNodeId> {
    dom.children(parent)
        .find(|&c| dom.element_name(c) == Some(tag))
}

/// Extract local name from namespaced XML name (e.g., "xhtml:div" -> "div").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Replace `&name;` references in attribute text. Unknown references are kept.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail.find(';').and_then(|semi| {
            resolve_entity(&tail[..semi]).map(|resolved| (semi, resolved))
        }) {
            Some((semi, resolved)) => {
                out.push_str(&resolved);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve an entity reference name (without `&` and `;`) against the
/// HTML5 named character set or as a numeric reference.
fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(named) = resolve_html5_entity(entity) {
        return Some(named.to_string());
    }

    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
