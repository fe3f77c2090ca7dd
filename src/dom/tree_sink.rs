//! Primary parser glue: html5ever tree builder into the arena.

use std::cell::RefCell;
use std::collections::HashMap;

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute};

/// Builds an [`ArenaDom`] from html5ever's tree-builder callbacks.
///
/// Node handles are arena ids. The arena stores plain lowercase tag names;
/// the qualified names html5ever asks back for live in a side table of
/// boxes that are never removed. Quirks mode is ignored: scraped pages are
/// only ever read for text and inline styles.
pub struct ArenaSink {
    dom: RefCell<ArenaDom>,
    names: RefCell<HashMap<ArenaNodeId, Box<QualName>>>,
}

impl Default for ArenaSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaSink {
    pub fn new() -> Self {
        Self {
            dom: RefCell::new(ArenaDom::new()),
            names: RefCell::new(HashMap::new()),
        }
    }

    pub fn into_dom(self) -> ArenaDom {
        self.dom.into_inner()
    }

    fn insert(&self, id: ArenaNodeId, child: NodeOrText<ArenaNodeId>, before: bool) {
        let mut dom = self.dom.borrow_mut();
        let node = match child {
            NodeOrText::AppendNode(node) => {
                dom.detach(node);
                node
            }
            NodeOrText::AppendText(text) if !before => {
                dom.append_text(id, &text);
                return;
            }
            NodeOrText::AppendText(text) => dom.create_text(text.to_string()),
        };
        if before {
            dom.insert_before(id, node);
        } else {
            dom.append(id, node);
        }
    }
}

fn convert_attrs(attrs: Vec<Html5Attribute>) -> Vec<Attribute> {
    attrs
        .into_iter()
        .map(|a| Attribute::new(a.name.local.to_string(), a.value.to_string()))
        .collect()
}

impl TreeSink for ArenaSink {
    type Handle = ArenaNodeId;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self {
        self
    }

    // Scraped pages are rarely valid HTML; recover silently like a browser
    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {}

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn get_document(&self) -> ArenaNodeId {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a ArenaNodeId) -> &'a QualName {
        static ANONYMOUS: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        match self.names.borrow().get(target) {
            Some(name) => {
                let name: &QualName = name;
                // SAFETY: each QualName is boxed, so its address is stable, and
                // entries are never removed or replaced while the sink lives.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            None => &ANONYMOUS,
        }
    }

    fn create_element(&self, name: QualName, attrs: Vec<Html5Attribute>, _: ElementFlags) -> ArenaNodeId {
        let id = self
            .dom
            .borrow_mut()
            .create_element(name.local.as_ref(), convert_attrs(attrs));
        self.names.borrow_mut().insert(id, Box::new(name));
        id
    }

    fn create_comment(&self, text: StrTendril) -> ArenaNodeId {
        self.dom.borrow_mut().create_comment(text.to_string())
    }

    // Processing instructions never carry page text
    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> ArenaNodeId {
        self.dom.borrow_mut().create_comment(String::new())
    }

    fn append(&self, parent: &ArenaNodeId, child: NodeOrText<ArenaNodeId>) {
        self.insert(*parent, child, false);
    }

    fn append_before_sibling(&self, sibling: &ArenaNodeId, child: NodeOrText<ArenaNodeId>) {
        self.insert(*sibling, child, true);
    }

    fn append_based_on_parent_node(
        &self,
        element: &ArenaNodeId,
        prev_element: &ArenaNodeId,
        child: NodeOrText<ArenaNodeId>,
    ) {
        let attached = self
            .dom
            .borrow()
            .get(*element)
            .is_some_and(|n| n.parent.is_some());
        if attached {
            self.insert(*element, child, true);
        } else {
            self.insert(*prev_element, child, false);
        }
    }

    fn append_doctype_to_document(&self, name: StrTendril, _: StrTendril, _: StrTendril) {
        let mut dom = self.dom.borrow_mut();
        let doctype = dom.create_doctype(name.to_string());
        let document = dom.document();
        dom.append(document, doctype);
    }

    fn get_template_contents(&self, target: &ArenaNodeId) -> ArenaNodeId {
        *target
    }

    fn same_node(&self, x: &ArenaNodeId, y: &ArenaNodeId) -> bool {
        x == y
    }

    fn add_attrs_if_missing(&self, target: &ArenaNodeId, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        let Some(ArenaNodeData::Element { attrs: present, .. }) =
            dom.get_mut(*target).map(|n| &mut n.data)
        else {
            return;
        };
        for attr in convert_attrs(attrs) {
            if present.iter().all(|a| a.name != attr.name) {
                present.push(attr);
            }
        }
    }

    fn remove_from_parent(&self, target: &ArenaNodeId) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &ArenaNodeId, new_parent: &ArenaNodeId) {
        self.dom.borrow_mut().reparent_children(*node, *new_parent);
    }
}
