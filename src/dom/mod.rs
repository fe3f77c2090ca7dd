//! Page DOM: arena tree, html5ever sink, and HTML serializer.

mod arena;
mod serialize;
#[cfg(feature = "html5ever")]
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute, ChildrenIter, Descendants};
pub use serialize::{node_to_html, to_html};

pub(crate) use serialize::VOID_ELEMENTS;
#[cfg(feature = "html5ever")]
pub(crate) use tree_sink::ArenaSink;
