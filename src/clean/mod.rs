//! Page clean-up passes.
//!
//! ## Pipeline Order
//!
//! 1. **Sanitize** - re-parse the page's own serialization, then remove
//!    page furniture (page-number tables, placeholder anchors, hidden
//!    annotations, centred dividers)
//! 2. **Reconnect** - splice paragraphs split by the removed dividers
//!
//! Reconnection depends on the dividers being gone, so the order is fixed.

mod pass;
mod reconnect;
mod sanitize;

pub use reconnect::{Reconnection, find_breaks, reconnect, splice};
pub use sanitize::{AttrMatcher, HIDDEN_ANNOTATION_STYLE, RemovalRule, Sanitizer};
