//! Tree traversal utilities for clean-up passes.

use crate::dom::{ArenaDom, ArenaNodeId};

/// Collect the outermost nodes under `root` matching `predicate`, in
/// document order.
///
/// The walk does not descend into a matching node, so a match nested
/// inside another match is not reported twice.
pub fn collect_outermost<F>(dom: &ArenaDom, root: ArenaNodeId, mut predicate: F) -> Vec<ArenaNodeId>
where
    F: FnMut(&ArenaDom, ArenaNodeId) -> bool,
{
    let mut matches = Vec::new();
    let mut stack: Vec<_> = dom.children(root).collect();
    stack.reverse();

    while let Some(id) = stack.pop() {
        if predicate(dom, id) {
            matches.push(id);
            continue;
        }
        let mut children: Vec<_> = dom.children(id).collect();
        children.reverse();
        stack.extend(children);
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Attribute;

    #[test]
    fn test_skips_nested_matches() {
        let mut dom = ArenaDom::new();
        let outer = dom.create_element("center", vec![]);
        dom.append(dom.document(), outer);
        let inner = dom.create_element("center", vec![]);
        dom.append(outer, inner);
        let sibling = dom.create_element("center", vec![Attribute::new("id", "x")]);
        dom.append(dom.document(), sibling);

        let found = collect_outermost(&dom, dom.document(), |dom, id| {
            dom.element_name(id) == Some("center")
        });

        assert_eq!(found, vec![outer, sibling]);
    }
}
