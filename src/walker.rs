//! Scoped depth-first traversal.

use tidewater_dom::Element;

/// Visits `root` and its descendants in document order, without descending into
/// boundary elements.
///
/// An element for which `is_boundary` returns `true` is skipped together with its
/// subtree, except `root` itself, which is always visited. The tree is not modified.
pub fn walk<B, V>(root: &Element, is_boundary: B, mut visit: V)
where
    B: Fn(&Element) -> bool,
    V: FnMut(&Element),
{
    walk_inner(root, &is_boundary, &mut visit, true);
}

fn walk_inner<B, V>(element: &Element, is_boundary: &B, visit: &mut V, is_root: bool)
where
    B: Fn(&Element) -> bool,
    V: FnMut(&Element),
{
    if !is_root && is_boundary(element) {
        return;
    }

    visit(element);

    let mut child = element.first_element_child();
    while let Some(node) = child {
        walk_inner(&node, is_boundary, visit, false);
        child = node.next_element_sibling();
    }
}

/// Collects the elements [`walk`] would visit.
#[must_use]
pub fn collect<B>(root: &Element, is_boundary: B) -> Vec<Element>
where
    B: Fn(&Element) -> bool,
{
    let mut visited = Vec::new();
    walk(root, is_boundary, |element| visited.push(element.clone()));
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewater_dom::Document;

    fn tags(elements: &[Element]) -> Vec<String> {
        elements.iter().map(Element::tag_name).collect()
    }

    #[test]
    fn test_preorder_document_order() {
        let document = Document::new();
        let root = document.create_element("section");
        let header = document.create_element("header");
        let title = document.create_element("h1");
        let footer = document.create_element("footer");
        header.append_child(&title).unwrap();
        root.append_child(&header).unwrap();
        root.append_text("between");
        root.append_child(&footer).unwrap();

        let visited = collect(&root, |_| false);
        assert_eq!(tags(&visited), ["section", "header", "h1", "footer"]);
    }

    #[test]
    fn test_root_visited_even_when_boundary() {
        let document = Document::new();
        let root = document.create_element("div");
        root.set_attribute("x-data", "{}");

        let visited = collect(&root, |element| element.has_attribute("x-data"));
        assert_eq!(visited, [root]);
    }

    #[test]
    fn test_nested_boundary_is_skipped_with_subtree() {
        let document = Document::new();
        let root = document.create_element("div");
        let nested = document.create_element("div");
        nested.set_attribute("x-data", "{}");
        let inner = document.create_element("span");
        let sibling = document.create_element("p");
        nested.append_child(&inner).unwrap();
        root.append_child(&nested).unwrap();
        root.append_child(&sibling).unwrap();

        let visited = collect(&root, |element| element.has_attribute("x-data"));
        assert_eq!(visited, [root.clone(), sibling]);

        let visited = collect(&nested, |element| element.has_attribute("x-data"));
        assert_eq!(visited, [nested, inner]);
    }
}
