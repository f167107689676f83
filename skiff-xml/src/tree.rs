// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::element::Element,
    std::{
        io::Write,
        ops::{Index, IndexMut},
    },
};

/// Number of spaces added per nesting level.
pub const INDENT: usize = 4;

/// Elements with more attributes than this place each attribute on its own line.
pub const ATTRIBUTE_WRAP_THRESHOLD: usize = 3;

/// Handle to an element stored in an [ElementTree].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Arena holding elements and their relationships.
///
/// A single tree can hold multiple unrelated roots.
#[derive(Clone, Debug, Default)]
pub struct ElementTree {
    nodes: Vec<Option<Element>>,
}

impl Index<ElementId> for ElementTree {
    type Output = Element;

    fn index(&self, id: ElementId) -> &Self::Output {
        self.get(id)
            .unwrap_or_else(|| panic!("element {:?} has been destroyed", id))
    }
}

impl IndexMut<ElementId> for ElementTree {
    fn index_mut(&mut self, id: ElementId) -> &mut Self::Output {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("element {:?} has been destroyed", id))
    }
}

impl ElementTree {
    /// Store an element in the tree, returning its handle.
    ///
    /// The element starts out detached. Any relationships carried by the
    /// passed value are discarded.
    pub fn insert(&mut self, mut element: Element) -> ElementId {
        element.children.clear();
        element.parent = None;

        self.nodes.push(Some(element));
        ElementId(self.nodes.len() - 1)
    }

    /// Obtain an element, or `None` if it was destroyed.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Obtain a mutable element, or `None` if it was destroyed.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Whether an element has been torn down by [Self::destroy].
    pub fn is_destroyed(&self, id: ElementId) -> bool {
        self.get(id).is_none()
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Passing `None` does nothing, which allows optional elements to be
    /// attached without branching at call sites.
    ///
    /// The caller must guarantee the child is detached and is not an
    /// ancestor of `parent`.
    pub fn add_child(&mut self, parent: ElementId, child: Option<ElementId>) {
        let child = match child {
            Some(child) => child,
            None => return,
        };

        debug_assert!(
            self[child].parent.is_none(),
            "element {:?} already has a parent",
            child
        );
        debug_assert!(
            child != parent && !self.is_ancestor(child, parent),
            "attaching {:?} to {:?} would create a cycle",
            child,
            parent
        );

        self[parent].children.push(child);
        self[child].parent = Some(parent);
    }

    /// The parent of an element, if attached.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|e| e.parent)
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = self.parent(id);

        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }

        false
    }

    /// Write an element and its subtree at indentation level 0.
    pub fn write<W: Write>(&self, id: ElementId, writer: &mut W) -> std::io::Result<()> {
        self.write_indented(id, writer, 0)
    }

    /// Write an element and its subtree, indented by `indent` spaces.
    ///
    /// This incurs many small `.write()` calls. So a buffered writer is
    /// recommended when writing to a file.
    pub fn write_indented<W: Write>(
        &self,
        id: ElementId,
        writer: &mut W,
        indent: usize,
    ) -> std::io::Result<()> {
        let element = &self[id];
        let tab = " ".repeat(indent);

        if element.leading_blank_line {
            writer.write_all(b"\n")?;
        }

        if !element.comment.is_empty() {
            writeln!(writer, "{}<!-- {} -->", tab, element.comment)?;
        }

        write!(writer, "{}<{}", tab, element.tag)?;

        let prefix = if element.attributes.len() > ATTRIBUTE_WRAP_THRESHOLD {
            format!("\n{}  ", tab)
        } else {
            " ".to_string()
        };

        for (key, value) in element.attributes.iter() {
            write!(writer, "{}{}=\"{}\"", prefix, key, value)?;
        }

        if !element.children.is_empty() {
            writer.write_all(b">\n")?;

            for child in &element.children {
                self.write_indented(*child, writer, indent + INDENT)?;
            }

            writeln!(writer, "{}</{}>", tab, element.tag)
        } else if !element.content.is_empty() {
            writeln!(writer, ">{}</{}>", element.content, element.tag)
        } else {
            writer.write_all(b" />\n")
        }
    }

    /// Serialize an element and its subtree to a string.
    pub fn to_xml_string(&self, id: ElementId) -> std::io::Result<String> {
        let mut buffer = Vec::new();
        self.write(id, &mut buffer)?;

        String::from_utf8(buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Tear down an element and its subtree.
    ///
    /// Children are destroyed depth-first before their parent. The element
    /// is detached from its parent, if any. Destroyed handles must not be
    /// used again: indexing them panics and [Self::get] returns `None`.
    ///
    /// Returns the destroyed handles in the order they were cleared.
    pub fn destroy(&mut self, id: ElementId) -> Vec<ElementId> {
        if let Some(parent) = self.parent(id) {
            if let Some(parent) = self.get_mut(parent) {
                parent.children.retain(|c| *c != id);
            }
        }

        let mut cleared = vec![];
        self.destroy_subtree(id, &mut cleared);

        cleared
    }

    fn destroy_subtree(&mut self, id: ElementId, cleared: &mut Vec<ElementId>) {
        let children = match self.get(id) {
            Some(element) => element.children.clone(),
            None => return,
        };

        for child in children {
            self.destroy_subtree(child, cleared);
        }

        self.nodes[id.0] = None;
        cleared.push(id);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc};

    fn render(tree: &ElementTree, id: ElementId) -> String {
        tree.to_xml_string(id).unwrap()
    }

    #[test]
    fn leaf_with_content() {
        let mut tree = ElementTree::default();
        let title = tree.insert(Element::new("title").with_content("My App"));

        assert_eq!(render(&tree, title), "<title>My App</title>\n");
    }

    #[test]
    fn empty_leaf_self_closes() {
        let mut tree = ElementTree::default();
        let payload = tree.insert(
            Element::new("payload")
                .with_attributes([("installKBytes", "204800"), ("numberOfFiles", "12")]),
        );
        let bare = tree.insert(Element::new("bundle-version"));

        assert_eq!(
            render(&tree, payload),
            "<payload installKBytes=\"204800\" numberOfFiles=\"12\" />\n"
        );
        assert_eq!(render(&tree, bare), "<bundle-version />\n");
    }

    #[test]
    fn content_ignored_with_children() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("choice").with_content("SECRET"));
        let child = tree.insert(Element::new("pkg-ref").with_attributes([("id", "a")]));
        tree.add_child(root, Some(child));

        let out = render(&tree, root);
        assert!(!out.contains("SECRET"));
        assert_eq!(
            out,
            indoc! {r#"
                <choice>
                    <pkg-ref id="a" />
                </choice>
            "#}
        );
    }

    #[test]
    fn three_attributes_inline() {
        let mut tree = ElementTree::default();
        let e = tree.insert(Element::new("background").with_attributes([
            ("file", "bg.png"),
            ("alignment", "bottomleft"),
            ("scaling", "none"),
        ]));

        assert_eq!(
            render(&tree, e),
            "<background file=\"bg.png\" alignment=\"bottomleft\" scaling=\"none\" />\n"
        );
    }

    #[test]
    fn four_attributes_wrap() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("installer-script"));
        let e = tree.insert(
            Element::new("pkg-ref")
                .with_attributes([
                    ("id", "org.example.base.pkg"),
                    ("installKBytes", "10"),
                    ("version", "1.0"),
                    ("auth", "Root"),
                ])
                .with_content("#base.pkg"),
        );
        tree.add_child(root, Some(e));

        assert_eq!(
            render(&tree, e),
            indoc! {r#"
                <pkg-ref
                  id="org.example.base.pkg"
                  installKBytes="10"
                  version="1.0"
                  auth="Root">#base.pkg</pkg-ref>
            "#}
        );

        // Continuation lines are relative to the element's own indentation.
        assert_eq!(
            render(&tree, root),
            indoc! {r#"
                <installer-script>
                    <pkg-ref
                      id="org.example.base.pkg"
                      installKBytes="10"
                      version="1.0"
                      auth="Root">#base.pkg</pkg-ref>
                </installer-script>
            "#}
        );
    }

    #[test]
    fn comment_and_blank_line() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("root"));
        let child = tree.insert(Element::new("options").with_comment("installer options"));
        tree[child].set_leading_blank_line(true);
        tree.add_child(root, Some(child));

        assert_eq!(
            render(&tree, root),
            "<root>\n\n    <!-- installer options -->\n    <options />\n</root>\n"
        );
    }

    #[test]
    fn nested_indentation() {
        let mut tree = ElementTree::default();
        let a = tree.insert(Element::new("a"));
        let b = tree.insert(Element::new("b"));
        let c = tree.insert(Element::new("c").with_content("text"));
        tree.add_child(a, Some(b));
        tree.add_child(b, Some(c));

        let mut out = Vec::new();
        tree.write_indented(a, &mut out, 4).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "    <a>\n        <b>\n            <c>text</c>\n        </b>\n    </a>\n"
        );
    }

    #[test]
    fn serialization_is_idempotent() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("scripts"));
        let pre = tree.insert(Element::new("preinstall").with_attributes([("file", "./pre")]));
        let post = tree.insert(Element::new("postinstall").with_attributes([("file", "./post")]));
        tree.add_child(root, Some(pre));
        tree.add_child(root, Some(post));

        assert_eq!(render(&tree, root), render(&tree, root));
    }

    #[test]
    fn add_child_none_is_noop() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("pkg-info"));
        let other = tree.insert(Element::new("payload"));

        tree.add_child(root, None);

        assert!(tree[root].children().is_empty());
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(other), None);
    }

    #[test]
    fn add_child_sets_parent() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("a"));
        let child = tree.insert(Element::new("b"));
        let grandchild = tree.insert(Element::new("c"));
        tree.add_child(root, Some(child));
        tree.add_child(child, Some(grandchild));

        assert_eq!(tree[root].children(), &[child]);
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree[grandchild].parent(), Some(child));
        assert!(tree.is_ancestor(root, grandchild));
        assert!(!tree.is_ancestor(grandchild, root));
    }

    #[test]
    fn destroy_clears_bottom_up() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("root"));
        let left = tree.insert(Element::new("left"));
        let right = tree.insert(Element::new("right").with_content("x"));
        let leaf = tree.insert(Element::new("leaf"));
        tree.add_child(root, Some(left));
        tree.add_child(root, Some(right));
        tree.add_child(left, Some(leaf));

        let cleared = tree.destroy(root);

        assert_eq!(cleared, vec![leaf, left, right, root]);
        for id in [root, left, right, leaf] {
            assert!(tree.is_destroyed(id));
            assert!(tree.get(id).is_none());
        }
    }

    #[test]
    fn destroy_subtree_detaches_from_parent() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("root"));
        let child = tree.insert(Element::new("child"));
        let grandchild = tree.insert(Element::new("grandchild"));
        tree.add_child(root, Some(child));
        tree.add_child(child, Some(grandchild));

        assert_eq!(tree.destroy(child), vec![grandchild, child]);
        assert!(!tree.is_destroyed(root));
        assert!(tree[root].children().is_empty());
        assert_eq!(render(&tree, root), "<root />\n");
    }

    #[test]
    #[should_panic(expected = "has been destroyed")]
    fn destroyed_element_cannot_be_serialized() {
        let mut tree = ElementTree::default();
        let root = tree.insert(Element::new("root"));
        tree.destroy(root);

        let _ = tree.to_xml_string(root);
    }
}
