// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! A minimal XML element tree.

This crate holds an ordered, mutable, in-memory tree of named elements
with string attributes and either child elements or text content. It
exists to emit the small XML manifests consumed by installer tooling,
such as the `PackageInfo` and `Distribution` files inside Apple flat
packages.

Elements live in an [ElementTree] arena and are addressed by
[ElementId]. A parent owns its children through its ordered child list.
Children hold a non-owning back-reference to their parent that is only
used for relationship queries.

Serialization is deliberately simple. Output is indented by 4 spaces
per nesting level and elements with more than 3 attributes have each
attribute placed on its own line. Attribute values and text content are
written verbatim: no escaping is performed. The XML declaration is not
emitted by this crate; callers write it before the root element.

```
use skiff_xml::{Element, ElementTree};

let mut tree = ElementTree::default();
let root = tree.insert(Element::new("choices-outline"));
let line = tree.insert(Element::new("line").with_attributes([("choice", "choice1")]));
tree.add_child(root, Some(line));

assert_eq!(
    tree.to_xml_string(root).unwrap(),
    "<choices-outline>\n    <line choice=\"choice1\" />\n</choices-outline>\n"
);
```
*/

mod element;
mod tree;

pub use {
    element::Element,
    tree::{ElementId, ElementTree, ATTRIBUTE_WRAP_THRESHOLD, INDENT},
};
