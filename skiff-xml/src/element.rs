// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {crate::tree::ElementId, linked_hash_map::LinkedHashMap};

/// A single node in an [crate::ElementTree].
///
/// Instances are constructed standalone and then handed to
/// [crate::ElementTree::insert]. Relationships (children and parent) are
/// managed by the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) attributes: LinkedHashMap<String, String>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) content: String,
    pub(crate) comment: String,
    pub(crate) leading_blank_line: bool,
    pub(crate) parent: Option<ElementId>,
}

impl Element {
    /// Construct a new element having the given tag name.
    ///
    /// The tag must not be empty.
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        debug_assert!(!tag.is_empty(), "element tag must not be empty");

        Self {
            tag,
            ..Default::default()
        }
    }

    /// Set initial attributes, consuming self.
    #[must_use]
    pub fn with_attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_attributes(attributes);
        self
    }

    /// Set text content, consuming self.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set a comment to emit before the opening tag, consuming self.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// The tag name of this element.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Merge attributes into this element.
    ///
    /// Keys that already exist have their value replaced and keep their
    /// position. New keys are appended in iteration order.
    pub fn set_attributes<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in attributes {
            let key = key.into();
            let value = value.into();

            // LinkedHashMap::insert() moves existing keys to the back.
            if let Some(existing) = self.attributes.get_mut(&key) {
                *existing = value;
            } else {
                self.attributes.insert(key, value);
            }
        }
    }

    /// Obtain the value of an attribute.
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|v| v.as_str())
    }

    /// Remove an attribute. Missing keys are ignored.
    pub fn remove_attribute(&mut self, key: &str) {
        self.attributes.remove(key);
    }

    /// Iterate over `(name, value)` attribute pairs in serialization order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes on this element.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Child elements, in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// The element owning this one, if attached.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Set text content.
    ///
    /// Content is ignored during serialization if the element has children.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn leading_blank_line(&self) -> bool {
        self.leading_blank_line
    }

    /// Request an empty line be written before this element.
    pub fn set_leading_blank_line(&mut self, value: bool) {
        self.leading_blank_line = value;
    }
}
