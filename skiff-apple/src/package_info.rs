// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `PackageInfo` XML files.

use {
    skiff_xml::{Element, ElementId, ElementTree},
    std::io::Write,
};

/// XML declaration preceding a `PackageInfo` document.
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>"#;

/// Describes the single component of a flat package.
///
/// The component is always installed as root, overwrites permissions of
/// existing directories and is not relocatable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageInfo {
    /// Component identifier, e.g. `com.example.app.base.pkg`.
    pub identifier: String,

    /// Version of the installed software.
    pub version: String,

    /// Size of the installed payload in KiB.
    pub install_kbytes: u64,

    /// Number of files in the payload.
    pub number_of_files: u64,

    /// File name of the pre-install script in the `Scripts` archive.
    pub preinstall: Option<String>,

    /// File name of the post-install script in the `Scripts` archive.
    pub postinstall: Option<String>,
}

impl PackageInfo {
    /// Build the XML element tree of this document.
    ///
    /// Returns the tree and the id of the root `pkg-info` element.
    pub fn to_tree(&self) -> (ElementTree, ElementId) {
        let mut tree = ElementTree::default();

        let root = tree.insert(Element::new("pkg-info").with_attributes([
            ("format-version", "2"),
            ("identifier", self.identifier.as_str()),
            ("version", self.version.as_str()),
            ("auth", "root"),
            ("overwrite-permissions", "true"),
            ("relocatable", "false"),
        ]));

        let payload = tree.insert(Element::new("payload").with_attributes([
            ("installKBytes", self.install_kbytes.to_string()),
            ("numberOfFiles", self.number_of_files.to_string()),
        ]));
        tree.add_child(root, Some(payload));

        let scripts = self.scripts_element(&mut tree);
        tree.add_child(root, scripts);

        let bundle_version = tree.insert(Element::new("bundle-version"));
        tree.add_child(root, Some(bundle_version));

        (tree, root)
    }

    fn scripts_element(&self, tree: &mut ElementTree) -> Option<ElementId> {
        if self.preinstall.is_none() && self.postinstall.is_none() {
            return None;
        }

        let scripts = tree.insert(Element::new("scripts"));

        for (tag, name) in [
            ("preinstall", &self.preinstall),
            ("postinstall", &self.postinstall),
        ] {
            if let Some(name) = name {
                let script = tree.insert(
                    Element::new(tag).with_attributes([("file", format!("./{}", name))]),
                );
                tree.add_child(scripts, Some(script));
            }
        }

        Some(scripts)
    }

    /// Write the document, including its XML declaration.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let (tree, root) = self.to_tree();

        writeln!(writer, "{}", DECLARATION)?;
        tree.write(root, writer)
    }

    /// Serialize the document to a string.
    pub fn to_xml_string(&self) -> std::io::Result<String> {
        let mut buffer = vec![];
        self.write(&mut buffer)?;

        String::from_utf8(buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
