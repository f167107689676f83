// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `Distribution` XML file format.
//!
//! See <https://developer.apple.com/library/archive/documentation/DeveloperTools/Reference/DistributionDefinitionRef/Chapters/Distribution_XML_Ref.html>
//! for Apple's documentation of this file format.

use {
    crate::macos::install_check_script,
    skiff_xml::{Element, ElementId, ElementTree},
    std::io::Write,
};

/// XML declaration preceding a `Distribution` document.
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes"?>"#;

/// Name of the single choice offered by the installer.
pub const CHOICE_ID: &str = "choice1";

/// Product installer definition for a package with one component.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Distribution {
    /// Installer window title.
    pub title: String,

    /// Identifier of the `base.pkg` component.
    pub pkg_ref_id: String,

    /// Version of the installed software.
    pub version: String,

    /// Size of the installed payload in KiB.
    pub install_kbytes: u64,

    /// Minimum macOS version checked for before installing.
    pub check_version: Option<String>,

    /// File name of the background image in `Resources/en.lproj`.
    pub background: Option<String>,

    /// File name of the welcome document in `Resources/en.lproj`.
    pub welcome: Option<String>,

    /// File name of the readme document in `Resources/en.lproj`.
    pub readme: Option<String>,

    /// File name of the license document in `Resources/en.lproj`.
    pub license: Option<String>,
}

impl Distribution {
    /// Build the XML element tree of this document.
    ///
    /// Returns the tree and the id of the root `installer-script` element.
    pub fn to_tree(&self) -> (ElementTree, ElementId) {
        let mut tree = ElementTree::default();

        let root = tree.insert(Element::new("installer-script").with_attributes([
            ("minSpecVersion", "1.000000"),
            ("authoringTool", "com.apple.PackageMaker"),
            ("authoringToolVersion", "3.0.3"),
            ("authoringToolBuild", "174"),
        ]));

        let mut children = vec![
            Element::new("title").with_content(self.title.as_str()),
            Element::new("options")
                .with_attributes([("customize", "never"), ("allow-external-scripts", "no")]),
            Element::new("domains").with_attributes([("enable_anywhere", "true")]),
        ];

        if let Some(version) = &self.check_version {
            children.push(
                Element::new("installation-check")
                    .with_attributes([("script", "install_check();")]),
            );
            children.push(
                Element::new("script").with_content(install_check_script(version, &self.title)),
            );
        }

        if let Some(file) = &self.background {
            children.push(Element::new("background").with_attributes([
                ("file", file.as_str()),
                ("alignment", "bottomleft"),
                ("scaling", "none"),
            ]));
        }

        for (tag, file) in [
            ("welcome", &self.welcome),
            ("readme", &self.readme),
            ("license", &self.license),
        ] {
            if let Some(file) = file {
                children.push(Element::new(tag).with_attributes([("file", file.as_str())]));
            }
        }

        for element in children {
            let id = tree.insert(element);
            tree.add_child(root, Some(id));
        }

        let outline = tree.insert(Element::new("choices-outline"));
        let line = tree.insert(Element::new("line").with_attributes([("choice", CHOICE_ID)]));
        tree.add_child(outline, Some(line));
        tree.add_child(root, Some(outline));

        let choice = tree.insert(
            Element::new("choice").with_attributes([("id", CHOICE_ID), ("title", "base")]),
        );
        let choice_ref =
            tree.insert(Element::new("pkg-ref").with_attributes([("id", self.pkg_ref_id.as_str())]));
        tree.add_child(choice, Some(choice_ref));
        tree.add_child(root, Some(choice));

        let pkg_ref = tree.insert(
            Element::new("pkg-ref")
                .with_attributes([
                    ("id", self.pkg_ref_id.clone()),
                    ("installKBytes", self.install_kbytes.to_string()),
                    ("version", self.version.clone()),
                    ("auth", "Root".to_string()),
                ])
                .with_content("#base.pkg"),
        );
        tree.add_child(root, Some(pkg_ref));

        (tree, root)
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
