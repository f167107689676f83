// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Writing of binary package control files.

See https://www.debian.org/doc/debian-policy/ch-controlfields.html
for how control files are formatted.
*/

use {
    crate::error::{DebianError, Result},
    std::{borrow::Cow, io::Write},
};

/// A field value in a control file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlFieldValue<'a> {
    /// A single line value.
    Simple(Cow<'a, str>),
    /// A value that may be folded over lines, such as a dependency list.
    Folded(Cow<'a, str>),
    /// A synopsis line followed by continuation lines.
    Multiline(Cow<'a, str>),
}

impl<'a> ControlFieldValue<'a> {
    /// Derive the value type from the name of the field it belongs to.
    ///
    /// Only fields valid in a binary package control file are accepted.
    pub fn from_field(key: &str, value: Cow<'a, str>) -> Result<Self> {
        match key {
            "Package" | "Source" | "Version" | "Architecture" | "Maintainer"
            | "Installed-Size" | "Section" | "Priority" | "Essential" | "Homepage"
            | "Built-Using" => Ok(Self::Simple(value)),
            "Depends" | "Pre-Depends" | "Recommends" | "Suggests" | "Breaks"
            | "Conflicts" | "Provides" | "Replaces" | "Enhances" => Ok(Self::Folded(value)),
            "Description" => Ok(Self::Multiline(value)),
            _ => Err(DebianError::UnknownControlField(key.to_string())),
        }
    }

    /// The raw string value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Simple(v) | Self::Folded(v) | Self::Multiline(v) => v,
        }
    }

    /// Write this value to a writer.
    ///
    /// Lines after the first of a multiline value are indented by a space.
    /// Empty continuation lines are written as ` .`. Input that is already
    /// in continuation form is written unchanged.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Self::Simple(v) | Self::Folded(v) => writer.write_all(v.as_bytes()),
            Self::Multiline(v) => {
                let mut lines = v.lines();

                if let Some(first) = lines.next() {
                    writer.write_all(first.as_bytes())?;
                }

                for line in lines {
                    let line = line.strip_prefix(' ').unwrap_or(line);

                    if line.trim().is_empty() || line == "." {
                        writer.write_all(b"\n .")?;
                    } else {
                        writer.write_all(b"\n ")?;
                        writer.write_all(line.as_bytes())?;
                    }
                }

                Ok(())
            }
        }
    }
}

/// A field in a control file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlField<'a> {
    name: Cow<'a, str>,
    value: ControlFieldValue<'a>,
}

impl<'a> ControlField<'a> {
    /// Construct an instance from a field name and typed value.
    pub fn new(name: Cow<'a, str>, value: ControlFieldValue<'a>) -> Self {
        Self { name, value }
    }

    /// Construct a field from a named key and string value.
    ///
    /// Unknown keys are rejected.
    pub fn from_string_value(key: Cow<'a, str>, value: Cow<'a, str>) -> Result<Self> {
        let value = ControlFieldValue::from_field(key.as_ref(), value)?;

        Ok(Self { name: key, value })
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field value.
    pub fn value(&self) -> &ControlFieldValue<'a> {
        &self.value
    }

    /// Write the contents of this field to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.name.as_bytes())?;
        writer.write_all(b": ")?;
        self.value.write(writer)?;
        writer.write_all(b"\n")
    }
}

/// A paragraph in a control file.
///
/// A paragraph is an ordered series of control fields. A binary package
/// control file consists of exactly one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ControlParagraph<'a> {
    fields: Vec<ControlField<'a>>,
}

impl<'a> ControlParagraph<'a> {
    /// Add a `ControlField` to this instance.
    pub fn add_field(&mut self, field: ControlField<'a>) {
        self.fields.push(field);
    }

    /// Add a field defined via strings.
    pub fn add_field_from_string(&mut self, name: Cow<'a, str>, value: Cow<'a, str>) -> Result<()> {
        self.fields
            .push(ControlField::from_string_value(name, value)?);
        Ok(())
    }

    /// Add a field unless its value is empty.
    pub fn add_nonempty_field(&mut self, name: &'a str, value: impl Into<Cow<'a, str>>) -> Result<()> {
        let value = value.into();

        if value.trim().is_empty() {
            Ok(())
        } else {
            self.add_field_from_string(Cow::Borrowed(name), value)
        }
    }

    /// Whether a named field is present in this paragraph.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Obtain the first field with a given name in this paragraph.
    pub fn get_field(&self, name: &str) -> Option<&ControlField<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate over fields in insertion order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField<'a>> {
        self.fields.iter()
    }

    /// Serialize the paragraph to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for field in &self.fields {
            field.write(writer)?;
        }

        Ok(())
    }

    /// Serialize the paragraph to a string.
    pub fn to_control_string(&self) -> std::io::Result<String> {
        let mut buffer = vec![];
        self.write(&mut buffer)?;

        String::from_utf8(buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
