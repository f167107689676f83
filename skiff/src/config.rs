// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Project configuration files.

use {
    anyhow::{anyhow, Context, Result},
    serde::{Deserialize, Serialize},
    skiff_apple::{DmgConfig, PkgBuildConfig},
    skiff_debian::DebConfig,
    skiff_rpm::RpmConfig,
    skiff_toolchain::locale::LocaleConfig,
    std::path::Path,
};

/// Default name of the project configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "skiff.yaml";

/// Settings of every builder a project uses.
///
/// Sections are optional. Running a builder whose section is absent is
/// an error.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub deb: Option<DebConfig>,
    pub rpm: Option<RpmConfig>,
    pub pkg: Option<PkgBuildConfig>,
    pub dmg: Option<DmgConfig>,
    pub locale: Option<LocaleConfig>,
}

impl ProjectConfig {
    /// Parse a YAML document.
    pub fn from_yaml(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Load a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        Self::from_yaml(&data).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Unwrap a configuration section, naming it in the error if absent.
pub fn require_section<'a, T>(section: &'a Option<T>, name: &str) -> Result<&'a T> {
    section
        .as_ref()
        .ok_or_else(|| anyhow!("project configuration has no `{}` section", name))
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc, skiff_apple::DmgMethod, std::path::PathBuf};

    #[test]
    fn sections() -> Result<()> {
        let config = ProjectConfig::from_yaml(indoc! {"
            deb:
              name: demo
              version: 1.0.0
              maintainer: Jane Doe <jane@example.com>
              depends: python3-cairo, python3-lxml
              description: Demo application
              scripts: [bin/demo]
            rpm:
              name: demo
              version: 1.0.0
              depends: [python3-cairo]
              install_path: /usr/lib/python3/site-packages/demo
            dmg:
              targets: [dist/demo.pkg]
              method: hfsplus
            locale:
              sources: [src/demo]
              textdomain: demo
        "})?;

        let deb = require_section(&config.deb, "deb")?;
        assert_eq!(deb.name, "demo");
        assert_eq!(deb.section, "python");
        assert_eq!(deb.scripts, vec![PathBuf::from("bin/demo")]);

        let rpm = require_section(&config.rpm, "rpm")?;
        assert_eq!(rpm.release, "0");
        assert_eq!(rpm.depends, vec!["python3-cairo"]);

        assert_eq!(
            require_section(&config.dmg, "dmg")?.method,
            DmgMethod::Hfsplus
        );
        assert_eq!(require_section(&config.locale, "locale")?.textdomain, "demo");

        let err = require_section(&config.pkg, "pkg").unwrap_err();
        assert_eq!(
            err.to_string(),
            "project configuration has no `pkg` section"
        );

        Ok(())
    }

    #[test]
    fn empty_document() -> Result<()> {
        assert_eq!(ProjectConfig::from_yaml("{}")?, ProjectConfig::default());

        Ok(())
    }

    #[test]
    fn missing_file() {
        let err = ProjectConfig::from_path("does-not-exist/skiff.yaml").unwrap_err();
        assert!(format!("{:#}", err).starts_with("reading does-not-exist/skiff.yaml"));
    }
}
