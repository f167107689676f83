// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::builder::RpmConfig,
    std::{fmt, path::Path},
};

/// A `.spec` file for a project built and installed by a Python build script.
///
/// Rendered through `Display`.
#[derive(Clone, Copy, Debug)]
pub struct SpecFile<'a> {
    config: &'a RpmConfig,
    source: &'a Path,
}

impl<'a> SpecFile<'a> {
    /// Construct an instance describing a package built from the tarball at `source`.
    pub fn new(config: &'a RpmConfig, source: &'a Path) -> Self {
        Self { config, source }
    }

    /// Entries of the `%files` section.
    pub fn files(&self) -> Vec<String> {
        let config = self.config;

        let mut files = if config.scripts.is_empty() {
            vec![format!("%{{_bindir}}/{}", config.name)]
        } else {
            config
                .scripts
                .iter()
                .map(|script| {
                    let name = script.rsplit('/').next().unwrap_or(script);
                    format!("%{{_bindir}}/{}", name)
                })
                .collect::<Vec<_>>()
        };

        files.push(config.install_path.replace("/usr/", "%{_usr}/"));

        for data in &config.data_files {
            if let Some(rest) = data.path.strip_prefix("/usr/share/") {
                for file in &data.files {
                    if let Some(name) = file.file_name() {
                        files.push(format!(
                            "%{{_datadir}}/{}/{}",
                            rest,
                            name.to_string_lossy()
                        ));
                    }
                }
            }
        }

        files
    }
}

impl<'a> fmt::Display for SpecFile<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.config;

        writeln!(f, "Name: python3-{}", config.name)?;
        writeln!(f, "Version: {}", config.version)?;
        writeln!(f, "Release: {}", config.release())?;
        writeln!(f, "Summary: {}", config.summary)?;
        writeln!(f)?;
        writeln!(f, "License: {}", config.license)?;
        writeln!(f, "URL: {}", config.url)?;
        if !config.maintainer.is_empty() {
            writeln!(f, "Packager: {}", config.maintainer)?;
        }
        writeln!(f, "Source: {}", self.source.display())?;
        writeln!(f)?;
        for dep in &config.depends {
            writeln!(f, "Requires: {}", dep)?;
        }
        writeln!(f)?;
        writeln!(f, "%global __python %{{__python3}}")?;
        writeln!(f)?;
        writeln!(f, "%description")?;
        writeln!(f, "{}", config.description)?;
        writeln!(f)?;
        writeln!(f, "%prep")?;
        writeln!(f, "%autosetup -n {}-{}", config.name, config.version)?;
        writeln!(f)?;
        writeln!(f, "%build")?;
        writeln!(f, "/usr/bin/python3 {} build", config.build_script)?;
        writeln!(f)?;
        writeln!(f, "%install")?;
        writeln!(f, "rm -rf $RPM_BUILD_ROOT")?;
        writeln!(
            f,
            "/usr/bin/python3 {} install --root=$RPM_BUILD_ROOT",
            config.build_script
        )?;
        writeln!(f)?;
        writeln!(f, "%files")?;
        for entry in self.files() {
            writeln!(f, "{}", entry)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc, skiff_common::fs::DataFiles, std::path::PathBuf};

    fn config() -> RpmConfig {
        RpmConfig {
            name: "demo".to_string(),
            version: "1.2.3".to_string(),
            summary: "Demo application".to_string(),
            description: "Does demo things.".to_string(),
            license: "MIT".to_string(),
            url: "https://example.com/demo".to_string(),
            depends: vec!["python3-gobject".to_string(), "python3-cairo".to_string()],
            install_path: "/usr/lib/python3/site-packages/demo/".to_string(),
            data_files: vec![
                DataFiles {
                    path: "/usr/share/applications".to_string(),
                    files: vec![PathBuf::from("resources/demo.desktop")],
                },
                DataFiles {
                    path: "/etc/demo".to_string(),
                    files: vec![PathBuf::from("demo.conf")],
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn render() {
        let config = config();
        let spec = SpecFile::new(&config, Path::new("/tmp/rpmbuild/SOURCES/demo-1.2.3.tar.gz"));

        assert_eq!(
            spec.to_string(),
            indoc! {"
                Name: python3-demo
                Version: 1.2.3
                Release: 0
                Summary: Demo application

                License: MIT
                URL: https://example.com/demo
                Source: /tmp/rpmbuild/SOURCES/demo-1.2.3.tar.gz

                Requires: python3-gobject
                Requires: python3-cairo

                %global __python %{__python3}

                %description
                Does demo things.

                %prep
                %autosetup -n demo-1.2.3

                %build
                /usr/bin/python3 setup.py build

                %install
                rm -rf $RPM_BUILD_ROOT
                /usr/bin/python3 setup.py install --root=$RPM_BUILD_ROOT

                %files
                %{_bindir}/demo
                %{_usr}/lib/python3/site-packages/demo/
                %{_datadir}/applications/demo.desktop
            "}
        );
    }

    #[test]
    fn scripts_and_packager() {
        let mut config = config();
        config.scripts = vec!["bin/demo-cli".to_string(), "demo-gui".to_string()];
        config.maintainer = "Jane Doe <jane@example.com>".to_string();
        config.depends.clear();

        let spec = SpecFile::new(&config, Path::new("demo.tar.gz"));

        assert_eq!(
            &spec.files()[..2],
            &["%{_bindir}/demo-cli", "%{_bindir}/demo-gui"]
        );

        let text = spec.to_string();
        assert!(text.contains("URL: https://example.com/demo\nPackager: Jane Doe <jane@example.com>\nSource: demo.tar.gz\n\n\n%global"));
    }

    #[test]
    fn blank_release_renders_zero() {
        let mut config = config();
        config.release = String::new();

        let text = SpecFile::new(&config, Path::new("demo.tar.gz")).to_string();
        assert!(text.contains("\nRelease: 0\n"));

        config.release = "3.fc39".to_string();
        let text = SpecFile::new(&config, Path::new("demo.tar.gz")).to_string();
        assert!(text.contains("\nRelease: 3.fc39\n"));
    }
}
