// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Natively compiled extension modules.

use {
    crate::pkgconfig::{extend_unique, PkgConfig},
    anyhow::Result,
    serde::{Deserialize, Serialize},
    std::path::{Path, PathBuf},
};

/// Describes how to compile and link a native module.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct NativeModule {
    /// Dotted module name, e.g. `app.cms._lcms2`.
    pub name: String,
    pub sources: Vec<PathBuf>,
    pub include_dirs: Vec<String>,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    /// `(name, value)` preprocessor definitions.
    pub define_macros: Vec<(String, String)>,
    pub extra_compile_args: Vec<String>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add source files named relative to a directory.
    #[must_use]
    pub fn with_sources(mut self, dir: impl AsRef<Path>, files: &[&str]) -> Self {
        self.sources
            .extend(files.iter().map(|f| dir.as_ref().join(f)));
        self
    }

    /// Add a preprocessor definition.
    #[must_use]
    pub fn with_define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.define_macros.push((name.into(), value.into()));
        self
    }

    /// Add library search directories.
    #[must_use]
    pub fn with_library_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.library_dirs.extend(dirs);
        self
    }

    /// Add include directories, libraries and compiler flags of `pkg-config` packages.
    pub fn with_pkg_config(
        mut self,
        pkg_config: &PkgConfig,
        packages: &[impl AsRef<str>],
    ) -> Result<Self> {
        extend_unique(&mut self.include_dirs, pkg_config.includes(packages)?);
        extend_unique(&mut self.libraries, pkg_config.libs(packages)?);
        extend_unique(&mut self.extra_compile_args, pkg_config.cflags(packages)?);

        Ok(self)
    }

    /// Compiler and linker arguments for this module, excluding sources.
    pub fn compile_args(&self) -> Vec<String> {
        let mut args = vec![];

        args.extend(self.define_macros.iter().map(|(name, value)| {
            if value.is_empty() {
                format!("-D{}", name)
            } else {
                format!("-D{}={}", name, value)
            }
        }));
        args.extend(self.include_dirs.iter().map(|d| format!("-I{}", d)));
        args.extend(self.extra_compile_args.iter().cloned());
        args.extend(
            self.library_dirs
                .iter()
                .map(|d| format!("-L{}", d.display())),
        );
        args.extend(self.libraries.iter().map(|l| format!("-l{}", l)));

        args
    }
}
