// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Querying `pkg-config`.

use {
    anyhow::{Context, Result},
    duct::cmd,
    log::debug,
    std::path::PathBuf,
};

/// Environment variable overriding the `pkg-config` executable.
pub const PKG_CONFIG_ENV: &str = "PKG_CONFIG";

/// Split `pkg-config` output into flags.
///
/// `prefix` is stripped from each flag. Empty flags are dropped.
pub fn parse_flags(output: &str, prefix: Option<&str>) -> Vec<String> {
    output
        .split_whitespace()
        .map(|flag| match prefix {
            Some(prefix) => flag.strip_prefix(prefix).unwrap_or(flag),
            None => flag,
        })
        .filter(|flag| !flag.is_empty())
        .map(|flag| flag.to_string())
        .collect()
}

/// Append items not yet present, preserving first-seen order.
pub fn extend_unique(dest: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !dest.contains(&item) {
            dest.push(item);
        }
    }
}

/// A `pkg-config` executable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PkgConfig {
    program: PathBuf,
}

impl Default for PkgConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PkgConfig {
    /// Use a specific executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use the executable named by `PKG_CONFIG`, falling back to `pkg-config`.
    pub fn from_env() -> Self {
        match std::env::var_os(PKG_CONFIG_ENV) {
            Some(program) if !program.is_empty() => Self::new(program),
            _ => Self::new("pkg-config"),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn query(&self, flag: &str, package: &str) -> Result<String> {
        debug!("{} {} {}", self.program.display(), flag, package);

        cmd(&self.program, &[flag, package])
            .stderr_capture()
            .read()
            .with_context(|| format!("querying pkg-config {} {}", flag, package))
    }

    fn query_all(
        &self,
        flag: &str,
        packages: &[impl AsRef<str>],
        prefix: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut res = vec![];

        for package in packages {
            let output = self.query(flag, package.as_ref())?;
            extend_unique(&mut res, parse_flags(&output, prefix));
        }

        Ok(res)
    }

    /// Version of a package.
    pub fn version(&self, package: &str) -> Result<String> {
        Ok(self.query("--modversion", package)?.trim().to_string())
    }

    /// Major component of a package's version.
    pub fn major_version(&self, package: &str) -> Result<String> {
        let version = self.version(package)?;

        Ok(version
            .split('.')
            .next()
            .unwrap_or(&version)
            .to_string())
    }

    /// Include directories of packages, without `-I`.
    pub fn includes(&self, packages: &[impl AsRef<str>]) -> Result<Vec<String>> {
        self.query_all("--cflags-only-I", packages, Some("-I"))
    }

    /// Libraries to link for packages, without `-l`.
    pub fn libs(&self, packages: &[impl AsRef<str>]) -> Result<Vec<String>> {
        self.query_all("--libs-only-l", packages, Some("-l"))
    }

    /// Compiler flags of packages other than include directories.
    pub fn cflags(&self, packages: &[impl AsRef<str>]) -> Result<Vec<String>> {
        self.query_all("--cflags-only-other", packages, None)
    }
}
