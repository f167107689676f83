// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use {simple_file_manifest::FileManifestError, thiserror::Error};

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum DebianError {
    #[error("file manifest error: {0}")]
    FileManifest(#[from] FileManifestError),

    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("path error: {0:?}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    #[error("unknown control field: {0}")]
    UnknownControlField(String),

    #[error("project build not found at {0}; build the project first")]
    MissingBuild(String),

    #[error("package data references package without a directory: {0}")]
    UnknownPackageDir(String),

    #[error("{0:#}")]
    Filesystem(anyhow::Error),

    #[error("{0:#}")]
    Command(anyhow::Error),
}

impl From<anyhow::Error> for DebianError {
    fn from(e: anyhow::Error) -> Self {
        Self::Filesystem(e)
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, DebianError>;
