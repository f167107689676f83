// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apple installer packages built without Apple tooling.
//!
//! Apple flat packages - often existing as `.pkg` files - are XAR archives
//! holding a `Distribution` XML file, a `Resources/` directory and one or
//! more *component* directories. This crate produces *product* packages
//! with a single component named `base.pkg`:
//!
//! `Distribution`
//!    Describes the installer UI and choices. See [Distribution].
//! `Resources/en.lproj/`
//!    Background image and welcome, readme and license documents.
//! `base.pkg/PackageInfo`
//!    Describes the component. See [PackageInfo].
//! `base.pkg/Payload`
//!    A gzipped `odc` cpio archive of the files to install.
//! `base.pkg/Scripts`
//!    A gzipped `odc` cpio archive of pre- and post-install scripts.
//! `base.pkg/Bom`
//!    The *bill of materials* of the payload, written by `mkbom`.
//!
//! [PkgBuilder] drives `cpio`, `gzip`, `mkbom` and `xar` to assemble these.
//! The [dmg] module wraps files into a disk image with `genisoimage` or
//! `mkfs.hfsplus`.

pub mod builder;
pub use builder::{PkgBuildConfig, PkgBuilder};
pub mod distribution;
pub use distribution::Distribution;
pub mod dmg;
pub use dmg::{build_dmg, DmgConfig, DmgMethod};
pub mod macos;
pub mod package_info;
pub use package_info::PackageInfo;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error writing {0}: {1}")]
    XmlWrite(String, std::io::Error),

    #[error("DMG payload is not provided")]
    EmptyDmgPayload,

    #[error("source directory {0} does not exist")]
    MissingSource(String),

    #[error("required setting {0} is empty")]
    MissingSetting(&'static str),

    #[error("refusing to use {0} as build directory")]
    UnsafeBuildDir(String),

    #[error("{0:#}")]
    Filesystem(anyhow::Error),

    #[error("{0:#}")]
    Command(anyhow::Error),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::Filesystem(e)
    }
}

/// Result type for this crate.
pub type PkgResult<T> = std::result::Result<T, Error>;
