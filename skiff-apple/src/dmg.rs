// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk images (`.dmg`).
//!
//! Two methods are available. [DmgMethod::Genisoimage] writes a hybrid
//! ISO 9660/HFS image with `genisoimage`, which macOS mounts and blesses.
//! [DmgMethod::Hfsplus] formats an HFS+ filesystem with `mkfs.hfsplus` and
//! fills it through a loop mount. It needs root and produces an unblessed
//! volume.

use {
    crate::{Error, PkgResult},
    duct::cmd,
    log::{info, warn},
    serde::{Deserialize, Serialize},
    skiff_common::fs::{copy_into, normalize_path, tree_size},
    std::{
        ffi::OsString,
        path::{Path, PathBuf},
    },
};

/// How the image is produced.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DmgMethod {
    #[default]
    Genisoimage,
    Hfsplus,
}

/// Describes a disk image.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DmgConfig {
    /// Files and directories placed at the root of the volume.
    pub targets: Vec<PathBuf>,
    pub dmg_filename: String,
    /// Name of the mounted volume.
    pub volume_name: String,
    /// Where the image is written.
    pub dist_dir: PathBuf,
    pub method: DmgMethod,
}

impl Default for DmgConfig {
    fn default() -> Self {
        Self {
            targets: vec![],
            dmg_filename: "test.dmg".to_string(),
            volume_name: "Install".to_string(),
            dist_dir: PathBuf::from("."),
            method: DmgMethod::default(),
        }
    }
}

impl DmgConfig {
    /// Path of the produced image.
    pub fn dmg_path(&self) -> PathBuf {
        self.dist_dir.join(&self.dmg_filename)
    }
}

/// Size in MB of an HFS+ image holding `bytes` of content.
///
/// Never less than 1.
pub fn hfsplus_image_size_mb(bytes: u64) -> u64 {
    ((bytes + 999_999) / 1_000_000).max(1)
}

/// Build a disk image, returning its path.
pub fn build_dmg(config: &DmgConfig) -> PkgResult<PathBuf> {
    if config.targets.is_empty() {
        return Err(Error::EmptyDmgPayload);
    }

    let targets = config
        .targets
        .iter()
        .map(normalize_path)
        .collect::<anyhow::Result<Vec<_>>>()?;

    std::fs::create_dir_all(&config.dist_dir)?;
    let dmg_path = normalize_path(config.dmg_path())?;

    info!("creating {}", dmg_path.display());

    match config.method {
        DmgMethod::Genisoimage => genisoimage(&targets, &config.volume_name, &dmg_path)?,
        DmgMethod::Hfsplus => hfsplus(&targets, &config.volume_name, &dmg_path)?,
    }

    Ok(dmg_path)
}

fn copy_targets(targets: &[PathBuf], dest: &Path) -> PkgResult<()> {
    for target in targets {
        copy_into(target, dest)?;
    }

    Ok(())
}

fn genisoimage(targets: &[PathBuf], volume_name: &str, dmg_path: &Path) -> PkgResult<()> {
    let staging = tempfile::Builder::new().prefix("skiff-dmg").tempdir()?;
    copy_targets(targets, staging.path())?;

    let args: Vec<OsString> = vec![
        "-V".into(),
        volume_name.into(),
        "-D".into(),
        "-R".into(),
        "-apple".into(),
        "-no-pad".into(),
        "-o".into(),
        dmg_path.into(),
        staging.path().into(),
    ];

    skiff_common::process::run(cmd("genisoimage", args), "genisoimage").map_err(Error::Command)
}

fn hfsplus(targets: &[PathBuf], volume_name: &str, dmg_path: &Path) -> PkgResult<()> {
    let mut bytes = 0;
    for target in targets {
        bytes += tree_size(target)?.bytes;
    }
    let size_mb = hfsplus_image_size_mb(bytes);

    let scratch = tempfile::Builder::new().prefix("skiff-dmg").tempdir()?;
    let image = scratch.path().join("image.dmg");
    let mount_point = scratch.path().join("mnt");
    std::fs::create_dir_all(&mount_point)?;

    info!("allocating {} MB image", size_mb);
    std::fs::File::create(&image)?.set_len(size_mb * 1024 * 1024)?;

    skiff_common::process::run(
        cmd("mkfs.hfsplus", vec![OsString::from("-v"), volume_name.into(), image.clone().into()]),
        "mkfs.hfsplus",
    )
    .map_err(Error::Command)?;

    skiff_common::process::run(
        cmd(
            "mount",
            vec![
                OsString::from("-o"),
                "loop".into(),
                image.clone().into(),
                mount_point.clone().into(),
            ],
        ),
        "mount",
    )
    .map_err(Error::Command)?;

    let copied = copy_targets(targets, &mount_point);

    skiff_common::process::run(cmd("umount", vec![mount_point.into_os_string()]), "umount")
        .map_err(Error::Command)?;
    copied?;

    if std::fs::rename(&image, dmg_path).is_err() {
        warn!("moving image across filesystems");
        std::fs::copy(&image, dmg_path)?;
    }

    Ok(())
}
