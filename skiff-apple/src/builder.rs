// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assembly of flat packages.

use {
    crate::{
        dmg::{build_dmg, DmgConfig},
        Distribution, Error, PackageInfo, PkgResult,
    },
    duct::{cmd, Expression},
    log::{info, warn},
    serde::{Deserialize, Serialize},
    skiff_common::fs::{
        copy_into, copy_tree, normalize_path, rmtree, set_executable, tree_size, TreeSize,
    },
    std::{
        ffi::OsString,
        io::{BufWriter, Write},
        path::{Path, PathBuf},
    },
};

/// Describes a flat package.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PkgBuildConfig {
    /// Directory whose content is installed.
    pub src_dir: PathBuf,
    /// Scratch directory. The package is written into it.
    pub build_dir: PathBuf,
    /// Reverse DNS identifier, e.g. `com.example.App`.
    pub identifier: String,
    /// Pretty application name shown by the installer.
    pub app_name: String,
    pub app_ver: String,
    /// File name of the produced package.
    pub pkg_name: String,
    /// Remove intermediate files once the package is written.
    pub remove_build: bool,
    pub preinstall: Option<PathBuf>,
    pub postinstall: Option<PathBuf>,
    /// Minimum macOS version, e.g. `10.11`.
    pub check_version: Option<String>,
    pub background: Option<PathBuf>,
    pub readme: Option<PathBuf>,
    pub welcome: Option<PathBuf>,
    pub license: Option<PathBuf>,
    /// Wrap files into a disk image once the package is written.
    pub dmg: Option<DmgConfig>,
}

impl PkgBuildConfig {
    /// Ensure required settings are present.
    pub fn validate(&self) -> PkgResult<()> {
        for (name, empty) in [
            ("src_dir", self.src_dir.as_os_str().is_empty()),
            ("build_dir", self.build_dir.as_os_str().is_empty()),
            ("identifier", self.identifier.is_empty()),
            ("app_name", self.app_name.is_empty()),
            ("app_ver", self.app_ver.is_empty()),
            ("pkg_name", self.pkg_name.is_empty()),
        ] {
            if empty {
                return Err(Error::MissingSetting(name));
            }
        }

        Ok(())
    }
}

/// `find . | cpio -o --format odc --owner 0:80 | gzip -c > dest`, run in `dir`.
fn cpio_gzip(dir: &Path, dest: &Path) -> Expression {
    cmd("find", &["."])
        .pipe(cmd("cpio", &["-o", "--format", "odc", "--owner", "0:80"]))
        .pipe(cmd("gzip", &["-c"]))
        .dir(dir)
        .stdout_path(dest)
}

/// `mkbom` arguments recording the tree at `root` as owned by `root:admin`.
fn mkbom_args(root: &Path, bom: &Path) -> Vec<OsString> {
    vec![
        "-u".into(),
        "0".into(),
        "-g".into(),
        "80".into(),
        root.as_os_str().to_owned(),
        bom.as_os_str().to_owned(),
    ]
}

/// Entity used to build a flat package with `cpio`, `mkbom` and `xar`.
#[derive(Clone, Debug)]
pub struct PkgBuilder {
    config: PkgBuildConfig,
    build_dir: PathBuf,
}

impl PkgBuilder {
    /// Create a new builder, validating settings and resolving the build directory.
    pub fn new(config: PkgBuildConfig) -> PkgResult<Self> {
        config.validate()?;

        let build_dir = normalize_path(&config.build_dir)?;
        let cwd = std::env::current_dir()?;
        if cwd.starts_with(&build_dir) {
            return Err(Error::UnsafeBuildDir(build_dir.display().to_string()));
        }

        Ok(Self { config, build_dir })
    }

    /// Obtain the package description of this instance.
    pub fn config(&self) -> &PkgBuildConfig {
        &self.config
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Directory archived by `xar`.
    pub fn flat_dir(&self) -> PathBuf {
        self.build_dir.join("flat")
    }

    /// Directory of the component.
    pub fn pkg_dir(&self) -> PathBuf {
        self.flat_dir().join("base.pkg")
    }

    /// Directory of installer resources.
    pub fn resources_dir(&self) -> PathBuf {
        self.flat_dir().join("Resources").join("en.lproj")
    }

    fn root_dir(&self) -> PathBuf {
        self.build_dir.join("root")
    }

    fn scripts_dir(&self) -> PathBuf {
        self.build_dir.join("scripts")
    }

    /// Path of the produced package.
    pub fn pkg_path(&self) -> PathBuf {
        self.build_dir.join(&self.config.pkg_name)
    }

    /// Identifier of the `base.pkg` component.
    pub fn component_identifier(&self) -> String {
        format!("{}.base.pkg", self.config.identifier)
    }

    /// Remove the build directory.
    pub fn clear_build(&self) -> PkgResult<()> {
        if self.build_dir.exists() {
            warn!("removing {}", self.build_dir.display());
            rmtree(&self.build_dir)?;
        }

        Ok(())
    }

    /// Create the empty directory layout of the flat package.
    pub fn create_layout(&self) -> PkgResult<()> {
        std::fs::create_dir_all(self.resources_dir())?;
        std::fs::create_dir_all(self.pkg_dir())?;

        Ok(())
    }

    /// Copy the source directory into the payload root and archive it into `Payload`.
    ///
    /// Returns the size of the payload root.
    pub fn create_payload(&self) -> PkgResult<TreeSize> {
        info!("creating payload");

        let src_dir = normalize_path(&self.config.src_dir)?;
        if !src_dir.is_dir() {
            return Err(Error::MissingSource(src_dir.display().to_string()));
        }

        let root_dir = self.root_dir();
        copy_tree(&src_dir, &root_dir)?;

        skiff_common::process::run(cpio_gzip(&root_dir, &self.pkg_dir().join("Payload")), "cpio")
            .map_err(Error::Command)?;

        let size = tree_size(&root_dir)?;
        info!(
            "payload holds {} files ({} KiB)",
            size.files,
            size.kibibytes()
        );

        Ok(size)
    }

    /// Archive the install scripts into `Scripts`.
    ///
    /// Returns the file names of the pre- and post-install scripts.
    pub fn create_scripts(&self) -> PkgResult<(Option<String>, Option<String>)> {
        let scripts_dir = self.scripts_dir();
        let mut names = (None, None);

        for (source, name) in [
            (&self.config.preinstall, &mut names.0),
            (&self.config.postinstall, &mut names.1),
        ] {
            if let Some(source) = source {
                info!("adding script {}", source.display());
                let dest = copy_into(normalize_path(source)?, &scripts_dir)?;
                set_executable(&dest)?;
                *name = dest
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string());
            }
        }

        if names.0.is_some() || names.1.is_some() {
            skiff_common::process::run(
                cpio_gzip(&scripts_dir, &self.pkg_dir().join("Scripts")),
                "cpio",
            )
            .map_err(Error::Command)?;
        }

        rmtree(&scripts_dir)?;

        Ok(names)
    }

    /// Write `base.pkg/PackageInfo`, archiving install scripts on the way.
    pub fn create_package_info(&self, payload: TreeSize) -> PkgResult<PackageInfo> {
        info!("creating package info");

        let (preinstall, postinstall) = self.create_scripts()?;

        let info = PackageInfo {
            identifier: self.component_identifier(),
            version: self.config.app_ver.clone(),
            install_kbytes: payload.kibibytes(),
            number_of_files: payload.files,
            preinstall,
            postinstall,
        };

        let path = self.pkg_dir().join("PackageInfo");
        write_document(&path, |w| info.write(w))?;

        Ok(info)
    }

    /// Write `base.pkg/Bom` from the payload root, then remove the root.
    pub fn create_bom(&self) -> PkgResult<()> {
        info!("creating Bom");

        let root_dir = self.root_dir();
        let bom = self.pkg_dir().join("Bom");

        skiff_common::process::run(cmd("mkbom", mkbom_args(&root_dir, &bom)), "mkbom")
            .map_err(Error::Command)?;

        rmtree(&root_dir)?;

        Ok(())
    }

    /// Copy a resource into `Resources/en.lproj`, returning its file name.
    fn add_resource(&self, source: &Option<PathBuf>) -> PkgResult<Option<String>> {
        match source {
            Some(source) => {
                let dest = copy_into(normalize_path(source)?, self.resources_dir())?;
                Ok(dest.file_name().map(|n| n.to_string_lossy().to_string()))
            }
            None => Ok(None),
        }
    }

    /// Write the `Distribution` file and copy installer resources.
    pub fn create_distribution(&self, payload: TreeSize) -> PkgResult<Distribution> {
        info!("creating Distribution");

        let distribution = Distribution {
            title: self.config.app_name.clone(),
            pkg_ref_id: self.component_identifier(),
            version: self.config.app_ver.clone(),
            install_kbytes: payload.kibibytes(),
            check_version: self.config.check_version.clone(),
            background: self.add_resource(&self.config.background)?,
            welcome: self.add_resource(&self.config.welcome)?,
            readme: self.add_resource(&self.config.readme)?,
            license: self.add_resource(&self.config.license)?,
        };

        let path = self.flat_dir().join("Distribution");
        write_document(&path, |w| distribution.write(w))?;

        Ok(distribution)
    }

    /// Arguments to `xar`, run in the flat directory.
    ///
    /// The package path is absolute. Entries of the flat directory follow
    /// in name order.
    pub fn xar_args(&self) -> PkgResult<Vec<OsString>> {
        let mut entries = std::fs::read_dir(self.flat_dir())?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        let mut args: Vec<OsString> = vec![
            "--compression".into(),
            "none".into(),
            "-cf".into(),
            self.pkg_path().into_os_string(),
        ];
        args.extend(entries);

        Ok(args)
    }

    /// Archive the flat directory into the package with `xar`.
    pub fn make_pkg(&self) -> PkgResult<PathBuf> {
        let pkg_path = self.pkg_path();
        info!("creating package {}", pkg_path.display());

        skiff_common::process::run(cmd("xar", self.xar_args()?).dir(self.flat_dir()), "xar")
            .map_err(Error::Command)?;

        Ok(pkg_path)
    }

    /// Build the disk image, if one is configured.
    pub fn make_dmg(&self) -> PkgResult<Option<PathBuf>> {
        match &self.config.dmg {
            Some(dmg) => Ok(Some(build_dmg(dmg)?)),
            None => Ok(None),
        }
    }

    /// Run the full build chain.
    ///
    /// Returns the path to the package.
    pub fn build(&self) -> PkgResult<PathBuf> {
        self.clear_build()?;
        self.create_layout()?;

        let payload = self.create_payload()?;
        self.create_package_info(payload)?;
        self.create_bom()?;
        self.create_distribution(payload)?;
        let pkg_path = self.make_pkg()?;

        if let Some(dmg) = self.make_dmg()? {
            info!("created {}", dmg.display());
        }

        if self.config.remove_build {
            warn!("removing {}", self.flat_dir().display());
            rmtree(self.flat_dir())?;
        }

        info!("created {}", pkg_path.display());

        Ok(pkg_path)
    }
}

fn write_document(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<std::fs::File>) -> std::io::Result<()>,
) -> PkgResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    write(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| Error::XmlWrite(path.display().to_string(), e))
}
