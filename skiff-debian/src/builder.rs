// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Building `.deb` files from a project build tree.

A [DebBuilder] stages a project build, scripts and data files into a
directory mirroring the installed filesystem, writes `DEBIAN/control`
and hands the directory to `dpkg --build`.
*/

use {
    crate::{
        control::ControlParagraph,
        error::{DebianError, Result},
    },
    duct::cmd,
    log::{error, info, warn},
    serde::{Deserialize, Serialize},
    simple_file_manifest::{FileEntry, FileManifest},
    skiff_common::fs::{
        get_all_files, get_filepaths, rmtree, set_mode_recursive, tree_size, DataFiles,
    },
    std::{
        collections::BTreeMap,
        ffi::{OsStr, OsString},
        path::{Path, PathBuf},
    },
};

/// Package data entry matching every file of its directory.
pub const ALL_FILES_WILDCARD: &str = "*.*";

const BANNER: &str = "==============================";

/// Debian architecture name of the machine we're running on.
pub fn host_architecture() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "i386",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "powerpc64" => "ppc64el",
        other => other,
    }
}

/// Describes a binary package and where its content comes from.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DebConfig {
    /// Project name. The package is named `python3-<name>` unless `package` is set.
    pub name: String,
    pub version: String,
    /// Debian architecture. Detected from the host when unset.
    pub arch: Option<String>,
    /// e.g. `John Smith <js@example.com>`.
    pub maintainer: String,
    /// Comma separated dependency list.
    pub depends: String,
    pub section: String,
    pub priority: String,
    pub homepage: String,
    /// Synopsis line.
    pub description: String,
    /// Extended description, one paragraph per blank line separated block.
    pub long_description: String,
    /// Overrides the package name.
    pub package: Option<String>,
    /// Project build output to install.
    pub source_dir: PathBuf,
    /// Absolute installation directory of the build output.
    pub install_dir: String,
    /// Staging root.
    pub build_dir: PathBuf,
    /// Where the `.deb` is written.
    pub dist_dir: PathBuf,
    /// Executables installed into `/usr/bin`.
    pub scripts: Vec<PathBuf>,
    /// Maintainer scripts (`postinst`, `prerm`, ...) installed into `DEBIAN/`.
    pub deb_scripts: Vec<PathBuf>,
    pub data_files: Vec<DataFiles>,
    /// Source directory of each package named in `package_data`.
    pub package_dirs: BTreeMap<String, PathBuf>,
    /// Non-code files per package, relative to its directory.
    pub package_data: BTreeMap<String, Vec<String>>,
    /// Run `dpkg` through `sudo`.
    pub sudo: bool,
}

impl Default for DebConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            arch: None,
            maintainer: String::new(),
            depends: String::new(),
            section: "python".to_string(),
            priority: "optional".to_string(),
            homepage: String::new(),
            description: String::new(),
            long_description: String::new(),
            package: None,
            source_dir: PathBuf::from("build/lib"),
            install_dir: "/usr/lib/python3/dist-packages".to_string(),
            build_dir: PathBuf::from("build/deb-root"),
            dist_dir: PathBuf::from("dist"),
            scripts: vec![],
            deb_scripts: vec![],
            data_files: vec![],
            package_dirs: BTreeMap::new(),
            package_data: BTreeMap::new(),
            sudo: false,
        }
    }
}

/// Entity used to build a `.deb` by calling into `dpkg`.
#[derive(Clone, Debug)]
pub struct DebBuilder {
    config: DebConfig,
    package: String,
    arch: String,
}

impl DebBuilder {
    /// Create a new builder from a package description.
    pub fn new(config: DebConfig) -> Self {
        let package = config
            .package
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| format!("python3-{}", config.name));
        let arch = config
            .arch
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| host_architecture().to_string());

        Self {
            config,
            package,
            arch,
        }
    }

    /// Obtain the package description of this instance.
    pub fn config(&self) -> &DebConfig {
        &self.config
    }

    /// The name of the binary package.
    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// The resolved Debian architecture.
    pub fn architecture(&self) -> &str {
        &self.arch
    }

    /// File name of the `.deb` being produced.
    pub fn deb_filename(&self) -> String {
        format!("{}-{}_{}.deb", self.package, self.config.version, self.arch)
    }

    /// Path of the `.deb` being produced.
    pub fn deb_path(&self) -> PathBuf {
        self.config.dist_dir.join(self.deb_filename())
    }

    fn install_prefix(&self) -> PathBuf {
        PathBuf::from(self.config.install_dir.trim_start_matches('/'))
    }

    /// Resolve the files to install, keyed by path relative to the staging root.
    ///
    /// The whole build tree is installed, hidden entries included. Package
    /// data wildcards only match visible files.
    pub fn install_manifest(&self) -> Result<FileManifest> {
        let mut manifest = FileManifest::default();
        let prefix = self.install_prefix();
        let source_dir = &self.config.source_dir;

        for path in get_all_files(source_dir)? {
            let rel_path = path.strip_prefix(source_dir)?;
            manifest.add_file_entry(prefix.join(rel_path), FileEntry::try_from(path.as_path())?)?;
        }

        for script in &self.config.scripts {
            manifest.add_file_entry(
                Path::new("usr/bin").join(file_name(script)?),
                FileEntry::new_from_path(script, true),
            )?;
        }

        for script in &self.config.deb_scripts {
            manifest.add_file_entry(
                Path::new("DEBIAN").join(file_name(script)?),
                FileEntry::new_from_path(script, true),
            )?;
        }

        for data in &self.config.data_files {
            let dest = data.relative_dest();

            for file in &data.files {
                manifest.add_file_entry(
                    dest.join(file_name(file)?),
                    FileEntry::try_from(file.as_path())?,
                )?;
            }
        }

        for (package, items) in &self.config.package_data {
            let package_dir = self
                .config
                .package_dirs
                .get(package)
                .ok_or_else(|| DebianError::UnknownPackageDir(package.clone()))?;
            let dest_dir = prefix.join(package.replace('.', "/"));

            for item in items {
                let item_path = Path::new(item);
                let rel_dir = item_path.parent().unwrap_or_else(|| Path::new(""));

                let sources = if item_path.file_name() == Some(OsStr::new(ALL_FILES_WILDCARD)) {
                    get_filepaths(package_dir.join(rel_dir), None)?
                } else {
                    let path = package_dir.join(item_path);
                    if path.is_file() {
                        vec![path]
                    } else {
                        warn!("package data {} not found; ignoring", path.display());
                        vec![]
                    }
                };

                for source in sources {
                    manifest.add_file_entry(
                        dest_dir.join(rel_dir).join(file_name(&source)?),
                        FileEntry::try_from(source.as_path())?,
                    )?;
                }
            }
        }

        Ok(manifest)
    }

    /// Obtain the control paragraph describing this package.
    ///
    /// Empty fields are omitted.
    pub fn control_paragraph(&self, installed_size: u64) -> Result<ControlParagraph<'_>> {
        let config = &self.config;
        let mut p = ControlParagraph::default();

        p.add_nonempty_field("Package", self.package.as_str())?;
        p.add_nonempty_field("Version", config.version.as_str())?;
        p.add_nonempty_field("Architecture", self.arch.as_str())?;
        p.add_nonempty_field("Maintainer", config.maintainer.as_str())?;
        p.add_nonempty_field("Installed-Size", installed_size.to_string())?;
        p.add_nonempty_field("Depends", config.depends.as_str())?;
        p.add_nonempty_field("Section", config.section.as_str())?;
        p.add_nonempty_field("Priority", config.priority.as_str())?;
        p.add_nonempty_field("Homepage", config.homepage.as_str())?;

        if config.description.trim().is_empty() {
            if !config.long_description.trim().is_empty() {
                warn!("long description without a synopsis is not written to the control file");
            }
        } else if config.long_description.trim().is_empty() {
            p.add_nonempty_field("Description", config.description.as_str())?;
        } else {
            p.add_nonempty_field(
                "Description",
                format!("{}\n{}", config.description, config.long_description.trim_end()),
            )?;
        }

        Ok(p)
    }

    /// Remove the staging root and previously built `.deb` files.
    pub fn clear_build(&self) -> Result<()> {
        let build_dir = &self.config.build_dir;
        let dist_dir = &self.config.dist_dir;

        if build_dir.exists() {
            warn!("removing {}", build_dir.display());
            rmtree(build_dir)?;
        }

        if dist_dir.is_dir() {
            for old in get_filepaths(dist_dir, Some("deb"))? {
                warn!("removing {}", old.display());
                std::fs::remove_file(&old)?;
            }
        } else {
            std::fs::create_dir_all(dist_dir)?;
        }

        Ok(())
    }

    /// Populate the staging root and write `DEBIAN/control`.
    ///
    /// Returns the installed size in KiB.
    pub fn stage(&self) -> Result<u64> {
        let source_dir = &self.config.source_dir;
        if !source_dir.is_dir() {
            return Err(DebianError::MissingBuild(source_dir.display().to_string()));
        }

        self.clear_build()?;

        let build_dir = &self.config.build_dir;
        std::fs::create_dir_all(build_dir.join(self.install_prefix()))?;

        let manifest = self.install_manifest()?;
        info!(
            "staging {} files into {}",
            manifest.iter_entries().count(),
            build_dir.display()
        );
        manifest.materialize_files(build_dir)?;

        let installed_size = tree_size(build_dir)?.kibibytes();
        self.write_control(installed_size)?;

        Ok(installed_size)
    }

    /// Write `DEBIAN/control` into the staging root.
    pub fn write_control(&self, installed_size: u64) -> Result<()> {
        let debian_dir = self.config.build_dir.join("DEBIAN");
        std::fs::create_dir_all(&debian_dir)?;

        info!("writing Debian control file");
        let mut fh = std::fs::File::create(debian_dir.join("control"))?;
        self.control_paragraph(installed_size)?.write(&mut fh)?;

        Ok(())
    }

    /// Program and arguments building the `.deb` from the staged root.
    pub fn dpkg_command(&self) -> (&'static str, Vec<OsString>) {
        let mut args: Vec<OsString> = vec![
            "--build".into(),
            self.config.build_dir.as_os_str().to_owned(),
            self.deb_path().into_os_string(),
        ];

        if self.config.sudo {
            args.insert(0, "dpkg".into());
            ("sudo", args)
        } else {
            ("dpkg", args)
        }
    }

    /// Run `dpkg --build` over the staged root.
    pub fn make_package(&self) -> Result<PathBuf> {
        let deb_path = self.deb_path();

        set_mode_recursive(&self.config.build_dir, 0o755)?;

        let (program, args) = self.dpkg_command();

        info!("building {}", self.deb_filename());
        skiff_common::process::run(cmd(program, args), "dpkg").map_err(DebianError::Command)?;

        Ok(deb_path)
    }

    /// Stage the package and build the `.deb`.
    pub fn build(&self) -> Result<PathBuf> {
        info!("{}", BANNER);
        info!("DEB PACKAGE BUILD");
        info!("{}", BANNER);

        let res = self.stage().and_then(|_| self.make_package());

        match &res {
            Ok(path) => {
                info!("{}", BANNER);
                info!("BUILD SUCCESSFUL: {}", path.display());
                info!("{}", BANNER);
            }
            Err(e) => {
                error!("{}", e);
                warn!("{}", BANNER);
                warn!("BUILD FAILED!");
                warn!("{}", BANNER);
            }
        }

        res
    }
}

fn file_name(path: &Path) -> Result<&OsStr> {
    path.file_name().ok_or_else(|| {
        DebianError::Filesystem(anyhow::anyhow!(
            "unable to resolve file name from path {}",
            path.display()
        ))
    })
}
