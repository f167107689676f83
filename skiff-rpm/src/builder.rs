// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::spec::SpecFile,
    anyhow::{anyhow, Context, Result},
    duct::cmd,
    log::{info, warn},
    serde::{Deserialize, Serialize},
    skiff_common::fs::{
        copy_into, get_filepaths, get_files_tree, normalize_path, rmtree, DataFiles,
    },
    std::path::{Path, PathBuf},
};

/// Directories of an `rpmbuild` tree.
pub const RPMBUILD_DIRS: [&str; 6] = ["BUILD", "BUILDROOT", "SOURCES", "SPECS", "RPMS", "SRPMS"];

/// Describes an RPM built from a project's source tarball.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RpmConfig {
    /// Project name. The package is named `python3-<name>`.
    pub name: String,
    pub version: String,
    /// Package release. Blank values mean `0`.
    pub release: String,
    /// Target architecture passed to `rpmbuild --target`.
    pub arch: Option<String>,
    /// Written as the `Packager` tag when set.
    pub maintainer: String,
    pub summary: String,
    pub description: String,
    pub license: String,
    pub url: String,
    /// One `Requires` tag per entry.
    pub depends: Vec<String>,
    /// Build script run by the spec's `%build` and `%install` stages.
    pub build_script: String,
    /// Installed executables. Only their base names are used.
    pub scripts: Vec<String>,
    /// Installed module directory, listed in `%files`.
    pub install_path: String,
    /// Data files. Only those below `/usr/share/` are listed in `%files`.
    pub data_files: Vec<DataFiles>,
    /// Directory holding the source tarball; receives the built RPMs.
    pub dist_dir: PathBuf,
    /// Root of the `rpmbuild` tree. Recreated on every build.
    pub topdir: PathBuf,
}

impl Default for RpmConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            release: "0".to_string(),
            arch: None,
            maintainer: String::new(),
            summary: String::new(),
            description: String::new(),
            license: String::new(),
            url: String::new(),
            depends: vec![],
            build_script: "setup.py".to_string(),
            scripts: vec![],
            install_path: String::new(),
            data_files: vec![],
            dist_dir: PathBuf::from("dist"),
            topdir: PathBuf::from("~/rpmbuild"),
        }
    }
}

impl RpmConfig {
    /// Release written into the spec file.
    pub fn release(&self) -> &str {
        let release = self.release.trim();

        if release.is_empty() {
            "0"
        } else {
            release
        }
    }
}

/// Entity used to build RPMs by calling into `rpmbuild`.
#[derive(Clone, Debug)]
pub struct RpmBuilder {
    config: RpmConfig,
    topdir: PathBuf,
    dist_dir: PathBuf,
}

impl RpmBuilder {
    /// Create a new builder, resolving its directories to absolute paths.
    pub fn new(config: RpmConfig) -> Result<Self> {
        let topdir = normalize_path(&config.topdir)?;
        let dist_dir = normalize_path(&config.dist_dir)?;

        Ok(Self {
            config,
            topdir,
            dist_dir,
        })
    }

    /// Obtain the package description of this instance.
    pub fn config(&self) -> &RpmConfig {
        &self.config
    }

    /// Absolute root of the `rpmbuild` tree.
    pub fn topdir(&self) -> &Path {
        &self.topdir
    }

    /// Path of the `.spec` file written into the tree.
    pub fn spec_path(&self) -> PathBuf {
        self.topdir
            .join("SPECS")
            .join(format!("python3-{}.spec", self.config.name))
    }

    /// Remove the `rpmbuild` tree.
    pub fn clear_topdir(&self) -> Result<()> {
        if self.topdir.exists() {
            warn!("removing {}", self.topdir.display());
            rmtree(&self.topdir)?;
        }

        Ok(())
    }

    /// Create an empty `rpmbuild` tree.
    pub fn create_topdir(&self) -> Result<()> {
        for dir in RPMBUILD_DIRS {
            let path = self.topdir.join(dir);
            std::fs::create_dir_all(&path)
                .with_context(|| format!("creating {}", path.display()))?;
        }

        Ok(())
    }

    /// Locate the source tarball in the dist directory.
    ///
    /// The first `*.tar.gz` in name order wins.
    pub fn find_tarball(&self) -> Result<PathBuf> {
        if !self.dist_dir.is_dir() {
            return Err(anyhow!(
                "source directory {} does not exist",
                self.dist_dir.display()
            ));
        }

        get_filepaths(&self.dist_dir, Some("gz"))?
            .into_iter()
            .find(|p| p.to_string_lossy().ends_with(".tar.gz"))
            .ok_or_else(|| anyhow!("no source tarball in {}", self.dist_dir.display()))
    }

    /// Write the `.spec` file referencing the tarball at `source`.
    pub fn write_spec(&self, source: &Path) -> Result<PathBuf> {
        let path = self.spec_path();
        let spec = SpecFile::new(&self.config, source);

        std::fs::write(&path, spec.to_string())
            .with_context(|| format!("writing {}", path.display()))?;

        Ok(path)
    }

    /// Lay out the `rpmbuild` tree with sources and spec file.
    ///
    /// Returns the path to the spec file.
    pub fn prepare(&self) -> Result<PathBuf> {
        self.clear_topdir()?;
        self.create_topdir()?;

        let tarball = self.find_tarball()?;
        info!("using source tarball {}", tarball.display());
        let source = copy_into(&tarball, self.topdir.join("SOURCES"))?;

        self.write_spec(&source)
    }

    /// Arguments to `rpmbuild` building binary packages from a spec file.
    pub fn rpmbuild_args(&self, spec_path: &Path) -> Vec<String> {
        let mut args = vec![
            "-bb".to_string(),
            spec_path.display().to_string(),
            "--define".to_string(),
            format!("_topdir {}", self.topdir.display()),
        ];

        if let Some(arch) = self.config.arch.as_ref().filter(|a| !a.is_empty()) {
            args.push("--target".to_string());
            args.push(arch.clone());
        }

        args
    }

    /// Run `rpmbuild -bb` over the spec file.
    pub fn run_rpmbuild(&self, spec_path: &Path) -> Result<()> {
        skiff_common::process::run(
            cmd("rpmbuild", self.rpmbuild_args(spec_path)).dir(self.topdir.join("SPECS")),
            "rpmbuild",
        )
    }

    /// Copy every `.rpm` in the tree into the dist directory.
    pub fn collect_rpms(&self) -> Result<Vec<PathBuf>> {
        let mut res = vec![];

        for rpm in get_files_tree(&self.topdir, Some("rpm"))? {
            res.push(copy_into(&rpm, &self.dist_dir)?);
        }

        Ok(res)
    }

    /// Build the RPMs, returning their paths in the dist directory.
    pub fn build(&self) -> Result<Vec<PathBuf>> {
        let spec_path = self.prepare()?;
        self.run_rpmbuild(&spec_path)?;
        let rpms = self.collect_rpms()?;
        self.clear_topdir()?;

        if rpms.is_empty() {
            return Err(anyhow!("rpmbuild produced no packages"));
        }

        for rpm in &rpms {
            info!("built {}", rpm.display());
        }

        Ok(rpms)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        skiff_common::testutil::{have_tool, write_file, DEFAULT_TEMP_DIR},
    };

    const SETUP_PY: &str = "\
import os
import sys

if sys.argv[1] == 'install':
    root = sys.argv[2].split('=', 1)[1]
    package = os.path.join(root, 'usr/lib/python3/site-packages/demo')
    os.makedirs(os.path.join(root, 'usr/bin'))
    os.makedirs(package)
    with open(os.path.join(root, 'usr/bin/demo'), 'w') as fh:
        fh.write('#!/bin/sh\\n')
    with open(os.path.join(package, '__init__.py'), 'w') as fh:
        fh.write('')
";

    fn builder(name: &str) -> Result<RpmBuilder> {
        let root = DEFAULT_TEMP_DIR.path().join(name);
        rmtree(&root)?;

        RpmBuilder::new(RpmConfig {
            name: "demo".to_string(),
            version: "1.0".to_string(),
            dist_dir: root.join("dist"),
            topdir: root.join("rpmbuild"),
            ..Default::default()
        })
    }

    #[test]
    fn yaml_defaults() -> Result<()> {
        let config: RpmConfig = serde_yaml::from_str("name: demo\nversion: '1.0'\n")?;

        assert_eq!(config.release, "0");
        assert_eq!(config.build_script, "setup.py");
        assert_eq!(config.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.topdir, PathBuf::from("~/rpmbuild"));

        Ok(())
    }

    #[test]
    fn blank_release() -> Result<()> {
        let config: RpmConfig = serde_yaml::from_str("name: demo\nversion: '1.0'\nrelease: ''\n")?;
        assert_eq!(config.release, "");
        assert_eq!(config.release(), "0");

        let config: RpmConfig = serde_yaml::from_str("name: demo\nrelease: ' 2 '\n")?;
        assert_eq!(config.release(), "2");

        Ok(())
    }

    #[test]
    fn rpmbuild_arguments() -> Result<()> {
        let builder = builder("rpm-args")?;
        let spec_path = builder.spec_path();
        let topdir = format!("_topdir {}", builder.topdir().display());

        assert_eq!(
            builder.rpmbuild_args(&spec_path),
            vec![
                "-bb".to_string(),
                spec_path.display().to_string(),
                "--define".to_string(),
                topdir.clone(),
            ]
        );

        let mut config = builder.config().clone();
        config.arch = Some(String::new());
        let builder = RpmBuilder::new(config.clone())?;
        assert_eq!(builder.rpmbuild_args(&spec_path).len(), 4);

        config.arch = Some("x86_64".to_string());
        let builder = RpmBuilder::new(config)?;
        assert_eq!(
            builder.rpmbuild_args(&spec_path)[2..],
            [
                "--define".to_string(),
                topdir,
                "--target".to_string(),
                "x86_64".to_string(),
            ]
        );

        Ok(())
    }

    #[test]
    fn tarball_search() -> Result<()> {
        let builder = builder("rpm-tarball")?;
        let dist = &builder.config().dist_dir;

        assert!(builder.find_tarball().is_err());

        write_file(dist.join("demo-1.0.zip"), "zip")?;
        write_file(dist.join("demo-1.0.gz"), "gz")?;
        assert!(builder.find_tarball().is_err());

        write_file(dist.join("demo-1.0.tar.gz"), "tgz")?;
        write_file(dist.join("alpha-0.1.tar.gz"), "tgz")?;
        assert_eq!(builder.find_tarball()?, dist.join("alpha-0.1.tar.gz"));

        Ok(())
    }

    #[test]
    fn prepare_tree() -> Result<()> {
        let builder = builder("rpm-prepare")?;
        write_file(builder.config().dist_dir.join("demo-1.0.tar.gz"), "tgz")?;
        write_file(builder.topdir().join("stale/file"), "old")?;

        let spec_path = builder.prepare()?;

        assert_eq!(spec_path, builder.topdir().join("SPECS/python3-demo.spec"));
        for dir in RPMBUILD_DIRS {
            assert!(builder.topdir().join(dir).is_dir());
        }
        assert!(!builder.topdir().join("stale").exists());

        let source = builder.topdir().join("SOURCES/demo-1.0.tar.gz");
        assert!(source.is_file());

        let spec = std::fs::read_to_string(&spec_path)?;
        assert!(spec.starts_with("Name: python3-demo\n"));
        assert!(spec.contains(&format!("Source: {}\n", source.display())));

        Ok(())
    }

    #[test]
    fn collect_rpms_into_dist() -> Result<()> {
        let builder = builder("rpm-collect")?;
        write_file(
            builder
                .topdir()
                .join("RPMS/noarch/python3-demo-1.0-0.noarch.rpm"),
            "rpm",
        )?;
        write_file(builder.topdir().join("SPECS/python3-demo.spec"), "spec")?;

        let rpms = builder.collect_rpms()?;

        assert_eq!(
            rpms,
            vec![builder
                .config()
                .dist_dir
                .join("python3-demo-1.0-0.noarch.rpm")]
        );
        assert!(rpms[0].is_file());

        Ok(())
    }

    #[test]
    fn build_rpm() -> Result<()> {
        if !have_tool("rpmbuild") || !have_tool("tar") || !Path::new("/usr/bin/python3").is_file()
        {
            return Ok(());
        }

        let root = DEFAULT_TEMP_DIR.path().join("rpm-build");
        rmtree(&root)?;

        write_file(root.join("src/demo-1.0/setup.py"), SETUP_PY)?;
        std::fs::create_dir_all(root.join("dist"))?;
        duct::cmd!("tar", "czf", root.join("dist/demo-1.0.tar.gz"), "demo-1.0")
            .dir(root.join("src"))
            .run()?;

        let builder = RpmBuilder::new(RpmConfig {
            name: "demo".to_string(),
            version: "1.0".to_string(),
            arch: Some("noarch".to_string()),
            summary: "Demo application".to_string(),
            description: "Does demo things.".to_string(),
            license: "MIT".to_string(),
            url: "https://example.com/demo".to_string(),
            install_path: "/usr/lib/python3/site-packages/demo".to_string(),
            dist_dir: root.join("dist"),
            topdir: root.join("rpmbuild"),
            ..Default::default()
        })?;

        let rpms = builder.build()?;

        assert!(rpms
            .iter()
            .any(|p| p.ends_with("python3-demo-1.0-0.noarch.rpm")));
        assert!(rpms.iter().all(|p| p.is_file()));
        assert!(!builder.topdir().exists());

        Ok(())
    }
}
