// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Discovery of Python packages in a source tree.

A directory is a package when it contains `__init__.py` and its name has
no `-`. The results feed the `package_dirs` and `package_data` settings
of the builders.
*/

use {
    crate::fs::{get_dirs_tree, is_hidden, normalize_path},
    anyhow::{anyhow, Result},
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// File marking a directory as a Python package.
pub const INIT_FILE: &str = "__init__.py";

/// Whether a directory is an importable Python package.
pub fn is_package(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    let valid_name = path
        .file_name()
        .map(|name| !name.to_string_lossy().contains('-'))
        .unwrap_or(false);

    path.is_dir() && valid_name && path.join(INIT_FILE).is_file()
}

fn child_packages(path: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !path.is_dir() {
        return Ok(vec![]);
    }

    let mut res = vec![];

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name();

        if is_hidden(&name) {
            continue;
        }

        if is_package(entry.path()) {
            res.push((name.to_string_lossy().to_string(), entry.path()));
        }
    }

    res.sort();

    Ok(res)
}

/// Package directories below `path`, subpackages included.
pub fn get_packages(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut res = vec![];

    for (_, folder) in child_packages(path.as_ref())? {
        let nested = get_packages(&folder)?;
        res.push(folder);
        res.extend(nested);
    }

    res.sort();

    Ok(res)
}

/// Top level packages of a source root, keyed by name.
///
/// Names listed in `excludes` are left out.
pub fn get_package_dirs(
    path: impl AsRef<Path>,
    excludes: &[&str],
) -> Result<BTreeMap<String, PathBuf>> {
    Ok(child_packages(path.as_ref())?
        .into_iter()
        .filter(|(name, _)| !excludes.contains(&name.as_str()))
        .collect())
}

/// `package_data` wildcards covering a resource directory of a package.
///
/// Every directory of the resource tree yields a `<dir>/*.*` entry
/// relative to the package. The resource directory itself comes last.
pub fn get_resources(pkg_path: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<Vec<String>> {
    let pkg_path = normalize_path(pkg_path)?;
    let path = normalize_path(path)?;

    let mut dirs = get_dirs_tree(&path)?;
    dirs.push(path);

    dirs.iter()
        .map(|dir| {
            let rel = dir.strip_prefix(&pkg_path).map_err(|_| {
                anyhow!(
                    "{} is not inside package {}",
                    dir.display(),
                    pkg_path.display()
                )
            })?;

            let mut parts = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>();
            parts.push("*.*".to_string());

            Ok(parts.join("/"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testutil::{write_file, DEFAULT_TEMP_DIR},
    };

    fn source_root(name: &str) -> Result<PathBuf> {
        let root = DEFAULT_TEMP_DIR.path().join(name);

        write_file(root.join("demo/__init__.py"), "")?;
        write_file(root.join("demo/ui/__init__.py"), "")?;
        write_file(root.join("demo/ui/widgets/__init__.py"), "")?;
        write_file(root.join("demo/share/icons/a.png"), "png")?;
        write_file(root.join("demo/share/icons/small/b.png"), "png")?;
        write_file(root.join("demo/share/.cache/c.png"), "png")?;
        write_file(root.join("demo/bad-name/__init__.py"), "")?;
        write_file(root.join("tools/__init__.py"), "")?;
        write_file(root.join(".hidden/__init__.py"), "")?;
        write_file(root.join("notes/readme.txt"), "")?;

        Ok(root)
    }

    #[test]
    fn package_detection() -> Result<()> {
        let root = source_root("packages-detect")?;

        assert!(is_package(root.join("demo")));
        assert!(is_package(root.join("demo/ui")));
        assert!(!is_package(root.join("demo/bad-name")));
        assert!(!is_package(root.join("notes")));
        assert!(!is_package(root.join("demo/__init__.py")));
        assert!(!is_package(root.join("missing")));

        Ok(())
    }

    #[test]
    fn packages_recursive() -> Result<()> {
        let root = source_root("packages-recursive")?;

        assert_eq!(
            get_packages(&root)?,
            vec![
                root.join("demo"),
                root.join("demo/ui"),
                root.join("demo/ui/widgets"),
                root.join("tools"),
            ]
        );
        assert!(get_packages(root.join("missing"))?.is_empty());

        Ok(())
    }

    #[test]
    fn package_dirs_with_excludes() -> Result<()> {
        let root = source_root("packages-dirs")?;

        let dirs = get_package_dirs(&root, &[])?;
        assert_eq!(
            dirs.into_iter().collect::<Vec<_>>(),
            vec![
                ("demo".to_string(), root.join("demo")),
                ("tools".to_string(), root.join("tools")),
            ]
        );

        let dirs = get_package_dirs(&root, &["tools"])?;
        assert_eq!(dirs.keys().collect::<Vec<_>>(), vec!["demo"]);

        Ok(())
    }

    #[test]
    fn resource_wildcards() -> Result<()> {
        let root = source_root("packages-resources")?;

        assert_eq!(
            get_resources(root.join("demo"), root.join("demo/share"))?,
            vec![
                "share/icons/*.*".to_string(),
                "share/icons/small/*.*".to_string(),
                "share/*.*".to_string(),
            ]
        );
        assert_eq!(
            get_resources(root.join("demo"), root.join("demo/./share/../share/icons/small"))?,
            vec!["share/icons/small/*.*".to_string()]
        );
        assert_eq!(
            get_resources(root.join("demo"), root.join("demo"))?.last(),
            Some(&"*.*".to_string())
        );
        assert!(get_resources(root.join("demo"), root.join("tools")).is_err());

        Ok(())
    }
}
