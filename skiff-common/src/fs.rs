// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Filesystem scanning and copying helpers.

Functions taking an `ext` argument filter files by extension. `None`
matches every file. Results are always sorted so callers producing
archives or manifests get deterministic output.

The scanners ([get_filepaths], [get_dirs_tree], [get_files_tree]) skip
hidden files and directories. [get_all_files], [tree_size] and
[copy_tree] see everything, so what is measured matches what is copied.
*/

use {
    anyhow::{anyhow, Context, Result},
    log::debug,
    path_dedot::ParseDot,
    serde::{Deserialize, Serialize},
    std::{
        ffi::OsStr,
        path::{Component, Path, PathBuf},
    },
    walkdir::{DirEntry, WalkDir},
};

/// Aggregate size of a file or directory tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeSize {
    /// Sum of file sizes in bytes.
    pub bytes: u64,
    /// Number of files counted.
    pub files: u64,
}

impl TreeSize {
    /// Size in whole KiB, rounded down.
    pub fn kibibytes(&self) -> u64 {
        self.bytes / 1024
    }
}

/// Files to install into an absolute directory of the target system.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DataFiles {
    /// Destination directory, e.g. `/usr/share/applications`.
    pub path: String,
    /// Source files, relative to the project directory.
    pub files: Vec<PathBuf>,
}

impl DataFiles {
    /// Destination directory relative to a staging root.
    pub fn relative_dest(&self) -> PathBuf {
        PathBuf::from(self.path.trim_start_matches('/'))
    }
}

fn matches_extension(name: &OsStr, ext: Option<&str>) -> bool {
    match ext {
        None => true,
        Some(ext) => name
            .to_string_lossy()
            .ends_with(&format!(".{}", ext)),
    }
}

pub(crate) fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Names of files directly inside a directory.
///
/// A path that isn't a directory yields an empty list.
pub fn get_filenames(path: impl AsRef<Path>, ext: Option<&str>) -> Result<Vec<String>> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Ok(vec![]);
    }

    let mut res = vec![];

    for entry in
        std::fs::read_dir(path).with_context(|| format!("reading {}", path.display()))?
    {
        let entry = entry?;

        if entry.path().is_file() && matches_extension(&entry.file_name(), ext) {
            res.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    res.sort();

    Ok(res)
}

/// Paths of files directly inside a directory, evaluated as a glob.
///
/// Names starting with `.` are not matched.
pub fn get_filepaths(path: impl AsRef<Path>, ext: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&path.as_ref().display().to_string()),
        match ext {
            Some(ext) => format!("*.{}", ext),
            None => "*".to_string(),
        }
    );

    let mut res = vec![];

    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };

    for path in glob::glob_with(&pattern, options)? {
        let path = path?;

        if path.is_file() {
            res.push(path);
        }
    }

    res.sort();

    Ok(res)
}

/// Directories directly inside a directory.
///
/// Directories whose name begins with `.` are skipped if `skip_hidden` is set.
pub fn get_dirpaths(path: impl AsRef<Path>, skip_hidden: bool) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Ok(vec![]);
    }

    let mut res = vec![];

    for entry in
        std::fs::read_dir(path).with_context(|| format!("reading {}", path.display()))?
    {
        let entry = entry?;

        if skip_hidden && is_hidden(&entry.file_name()) {
            continue;
        }

        if entry.path().is_dir() {
            res.push(entry.path());
        }
    }

    res.sort();

    Ok(res)
}

/// All directories below a directory, recursively.
///
/// Hidden directories and everything beneath them are skipped.
pub fn get_dirs_tree(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Ok(vec![]);
    }

    let walk = WalkDir::new(path)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e: &DirEntry| {
            e.depth() == 0 || !(e.file_type().is_dir() && is_hidden(e.file_name()))
        });

    let mut res = vec![];

    for entry in walk {
        let entry = entry?;

        if entry.file_type().is_dir() {
            res.push(entry.into_path());
        }
    }

    res.sort();

    Ok(res)
}

/// All files in a directory and in its directory tree.
pub fn get_files_tree(path: impl AsRef<Path>, ext: Option<&str>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    let mut res = get_filepaths(path, ext)?;

    for dir in get_dirs_tree(path)? {
        res.extend(get_filepaths(&dir, ext)?);
    }

    res.sort();

    Ok(res)
}

/// Every file below a directory, hidden ones included.
pub fn get_all_files(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();

    if !path.is_dir() {
        return Ok(vec![]);
    }

    let mut res = vec![];

    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry?;

        if entry.file_type().is_file() {
            res.push(entry.into_path());
        }
    }

    res.sort();

    Ok(res)
}

/// Resolve a path to an absolute path.
///
/// A leading `~` is expanded to the home directory. Relative paths are
/// resolved against the current directory. `.` and `..` components are
/// removed lexically.
pub fn normalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();

    let expanded = match path.components().next() {
        Some(Component::Normal(first)) if first == "~" => {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("unable to resolve home directory"))?;
            home.join(path.strip_prefix("~")?)
        }
        _ => path.to_path_buf(),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };

    Ok(absolute.parse_dot()?.to_path_buf())
}

/// Compute the size of a file or of all files in a directory tree.
pub fn tree_size(path: impl AsRef<Path>) -> Result<TreeSize> {
    let path = path.as_ref();

    if path.is_file() {
        return Ok(TreeSize {
            bytes: std::fs::metadata(path)?.len(),
            files: 1,
        });
    }

    let mut size = TreeSize::default();

    for file in get_all_files(path)? {
        size.bytes += std::fs::metadata(&file)
            .with_context(|| format!("reading metadata of {}", file.display()))?
            .len();
        size.files += 1;
    }

    Ok(size)
}

/// Delete a directory tree, or unlink a symlink.
///
/// Missing paths are ignored.
pub fn rmtree(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if metadata.file_type().is_symlink() {
        std::fs::remove_file(path).with_context(|| format!("unlinking {}", path.display()))?;
    } else if metadata.is_dir() {
        remove_dir_all::remove_dir_all(path)
            .with_context(|| format!("removing {}", path.display()))?;
    }

    Ok(())
}

/// Delete files in a directory tree having any of the given extensions.
pub fn clear_files(path: impl AsRef<Path>, extensions: &[&str]) -> Result<()> {
    for ext in extensions {
        for file in get_files_tree(path.as_ref(), Some(ext))? {
            debug!("removing {}", file.display());
            std::fs::remove_file(&file).with_context(|| format!("removing {}", file.display()))?;
        }
    }

    Ok(())
}

/// Recursively copy the content of `source` into `dest`.
///
/// `dest` and any missing parents are created. Symlinks are followed.
pub fn copy_tree(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let source = source.as_ref();
    let dest = dest.as_ref();

    for entry in WalkDir::new(source)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = entry?;
        let dest_path = dest.join(entry.path().strip_prefix(source)?);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path)
                .with_context(|| format!("creating {}", dest_path.display()))?;
        } else {
            std::fs::copy(entry.path(), &dest_path).with_context(|| {
                format!(
                    "copying {} -> {}",
                    entry.path().display(),
                    dest_path.display()
                )
            })?;
        }
    }

    Ok(())
}

/// Copy a file or a directory into a destination directory.
///
/// The copy keeps the base name of `source`. Returns the destination path.
pub fn copy_into(source: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let source = source.as_ref();
    let dest_dir = dest_dir.as_ref();

    let name = source
        .file_name()
        .ok_or_else(|| anyhow!("unable to determine filename of {}", source.display()))?;
    let dest_path = dest_dir.join(name);

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("creating {}", dest_dir.display()))?;

    if source.is_dir() {
        copy_tree(source, &dest_path)?;
    } else {
        std::fs::copy(source, &dest_path).with_context(|| {
            format!("copying {} -> {}", source.display(), dest_path.display())
        })?;
    }

    Ok(dest_path)
}

/// Mark a file as executable by everyone who can read it.
#[cfg(unix)]
pub fn set_executable(path: impl AsRef<Path>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let path = path.as_ref();
    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    std::fs::set_permissions(path, permissions)
        .with_context(|| format!("setting executable bit on {}", path.display()))?;

    Ok(())
}

#[cfg(not(unix))]
pub fn set_executable(_path: impl AsRef<Path>) -> Result<()> {
    Ok(())
}

/// Apply a permission mode to every file and directory in a tree.
///
/// Symlinks are left alone.
#[cfg(unix)]
pub fn set_mode_recursive(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for entry in WalkDir::new(path.as_ref()) {
        let entry = entry?;

        if entry.path_is_symlink() {
            continue;
        }

        std::fs::set_permissions(entry.path(), std::fs::Permissions::from_mode(mode))
            .with_context(|| format!("setting mode of {}", entry.path().display()))?;
    }

    Ok(())
}

#[cfg(not(unix))]
pub fn set_mode_recursive(_path: impl AsRef<Path>, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testutil::{write_file, DEFAULT_TEMP_DIR},
    };

    fn fixture(name: &str) -> Result<PathBuf> {
        let root = DEFAULT_TEMP_DIR.path().join(name);
        rmtree(&root)?;

        write_file(root.join("b.py"), "b")?;
        write_file(root.join("a.txt"), "aa")?;
        write_file(root.join("README"), "readme")?;
        write_file(root.join("pkg/mod.py"), "module")?;
        write_file(root.join("pkg/sub/deep.py"), "deep")?;
        write_file(root.join(".svn/entries.py"), "hidden")?;

        Ok(root)
    }

    #[test]
    fn filenames_sorted_and_filtered() -> Result<()> {
        let root = fixture("filenames")?;

        assert_eq!(get_filenames(&root, None)?, vec!["README", "a.txt", "b.py"]);
        assert_eq!(get_filenames(&root, Some("py"))?, vec!["b.py"]);
        assert!(get_filenames(root.join("missing"), None)?.is_empty());

        Ok(())
    }

    #[test]
    fn filepaths_sorted_and_filtered() -> Result<()> {
        let root = fixture("filepaths")?;

        assert_eq!(
            get_filepaths(&root, None)?,
            vec![root.join("README"), root.join("a.txt"), root.join("b.py")]
        );
        assert_eq!(get_filepaths(&root, Some("txt"))?, vec![root.join("a.txt")]);

        Ok(())
    }

    #[test]
    fn dirpaths_skip_hidden() -> Result<()> {
        let root = fixture("dirpaths")?;

        assert_eq!(get_dirpaths(&root, true)?, vec![root.join("pkg")]);
        assert_eq!(
            get_dirpaths(&root, false)?,
            vec![root.join(".svn"), root.join("pkg")]
        );

        Ok(())
    }

    #[test]
    fn dirs_and_files_tree() -> Result<()> {
        let root = fixture("trees")?;

        assert_eq!(
            get_dirs_tree(&root)?,
            vec![root.join("pkg"), root.join("pkg/sub")]
        );
        assert_eq!(
            get_files_tree(&root, Some("py"))?,
            vec![
                root.join("b.py"),
                root.join("pkg/mod.py"),
                root.join("pkg/sub/deep.py"),
            ]
        );

        Ok(())
    }

    #[test]
    fn glob_skips_dotfiles() -> Result<()> {
        let root = fixture("dotfiles")?;
        write_file(root.join(".DS_Store"), "junk")?;
        write_file(root.join("pkg/.hidden.py"), "hidden")?;

        assert_eq!(
            get_filepaths(&root, None)?,
            vec![root.join("README"), root.join("a.txt"), root.join("b.py")]
        );
        assert_eq!(
            get_files_tree(root.join("pkg"), Some("py"))?,
            vec![root.join("pkg/mod.py"), root.join("pkg/sub/deep.py")]
        );

        Ok(())
    }

    #[test]
    fn all_files_include_hidden() -> Result<()> {
        let root = fixture("all-files")?;
        write_file(root.join("pkg/.libs/libfoo.so"), "so")?;

        assert_eq!(
            get_all_files(&root)?,
            vec![
                root.join(".svn/entries.py"),
                root.join("README"),
                root.join("a.txt"),
                root.join("b.py"),
                root.join("pkg/.libs/libfoo.so"),
                root.join("pkg/mod.py"),
                root.join("pkg/sub/deep.py"),
            ]
        );
        assert!(get_all_files(root.join("missing"))?.is_empty());

        Ok(())
    }

    #[test]
    fn tree_size_counts_hidden_files() -> Result<()> {
        let root = fixture("size")?;

        assert_eq!(
            tree_size(&root)?,
            TreeSize {
                bytes: 1 + 2 + 6 + 6 + 4 + 6,
                files: 6
            }
        );
        assert_eq!(
            tree_size(root.join("a.txt"))?,
            TreeSize { bytes: 2, files: 1 }
        );
        assert_eq!(TreeSize { bytes: 4095, files: 1 }.kibibytes(), 3);

        Ok(())
    }

    #[test]
    fn normalize_path_resolves_dots() -> Result<()> {
        let cwd = std::env::current_dir()?;

        assert_eq!(normalize_path("a/./b/../c")?, cwd.join("a/c"));
        assert_eq!(normalize_path("/usr/lib/../share")?, PathBuf::from("/usr/share"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(normalize_path("~/rpmbuild")?, home.join("rpmbuild"));
        }

        Ok(())
    }

    #[test]
    fn clear_files_by_extension() -> Result<()> {
        let root = fixture("clear")?;

        clear_files(&root, &["py"])?;

        assert!(get_files_tree(&root, Some("py"))?.is_empty());
        assert!(root.join("a.txt").exists());
        // Hidden directories are not scanned.
        assert!(root.join(".svn/entries.py").exists());

        Ok(())
    }

    #[test]
    fn copy_tree_and_copy_into() -> Result<()> {
        let root = fixture("copy-src")?;
        let dest = DEFAULT_TEMP_DIR.path().join("copy-dest");
        rmtree(&dest)?;

        copy_tree(&root, dest.join("tree"))?;
        assert_eq!(
            std::fs::read_to_string(dest.join("tree/pkg/sub/deep.py"))?,
            "deep"
        );

        assert_eq!(copy_into(root.join("pkg"), &dest)?, dest.join("pkg"));
        assert!(dest.join("pkg/mod.py").is_file());

        assert_eq!(copy_into(root.join("a.txt"), &dest)?, dest.join("a.txt"));
        assert!(dest.join("a.txt").is_file());

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn executable_and_modes() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let root = fixture("modes")?;
        let script = root.join("b.py");

        set_executable(&script)?;
        assert_ne!(std::fs::metadata(&script)?.permissions().mode() & 0o111, 0);

        set_mode_recursive(&root, 0o755)?;
        assert_eq!(
            std::fs::metadata(root.join("pkg/mod.py"))?.permissions().mode() & 0o777,
            0o755
        );

        Ok(())
    }

    #[test]
    fn data_files_relative_dest() {
        let data = DataFiles {
            path: "/usr/share/applications".to_string(),
            files: vec![PathBuf::from("demo.desktop")],
        };

        assert_eq!(data.relative_dest(), PathBuf::from("usr/share/applications"));
    }

    #[test]
    fn rmtree_ignores_missing() -> Result<()> {
        let root = fixture("rmtree")?;

        rmtree(&root)?;
        assert!(!root.exists());
        rmtree(&root)?;

        Ok(())
    }
}
