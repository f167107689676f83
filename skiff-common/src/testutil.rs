// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    anyhow::Result,
    once_cell::sync::Lazy,
    std::path::Path,
};

pub static DEFAULT_TEMP_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
    tempfile::Builder::new()
        .prefix("skiff-test")
        .tempdir()
        .expect("unable to create temporary directory")
});

/// Write a file, creating parent directories as needed.
pub fn write_file(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;

    Ok(())
}

/// Whether an external tool is available, printing a skip notice if not.
pub fn have_tool(name: &str) -> bool {
    if which::which(name).is_ok() {
        true
    } else {
        eprintln!("{} not found; skipping test", name);
        false
    }
}
