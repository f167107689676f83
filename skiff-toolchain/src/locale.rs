// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! gettext message catalogs.
//!
//! [build_pot] extracts translatable strings from source files into a
//! template with `xgettext`. [build_locales] compiles every `<lang>.po`
//! in a directory into `<dest>/<lang>/LC_MESSAGES/<textdomain>.mo`.

use {
    anyhow::{anyhow, Context, Result},
    duct::cmd,
    log::info,
    serde::{Deserialize, Serialize},
    skiff_common::fs::{get_filenames, get_files_tree},
    std::{
        ffi::OsString,
        io::Write,
        path::{Path, PathBuf},
    },
};

/// Describes where translatable sources and catalogs live.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocaleConfig {
    /// Directories scanned recursively for source files.
    pub sources: Vec<PathBuf>,
    /// Extension of source files, without the dot.
    pub extension: String,
    /// Language passed to `xgettext -L`.
    pub language: String,
    /// Template written by [build_pot].
    pub pot_file: PathBuf,
    /// Receives `xgettext` diagnostics. Discarded when unset.
    pub error_log: Option<PathBuf>,
    /// Directory holding `<lang>.po` files.
    pub po_dir: PathBuf,
    /// Root of the compiled `<lang>/LC_MESSAGES` tree.
    pub dest_dir: PathBuf,
    pub textdomain: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            sources: vec![],
            extension: "py".to_string(),
            language: "Python".to_string(),
            pot_file: PathBuf::from("messages.po"),
            error_log: None,
            po_dir: PathBuf::from("po"),
            dest_dir: PathBuf::from("locale"),
            textdomain: "messages".to_string(),
        }
    }
}

/// Source files under the configured directories, in scan order.
pub fn collect_sources(config: &LocaleConfig) -> Result<Vec<PathBuf>> {
    let mut files = vec![];

    for dir in &config.sources {
        files.extend(get_files_tree(dir, Some(config.extension.as_str()))?);
    }

    Ok(files)
}

/// Extract messages from the configured sources into the template file.
///
/// Returns the number of source files scanned.
pub fn build_pot(config: &LocaleConfig) -> Result<usize> {
    let files = collect_sources(config)?;
    if files.is_empty() {
        return Err(anyhow!("no *.{} sources to extract messages from", config.extension));
    }

    let mut list = tempfile::Builder::new()
        .prefix("skiff-locale")
        .suffix(".in")
        .tempfile()
        .context("creating xgettext file list")?;
    for file in &files {
        writeln!(list, "{}", file.display())?;
    }
    list.flush()?;

    if let Some(parent) = config.pot_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let args: Vec<OsString> = vec![
        "-f".into(),
        list.path().into(),
        "-L".into(),
        config.language.clone().into(),
        "-o".into(),
        config.pot_file.clone().into(),
    ];
    let expression = cmd("xgettext", args).stdout_null();
    let expression = match &config.error_log {
        Some(path) => expression.stderr_path(path),
        None => expression.stderr_null(),
    };

    expression
        .run()
        .with_context(|| format!("running xgettext for {}", config.pot_file.display()))?;

    info!("POT file updated: {}", config.pot_file.display());

    Ok(files.len())
}

/// Pairs of `(po, mo)` paths for every catalog in `po_dir`.
///
/// The language is the file name up to its first dot.
pub fn mo_targets(
    po_dir: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
    textdomain: &str,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let po_dir = po_dir.as_ref();
    let dest_dir = dest_dir.as_ref();

    Ok(get_filenames(po_dir, Some("po"))?
        .into_iter()
        .map(|name| {
            let lang = name.split('.').next().unwrap_or(&name).to_string();

            (
                po_dir.join(&name),
                dest_dir
                    .join(lang)
                    .join("LC_MESSAGES")
                    .join(format!("{}.mo", textdomain)),
            )
        })
        .collect())
}

/// Compile every catalog with `msgfmt`, returning the written `.mo` files.
pub fn build_locales(config: &LocaleConfig) -> Result<Vec<PathBuf>> {
    info!("building locales");

    let mut written = vec![];

    for (po, mo) in mo_targets(&config.po_dir, &config.dest_dir, &config.textdomain)? {
        if let Some(parent) = mo.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        info!("{} ==> {}", po.display(), mo.display());

        let args: Vec<OsString> = vec!["-o".into(), mo.clone().into(), po.clone().into()];
        skiff_common::process::run(cmd("msgfmt", args), "msgfmt")
            .with_context(|| format!("compiling {}", po.display()))?;

        written.push(mo);
    }

    Ok(written)
}
