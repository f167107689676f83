// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::config::{require_section, ProjectConfig, DEFAULT_CONFIG_FILE},
    anyhow::{anyhow, Result},
    clap::{Arg, ArgAction, ArgMatches, Command},
    log::{info, LevelFilter},
    skiff_apple::{build_dmg, PkgBuilder},
    skiff_debian::DebBuilder,
    skiff_rpm::RpmBuilder,
    skiff_toolchain::{locale, native::NativeModule, pkgconfig::PkgConfig},
    std::path::PathBuf,
};

const DEB_ABOUT: &str = "\
Build a Debian binary package.

The project build tree (the `source_dir` of the `deb` section) is staged
below the installation directory together with scripts, data files and
package data. A DEBIAN/control file is generated and `dpkg --build`
writes the package into the dist directory.
";

const RPM_ABOUT: &str = "\
Build RPM packages with rpmbuild.

The first *.tar.gz found in the dist directory is used as the source
tarball. A spec file is generated from the `rpm` section, rpmbuild runs
in a freshly created topdir and every produced RPM is copied into the
dist directory.
";

const PKG_ABOUT: &str = "\
Build a macOS flat package (.pkg).

The `src_dir` of the `pkg` section becomes the payload. The package is
assembled with cpio, gzip, mkbom and xar, so it can be produced from
Linux hosts. When the section has a `dmg` entry, the package is then
wrapped into a disk image.
";

const DMG_ABOUT: &str = "\
Build a disk image (.dmg) from the files of the `dmg` section.
";

const PKG_CONFIG_ABOUT: &str = "\
Query pkg-config for a set of packages.

QUERY is one of:

version   the version of each package
includes  include directories, without -I
libs      libraries to link, without -l
cflags    compiler flags other than include directories
flags     complete compiler and linker arguments

Results of multiple packages are merged without duplicates. The
pkg-config executable can be overridden with the PKG_CONFIG environment
variable.
";

const POT_ABOUT: &str = "\
Extract translatable messages into a template with xgettext.

Sources are collected from the directories of the `locale` section.
";

const LOCALES_ABOUT: &str = "\
Compile message catalogs with msgfmt.

Every <lang>.po in the `po_dir` of the `locale` section is compiled into
<dest_dir>/<lang>/LC_MESSAGES/<textdomain>.mo.
";

const PKG_CONFIG_QUERIES: [&str; 5] = ["version", "includes", "libs", "cflags", "flags"];

fn command() -> Command {
    Command::new("skiff")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build Debian, RPM and macOS packages of a project")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(DEFAULT_CONFIG_FILE)
                .help("Project configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase logging verbosity. Can be specified multiple times."),
        )
        .subcommand(
            Command::new("deb")
                .about("Build a Debian binary package")
                .long_about(DEB_ABOUT),
        )
        .subcommand(
            Command::new("rpm")
                .about("Build RPM packages")
                .long_about(RPM_ABOUT),
        )
        .subcommand(
            Command::new("pkg")
                .about("Build a macOS flat package")
                .long_about(PKG_ABOUT),
        )
        .subcommand(
            Command::new("dmg")
                .about("Build a disk image")
                .long_about(DMG_ABOUT),
        )
        .subcommand(
            Command::new("pkg-config")
                .about("Query pkg-config for a set of packages")
                .long_about(PKG_CONFIG_ABOUT)
                .arg(
                    Arg::new("query")
                        .required(true)
                        .value_parser(PKG_CONFIG_QUERIES)
                        .help("What to query"),
                )
                .arg(
                    Arg::new("packages")
                        .required(true)
                        .num_args(1..)
                        .help("pkg-config package names"),
                ),
        )
        .subcommand(
            Command::new("pot")
                .about("Extract translatable messages")
                .long_about(POT_ABOUT),
        )
        .subcommand(
            Command::new("locales")
                .about("Compile message catalogs")
                .long_about(LOCALES_ABOUT),
        )
}

fn load_config(args: &ArgMatches) -> Result<ProjectConfig> {
    let path = args
        .get_one::<PathBuf>("config")
        .ok_or_else(|| anyhow!("--config is required"))?;

    ProjectConfig::from_path(path)
}

fn command_deb(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    let builder = DebBuilder::new(require_section(&config.deb, "deb")?.clone());
    let path = builder.build()?;
    info!("wrote {}", path.display());

    Ok(())
}

fn command_rpm(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    let builder = RpmBuilder::new(require_section(&config.rpm, "rpm")?.clone())?;
    for path in builder.build()? {
        info!("wrote {}", path.display());
    }

    Ok(())
}

fn command_pkg(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    let builder = PkgBuilder::new(require_section(&config.pkg, "pkg")?.clone())?;
    let path = builder.build()?;
    info!("wrote {}", path.display());

    Ok(())
}

fn command_dmg(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    let path = build_dmg(require_section(&config.dmg, "dmg")?)?;
    info!("wrote {}", path.display());

    Ok(())
}

fn command_pkg_config(args: &ArgMatches) -> Result<()> {
    let query = args
        .get_one::<String>("query")
        .ok_or_else(|| anyhow!("query is required"))?;
    let packages = args
        .get_many::<String>("packages")
        .ok_or_else(|| anyhow!("at least one package is required"))?
        .cloned()
        .collect::<Vec<_>>();

    let pkg_config = PkgConfig::from_env();

    let lines = match query.as_str() {
        "version" => packages
            .iter()
            .map(|package| Ok(format!("{} {}", package, pkg_config.version(package)?)))
            .collect::<Result<Vec<_>>>()?,
        "includes" => pkg_config.includes(packages.as_slice())?,
        "libs" => pkg_config.libs(packages.as_slice())?,
        "cflags" => pkg_config.cflags(packages.as_slice())?,
        "flags" => vec![NativeModule::default()
            .with_pkg_config(&pkg_config, packages.as_slice())?
            .compile_args()
            .join(" ")],
        _ => return Err(anyhow!("unknown pkg-config query: {}", query)),
    };

    for line in lines {
        println!("{}", line);
    }

    Ok(())
}

fn command_pot(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    let count = locale::build_pot(require_section(&config.locale, "locale")?)?;
    info!("scanned {} source files", count);

    Ok(())
}

fn command_locales(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;

    let written = locale::build_locales(require_section(&config.locale, "locale")?)?;
    info!("compiled {} catalogs", written.len());

    Ok(())
}

pub fn run_cli() -> Result<()> {
    let matches = command().get_matches();

    let log_level = match matches.get_count("verbose") {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Tool output is forwarded line by line; keep it free of log context.
    if log_level <= LevelFilter::Info {
        builder
            .format_timestamp(None)
            .format_level(false)
            .format_target(false);
    }

    builder.init();

    match matches.subcommand() {
        Some(("deb", args)) => command_deb(args),
        Some(("rpm", args)) => command_rpm(args),
        Some(("pkg", args)) => command_pkg(args),
        Some(("dmg", args)) => command_dmg(args),
        Some(("pkg-config", args)) => command_pkg_config(args),
        Some(("pot", args)) => command_pot(args),
        Some(("locales", args)) => command_locales(args),
        _ => Err(anyhow!("invalid sub-command")),
    }
}
