// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! macOS release names and installer version checks.

/// Known macOS versions and their marketing names.
pub const MACOS_VERSIONS: [(&str, &str); 11] = [
    ("10.5", "Mac OS X 10.5 Leopard"),
    ("10.6", "Mac OS X 10.6 Snow Leopard"),
    ("10.7", "Mac OS X 10.7 Lion"),
    ("10.8", "OS X 10.8 Mountain Lion"),
    ("10.9", "OS X 10.9 Mavericks"),
    ("10.10", "OS X 10.10 Yosemite"),
    ("10.11", "OS X 10.11 El Capitan"),
    ("10.12", "macOS 10.12 Sierra"),
    ("10.13", "macOS 10.13 High Sierra"),
    ("10.14", "macOS 10.14 Mojave"),
    ("10.15", "macOS 10.15 Catalina"),
];

/// Version checked for when the requested one is unknown.
pub const FALLBACK_VERSION: &str = "10.10";

/// Resolve a version to a known `(version, name)` pair.
///
/// Unknown versions resolve to [FALLBACK_VERSION].
pub fn resolve_version(version: &str) -> (&'static str, &'static str) {
    let lookup = |wanted: &str| MACOS_VERSIONS.iter().find(|(v, _)| *v == wanted).copied();

    lookup(version)
        .or_else(|| lookup(FALLBACK_VERSION))
        .unwrap_or(MACOS_VERSIONS[5])
}

/// JavaScript for a `Distribution` installation check requiring a minimum macOS.
///
/// The script defines `install_check()`, which fails the install with a
/// message naming the required release and the application.
pub fn install_check_script(version: &str, app_name: &str) -> String {
    let (version, name) = resolve_version(version);

    format!(
        "function install_check() {{\n  \
         if(!(system.compareVersions(system.version.ProductVersion,'{version}') >= 0)) {{\n    \
         my.result.title = 'Failure';\n    \
         my.result.message = 'You need at least {name} to install {app_name}.';\n    \
         my.result.type = 'Fatal';\n    \
         return false;\n  \
         }}\n  \
         return true;\n\
         }}\n",
        version = version,
        name = name,
        app_name = app_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_versions() {
        assert_eq!(resolve_version("10.13"), ("10.13", "macOS 10.13 High Sierra"));
        assert_eq!(resolve_version("10.5"), ("10.5", "Mac OS X 10.5 Leopard"));
        assert_eq!(resolve_version("11.0"), ("10.10", "OS X 10.10 Yosemite"));
        assert_eq!(resolve_version(""), ("10.10", "OS X 10.10 Yosemite"));
    }

    #[test]
    fn check_script() {
        assert_eq!(
            install_check_script("10.11", "Demo App"),
            "function install_check() {\n  \
             if(!(system.compareVersions(system.version.ProductVersion,'10.11') >= 0)) {\n    \
             my.result.title = 'Failure';\n    \
             my.result.message = 'You need at least OS X 10.11 El Capitan to install Demo App.';\n    \
             my.result.type = 'Fatal';\n    \
             return false;\n  \
             }\n  \
             return true;\n\
             }\n"
        );
        assert!(install_check_script("9.0", "X").contains("ProductVersion,'10.10')"));
    }
}
