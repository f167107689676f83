// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian binary package building.

The [builder::DebBuilder] type stages a project build into a directory
mirroring the installed filesystem and turns it into a `.deb` with
`dpkg --build`. The [control] module writes the `DEBIAN/control` file.
*/

pub mod builder;
pub mod control;
pub mod error;

pub use {
    builder::{DebBuilder, DebConfig},
    error::{DebianError, Result},
};
