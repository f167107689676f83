// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Build RPMs by driving `rpmbuild`.

[RpmBuilder] lays out an `rpmbuild` tree, copies the project's source
tarball into it, renders a `.spec` file via [SpecFile] and collects the
produced `.rpm` files.
*/

mod builder;
mod spec;

pub use {
    builder::{RpmBuilder, RpmConfig},
    spec::SpecFile,
};
