// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Functionality shared by the skiff packaging crates.

* [fs] scans and copies directory trees and measures their size.
* [packages] discovers Python packages and their resource directories.
* [process] runs external packaging tools, streaming their output into
  the log.
* [testutil] holds helpers for tests that touch the filesystem.
*/

pub mod fs;
pub mod packages;
pub mod process;
pub mod testutil;
