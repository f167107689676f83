// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Build helpers that sit next to packaging.

* [pkgconfig] queries `pkg-config` for include directories, libraries and
  compiler flags.
* [native] describes a natively compiled extension module and derives
  its compiler flags.
* [locale] extracts translatable messages with `xgettext` and compiles
  message catalogs with `msgfmt`.
*/

pub mod locale;
pub mod native;
pub mod pkgconfig;
