// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Types describing LXD API resources, as printed by `lxc query`.

pub mod cluster;
pub mod operation;
pub mod path;
pub mod storage;
