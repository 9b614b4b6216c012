// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converges LXD cluster membership and storage pools towards a declared
//! state, one step per pass, through the `lxc` client.

pub mod api;
pub mod cluster_member;
pub mod config;
pub mod converge;
pub mod error;
pub mod storage_pool;

pub use api::LxdApi;
pub use error::{Error, Operation};
