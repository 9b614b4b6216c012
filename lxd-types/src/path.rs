// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LXD API paths.

pub const API_ROOT: &str = "/1.0";

pub fn cluster() -> String {
    format!("{API_ROOT}/cluster")
}

pub fn cluster_members() -> String {
    format!("{API_ROOT}/cluster/members")
}

pub fn cluster_member(name: &str) -> String {
    format!("{API_ROOT}/cluster/members/{name}")
}

pub fn cluster_member_state(name: &str) -> String {
    format!("{API_ROOT}/cluster/members/{name}/state")
}

/// The pool collection, optionally scoped to one cluster member.
pub fn storage_pools(target: Option<&str>) -> String {
    with_target(format!("{API_ROOT}/storage-pools"), target)
}

/// One pool, optionally as seen by one cluster member.
pub fn storage_pool(name: &str, target: Option<&str>) -> String {
    with_target(format!("{API_ROOT}/storage-pools/{name}"), target)
}

fn with_target(path: String, target: Option<&str>) -> String {
    match target {
        Some(target) => format!("{path}?target={target}"),
        None => path,
    }
}

/// Name of the resource a collection URL points at, e.g. `default` for
/// `/1.0/storage-pools/default`.
pub fn name_from_url(url: &str) -> &str {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    path.rsplit('/').next().unwrap_or(path)
}
