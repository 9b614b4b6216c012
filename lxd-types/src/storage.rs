// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storage pool types.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Storage pool `config` keys.
pub type PoolConfig = BTreeMap<String, String>;

/// Keys that describe one member's local backing storage.
///
/// In a cluster, a pool is first created on each member with a `target`, and
/// those requests accept only these keys. The final cluster-wide create and
/// cluster-wide updates reject them. See `lxd/db/storage_pools.go` in LXD
/// (`NodeSpecificStorageConfig`).
pub const NODE_SPECIFIC_POOL_CONFIG_KEYS: [&str; 6] = [
    "size",
    "source",
    "volatile.initial_source",
    "zfs.pool_name",
    "lvm.thinpool_name",
    "lvm.vg_name",
];

pub fn is_node_specific(key: &str) -> bool {
    NODE_SPECIFIC_POOL_CONFIG_KEYS.contains(&key)
}

/// Splits `config` into `(node_specific, cluster_wide)`.
pub fn partition(config: &PoolConfig) -> (PoolConfig, PoolConfig) {
    config
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(k, _)| is_node_specific(k))
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown storage driver {0:?}")]
pub struct UnknownDriver(pub String);

/// Backend of a storage pool. Fixed once the pool exists.
///
/// Pools read back from LXD may use a driver not listed here; those are
/// carried verbatim in `Other`. Only the listed drivers can be configured,
/// see [`deserialize_known_driver`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum StorageDriver {
    Dir,
    Zfs,
    Btrfs,
    Lvm,
    Ceph,
    Cephfs,
    Other(String),
}

impl StorageDriver {
    pub fn as_str(&self) -> &str {
        match self {
            StorageDriver::Dir => "dir",
            StorageDriver::Zfs => "zfs",
            StorageDriver::Btrfs => "btrfs",
            StorageDriver::Lvm => "lvm",
            StorageDriver::Ceph => "ceph",
            StorageDriver::Cephfs => "cephfs",
            StorageDriver::Other(s) => s.as_str(),
        }
    }
}

/// Accepts only the drivers listed in [`StorageDriver`].
impl FromStr for StorageDriver {
    type Err = UnknownDriver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match StorageDriver::from(s.to_string()) {
            StorageDriver::Other(s) => Err(UnknownDriver(s)),
            driver => Ok(driver),
        }
    }
}

impl From<String> for StorageDriver {
    fn from(s: String) -> Self {
        match s.as_str() {
            "dir" => StorageDriver::Dir,
            "zfs" => StorageDriver::Zfs,
            "btrfs" => StorageDriver::Btrfs,
            "lvm" => StorageDriver::Lvm,
            "ceph" => StorageDriver::Ceph,
            "cephfs" => StorageDriver::Cephfs,
            _ => StorageDriver::Other(s),
        }
    }
}

impl From<StorageDriver> for String {
    fn from(driver: StorageDriver) -> Self {
        match driver {
            StorageDriver::Other(s) => s,
            driver => driver.as_str().to_string(),
        }
    }
}

impl fmt::Display for StorageDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// For fields naming a driver to configure: unlike plain deserialization,
/// a driver outside [`StorageDriver`]'s list is an error.
pub fn deserialize_known_driver<'de, D>(
    deserializer: D,
) -> Result<StorageDriver, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// Cluster-wide lifecycle of a pool.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum PoolStatus {
    /// Defined on some members, not yet committed cluster-wide.
    Pending,
    Created,
    Errored,
    Unknown,
    Other(String),
}

impl From<String> for PoolStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => PoolStatus::Pending,
            "Created" => PoolStatus::Created,
            "Errored" => PoolStatus::Errored,
            "Unknown" => PoolStatus::Unknown,
            _ => PoolStatus::Other(s),
        }
    }
}

impl From<PoolStatus> for String {
    fn from(status: PoolStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoolStatus::Pending => "Pending",
            PoolStatus::Created => "Created",
            PoolStatus::Errored => "Errored",
            PoolStatus::Unknown => "Unknown",
            PoolStatus::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// A storage pool, from `GET /1.0/storage-pools/<name>`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoragePool {
    pub name: String,
    pub driver: StorageDriver,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: PoolConfig,
    pub status: PoolStatus,
    /// Members on which the pool has been defined. Empty when not clustered.
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Body of `POST /1.0/storage-pools`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoragePoolCreateRequest {
    pub config: PoolConfig,
    pub description: String,
    pub driver: StorageDriver,
    pub name: String,
}

/// Body of `PATCH /1.0/storage-pools/<name>`; absent fields are untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoragePoolPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PoolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StoragePoolPatch {
    pub fn config(config: PoolConfig) -> Self {
        Self { config: Some(config), ..Default::default() }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self { description: Some(description.into()), ..Default::default() }
    }
}
