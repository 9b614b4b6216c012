// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration file for `lxd-reconcile`.

use crate::cluster_member::ClusterMemberSpec;
use crate::storage_pool::StoragePoolSpec;
use camino::{Utf8Path, Utf8PathBuf};
use dropshot::ConfigLogging;
use serde::Deserialize;

/// The whole configuration file: logging, how to reach LXD, and the desired
/// state of every managed resource.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub log: ConfigLogging,
    #[serde(default)]
    pub lxc: LxcConfig,
    #[serde(default)]
    pub cluster_member: Option<ClusterMemberSpec>,
    #[serde(default)]
    pub storage_pool: Vec<StoragePoolSpec>,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("read {path:?}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("parse {path:?}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        err: toml::de::Error,
    },
}

impl Config {
    pub fn from_file(path: &Utf8Path) -> Result<Config, LoadError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| LoadError::Io { path: path.to_owned(), err })?;
        toml::from_str(&contents)
            .map_err(|err| LoadError::Parse { path: path.to_owned(), err })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LxcConfig {
    /// Path to the `lxc` client.
    #[serde(default = "LxcConfig::default_binary")]
    pub binary: Utf8PathBuf,
}

impl LxcConfig {
    fn default_binary() -> Utf8PathBuf {
        Utf8PathBuf::from(lxd_utils::lxc::LXC)
    }
}

impl Default for LxcConfig {
    fn default() -> Self {
        Self { binary: Self::default_binary() }
    }
}
