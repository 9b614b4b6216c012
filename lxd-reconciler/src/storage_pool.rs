// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of storage pools.
//!
//! On a single server a pool is created with one request. In a cluster LXD
//! needs every member to define the pool locally (`?target=<member>`, with
//! only node-specific config) before a final untargeted create commits it
//! cluster-wide:
//!
//! `Absent -> Pending(some locations) -> Pending(all locations) -> Created`
//!
//! Each call to [StoragePoolReconciler::create] makes at most one of those
//! transitions, deciding which from the pool's `locations` as LXD reports
//! them at that moment. Several passes (one per member, then one more) are
//! therefore needed to reach `Created`.

use crate::api::LxdApi;
use crate::converge::Ensure;
use crate::error::{Error, Operation};
use lxd_types::cluster::ClusterInfo;
use lxd_types::path;
use lxd_types::storage::{
    deserialize_known_driver, partition, PoolConfig, PoolStatus,
    StorageDriver, StoragePool, StoragePoolCreateRequest, StoragePoolPatch,
};
use lxd_utils::lxc::Method;
use serde::Deserialize;
use slog::{debug, info, Logger};

/// Desired state of one storage pool.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoragePoolSpec {
    pub name: String,
    #[serde(default)]
    pub ensure: Ensure,
    #[serde(deserialize_with = "deserialize_known_driver")]
    pub driver: StorageDriver,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: PoolConfig,
    /// Backing device or dataset. Merged into `config` as `source` on create
    /// when non-empty.
    #[serde(default)]
    pub source: String,
}

impl StoragePoolSpec {
    /// Config sent on create: `config`, plus `source` when given.
    pub fn create_config(&self) -> PoolConfig {
        let mut config = self.config.clone();
        if !self.source.is_empty() {
            config.insert("source".to_string(), self.source.clone());
        }
        config
    }
}

pub struct StoragePoolReconciler<'a> {
    api: &'a LxdApi,
    spec: &'a StoragePoolSpec,
    log: Logger,
}

impl<'a> StoragePoolReconciler<'a> {
    pub fn new(api: &'a LxdApi, spec: &'a StoragePoolSpec) -> Self {
        let log = api.log().new(slog::o!("pool" => spec.name.clone()));
        Self { api, spec, log }
    }

    pub fn spec(&self) -> &StoragePoolSpec {
        self.spec
    }

    /// Whether the pool is fully created.
    ///
    /// A pool still `Pending` somewhere in the cluster reads as absent, so
    /// that [Self::create] keeps being called until it is committed.
    pub fn exists(&self) -> Result<bool, Error> {
        let pool = self.api.find_storage_pool(&self.spec.name)?;
        Ok(pool.is_some_and(|pool| pool.status != PoolStatus::Pending))
    }

    /// Advances the pool one step towards `Created`.
    pub fn create(&self) -> Result<(), Error> {
        let cluster = self.api.cluster_info()?;
        if !cluster.enabled {
            info!(
                self.log, "creating storage pool";
                "driver" => %self.spec.driver,
            );
            return self.post(self.spec.create_config(), None);
        }

        let (node_specific, cluster_wide) =
            partition(&self.spec.create_config());
        let member = cluster.server_name.as_str();
        let needs_member = match self.api.find_storage_pool(&self.spec.name)? {
            None => true,
            Some(pool) => {
                pool.status == PoolStatus::Pending
                    && !pool.locations.iter().any(|l| l == member)
            }
        };

        if needs_member {
            info!(
                self.log, "defining storage pool on member";
                "member" => member,
                "driver" => %self.spec.driver,
            );
            self.post(node_specific, Some(member))
        } else {
            info!(self.log, "committing storage pool across cluster");
            self.post(cluster_wide, None)
        }
    }

    fn post(
        &self,
        config: PoolConfig,
        target: Option<&str>,
    ) -> Result<(), Error> {
        let body = StoragePoolCreateRequest {
            config,
            description: self.spec.description.clone(),
            driver: self.spec.driver.clone(),
            name: self.spec.name.clone(),
        };
        self.api.send(
            Operation::CreateStoragePool,
            Method::Post,
            &path::storage_pools(target),
            Some(&body),
        )?;
        Ok(())
    }

    pub fn destroy(&self) -> Result<(), Error> {
        info!(self.log, "deleting storage pool");
        self.api.send::<()>(
            Operation::DeleteStoragePool,
            Method::Delete,
            &path::storage_pool(&self.spec.name, None),
            None,
        )?;
        Ok(())
    }

    /// The pool's config, limited to keys present in the desired config.
    ///
    /// LXD adds keys of its own (`volatile.initial_source`, `source`, ...)
    /// which are not drift. In a cluster, this member's view is read so that
    /// node-specific keys are included.
    pub fn config(&self) -> Result<PoolConfig, Error> {
        let cluster = self.api.cluster_info()?;
        let pool = self.api.storage_pool(&self.spec.name, target(&cluster))?;
        Ok(pool
            .config
            .into_iter()
            .filter(|(key, _)| self.spec.config.contains_key(key))
            .collect())
    }

    /// Updates config. In a cluster node-specific keys are written to this
    /// member and the rest cluster-wide, in two requests.
    pub fn set_config(&self, config: &PoolConfig) -> Result<(), Error> {
        let cluster = self.api.cluster_info()?;
        match target(&cluster) {
            None => self.patch(StoragePoolPatch::config(config.clone()), None),
            Some(member) => {
                let (node_specific, cluster_wide) = partition(config);
                debug!(
                    self.log, "updating storage pool config";
                    "member" => member,
                    "node_specific" => node_specific.len(),
                    "cluster_wide" => cluster_wide.len(),
                );
                self.patch(
                    StoragePoolPatch::config(node_specific),
                    Some(member),
                )?;
                self.patch(StoragePoolPatch::config(cluster_wide), None)
            }
        }
    }

    pub fn description(&self) -> Result<String, Error> {
        Ok(self.pool()?.description)
    }

    pub fn set_description(&self, description: &str) -> Result<(), Error> {
        self.patch(StoragePoolPatch::description(description), None)
    }

    pub fn driver(&self) -> Result<StorageDriver, Error> {
        Ok(self.pool()?.driver)
    }

    /// Always fails: LXD cannot change the driver of an existing pool.
    pub fn set_driver(&self, _driver: StorageDriver) -> Result<(), Error> {
        Err(Error::ImmutableProperty {
            pool: self.spec.name.clone(),
            property: "driver",
        })
    }

    fn pool(&self) -> Result<StoragePool, Error> {
        self.api.storage_pool(&self.spec.name, None)
    }

    fn patch(
        &self,
        body: StoragePoolPatch,
        target: Option<&str>,
    ) -> Result<(), Error> {
        self.api.send(
            Operation::UpdateStoragePool,
            Method::Patch,
            &path::storage_pool(&self.spec.name, target),
            Some(&body),
        )?;
        Ok(())
    }
}

fn target(cluster: &ClusterInfo) -> Option<&str> {
    cluster.enabled.then_some(cluster.server_name.as_str())
}
