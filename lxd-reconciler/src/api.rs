// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed access to the LXD API over `lxc query`.

use crate::error::{Error, Operation};
use lxd_types::cluster::{ClusterInfo, ClusterMember};
use lxd_types::operation::OperationResponse;
use lxd_types::path;
use lxd_types::storage::StoragePool;
use lxd_utils::lxc::{Lxc, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use slog::{debug, Logger};

/// Reads and writes LXD state. Nothing is cached: every call goes to LXD.
pub struct LxdApi {
    lxc: Lxc,
    log: Logger,
}

impl LxdApi {
    pub fn new(lxc: Lxc, log: &Logger) -> Self {
        Self { lxc, log: log.new(slog::o!("component" => "LxdApi")) }
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn cluster_info(&self) -> Result<ClusterInfo, Error> {
        self.get(Operation::ClusterInfo, &path::cluster())
    }

    /// URLs of every member of the cluster.
    pub fn cluster_member_urls(&self) -> Result<Vec<String>, Error> {
        self.get(Operation::ClusterMembers, &path::cluster_members())
    }

    pub fn cluster_member(&self, name: &str) -> Result<ClusterMember, Error> {
        self.get(Operation::ClusterMember, &path::cluster_member(name))
    }

    /// URLs of every storage pool, including pools still pending.
    pub fn storage_pool_urls(&self) -> Result<Vec<String>, Error> {
        self.get(Operation::ListStoragePools, &path::storage_pools(None))
    }

    /// Fetches one pool. With a `target`, member-specific config of that
    /// member is included.
    pub fn storage_pool(
        &self,
        name: &str,
        target: Option<&str>,
    ) -> Result<StoragePool, Error> {
        self.get(Operation::GetStoragePool, &path::storage_pool(name, target))
    }

    /// Looks `name` up in the pool list before fetching it, so a missing pool
    /// is `None` rather than an API error.
    pub fn find_storage_pool(
        &self,
        name: &str,
    ) -> Result<Option<StoragePool>, Error> {
        let urls = self.storage_pool_urls()?;
        if !urls.iter().any(|url| path::name_from_url(url) == name) {
            return Ok(None);
        }
        self.storage_pool(name, None).map(Some)
    }

    /// Every storage pool LXD knows about, pending or not.
    pub fn list_storage_pools(&self) -> Result<Vec<StoragePool>, Error> {
        self.storage_pool_urls()?
            .iter()
            .map(|url| self.storage_pool(path::name_from_url(url), None))
            .collect()
    }

    /// Issues a request whose only required outcome is that `lxc` succeeds.
    /// Returns the raw response.
    pub fn send<B: Serialize>(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, Error> {
        let body = body
            .map(|body| serde_json::to_string(body))
            .transpose()
            .map_err(|err| Error::Encode { operation, err })?;
        debug!(
            self.log, "sending request";
            "operation" => %operation,
            "method" => %method,
            "path" => path,
        );
        self.lxc
            .query(method, path, body.as_deref())
            .map_err(|err| Error::transport(operation, err))
    }

    /// Issues a request that runs as an LXD operation, and requires the
    /// operation to have succeeded.
    pub fn run_operation<B: Serialize>(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<OperationResponse, Error> {
        let raw = self.send(operation, method, path, body)?;
        let response: OperationResponse = parse(operation, &raw)?;
        if !response.is_success() {
            return Err(Error::Convergence { operation, raw });
        }
        Ok(response)
    }

    fn get<T: DeserializeOwned>(
        &self,
        operation: Operation,
        path: &str,
    ) -> Result<T, Error> {
        let raw = self.send::<()>(operation, Method::Get, path, None)?;
        parse(operation, &raw)
    }
}

fn parse<T: DeserializeOwned>(
    operation: Operation,
    raw: &str,
) -> Result<T, Error> {
    serde_json::from_str(raw).map_err(|err| Error::Protocol {
        operation,
        raw: raw.to_string(),
        err,
    })
}
