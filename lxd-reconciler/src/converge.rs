// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One convergence pass: compare each declared resource against LXD and make
//! at most one lifecycle change to it.

use crate::api::LxdApi;
use crate::cluster_member::{ClusterMemberReconciler, ClusterMemberSpec};
use crate::error::Error;
use crate::storage_pool::{StoragePoolReconciler, StoragePoolSpec};
use lxd_utils::certificate;
use serde::Deserialize;
use slog::{error, info};
use std::fmt;

/// Whether a declared resource should exist.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

/// What a pass did to one resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Destroyed,
    /// Properties that were changed, in the order they were set.
    Updated(Vec<&'static str>),
    Unchanged,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => f.write_str("created"),
            Outcome::Destroyed => f.write_str("destroyed"),
            Outcome::Updated(props) => {
                write!(f, "updated {}", props.join(", "))
            }
            Outcome::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Brings this server's membership in line with its spec.
pub fn converge_cluster_member(
    member: &ClusterMemberReconciler<'_>,
) -> Result<Outcome, Error> {
    let spec = member.spec();
    match (spec.ensure, member.exists()?) {
        (Ensure::Present, false) => {
            member.create()?;
            Ok(Outcome::Created)
        }
        (Ensure::Present, true) => match spec.enabled {
            Some(enabled) if member.enabled()? != enabled => {
                member.set_enabled(enabled)?;
                Ok(Outcome::Updated(vec!["enabled"]))
            }
            _ => Ok(Outcome::Unchanged),
        },
        (Ensure::Absent, true) => {
            if member.destroy()? {
                Ok(Outcome::Destroyed)
            } else {
                // The last member of a cluster stays.
                Ok(Outcome::Unchanged)
            }
        }
        (Ensure::Absent, false) => Ok(Outcome::Unchanged),
    }
}

/// Brings one storage pool in line with its spec.
///
/// A pool being rolled out across a cluster gets one `create` step per pass.
pub fn converge_storage_pool(
    pool: &StoragePoolReconciler<'_>,
) -> Result<Outcome, Error> {
    let spec = pool.spec();
    match (spec.ensure, pool.exists()?) {
        (Ensure::Present, false) => {
            pool.create()?;
            Ok(Outcome::Created)
        }
        (Ensure::Present, true) => {
            let mut changed = Vec::new();
            if pool.driver()? != spec.driver {
                pool.set_driver(spec.driver.clone())?;
                changed.push("driver");
            }
            if pool.description()? != spec.description {
                pool.set_description(&spec.description)?;
                changed.push("description");
            }
            if pool.config()? != spec.config {
                pool.set_config(&spec.config)?;
                changed.push("config");
            }
            if changed.is_empty() {
                Ok(Outcome::Unchanged)
            } else {
                Ok(Outcome::Updated(changed))
            }
        }
        (Ensure::Absent, true) => {
            pool.destroy()?;
            Ok(Outcome::Destroyed)
        }
        (Ensure::Absent, false) => Ok(Outcome::Unchanged),
    }
}

/// Result of converging one resource.
#[derive(Debug)]
pub struct ResourceResult {
    /// e.g. `cluster_member member01`, `storage_pool default`
    pub resource: String,
    pub result: Result<Outcome, Error>,
}

/// Converges the cluster member first, then every pool in order.
///
/// A failure ends work on that resource only; the rest are still attempted.
pub fn converge_all(
    api: &LxdApi,
    certificates: &dyn certificate::Api,
    cluster_member: Option<&ClusterMemberSpec>,
    storage_pools: &[StoragePoolSpec],
) -> Vec<ResourceResult> {
    let log = api.log();
    let mut results = Vec::new();

    if let Some(spec) = cluster_member {
        let member = ClusterMemberReconciler::new(api, certificates, spec);
        results.push(ResourceResult {
            resource: format!("cluster_member {}", spec.name),
            result: converge_cluster_member(&member),
        });
    }
    for spec in storage_pools {
        let pool = StoragePoolReconciler::new(api, spec);
        results.push(ResourceResult {
            resource: format!("storage_pool {}", spec.name),
            result: converge_storage_pool(&pool),
        });
    }

    for ResourceResult { resource, result } in &results {
        match result {
            Ok(outcome) => {
                info!(
                    log, "converged";
                    "resource" => resource,
                    "outcome" => %outcome,
                )
            }
            Err(err) => error!(
                log, "failed to converge";
                "resource" => resource,
                "error" => %err,
                "cause" => ?std::error::Error::source(err)
                    .map(|s| s.to_string()),
            ),
        }
    }
    results
}
