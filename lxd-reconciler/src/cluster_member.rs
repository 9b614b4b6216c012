// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of this server's cluster membership.
//!
//! A member moves through
//! `Absent -> (bootstrapping | joining) -> Online <-> Evacuated -> Absent`.
//! Bootstrap and join both go through `PUT /1.0/cluster`; there is no pending
//! phase for members. `Online` and `Evacuated` are toggled only through
//! [ClusterMemberReconciler::set_enabled].

use crate::api::LxdApi;
use crate::converge::Ensure;
use crate::error::{Error, Operation};
use lxd_types::cluster::{
    ClusterBootstrapRequest, ClusterJoinRequest, MemberStateAction,
    MemberStateRequest, MemberStatus,
};
use lxd_types::path;
use lxd_utils::certificate;
use lxd_utils::lxc::Method;
use serde::Deserialize;
use slog::{info, Logger};

/// Desired membership of this server.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClusterMemberSpec {
    /// Name this server has (or will have) in the cluster.
    pub name: String,
    #[serde(default)]
    pub ensure: Ensure,
    /// `false` keeps the member evacuated; unmanaged when absent.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Trust password of the cluster; needed to join.
    #[serde(default)]
    pub cluster_password: Option<String>,
    /// `<host>:<port>` other members reach this server on.
    pub address: String,
    /// Existing member to join through. Equal to `address` on the member that
    /// bootstraps the cluster.
    pub join_member: String,
    #[serde(default)]
    pub other_members: Vec<String>,
}

pub struct ClusterMemberReconciler<'a> {
    api: &'a LxdApi,
    certificates: &'a dyn certificate::Api,
    spec: &'a ClusterMemberSpec,
    log: Logger,
}

impl<'a> ClusterMemberReconciler<'a> {
    pub fn new(
        api: &'a LxdApi,
        certificates: &'a dyn certificate::Api,
        spec: &'a ClusterMemberSpec,
    ) -> Self {
        let log = api.log().new(slog::o!("member" => spec.name.clone()));
        Self { api, certificates, spec, log }
    }

    pub fn spec(&self) -> &ClusterMemberSpec {
        self.spec
    }

    /// Whether this server is part of a cluster.
    pub fn exists(&self) -> Result<bool, Error> {
        Ok(self.api.cluster_info()?.enabled)
    }

    /// Bootstraps a new cluster, or joins an existing one through
    /// `join_member`.
    pub fn create(&self) -> Result<(), Error> {
        if self.spec.address == self.spec.join_member {
            self.bootstrap()
        } else {
            self.join()
        }
    }

    fn bootstrap(&self) -> Result<(), Error> {
        info!(
            self.log, "bootstrapping new cluster";
            "address" => &self.spec.address,
        );
        let body =
            ClusterBootstrapRequest::new(&self.spec.address, &self.spec.name);
        self.api.run_operation(
            Operation::ClusterInit,
            Method::Put,
            &path::cluster(),
            Some(&body),
        )?;
        Ok(())
    }

    fn join(&self) -> Result<(), Error> {
        let password = self.spec.cluster_password.as_deref().ok_or_else(|| {
            Error::MissingParameter {
                resource: format!("cluster member {:?}", self.spec.name),
                parameter: "cluster_password",
            }
        })?;
        info!(
            self.log, "joining cluster";
            "address" => &self.spec.address,
            "join_member" => &self.spec.join_member,
        );

        let cluster_certificate = self
            .certificates
            .peer_certificate_pem(&self.spec.join_member)
            .map_err(|err| Error::transport(Operation::FetchCertificate, err))?;
        let body = ClusterJoinRequest {
            cluster_address: self.spec.join_member.clone(),
            cluster_certificate,
            cluster_password: password.to_string(),
            enabled: true,
            server_address: self.spec.address.clone(),
            server_name: self.spec.name.clone(),
        };
        self.api.run_operation(
            Operation::ClusterJoin,
            Method::Put,
            &path::cluster(),
            Some(&body),
        )?;
        Ok(())
    }

    /// Removes this server from its cluster, returning whether it left.
    ///
    /// LXD refuses to remove the only member of a cluster, so when this
    /// server is alone (or not clustered at all) nothing is done.
    pub fn destroy(&self) -> Result<bool, Error> {
        if !self.api.cluster_info()?.enabled {
            info!(self.log, "not part of a cluster; nothing to leave");
            return Ok(false);
        }
        let members = self.api.cluster_member_urls()?;
        if members.len() <= 1 {
            info!(self.log, "last member of the cluster; not leaving");
            return Ok(false);
        }

        info!(self.log, "leaving cluster"; "members" => members.len());
        let raw = self.api.send::<()>(
            Operation::ClusterLeave,
            Method::Delete,
            &path::cluster_member(&self.spec.name),
            None,
        )?;
        if !raw.trim().is_empty() {
            return Err(Error::Convergence {
                operation: Operation::ClusterLeave,
                raw,
            });
        }
        Ok(true)
    }

    /// `true` when the member is online, `false` when evacuated.
    pub fn enabled(&self) -> Result<bool, Error> {
        let member = self.api.cluster_member(&self.spec.name)?;
        match member.status {
            MemberStatus::Online => Ok(true),
            MemberStatus::Evacuated => Ok(false),
            status => Err(Error::UnrecognizedMemberStatus {
                member: self.spec.name.clone(),
                status: status.to_string(),
            }),
        }
    }

    /// Restores (`true`) or evacuates (`false`) the member.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), Error> {
        let action = MemberStateAction::for_enabled(enabled);
        info!(self.log, "changing member state"; "action" => ?action);
        self.api.run_operation(
            Operation::MemberState,
            Method::Post,
            &path::cluster_member_state(&self.spec.name),
            Some(&MemberStateRequest { action }),
        )?;
        Ok(())
    }
}
