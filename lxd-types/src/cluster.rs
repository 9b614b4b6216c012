// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cluster-related types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The local server's view of clustering, from `GET /1.0/cluster`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterInfo {
    /// Whether this server is a member of a cluster.
    pub enabled: bool,
    /// This server's member name; empty when not clustered.
    #[serde(default)]
    pub server_name: String,
}

/// One member of a cluster, from `GET /1.0/cluster/members/<name>`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterMember {
    #[serde(rename = "server_name")]
    pub name: String,
    pub status: MemberStatus,
    #[serde(default)]
    pub roles: Vec<String>,
}

// LXD reports member status as free-form text. Only `Online` and `Evacuated`
// matter for reconciliation, but the other values LXD uses are kept distinct
// so errors can name them, and anything unforeseen is carried verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum MemberStatus {
    Online,
    Evacuated,
    Offline,
    Blocked,
    Pending,
    Other(String),
}

impl From<String> for MemberStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Online" => MemberStatus::Online,
            "Evacuated" => MemberStatus::Evacuated,
            "Offline" => MemberStatus::Offline,
            "Blocked" => MemberStatus::Blocked,
            "Pending" => MemberStatus::Pending,
            _ => MemberStatus::Other(s),
        }
    }
}

impl From<MemberStatus> for String {
    fn from(status: MemberStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemberStatus::Online => "Online",
            MemberStatus::Evacuated => "Evacuated",
            MemberStatus::Offline => "Offline",
            MemberStatus::Blocked => "Blocked",
            MemberStatus::Pending => "Pending",
            MemberStatus::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// Body of the `PUT /1.0/cluster` request that creates a new cluster with
/// this server as its first member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterBootstrapRequest {
    pub enabled: bool,
    pub server_address: String,
    pub server_name: String,
}

impl ClusterBootstrapRequest {
    pub fn new(server_address: &str, server_name: &str) -> Self {
        Self {
            enabled: true,
            server_address: server_address.to_string(),
            server_name: server_name.to_string(),
        }
    }
}

/// Body of the `PUT /1.0/cluster` request that joins this server to an
/// existing cluster through `cluster_address`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterJoinRequest {
    pub cluster_address: String,
    /// PEM certificate of the member at `cluster_address`.
    pub cluster_certificate: String,
    pub cluster_password: String,
    pub enabled: bool,
    pub server_address: String,
    pub server_name: String,
}

/// Body of `POST /1.0/cluster/members/<name>/state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MemberStateRequest {
    pub action: MemberStateAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStateAction {
    /// Move instances off the member and stop using it.
    Evacuate,
    /// Bring an evacuated member back into service.
    Restore,
}

impl MemberStateAction {
    /// The action that leaves a member enabled (`true`) or evacuated.
    pub fn for_enabled(enabled: bool) -> Self {
        if enabled {
            MemberStateAction::Restore
        } else {
            MemberStateAction::Evacuate
        }
    }
}
