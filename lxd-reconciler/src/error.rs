// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use lxd_utils::TransportError;
use std::fmt;

/// The LXD request an error arose from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    ClusterInfo,
    ClusterMembers,
    ClusterMember,
    ClusterInit,
    ClusterJoin,
    ClusterLeave,
    MemberState,
    FetchCertificate,
    ListStoragePools,
    GetStoragePool,
    CreateStoragePool,
    UpdateStoragePool,
    DeleteStoragePool,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::ClusterInfo => "get cluster info",
            Operation::ClusterMembers => "list cluster members",
            Operation::ClusterMember => "get cluster member",
            Operation::ClusterInit => "cluster init",
            Operation::ClusterJoin => "cluster join",
            Operation::ClusterLeave => "cluster leave",
            Operation::MemberState => "change cluster member state",
            Operation::FetchCertificate => "fetch member certificate",
            Operation::ListStoragePools => "list storage pools",
            Operation::GetStoragePool => "get storage pool",
            Operation::CreateStoragePool => "create storage pool",
            Operation::UpdateStoragePool => "update storage pool",
            Operation::DeleteStoragePool => "delete storage pool",
        };
        f.write_str(s)
    }
}

/// Failure of a reconciler step. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{operation}: request failed")]
    Transport {
        operation: Operation,
        #[source]
        err: TransportError,
    },

    #[error("{operation}: unexpected response {raw:?}")]
    Protocol {
        operation: Operation,
        raw: String,
        #[source]
        err: serde_json::Error,
    },

    #[error("{operation}: failed request {raw:?}")]
    Convergence { operation: Operation, raw: String },

    #[error("{operation}: failed to encode request body")]
    Encode {
        operation: Operation,
        #[source]
        err: serde_json::Error,
    },

    #[error(
        "storage pool {pool:?}: {property} cannot be changed once the pool \
         exists"
    )]
    ImmutableProperty { pool: String, property: &'static str },

    #[error("cluster member {member:?} is in unrecognized state {status:?}")]
    UnrecognizedMemberStatus { member: String, status: String },

    #[error("{resource}: {parameter} is required")]
    MissingParameter { resource: String, parameter: &'static str },
}

impl Error {
    pub(crate) fn transport(
        operation: Operation,
        err: impl Into<TransportError>,
    ) -> Self {
        Error::Transport { operation, err: err.into() }
    }

    /// The operation the error arose from, if it came from a request.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Error::Transport { operation, .. }
            | Error::Protocol { operation, .. }
            | Error::Convergence { operation, .. }
            | Error::Encode { operation, .. } => Some(*operation),
            Error::ImmutableProperty { .. }
            | Error::UnrecognizedMemberStatus { .. }
            | Error::MissingParameter { .. } => None,
        }
    }
}
