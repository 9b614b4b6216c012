// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wrappers around the `lxc` client and the other host facilities used to
//! observe and mutate an LXD server.

pub mod certificate;
pub mod fakes;
pub mod host;
pub mod lxc;

pub use certificate::CertificateError;
pub use host::error::{CommandFailureInfo, ExecutionError};

/// A failure below the LXD API layer: the request never produced a response
/// we could interpret.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),
}
