// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wraps `lxc query`, the raw REST passthrough of the LXD client.

use crate::host::BoxedExecutor;
use crate::ExecutionError;
use camino::Utf8PathBuf;
use std::fmt;
use std::process::Command;

pub const LXC: &str = "lxc";

/// HTTP method of an LXD API request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issues requests against the LXD API through the `lxc` client.
///
/// `lxc query` prints the response metadata on success and exits non-zero
/// (with the error on stderr) when the API rejects the request. Operations are
/// waited on, so asynchronous requests print the finished operation.
pub struct Lxc {
    executor: BoxedExecutor,
    binary: Utf8PathBuf,
}

impl Lxc {
    pub fn new(executor: BoxedExecutor) -> Self {
        Self { executor, binary: Utf8PathBuf::from(LXC) }
    }

    pub fn with_binary(mut self, binary: impl Into<Utf8PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn binary(&self) -> &Utf8PathBuf {
        &self.binary
    }

    /// Returns the raw response text of `method path`, sending `body` as the
    /// request payload when given.
    pub fn query(
        &self,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<String, ExecutionError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("query").arg("--wait").arg("-X").arg(method.as_str());
        if let Some(body) = body {
            cmd.arg("--data").arg(body);
        }
        cmd.arg(path);

        let output = self.executor.execute(&mut cmd)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
