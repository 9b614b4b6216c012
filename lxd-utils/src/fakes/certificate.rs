// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::certificate::Api;
use crate::certificate::CertificateError;
use std::sync::Arc;
use std::sync::Mutex;

/// A fake implementation of [crate::certificate::PeerCertificate].
///
/// Hands out a fixed certificate without touching the network, and remembers
/// which addresses were asked for.
pub struct PeerCertificate {
    pem: String,
    requests: Mutex<Vec<String>>,
}

impl PeerCertificate {
    pub fn new(pem: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { pem: pem.into(), requests: Mutex::new(Vec::new()) })
    }

    /// Addresses certificates were requested from, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Api for PeerCertificate {
    fn peer_certificate_pem(
        &self,
        address: &str,
    ) -> Result<String, CertificateError> {
        self.requests.lock().unwrap().push(address.to_string());
        Ok(self.pem.clone())
    }
}
