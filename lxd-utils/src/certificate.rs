// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retrieval of an LXD member's server certificate.
//!
//! Joining a cluster requires the certificate of an existing member. It is
//! captured from a direct TLS session with that member **without verifying
//! it**: trust is established out-of-band by the cluster password, which the
//! existing member checks during the join. This is a trust-on-first-use step:
//! whoever answers on the member's address during the join is trusted.

use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use slog::{info, Logger};
use std::net::TcpStream;

#[derive(thiserror::Error, Debug)]
pub enum CertificateError {
    #[error("invalid member address {0:?}: expected <host>:<port>")]
    InvalidAddress(String),

    #[error("failed to connect to {address}")]
    Connect {
        address: String,
        #[source]
        err: std::io::Error,
    },

    #[error("failed to configure TLS client")]
    Configure(#[source] openssl::error::ErrorStack),

    #[error("TLS handshake with {address} failed: {message}")]
    Handshake { address: String, message: String },

    #[error("{address} did not present a certificate")]
    NoPeerCertificate { address: String },

    #[error("failed to encode certificate of {address} as PEM")]
    Encode {
        address: String,
        #[source]
        err: openssl::error::ErrorStack,
    },
}

/// Fetches the PEM-encoded certificate a server presents.
pub trait Api: Send + Sync {
    fn peer_certificate_pem(
        &self,
        address: &str,
    ) -> Result<String, CertificateError>;
}

/// Splits `host:port`, accepting bracketed IPv6 hosts.
fn host_of(address: &str) -> Result<&str, CertificateError> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| CertificateError::InvalidAddress(address.to_string()))?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(CertificateError::InvalidAddress(address.to_string()));
    }
    Ok(host.trim_start_matches('[').trim_end_matches(']'))
}

/// Fetches certificates over the network with OpenSSL.
pub struct PeerCertificate {
    log: Logger,
}

impl PeerCertificate {
    pub fn new(log: &Logger) -> Self {
        Self { log: log.new(slog::o!("component" => "PeerCertificate")) }
    }
}

impl Api for PeerCertificate {
    fn peer_certificate_pem(
        &self,
        address: &str,
    ) -> Result<String, CertificateError> {
        let host = host_of(address)?;
        info!(self.log, "fetching peer certificate"; "address" => address);

        let stream = TcpStream::connect(address).map_err(|err| {
            CertificateError::Connect { address: address.to_string(), err }
        })?;

        let mut builder = SslConnector::builder(SslMethod::tls_client())
            .map_err(CertificateError::Configure)?;
        builder.set_verify(SslVerifyMode::NONE);
        let mut config = builder
            .build()
            .configure()
            .map_err(CertificateError::Configure)?;
        config.set_verify_hostname(false);

        let stream = config.connect(host, stream).map_err(|err| {
            CertificateError::Handshake {
                address: address.to_string(),
                message: err.to_string(),
            }
        })?;
        let cert = stream.ssl().peer_certificate().ok_or_else(|| {
            CertificateError::NoPeerCertificate { address: address.to_string() }
        })?;
        let pem = cert.to_pem().map_err(|err| CertificateError::Encode {
            address: address.to_string(),
            err,
        })?;
        Ok(String::from_utf8_lossy(&pem).to_string())
    }
}
