//! Probe call and response classification
//!
//! A probe is one authenticated OPTIONS request against the ActiveSync
//! endpoint for one candidate username. The response maps to a
//! [`Classification`] through a fixed case table; that mapping is the
//! contract the rest of the pipeline depends on, so it lives in a pure
//! function with exhaustive tests.

use crate::error::ProbeError;
use reqwest::blocking::Client;
use reqwest::{Method, Url};
use std::time::Duration;

/// Header naming the ActiveSync protocol revision spoken by the client.
const AS_PROTOCOL_HEADER: &str = "MS-ASProtocolVersion";

/// Protocol revision sent with every probe.
const AS_PROTOCOL_VERSION: &str = "14.0";

/// Header carrying the server-side error indicator on 404 responses.
const CAS_ERROR_HEADER: &str = "X-CasErrorCode";

/// Error indicator value identifying an unknown account.
const USER_NOT_FOUND: &str = "UserNotFound";

/// Outcome category assigned to a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Account exists; the password was rejected.
    ValidUser,
    /// Server explicitly reported the account as unknown.
    InvalidUser,
    /// Credentials accepted but a second factor blocked the login.
    ValidPasswordSecondFactor,
    /// Full login succeeded.
    ValidLogin,
    /// Inconclusive response or transport failure.
    Unknown,
}

impl Classification {
    /// One-character outcome marker used in output records.
    pub fn symbol(self) -> char {
        match self {
            Classification::ValidUser => '+',
            Classification::InvalidUser => '-',
            Classification::ValidPasswordSecondFactor => '#',
            Classification::ValidLogin => '!',
            Classification::Unknown => '?',
        }
    }

    /// Stable record name written to the output file.
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::ValidUser => "VALID_USER",
            Classification::InvalidUser => "INVALID_USER",
            Classification::ValidPasswordSecondFactor => "VALID_PASSWD_2FA",
            Classification::ValidLogin => "VALID_LOGIN",
            Classification::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a response status and the 404 error indicator to a classification.
///
/// 401 means the account exists but the password was wrong. 404 is only
/// conclusive when the server names the account as unknown; without the
/// indicator it stays inconclusive. 403 means the credentials were accepted
/// and a second factor stood in the way. 200 is a full login.
pub fn classify(status: u16, user_not_found: bool) -> Classification {
    match status {
        401 => Classification::ValidUser,
        404 if user_not_found => Classification::InvalidUser,
        403 => Classification::ValidPasswordSecondFactor,
        200 => Classification::ValidLogin,
        _ => Classification::Unknown,
    }
}

/// Raw outcome of a completed probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status returned by the endpoint.
    pub status: u16,

    /// Classification derived from status and headers.
    pub classification: Classification,
}

/// Classified result for one candidate, as consumed by the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// The candidate identity that was probed.
    pub username: String,

    /// Outcome category.
    pub classification: Classification,

    /// Response status, absent when the probe failed at the transport layer.
    pub status: Option<u16>,
}

/// A single authentication attempt against the target endpoint.
///
/// Implementations must not block past their configured timeout. Transport
/// failures surface as [`ProbeError`] and are absorbed by the calling
/// worker, never propagated out of the pool.
pub trait Prober: Send + Sync {
    /// Probe one candidate username with the fixed credential.
    fn probe(&self, username: &str) -> Result<ProbeResponse, ProbeError>;
}

/// Prober speaking the ActiveSync dialect: an OPTIONS request carrying HTTP
/// Basic credentials and the protocol version header.
pub struct ActiveSyncProber {
    client: Client,
    endpoint: Url,
    password: String,
}

impl ActiveSyncProber {
    /// Build a prober with the per-probe timeout baked into the client.
    pub fn new(endpoint: Url, password: String, timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProbeError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint,
            password,
        })
    }
}

impl Prober for ActiveSyncProber {
    fn probe(&self, username: &str) -> Result<ProbeResponse, ProbeError> {
        let response = self
            .client
            .request(Method::OPTIONS, self.endpoint.clone())
            .header(AS_PROTOCOL_HEADER, AS_PROTOCOL_VERSION)
            .basic_auth(username, Some(&self.password))
            .send()
            .map_err(|source| ProbeError::Transport {
                endpoint: self.endpoint.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let user_not_found = response
            .headers()
            .get(CAS_ERROR_HEADER)
            .map(|value| value.as_bytes() == USER_NOT_FOUND.as_bytes())
            .unwrap_or(false);

        Ok(ProbeResponse {
            status,
            classification: classify(status, user_not_found),
        })
    }
}
