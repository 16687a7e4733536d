// Probe request/outcome: one HTTP(S) request against a local service

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PROBE_METHOD, DEFAULT_PROBE_PATH, DEFAULT_PROBE_TIMEOUT};
use crate::domain::address::{classify_address, AddressFamily};

/// Client key + certificate (PEM files) presented when probing over TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub key_file: PathBuf,
    pub cert_file: PathBuf,
}

/// Server certificate checking when probing over TLS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsVerification {
    /// Verify the server certificate chain and hostname
    #[default]
    Verify,
    /// Accept any server certificate. Only for self-signed development servers.
    AcceptAny,
}

/// A single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub host: String,
    pub port: u16,
    pub method: String,
    pub path: String,
    pub tls: Option<TlsMaterial>,
    pub verification: TlsVerification,
    pub timeout: Duration,
}

impl ProbeRequest {
    /// Plain-HTTP `GET /` with the default timeout
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            method: DEFAULT_PROBE_METHOD.to_string(),
            path: DEFAULT_PROBE_PATH.to_string(),
            tls: None,
            verification: TlsVerification::default(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn verification(mut self, verification: TlsVerification) -> Self {
        self.verification = verification;
        self
    }

    /// Switch to HTTPS, presenting `key_file` + `cert_file` as client identity
    pub fn tls(mut self, key_file: impl Into<PathBuf>, cert_file: impl Into<PathBuf>) -> Self {
        self.tls = Some(TlsMaterial {
            key_file: key_file.into(),
            cert_file: cert_file.into(),
        });
        self
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Absolute URL for this request
    ///
    /// IPv6 literals are bracketed and a missing leading `/` on the path is added.
    ///
    /// # Example
    /// ```
    /// use devhost_core::domain::ProbeRequest;
    ///
    /// let req = ProbeRequest::new("::1", 9090).path("heartbeat");
    /// assert_eq!(req.url(), "http://[::1]:9090/heartbeat");
    /// ```
    pub fn url(&self) -> String {
        let scheme = if self.is_tls() { "https" } else { "http" };
        let host = match classify_address(&self.host) {
            Some(AddressFamily::V6) => format!("[{}]", self.host),
            _ => self.host.clone(),
        };
        let slash = if self.path.starts_with('/') { "" } else { "/" };
        format!("{}://{}:{}{}{}", scheme, host, self.port, slash, self.path)
    }
}

/// Result of a probe that reached the transport layer without failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// HTTP 200 with its full body
    Ready { body: Vec<u8> },
    /// Any status other than 200; the body is discarded
    Unexpected { code: u16 },
    /// Connection refused: nothing is listening yet
    Pending,
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProbeOutcome::Ready { .. })
    }

    /// Collapse to "body or no response": non-200 and refused both map to `None`
    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            ProbeOutcome::Ready { body } => Some(body),
            ProbeOutcome::Unexpected { .. } | ProbeOutcome::Pending => None,
        }
    }
}
