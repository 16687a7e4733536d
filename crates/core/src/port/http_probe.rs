// HTTP Probe Port
// One request per call; "connection refused" is an outcome, not an error

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{ProbeOutcome, ProbeRequest};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Probe errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read TLS material {}: {source}", .path.display())]
    TlsMaterial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TLS identity: {0}")]
    TlsIdentity(String),

    #[error("Failed to start probe runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        url: String,
        timeout: Duration,
        #[source]
        source: BoxError,
    },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },
}

impl ProbeError {
    /// The `std::io::ErrorKind` at the root of this error, if there is one
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            ProbeError::TlsMaterial { source, .. } => Some(source.kind()),
            ProbeError::Runtime(source) => Some(source.kind()),
            ProbeError::Timeout { .. } => Some(std::io::ErrorKind::TimedOut),
            ProbeError::Transport { source, .. } => find_io_kind(source.as_ref()),
            _ => None,
        }
    }
}

/// Walk an error chain looking for an `std::io::Error`
pub fn find_io_kind(err: &(dyn std::error::Error + 'static)) -> Option<std::io::ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        current = e.source();
    }
    None
}

/// HTTP Probe trait
///
/// Implementations:
/// - ReqwestHttpProbe: reqwest client on a per-call runtime, both dropped after every call
pub trait HttpProbe: Send + Sync {
    /// Issue `request` once and classify the response
    ///
    /// # Returns
    /// - ProbeOutcome::Ready with the body on HTTP 200
    /// - ProbeOutcome::Unexpected on any other status
    /// - ProbeOutcome::Pending if the connection was refused
    ///
    /// # Errors
    /// Every other failure, with its original cause attached
    fn probe(&self, request: &ProbeRequest) -> Result<ProbeOutcome, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug, Error)]
    #[error("wrapper")]
    struct Wrapper(#[source] io::Error);

    #[test]
    fn test_io_kind_walks_source_chain() {
        let err = ProbeError::Transport {
            url: "http://127.0.0.1:1/".to_string(),
            source: Box::new(Wrapper(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))),
        };
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionReset));
    }

    #[test]
    fn test_io_kind_none_without_io_error() {
        let err = ProbeError::Transport {
            url: "http://127.0.0.1:1/".to_string(),
            source: "bad response".into(),
        };
        assert_eq!(err.io_kind(), None);
        assert_eq!(ProbeError::InvalidRequest("x".into()).io_kind(), None);
    }

    #[test]
    fn test_timeout_kind_and_cause() {
        let err = ProbeError::Timeout {
            url: "http://localhost:9/".to_string(),
            timeout: Duration::from_secs(1),
            source: "operation timed out".into(),
        };
        assert_eq!(err.io_kind(), Some(io::ErrorKind::TimedOut));

        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("operation timed out"));
    }
}
