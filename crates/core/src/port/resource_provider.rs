// Resource Provider Port
// Read-only lookup of bundled assets by logical name (e.g. "certs/openssl.cnf")

use std::path::PathBuf;

use thiserror::Error;

/// Resource errors
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid resource name: {0:?}")]
    InvalidName(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resource Provider trait
///
/// Implementations:
/// - EmbeddedResources: assets compiled into the binary
/// - DirectoryResources: assets read from a directory at runtime
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
pub trait ResourceProvider: Send + Sync {
    /// Full contents of the named asset
    ///
    /// # Errors
    /// - ResourceError::NotFound if no asset has this name
    /// - ResourceError::Io if the asset exists but cannot be read
    fn load(&self, name: &str) -> Result<Vec<u8>, ResourceError>;

    /// Names of every available asset, sorted
    fn names(&self) -> Vec<String>;
}
