// Resource extraction use case
// Copies a bundled asset verbatim into a directory, named after its basename

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::port::resource_provider::{ResourceError, ResourceProvider};

/// Writes assets from a `ResourceProvider` to disk
pub struct ResourceExtractor {
    provider: Arc<dyn ResourceProvider>,
}

impl ResourceExtractor {
    /// Create a new extractor
    ///
    /// # Example
    /// ```ignore
    /// let extractor = ResourceExtractor::new(Arc::new(EmbeddedResources));
    /// let path = extractor.extract("openssl.cnf", Path::new("/tmp/certs"))?;
    /// ```
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Write `name` to `<target_dir>/<basename(name)>` and return that path
    ///
    /// An existing file at the target path is overwritten.
    ///
    /// # Errors
    /// - ResourceError::InvalidName if `name` has no file name component
    /// - ResourceError::NotFound if the provider has no such asset
    /// - ResourceError::Io if the target cannot be written
    pub fn extract(&self, name: &str, target_dir: &Path) -> Result<PathBuf, ResourceError> {
        let file_name = basename(name)?;
        let content = self.provider.load(name)?;
        let target = target_dir.join(file_name);

        debug!(resource = %name, target = %target.display(), bytes = content.len(), "Writing resource");

        std::fs::write(&target, &content).map_err(|source| ResourceError::Io {
            path: target.clone(),
            source,
        })?;

        info!(resource = %name, target = %target.display(), "Resource extracted");
        Ok(target)
    }

    /// Names the underlying provider can serve
    pub fn available(&self) -> Vec<String> {
        self.provider.names()
    }
}

fn basename(name: &str) -> Result<&OsStr, ResourceError> {
    if name.ends_with('/') || name.ends_with('\\') {
        return Err(ResourceError::InvalidName(name.to_string()));
    }
    Path::new(name)
        .file_name()
        .ok_or_else(|| ResourceError::InvalidName(name.to_string()))
}
