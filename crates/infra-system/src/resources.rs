// Resource providers
// reason: rust-embed for assets compiled into the binary; a directory provider for assets shipped alongside it
use std::path::{Component, Path, PathBuf};

use rust_embed::RustEmbed;
use tracing::{debug, warn};

use devhost_core::port::resource_provider::{ResourceError, ResourceProvider};

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Assets embedded from `crates/infra-system/assets/` at build time
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedResources;

impl EmbeddedResources {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceProvider for EmbeddedResources {
    fn load(&self, name: &str) -> Result<Vec<u8>, ResourceError> {
        Assets::get(name)
            .map(|file| file.data.into_owned())
            .ok_or_else(|| ResourceError::NotFound(name.to_string()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Assets::iter().map(|name| name.into_owned()).collect();
        names.sort();
        names
    }
}

/// Assets read from a directory at runtime
///
/// Names are `/`-separated paths relative to `root`; names that would escape
/// the root (absolute paths, `..`) are rejected.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, ResourceError> {
        let relative = Path::new(name);
        let contained = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if !contained {
            return Err(ResourceError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn collect(&self, dir: &Path, prefix: &str, names: &mut Vec<String>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot list resource directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let name = format!("{}{}", prefix, file_name);
            match entry.file_type() {
                Ok(t) if t.is_dir() => self.collect(&entry.path(), &format!("{}/", name), names),
                Ok(t) if t.is_file() => names.push(name),
                _ => {}
            }
        }
    }
}

impl ResourceProvider for DirectoryResources {
    fn load(&self, name: &str) -> Result<Vec<u8>, ResourceError> {
        let path = self.resolve(name)?;
        debug!(resource = %name, path = %path.display(), "Loading resource from directory");

        match std::fs::read(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ResourceError::NotFound(name.to_string()))
            }
            Err(source) => Err(ResourceError::Io { path, source }),
        }
    }

    fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect(&self.root, "", &mut names);
        names.sort();
        names
    }
}
