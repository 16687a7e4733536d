//! Layered configuration: defaults, then a TOML file, then `DEVHOST_*` environment variables

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;

use devhost_core::constants::DEFAULT_PROBE_TIMEOUT;
use devhost_core::domain::TlsVerification;

pub const ENV_PREFIX: &str = "DEVHOST";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub probe: ProbeSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeSettings {
    pub timeout_ms: u64,
    pub verification: TlsVerification,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    pub filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Settings {
    /// Load settings
    ///
    /// An explicit `path` must exist; otherwise the platform config file
    /// (`<config dir>/devhost/config.toml`) is read if present.
    ///
    /// # Environment Variables
    ///
    /// - `DEVHOST_PROBE__TIMEOUT_MS`: probe timeout in milliseconds (default: 1000)
    /// - `DEVHOST_PROBE__VERIFICATION`: `verify` or `accept_any` (default: verify)
    /// - `DEVHOST_LOG__FORMAT`: `pretty` or `json` (default: pretty)
    /// - `DEVHOST_LOG__FILTER`: tracing filter when `RUST_LOG` is unset (default: devhost=warn)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(File::from(path).required(true)),
            None => default_config_path().map(|path| File::from(path).required(false)),
        };

        let mut builder = Config::builder()
            .set_default("probe.timeout_ms", DEFAULT_PROBE_TIMEOUT.as_millis() as u64)?
            .set_default("probe.verification", "verify")?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "devhost=warn")?;

        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        builder.add_source(env).build()?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "devhost").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
