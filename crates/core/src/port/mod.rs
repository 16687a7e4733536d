// Port Layer - Interfaces for the OS and network

pub mod http_probe;
pub mod process_runner;
pub mod resource_provider;

// Re-exports
pub use http_probe::{HttpProbe, ProbeError};
pub use process_runner::{ProcessError, ProcessRunner};
pub use resource_provider::{ResourceError, ResourceProvider};
