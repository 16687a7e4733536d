// devhost Infrastructure - System Adapters
// Implements: ProcessRunner, HttpProbe, ResourceProvider

pub mod http_probe_impl;
pub mod resources;
pub mod subprocess_runner;

pub use http_probe_impl::ReqwestHttpProbe;
pub use resources::{DirectoryResources, EmbeddedResources};
pub use subprocess_runner::SubprocessRunner;
