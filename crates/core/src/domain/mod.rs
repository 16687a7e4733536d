// Domain Layer - Plain value types passed across ports

pub mod address;
pub mod invocation;
pub mod probe;

// Re-exports
pub use address::{classify_address, is_ip_address, AddressFamily};
pub use invocation::Invocation;
pub use probe::{ProbeOutcome, ProbeRequest, TlsMaterial, TlsVerification};
