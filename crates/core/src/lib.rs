// devhost Core - Domain Types & Ports
// NO infrastructure dependencies: adapters live in devhost-infra-system

pub mod application;
pub mod constants;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
