// Application Layer - Use cases built on ports

pub mod resource_extractor;

pub use resource_extractor::ResourceExtractor;
