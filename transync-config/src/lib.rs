//! Configuration management for the translation sync services.
//!
//! Provides environment detection, layered configuration loading from YAML
//! files and environment variables, secret handling, and the configuration
//! types shared by the engine and the server binary.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
