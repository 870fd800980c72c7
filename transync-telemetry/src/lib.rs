//! Logging setup shared by the translation sync binaries and tests.

pub mod tracing;

pub use crate::tracing::{LogFlusher, TracingError, init_test_tracing, init_tracing};
