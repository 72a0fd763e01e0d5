//! Tracing/logging setup shared by every binary.

pub mod logging;

pub use logging::{DEFAULT_FILTER, init, init_with_default};
