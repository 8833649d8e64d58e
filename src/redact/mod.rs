//! Top-level redaction driver (C12) and its supporting resource management.

pub mod driver;
pub mod scratch;

pub use driver::redact;
