//! Compression handling for TIFF files
//!
//! This module implements strategies for handling different compression methods.

mod handler;
mod uncompressed;
mod factory;
pub mod jpeg;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use factory::CompressionFactory;
pub use jpeg::JpegHandler;
