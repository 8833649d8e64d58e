//! Factory for creating compression handlers

use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::jpeg::JpegHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given compression code
    pub fn create_handler(compression: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        match compression {
            1 => Ok(Box::new(UncompressedHandler)),
            7 => Ok(Box::new(JpegHandler::default())),
            _ => Err(TiffError::UnsupportedCompression(compression))
        }
    }
}
