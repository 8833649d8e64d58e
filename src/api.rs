use crate::tiff::errors::TiffResult;
use crate::utils::logger::Logger;

/// Main interface to the RasterKit library
pub struct RasterKit {
    logger: Logger,
}

impl RasterKit {
    /// Create a new RasterKit instance
    ///
    /// # Arguments
    /// * `log_file` - Optional path to log file, defaults to "rasterkit.log"
    ///
    /// # Returns
    /// A RasterKit instance or an error if initialization fails
    pub fn new(log_file: Option<&str>) -> TiffResult<Self> {
        let log_path = log_file.unwrap_or("rasterkit.log");
        let logger = Logger::new(log_path)?;
        Ok(RasterKit { logger })
    }

    /// Redact the polygons described by a Girder-style annotation JSON out of
    /// a pyramidal TIFF/BigTIFF, writing the result to `output_path`
    ///
    /// # Arguments
    /// * `input_path` - Path to the source TIFF/BigTIFF
    /// * `output_path` - Path to write the redacted BigTIFF to
    /// * `annotation_path` - Path to the annotation JSON listing polygons to redact
    ///
    /// # Returns
    /// Result indicating success or an error
    pub fn redact(&self, input_path: &str, output_path: &str, annotation_path: &str) -> TiffResult<()> {
        crate::redact::redact(input_path, output_path, annotation_path, &self.logger)
    }
}
