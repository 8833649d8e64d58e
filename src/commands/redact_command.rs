//! Redaction command (C14)
//!
//! CLI entry point for the redactor: wraps [`crate::redact::redact`] in the
//! `Command` pattern so it dispatches the same way every other subcommand
//! does.

use clap::ArgMatches;
use log::{debug, info};

use crate::commands::command_traits::Command;
use crate::redact;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::utils::logger::Logger;

/// Default JPEG re-encode quality when neither quantization tables nor an
/// `ImageDescription` hint are usable.
const DEFAULT_OUTPUT_SUFFIX: &str = "_redacted.tiff";

pub struct RedactCommand<'a> {
    source: String,
    output: String,
    annotation: String,
    verbose: bool,
    logger: &'a Logger,
}

impl<'a> RedactCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> TiffResult<Self> {
        let source = args
            .get_one::<String>("source")
            .ok_or_else(|| TiffError::GenericError("Missing source file".to_string()))?
            .clone();

        let annotation = args
            .get_one::<String>("annotation")
            .ok_or_else(|| TiffError::GenericError("Missing --annotation file".to_string()))?
            .clone();

        let output = args
            .get_one::<String>("out")
            .cloned()
            .unwrap_or_else(|| default_output_path(&source));

        let verbose = args.get_flag("verbose");

        Ok(RedactCommand { source, output, annotation, verbose, logger })
    }
}

fn default_output_path(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, _ext)) => format!("{}{}", stem, DEFAULT_OUTPUT_SUFFIX),
        None => format!("{}{}", source, DEFAULT_OUTPUT_SUFFIX),
    }
}

impl<'a> Command for RedactCommand<'a> {
    fn execute(&self) -> TiffResult<()> {
        if self.verbose {
            debug!("verbose logging enabled");
        }
        info!("Redacting {} with annotations from {} -> {}", self.source, self.annotation, self.output);
        redact::redact(&self.source, &self.output, &self.annotation, self.logger)?;
        info!("Redaction complete: {}", self.output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_replaces_extension() {
        assert_eq!(default_output_path("slide.tiff"), "slide_redacted.tiff");
        assert_eq!(default_output_path("/a/b/slide.svs"), "/a/b/slide_redacted.tiff");
    }

    #[test]
    fn default_output_path_without_extension_appends_suffix() {
        assert_eq!(default_output_path("slide"), "slide_redacted.tiff");
    }
}
