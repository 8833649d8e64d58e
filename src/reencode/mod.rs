//! Level re-encoding and raster compositing (C7)
//!
//! Decodes a source IFD's pixels back to an RGB raster, composites the
//! redaction mask over it, and re-encodes the result as a fresh single-IFD
//! BigTIFF scratch file — tiled (for pyramid levels) or untiled (thumbnails).

pub mod image_reencoder;

pub use image_reencoder::{composite_over, decode_ifd, save_tiled_jpeg, save_untiled_jpeg};
