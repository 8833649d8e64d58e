//! JPEG compression handler and quality recovery
//!
//! Implements `CompressionHandler` for JPEG-compressed tile/strip data (compression
//! code 7), and the three-tier JPEG quality estimation used by the compatibility
//! checker (C8) and the re-encoder (C7): try the quantization tables carried in
//! `JPEGTables`, then a `Q=NN` marker in `ImageDescription`, then a fixed default.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader};
use regex::Regex;

use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFD;

use super::handler::CompressionHandler;

/// Default JPEG quality used when no estimate can be recovered from the source
pub const DEFAULT_QUALITY: u8 = 70;

/// The standard JPEG Annex K luminance quantization table, row-major order,
/// used as the reference point for estimating quality from a custom table.
const STANDARD_LUMINANCE_TABLE: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// JPEG compression handler (compression code 7)
///
/// `decompress`/`compress` operate on full baseline JPEG streams (not the
/// abbreviated per-tile streams that share a `JPEGTables` prefix); re-encoding
/// of redacted levels goes through `reencode::image_reencoder` instead, which
/// handles table-prefixed tiles directly.
pub struct JpegHandler {
    quality: u8,
}

impl JpegHandler {
    /// Creates a handler that re-compresses at the given quality
    pub fn new(quality: u8) -> Self {
        JpegHandler { quality }
    }
}

impl Default for JpegHandler {
    fn default() -> Self {
        JpegHandler::new(DEFAULT_QUALITY)
    }
}

impl CompressionHandler for JpegHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let image = ImageReader::with_format(Cursor::new(data), ImageFormat::Jpeg)
            .decode()?;
        Ok(image.into_rgb8().into_raw())
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let image = ImageReader::with_format(Cursor::new(data), ImageFormat::Jpeg)
            .decode()?;
        let rgb = image.into_rgb8();
        let mut out = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
        encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)?;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "JPEG"
    }

    fn code(&self) -> u64 {
        7
    }
}

/// Estimates JPEG quality from a raw `JPEGTables` byte stream, by locating the
/// first DQT (quantization table) marker segment and comparing its luminance
/// table against the standard Annex K table.
///
/// Returns `None` if no DQT segment is found or the segment is malformed.
pub fn estimate_quality_from_tables(tables: &[u8]) -> Option<u8> {
    let mut i = 0usize;
    while i + 1 < tables.len() {
        if tables[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = tables[i + 1];
        if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        if marker == 0xD9 {
            break;
        }
        if i + 3 >= tables.len() {
            break;
        }
        let seg_len = ((tables[i + 2] as usize) << 8) | tables[i + 3] as usize;
        if seg_len < 2 || i + 2 + seg_len > tables.len() {
            break;
        }
        if marker == 0xDB {
            let mut pos = i + 4;
            let seg_end = i + 2 + seg_len;
            while pos < seg_end {
                let precision_and_id = tables[pos];
                let precision = precision_and_id >> 4;
                let table_len = if precision == 0 { 64 } else { 128 };
                pos += 1;
                if pos + table_len > seg_end {
                    break;
                }
                let mut values = [0u16; 64];
                if precision == 0 {
                    for k in 0..64 {
                        values[k] = tables[pos + k] as u16;
                    }
                } else {
                    for k in 0..64 {
                        values[k] = ((tables[pos + 2 * k] as u16) << 8) | tables[pos + 2 * k + 1] as u16;
                    }
                }
                return Some(quality_from_luminance_table(&values));
            }
        }
        i += 2 + seg_len;
    }
    None
}

fn quality_from_luminance_table(table: &[u16; 64]) -> u8 {
    let mut ratio_sum = 0f64;
    let mut n = 0u32;
    for i in 0..64 {
        if STANDARD_LUMINANCE_TABLE[i] == 0 {
            continue;
        }
        ratio_sum += table[i] as f64 / STANDARD_LUMINANCE_TABLE[i] as f64;
        n += 1;
    }
    if n == 0 {
        return DEFAULT_QUALITY;
    }
    let scaling = (ratio_sum / n as f64) * 100.0;
    let quality = if scaling <= 100.0 {
        (200.0 - scaling) / 2.0
    } else {
        5000.0 / scaling
    };
    quality.round().clamp(1.0, 100.0) as u8
}

/// Extracts a `Q=NN` quality hint from an `ImageDescription` string
pub fn estimate_quality_from_description(description: &str) -> Option<u8> {
    let re = Regex::new(r"Q=([0-9]+)").ok()?;
    let caps = re.captures(description)?;
    caps.get(1)?.as_str().parse::<u8>().ok().map(|q| q.clamp(1, 100))
}

/// Three-tier JPEG quality recovery for an IFD: `JPEGTables` estimate, then
/// `Q=NN` in `ImageDescription`, then [`DEFAULT_QUALITY`]. Never fails.
pub fn estimate_quality(ifd: &IFD, jpeg_tables: Option<&[u8]>, image_description: Option<&str>) -> u8 {
    if let Some(tables) = jpeg_tables {
        if let Some(q) = estimate_quality_from_tables(tables) {
            return q;
        }
    }
    if let Some(desc) = image_description {
        if let Some(q) = estimate_quality_from_description(desc) {
            return q;
        }
    }
    let _ = ifd.has_tag(tags::JPEG_TABLES);
    DEFAULT_QUALITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_estimates_near_quality_50() {
        let table: [u16; 64] = STANDARD_LUMINANCE_TABLE;
        let q = quality_from_luminance_table(&table);
        assert!((45..=55).contains(&q), "expected ~50, got {}", q);
    }

    #[test]
    fn description_regex_extracts_quality() {
        assert_eq!(estimate_quality_from_description("Aperio Image Library Q=80"), Some(80));
        assert_eq!(estimate_quality_from_description("no hint here"), None);
    }

    #[test]
    fn fallback_chain_reaches_default() {
        let ifd = IFD::new(0, 0);
        assert_eq!(estimate_quality(&ifd, None, None), DEFAULT_QUALITY);
        assert_eq!(estimate_quality(&ifd, None, Some("random text")), DEFAULT_QUALITY);
        assert_eq!(estimate_quality(&ifd, None, Some("tag Q=42 here")), 42);
    }
}
