//! Compatibility checker (C8)
//!
//! After a tile or thumbnail IFD has been re-encoded to a scratch file, this
//! module verifies the re-encode agrees with the original on the properties
//! that the conditional splice (C9/C10) depends on. A mismatch is recoverable:
//! the driver falls back to emitting the re-encoded IFD wholesale.

use crate::compression::jpeg;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;

/// Checks that `redacted` can be spliced against `original` tile-for-tile.
///
/// Returns `Ok(())` if `TileWidth`, `TileHeight`, `Compression`, `Photometric`,
/// and the estimated JPEG quality all agree; otherwise `Err(TiffError::Incompatible)`
/// naming the first mismatching property.
pub fn check_compatible(original: &IFD, redacted: &IFD) -> TiffResult<()> {
    check_tag_equal(original, redacted, tags::TILE_WIDTH, "TileWidth")?;
    check_tag_equal(original, redacted, tags::TILE_LENGTH, "TileHeight")?;
    check_tag_equal(original, redacted, tags::COMPRESSION, "Compression")?;
    check_tag_equal(original, redacted, tags::PHOTOMETRIC_INTERPRETATION, "Photometric")?;

    let original_quality = estimate_quality(original);
    let redacted_quality = estimate_quality(redacted);
    if original_quality != redacted_quality {
        return Err(TiffError::Incompatible(format!(
            "JPEG quality mismatch: original={}, redacted={}",
            original_quality, redacted_quality
        )));
    }

    Ok(())
}

fn check_tag_equal(original: &IFD, redacted: &IFD, tag: u16, label: &str) -> TiffResult<()> {
    let original_value = original.get_tag_value(tag);
    let redacted_value = redacted.get_tag_value(tag);
    if original_value != redacted_value {
        return Err(TiffError::Incompatible(format!(
            "{} mismatch: original={:?}, redacted={:?}",
            label, original_value, redacted_value
        )));
    }
    Ok(())
}

fn estimate_quality(ifd: &IFD) -> u8 {
    let tables = ifd.raw_tag_bytes(tags::JPEG_TABLES).ok();
    let description = ifd.get_ascii_tag(tags::IMAGE_DESCRIPTION);
    jpeg::estimate_quality(ifd, tables.as_deref(), description.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::ifd::IFDEntry;

    fn tile_ifd(tile_w: u64, tile_h: u64, compression: u64, photometric: u64) -> IFD {
        let mut ifd = IFD::new(0, 0);
        ifd.add_entry(IFDEntry::new(tags::TILE_WIDTH, 4, 1, tile_w));
        ifd.add_entry(IFDEntry::new(tags::TILE_LENGTH, 4, 1, tile_h));
        ifd.add_entry(IFDEntry::new(tags::COMPRESSION, 3, 1, compression));
        ifd.add_entry(IFDEntry::new(tags::PHOTOMETRIC_INTERPRETATION, 3, 1, photometric));
        ifd
    }

    #[test]
    fn identical_geometry_and_quality_is_compatible() {
        let original = tile_ifd(256, 256, 7, 2);
        let redacted = tile_ifd(256, 256, 7, 2);
        assert!(check_compatible(&original, &redacted).is_ok());
    }

    #[test]
    fn mismatched_tile_width_is_incompatible() {
        let original = tile_ifd(256, 256, 7, 2);
        let redacted = tile_ifd(240, 256, 7, 2);
        assert!(matches!(check_compatible(&original, &redacted), Err(TiffError::Incompatible(_))));
    }

    #[test]
    fn mismatched_compression_is_incompatible() {
        let original = tile_ifd(256, 256, 7, 2);
        let redacted = tile_ifd(256, 256, 8, 2);
        assert!(matches!(check_compatible(&original, &redacted), Err(TiffError::Incompatible(_))));
    }
}
