//! Conditional IFD builder (C9)
//!
//! Produces the composed IFD that the writer (C11) emits in conditional mode:
//! a deep copy of the original tile IFD whose `TileByteCounts` is merged
//! per-tile from the original or redacted source, and whose `TileOffsets` is a
//! monotone placeholder sequence the writer discards in favor of the real
//! offsets C10 returns while splicing.

use crate::tiff::constants::{field_types, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFDEntry, IFD};

/// Builds the composed IFD `M` for conditional emission of one tile level.
///
/// `original`, `redacted`, and `selection` must agree in tile count; violating
/// this is a fatal [`TiffError::SourceOffsetsInconsistent`], not a per-tile skip,
/// because it means the two IFDs don't describe the same tile grid at all.
pub fn build_conditional_ifd(original: &IFD, redacted: &IFD, selection: &[bool]) -> TiffResult<IFD> {
    let original_offsets = original
        .get_tag_values(tags::TILE_OFFSETS)
        .ok_or_else(|| TiffError::InputMalformed("original IFD has no TileOffsets".to_string()))?;
    let original_bytecounts = original
        .get_tag_values(tags::TILE_BYTE_COUNTS)
        .ok_or_else(|| TiffError::InputMalformed("original IFD has no TileByteCounts".to_string()))?;
    let redacted_bytecounts = redacted
        .get_tag_values(tags::TILE_BYTE_COUNTS)
        .ok_or_else(|| TiffError::InputMalformed("redacted IFD has no TileByteCounts".to_string()))?;

    let n = original_offsets.len();
    if original_bytecounts.len() != n || redacted_bytecounts.len() != n || selection.len() != n {
        return Err(TiffError::SourceOffsetsInconsistent(format!(
            "tile count disagreement: original offsets={}, original bytecounts={}, redacted bytecounts={}, selection={}",
            n,
            original_bytecounts.len(),
            redacted_bytecounts.len(),
            selection.len()
        )));
    }

    let mut composed = original.clone();

    let mut bytecounts = Vec::with_capacity(n);
    let mut offsets = Vec::with_capacity(n);
    let mut placeholder = original_offsets[0];
    for i in 0..n {
        let bc = if selection[i] { redacted_bytecounts[i] } else { original_bytecounts[i] };
        offsets.push(placeholder);
        placeholder += bc;
        bytecounts.push(bc);
    }

    composed.set_tag_values(tags::TILE_OFFSETS, offsets);
    composed.set_tag_values(tags::TILE_BYTE_COUNTS, bytecounts);
    replace_entry(&mut composed, tags::TILE_OFFSETS, field_types::LONG8, n as u64);
    replace_entry(&mut composed, tags::TILE_BYTE_COUNTS, field_types::LONG8, n as u64);

    Ok(composed)
}

fn replace_entry(ifd: &mut IFD, tag: u16, field_type: u16, count: u64) {
    if let Some(pos) = ifd.entries.iter().position(|e| e.tag == tag) {
        ifd.entries[pos] = IFDEntry::new(tag, field_type, count, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ifd_with_tiles(offsets: Vec<u64>, bytecounts: Vec<u64>) -> IFD {
        let mut ifd = IFD::new(0, 0);
        ifd.add_entry(IFDEntry::new(tags::TILE_OFFSETS, field_types::LONG8, offsets.len() as u64, 0));
        ifd.add_entry(IFDEntry::new(tags::TILE_BYTE_COUNTS, field_types::LONG8, bytecounts.len() as u64, 0));
        ifd.set_tag_values(tags::TILE_OFFSETS, offsets);
        ifd.set_tag_values(tags::TILE_BYTE_COUNTS, bytecounts);
        ifd
    }

    #[test]
    fn merges_bytecounts_per_selection() {
        let original = ifd_with_tiles(vec![100, 300, 500, 700], vec![200, 200, 200, 200]);
        let redacted = ifd_with_tiles(vec![0, 0, 0, 0], vec![50, 50, 50, 50]);
        let selection = [true, false, true, false];

        let composed = build_conditional_ifd(&original, &redacted, &selection).unwrap();
        let bytecounts = composed.get_tag_values(tags::TILE_BYTE_COUNTS).unwrap();
        assert_eq!(bytecounts, &[50, 200, 50, 200]);

        let offsets = composed.get_tag_values(tags::TILE_OFFSETS).unwrap();
        assert_eq!(offsets[0], 100);
        assert_eq!(offsets[1], offsets[0] + bytecounts[0]);
        assert_eq!(offsets[2], offsets[1] + bytecounts[1]);
        assert_eq!(offsets[3], offsets[2] + bytecounts[2]);
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let original = ifd_with_tiles(vec![100, 300], vec![200, 200]);
        let redacted = ifd_with_tiles(vec![0, 0, 0], vec![50, 50, 50]);
        let selection = [true, false];
        assert!(matches!(
            build_conditional_ifd(&original, &redacted, &selection),
            Err(TiffError::SourceOffsetsInconsistent(_))
        ));
    }
}
