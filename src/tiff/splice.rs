//! Conditional tile-data writer (C10)
//!
//! Given two parallel tile-data sources (the original file and a re-encoded
//! scratch file) and a per-tile selection vector, copies each tile's bytes from
//! whichever source the selection names, in tile-index order, and reports the
//! destination offset each tile landed at.

use log::warn;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::tiff::errors::{TiffError, TiffResult};

const COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// Parameters needed to splice one IFD's tile data from two parallel sources
pub struct ConditionalSpec<'a> {
    pub original_path: &'a str,
    pub original_len: u64,
    pub original_offsets: &'a [u64],
    pub original_bytecounts: &'a [u64],
    pub redacted_path: &'a str,
    pub redacted_len: u64,
    pub redacted_offsets: &'a [u64],
    pub redacted_bytecounts: &'a [u64],
    /// `selection[i]` true selects the redacted source for tile `i`
    pub selection: &'a [bool],
}

/// Splices tile data in tile-index order and returns `(dest_offsets, dest_bytecounts)`
///
/// A tile whose source offset/length pair falls outside its source file's bounds
/// is skipped with a zero destination offset and zero byte count, rather than
/// failing the whole redaction; this mirrors a malformed single tile without
/// discarding the rest of the level.
pub fn write_conditional_tiles(
    dest: &mut (impl Write + Seek),
    spec: &ConditionalSpec,
) -> TiffResult<(Vec<u64>, Vec<u64>)> {
    if spec.original_offsets.len() != spec.selection.len()
        || spec.redacted_offsets.len() != spec.selection.len()
    {
        return Err(TiffError::SourceOffsetsInconsistent(
            "tile offset arrays and selection vector differ in length".to_string(),
        ));
    }

    let mut original = File::open(spec.original_path)?;
    let mut redacted = File::open(spec.redacted_path)?;
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];

    let mut dest_offsets = Vec::with_capacity(spec.selection.len());
    let mut dest_bytecounts = Vec::with_capacity(spec.selection.len());

    for i in 0..spec.selection.len() {
        let (source, offset, length, source_len) = if spec.selection[i] {
            (&mut redacted, spec.redacted_offsets[i], spec.redacted_bytecounts[i], spec.redacted_len)
        } else {
            (&mut original, spec.original_offsets[i], spec.original_bytecounts[i], spec.original_len)
        };

        if offset == 0 || offset.saturating_add(length) > source_len {
            warn!("tile {} source offset/length out of bounds, emitting empty tile", i);
            dest_offsets.push(0);
            dest_bytecounts.push(0);
            continue;
        }

        source.seek(SeekFrom::Start(offset))?;
        dest_offsets.push(dest.stream_position()?);
        dest_bytecounts.push(length);

        let mut remaining = length;
        while remaining > 0 {
            let chunk = remaining.min(buf.len() as u64) as usize;
            source.read_exact(&mut buf[..chunk])?;
            dest.write_all(&buf[..chunk])?;
            remaining -= chunk as u64;
        }
    }

    Ok((dest_offsets, dest_bytecounts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    fn file_with(bytes: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn selects_redacted_tile_when_flagged() {
        let original = file_with(b"ORIGINAL_TILE_DATA_0000");
        let redacted = file_with(b"REDACTEDxx");

        let spec = ConditionalSpec {
            original_path: original.path().to_str().unwrap(),
            original_len: 23,
            original_offsets: &[0],
            original_bytecounts: &[23],
            redacted_path: redacted.path().to_str().unwrap(),
            redacted_len: 10,
            redacted_offsets: &[0],
            redacted_bytecounts: &[10],
            selection: &[true],
        };

        let mut out = Cursor::new(Vec::new());
        let (offsets, bytecounts) = write_conditional_tiles(&mut out, &spec).unwrap();
        assert_eq!(offsets, vec![0]);
        assert_eq!(bytecounts, vec![10]);
        assert_eq!(&out.into_inner()[..10], b"REDACTEDxx");
    }

    #[test]
    fn out_of_bounds_tile_becomes_empty() {
        let original = file_with(b"short");
        let redacted = file_with(b"also short");

        let spec = ConditionalSpec {
            original_path: original.path().to_str().unwrap(),
            original_len: 5,
            original_offsets: &[100],
            original_bytecounts: &[50],
            redacted_path: redacted.path().to_str().unwrap(),
            redacted_len: 10,
            redacted_offsets: &[0],
            redacted_bytecounts: &[10],
            selection: &[false],
        };

        let mut out = Cursor::new(Vec::new());
        let (offsets, bytecounts) = write_conditional_tiles(&mut out, &spec).unwrap();
        assert_eq!(offsets, vec![0]);
        assert_eq!(bytecounts, vec![0]);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let original = file_with(b"x");
        let redacted = file_with(b"y");
        let spec = ConditionalSpec {
            original_path: original.path().to_str().unwrap(),
            original_len: 1,
            original_offsets: &[0, 0],
            original_bytecounts: &[1, 1],
            redacted_path: redacted.path().to_str().unwrap(),
            redacted_len: 1,
            redacted_offsets: &[0],
            redacted_bytecounts: &[1],
            selection: &[true],
        };
        let mut out = Cursor::new(Vec::new());
        assert!(write_conditional_tiles(&mut out, &spec).is_err());
    }
}
