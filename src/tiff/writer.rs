//! BigTIFF writer (C11)
//!
//! Emits a BigTIFF (8-byte offsets, magic `0x002B`) regardless of whether the
//! source was classic TIFF. Endianness follows the source. IFDs are written in
//! two modes: plain (copy an IFD's own tag data from its own backing source)
//! and conditional (splice `TileOffsets`/`TileByteCounts` from two parallel
//! sources per §4.5/§4.6 via [`crate::tiff::splice`]). SubIFDs recurse through
//! back-patched pointers threaded via the negative-offset convention.

use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{field_types, tags};
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::splice::{self, ConditionalSpec};

/// Drives emission of an IFD chain into a single BigTIFF file.
pub struct BigTiffWriter {
    byte_order: ByteOrder,
}

impl BigTiffWriter {
    /// Creates a writer that emits in the given byte order
    pub fn new(byte_order: ByteOrder) -> Self {
        BigTiffWriter { byte_order }
    }

    /// Writes the BigTIFF header and the full top-level IFD chain in one call.
    ///
    /// `conditional` maps an index into `ifds` to the splicing parameters for
    /// that IFD; IFDs with no entry are written in plain mode. Callers that
    /// need to interleave per-IFD scratch-file lifetimes with emission (the
    /// driver, C12) should instead call [`Self::write_header`] and
    /// [`Self::write_ifd`] directly, one IFD at a time.
    pub fn write(
        &self,
        output_path: &str,
        ifds: &[IFD],
        conditional: &HashMap<usize, ConditionalSpec>,
    ) -> TiffResult<()> {
        let file = File::create(output_path)?;
        let mut dest = BufWriter::with_capacity(1024 * 1024, file);

        let mut next_ifd_ptr = self.write_header(&mut dest)?;

        for (i, ifd) in ifds.iter().enumerate() {
            next_ifd_ptr = self.write_ifd(&mut dest, ifd, conditional.get(&i), next_ifd_ptr)?;
        }

        dest.flush()?;
        Ok(())
    }

    /// Writes the 16-byte BigTIFF header and returns the file position of the
    /// placeholder first-IFD pointer, ready to be threaded through successive
    /// [`Self::write_ifd`] calls.
    pub fn write_header(&self, dest: &mut (impl Write + Seek)) -> TiffResult<u64> {
        dest.write_all(&self.byte_order.marker())?;
        self.write_u16(dest, 0x002B)?;
        self.write_u16(dest, 8)?;
        self.write_u16(dest, 0)?;
        let ifd_ptr = dest.stream_position()?;
        self.write_u64(dest, 0)?;
        Ok(ifd_ptr)
    }

    fn write_u16(&self, dest: &mut (impl Write + Seek), v: u16) -> TiffResult<()> {
        self.byte_order.create_handler().write_u16(dest, v)?;
        Ok(())
    }

    fn write_u64(&self, dest: &mut (impl Write + Seek), v: u64) -> TiffResult<()> {
        self.byte_order.create_handler().write_u64(dest, v)?;
        Ok(())
    }

    /// Writes one IFD at the next available position, back-patches `ifd_ptr_pos`
    /// to point at it, recurses into any SubIFDs, and returns the position of
    /// this IFD's own next-IFD pointer slot for the caller to back-patch next.
    ///
    /// Public so the driver (C12) can interleave emission with per-IFD scratch
    /// file lifetimes instead of collecting the whole chain before writing.
    pub fn write_ifd(
        &self,
        dest: &mut (impl Write + Seek),
        ifd: &IFD,
        conditional: Option<&ConditionalSpec>,
        ifd_ptr_pos: u64,
    ) -> TiffResult<u64> {
        let mut entries: Vec<IFDEntry> = ifd.entries.clone();
        entries.sort_by_key(|e| e.tag);

        let mut ifd_record: Vec<u8> = Vec::new();
        self.push_u64(&mut ifd_record, entries.len() as u64);

        let mut subifd_ptrs: HashMap<u16, i64> = HashMap::new();
        let mut pending_conditional_bytecounts: Option<Vec<u64>> = None;

        for entry in &entries {
            let mut field_type = entry.field_type;
            let mut count = entry.count;
            let packed: Vec<u8>;
            let is_subifd = field_type == field_types::IFD8 || entry.tag == tags::SUB_IFDS;

            if is_subifd {
                field_type = field_types::IFD8;
                let n = ifd.get_sub_ifds(entry.tag).map(|v| v.len()).unwrap_or(0);
                count = n as u64;
                packed = vec![0u8; n * 8];
            } else if entry.tag == tags::TILE_OFFSETS {
                let dest_offsets = if let Some(spec) = conditional {
                    let (offsets, bytecounts) = splice::write_conditional_tiles(dest, spec)?;
                    pending_conditional_bytecounts = Some(bytecounts);
                    offsets
                } else {
                    self.copy_plain_tile_data(
                        dest,
                        &ifd.source_path,
                        ifd.source_len,
                        ifd.get_tag_values(tags::TILE_OFFSETS).unwrap_or(&[]),
                        ifd.get_tag_values(tags::TILE_BYTE_COUNTS).unwrap_or(&[]),
                    )?
                };
                field_type = field_types::LONG8;
                count = dest_offsets.len() as u64;
                packed = self.pack_u64_array(&dest_offsets);
            } else if entry.tag == tags::TILE_BYTE_COUNTS {
                let bytecounts = match pending_conditional_bytecounts.take() {
                    Some(bc) => bc,
                    None => ifd.get_tag_values(tags::TILE_BYTE_COUNTS).unwrap_or(&[]).to_vec(),
                };
                field_type = field_types::LONG8;
                count = bytecounts.len() as u64;
                packed = self.pack_u64_array(&bytecounts);
            } else if entry.tag == tags::STRIP_OFFSETS {
                let dest_offsets = self.copy_plain_tile_data(
                    dest,
                    &ifd.source_path,
                    ifd.source_len,
                    ifd.get_tag_values(tags::STRIP_OFFSETS).unwrap_or(&[]),
                    ifd.get_tag_values(tags::STRIP_BYTE_COUNTS).unwrap_or(&[]),
                )?;
                field_type = field_types::LONG8;
                count = dest_offsets.len() as u64;
                packed = self.pack_u64_array(&dest_offsets);
            } else if entry.tag == tags::STRIP_BYTE_COUNTS {
                let bytecounts = ifd.get_tag_values(tags::STRIP_BYTE_COUNTS).unwrap_or(&[]).to_vec();
                field_type = field_types::LONG8;
                count = bytecounts.len() as u64;
                packed = self.pack_u64_array(&bytecounts);
            } else {
                packed = ifd.raw_tag_bytes(entry.tag)?;
            }

            self.push_u16(&mut ifd_record, entry.tag);
            self.push_u16(&mut ifd_record, field_type);
            self.push_u64(&mut ifd_record, count);

            if packed.len() <= 8 {
                if is_subifd {
                    subifd_ptrs.insert(entry.tag, -(ifd_record.len() as i64));
                }
                let mut value = packed;
                value.resize(8, 0);
                ifd_record.extend_from_slice(&value);
            } else {
                if dest.stream_position()? % 2 != 0 {
                    dest.write_all(&[0u8])?;
                }
                let spill_pos = dest.stream_position()?;
                dest.write_all(&packed)?;
                if is_subifd {
                    subifd_ptrs.insert(entry.tag, spill_pos as i64);
                }
                let mut ptr_bytes = Vec::new();
                self.push_u64(&mut ptr_bytes, spill_pos);
                ifd_record.extend_from_slice(&ptr_bytes);
            }
        }

        if dest.stream_position()? % 2 != 0 {
            dest.write_all(&[0u8])?;
        }
        let pos = dest.stream_position()?;

        dest.seek(SeekFrom::Start(ifd_ptr_pos))?;
        self.write_u64(dest, pos)?;
        dest.seek(SeekFrom::Start(pos))?;
        dest.write_all(&ifd_record)?;
        let next_ifd_ptr = dest.stream_position()?;
        self.write_u64(dest, 0)?;

        for (tag, rel) in subifd_ptrs {
            let ptr_pos = if rel < 0 { (pos as i64 + (-rel)) as u64 } else { rel as u64 };
            self.write_sub_ifds(dest, ifd, tag, ptr_pos)?;
        }

        debug!("wrote IFD #{} at offset {}", ifd.number, pos);
        Ok(next_ifd_ptr)
    }

    fn write_sub_ifds(
        &self,
        dest: &mut (impl Write + Seek),
        ifd: &IFD,
        tag: u16,
        mut slot_ptr: u64,
    ) -> TiffResult<()> {
        let Some(children) = ifd.get_sub_ifds(tag) else { return Ok(()) };
        for child in children {
            self.write_ifd(dest, child, None, slot_ptr)?;
            slot_ptr += 8;
        }
        Ok(())
    }

    /// Copies an offset-bearing tag's payload from a single source and returns
    /// the destination offsets, in tile/strip-index order.
    fn copy_plain_tile_data(
        &self,
        dest: &mut (impl Write + Seek),
        source_path: &str,
        source_len: u64,
        offsets: &[u64],
        lengths: &[u64],
    ) -> TiffResult<Vec<u64>> {
        let mut source = File::open(source_path)?;
        let mut dest_offsets = Vec::with_capacity(offsets.len());
        let mut buf = vec![0u8; 1024 * 1024];

        for (&offset, &length) in offsets.iter().zip(lengths.iter()) {
            if offset == 0 || offset.saturating_add(length) > source_len {
                dest_offsets.push(0);
                continue;
            }
            source.seek(SeekFrom::Start(offset))?;
            dest_offsets.push(dest.stream_position()?);
            let mut remaining = length;
            while remaining > 0 {
                let chunk = remaining.min(buf.len() as u64) as usize;
                source.read_exact(&mut buf[..chunk])?;
                dest.write_all(&buf[..chunk])?;
                remaining -= chunk as u64;
            }
        }

        Ok(dest_offsets)
    }

    fn pack_u64_array(&self, values: &[u64]) -> Vec<u8> {
        let mut out = Vec::with_capacity(values.len() * 8);
        for v in values {
            self.push_u64(&mut out, *v);
        }
        out
    }

    fn push_u16(&self, out: &mut Vec<u8>, v: u16) {
        match self.byte_order {
            ByteOrder::LittleEndian => out.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&v.to_be_bytes()),
        }
    }

    fn push_u64(&self, out: &mut Vec<u8>, v: u64) {
        match self.byte_order {
            ByteOrder::LittleEndian => out.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => out.extend_from_slice(&v.to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::reader::TiffReader;
    use crate::tiff::constants::field_types;
    use crate::utils::logger::Logger;
    use tempfile::NamedTempFile;

    #[test]
    fn header_and_single_plain_ifd_round_trip() {
        let mut ifd = IFD::new(0, 0);
        ifd.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, 64));
        ifd.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, 64));

        let writer = BigTiffWriter::new(ByteOrder::LittleEndian);
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap().to_string();
        writer.write(&path, std::slice::from_ref(&ifd), &HashMap::new()).unwrap();

        let log_file = NamedTempFile::new().unwrap();
        let logger = Logger::new(log_file.path().to_str().unwrap()).unwrap();
        let mut reader = TiffReader::new(&logger);
        let tiff = reader.load(&path).unwrap();
        assert!(tiff.is_big_tiff);
        assert_eq!(tiff.ifds.len(), 1);
        assert_eq!(tiff.ifds[0].get_tag_value(tags::IMAGE_WIDTH), Some(64));
        assert_eq!(tiff.ifds[0].get_tag_value(tags::IMAGE_LENGTH), Some(64));
    }

    #[test]
    fn subifds_with_multiple_children_round_trip() {
        let mut parent = IFD::new(0, 0);
        parent.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, 64));
        parent.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, 64));
        parent.add_entry(IFDEntry::new(tags::SUB_IFDS, field_types::IFD8, 0, 0));

        let mut child_a = IFD::new(0, 0);
        child_a.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, 32));
        child_a.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, 32));

        let mut child_b = IFD::new(0, 0);
        child_b.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, 16));
        child_b.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, 16));

        parent.add_sub_ifds(tags::SUB_IFDS, vec![child_a, child_b]);

        let writer = BigTiffWriter::new(ByteOrder::LittleEndian);
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap().to_string();
        writer.write(&path, std::slice::from_ref(&parent), &HashMap::new()).unwrap();

        let log_file = NamedTempFile::new().unwrap();
        let logger = Logger::new(log_file.path().to_str().unwrap()).unwrap();
        let mut reader = TiffReader::new(&logger);
        let tiff = reader.load(&path).unwrap();
        assert_eq!(tiff.ifds.len(), 1);

        let children = tiff.ifds[0].get_sub_ifds(tags::SUB_IFDS).expect("sub IFDs present");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].get_dimensions(), Some((32, 32)));
        assert_eq!(children[1].get_dimensions(), Some((16, 16)));
    }
}
