//! Top-level driver (C12): the per-IFD state machine described in SPEC_FULL §4.7.
//!
//! Processes the source IFD chain strictly in order, single-threaded. Tile
//! IFDs are masked, re-encoded to a scratch file, checked for compatibility
//! with the original, then spliced conditionally or emitted wholesale.
//! Thumbnails are composited and re-encoded untiled with ancillary tags
//! backfilled from the original. Label/Macro/Other IFDs pass through
//! unchanged.

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::imageops;
use image::RgbaImage;
use log::{info, warn};

use crate::io::byte_order::ByteOrder;
use crate::mask::{load_polygons, PolygonRasterizer, ScanlineRasterizer};
use crate::reencode::{composite_over, decode_ifd, save_tiled_jpeg, save_untiled_jpeg};
use crate::tiff::compat::check_compatible;
use crate::tiff::conditional::build_conditional_ifd;
use crate::tiff::constants::{photometric, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::splice::ConditionalSpec;
use crate::tiff::writer::BigTiffWriter;
use crate::tiff::{classify, IfdKind, TiffReader};
use crate::utils::logger::Logger;

use super::scratch::ScratchFile;

/// Backfilled on thumbnail re-encode when the original carries them but the
/// re-encoded raster doesn't (orientation and resolution are photometric-free
/// metadata the re-encoder has no reason to invent).
const THUMBNAIL_BACKFILL_TAGS: &[u16] = &[
    tags::ORIENTATION,
    tags::X_RESOLUTION,
    tags::Y_RESOLUTION,
    tags::RESOLUTION_UNIT,
    tags::NEW_SUBFILE_TYPE,
];

/// Redacts the polygons in `annotation_path` out of `source_path`, writing a
/// BigTIFF to `output_path`. On any fatal error, partial output is removed.
pub fn redact(source_path: &str, output_path: &str, annotation_path: &str, logger: &Logger) -> TiffResult<()> {
    if Path::new(source_path) == Path::new(output_path) {
        return Err(TiffError::SameInputOutput);
    }

    match redact_inner(source_path, output_path, annotation_path, logger) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(output_path);
            Err(e)
        }
    }
}

fn redact_inner(source_path: &str, output_path: &str, annotation_path: &str, logger: &Logger) -> TiffResult<()> {
    let polygons = load_polygons(annotation_path)?;
    info!("loaded {} polygon(s) from {}", polygons.len(), annotation_path);

    let mut reader = TiffReader::new(logger);
    let tiff = reader.load(source_path)?;
    if tiff.ifds.is_empty() {
        return Err(TiffError::InputMalformed("source TIFF has no IFDs".to_string()));
    }

    let (full_width, full_height) = tiff.ifds[0]
        .get_dimensions()
        .ok_or_else(|| TiffError::InputMalformed("first IFD is missing ImageWidth/ImageLength".to_string()))?;
    let big_endian = tiff.ifds[0].big_endian;

    let rasterizer = ScanlineRasterizer;
    let mask_full = rasterizer.rasterize(full_width as u32, full_height as u32, &polygons);

    let byte_order = if big_endian { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
    let writer = BigTiffWriter::new(byte_order);

    let file = File::create(output_path)?;
    let mut dest = BufWriter::with_capacity(1024 * 1024, file);
    let mut ifd_ptr = writer.write_header(&mut dest)?;

    let scratch_dir = env::temp_dir();

    for (i, original_ifd) in tiff.ifds.iter().enumerate() {
        match classify(original_ifd) {
            IfdKind::Tile => {
                ifd_ptr = process_tile_ifd(
                    &writer,
                    &mut dest,
                    source_path,
                    &reader,
                    logger,
                    original_ifd,
                    &mask_full,
                    full_width,
                    full_height,
                    big_endian,
                    &scratch_dir,
                    i,
                    ifd_ptr,
                )?;
            }
            IfdKind::Thumbnail => {
                ifd_ptr = process_thumbnail_ifd(
                    &writer,
                    &mut dest,
                    source_path,
                    &reader,
                    logger,
                    original_ifd,
                    &mask_full,
                    full_width,
                    full_height,
                    big_endian,
                    &scratch_dir,
                    i,
                    ifd_ptr,
                )?;
            }
            IfdKind::Label | IfdKind::Macro | IfdKind::Other => {
                ifd_ptr = writer.write_ifd(&mut dest, original_ifd, None, ifd_ptr)?;
            }
        }
    }

    dest.flush()?;
    Ok(())
}

fn resample_mask(mask_full: &RgbaImage, full_width: u64, full_height: u64, width: u64, height: u64) -> RgbaImage {
    if width == full_width && height == full_height {
        mask_full.clone()
    } else {
        imageops::resize(mask_full, width as u32, height as u32, imageops::FilterType::Triangle)
    }
}

fn estimate_jpeg_quality(ifd: &IFD) -> u8 {
    let tables = ifd.raw_tag_bytes(tags::JPEG_TABLES).ok();
    let description = ifd.get_ascii_tag(tags::IMAGE_DESCRIPTION);
    crate::compression::jpeg::estimate_quality(ifd, tables.as_deref(), description.as_deref())
}

#[allow(clippy::too_many_arguments)]
fn process_tile_ifd(
    writer: &BigTiffWriter,
    dest: &mut (impl Write + std::io::Seek),
    source_path: &str,
    tiff_reader: &TiffReader,
    logger: &Logger,
    original_ifd: &IFD,
    mask_full: &RgbaImage,
    full_width: u64,
    full_height: u64,
    big_endian: bool,
    scratch_dir: &Path,
    index: usize,
    ifd_ptr: u64,
) -> TiffResult<u64> {
    let (width, height) = original_ifd
        .get_dimensions()
        .ok_or_else(|| TiffError::InputMalformed("tile IFD is missing ImageWidth/ImageLength".to_string()))?;
    let tile_width = original_ifd
        .get_tag_value(tags::TILE_WIDTH)
        .ok_or_else(|| TiffError::InputMalformed("tile IFD is missing TileWidth".to_string()))?;
    let tile_height = original_ifd
        .get_tag_value(tags::TILE_LENGTH)
        .ok_or_else(|| TiffError::InputMalformed("tile IFD is missing TileLength".to_string()))?;
    let photometric_value = original_ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION).unwrap_or(photometric::RGB as u64) as u16;
    if photometric_value != photometric::RGB && photometric_value != photometric::YCBCR {
        return Err(TiffError::UnsupportedEncoding(format!(
            "tile IFD {} has photometric interpretation {}, only RGB and YCbCr are supported for re-encoding",
            index, photometric_value
        )));
    }
    let quality = estimate_jpeg_quality(original_ifd);

    let base = decode_ifd(source_path, original_ifd, tiff_reader)?;
    let level_mask = resample_mask(mask_full, full_width, full_height, width, height);
    let composited = composite_over(&base, &level_mask);

    let scratch = ScratchFile::new(scratch_dir, "tile", index)?;
    save_tiled_jpeg(&composited, scratch.path_str(), tile_width as u32, tile_height as u32, photometric_value, quality, big_endian)?;

    let mut scratch_reader = TiffReader::new(logger);
    let mut redacted_tiff = scratch_reader.load(scratch.path_str())?;
    let redacted_ifd = redacted_tiff.ifds.remove(0);

    let selection = crate::mask::compute_tile_selection(mask_full, width, height, tile_width, tile_height);

    match check_compatible(original_ifd, &redacted_ifd) {
        Ok(()) => {
            let composed = build_conditional_ifd(original_ifd, &redacted_ifd, &selection)?;

            let original_offsets = original_ifd.get_tag_values(tags::TILE_OFFSETS).unwrap_or(&[]);
            let original_bytecounts = original_ifd.get_tag_values(tags::TILE_BYTE_COUNTS).unwrap_or(&[]);
            let redacted_offsets = redacted_ifd.get_tag_values(tags::TILE_OFFSETS).unwrap_or(&[]);
            let redacted_bytecounts = redacted_ifd.get_tag_values(tags::TILE_BYTE_COUNTS).unwrap_or(&[]);

            let spec = ConditionalSpec {
                original_path: &original_ifd.source_path,
                original_len: original_ifd.source_len,
                original_offsets,
                original_bytecounts,
                redacted_path: &redacted_ifd.source_path,
                redacted_len: redacted_ifd.source_len,
                redacted_offsets,
                redacted_bytecounts,
                selection: &selection,
            };

            writer.write_ifd(dest, &composed, Some(&spec), ifd_ptr)
        }
        Err(TiffError::Incompatible(reason)) => {
            warn!("level {} incompatible with re-encode ({}), emitting wholesale", index, reason);
            writer.write_ifd(dest, &redacted_ifd, None, ifd_ptr)
        }
        Err(e) => Err(e),
    }
}

#[allow(clippy::too_many_arguments)]
fn process_thumbnail_ifd(
    writer: &BigTiffWriter,
    dest: &mut (impl Write + std::io::Seek),
    source_path: &str,
    tiff_reader: &TiffReader,
    logger: &Logger,
    original_ifd: &IFD,
    mask_full: &RgbaImage,
    full_width: u64,
    full_height: u64,
    big_endian: bool,
    scratch_dir: &Path,
    index: usize,
    ifd_ptr: u64,
) -> TiffResult<u64> {
    let (width, height) = original_ifd
        .get_dimensions()
        .ok_or_else(|| TiffError::InputMalformed("thumbnail IFD is missing ImageWidth/ImageLength".to_string()))?;
    let photometric_value = original_ifd.get_tag_value(tags::PHOTOMETRIC_INTERPRETATION).unwrap_or(photometric::RGB as u64) as u16;
    if photometric_value != photometric::RGB && photometric_value != photometric::YCBCR {
        return Err(TiffError::UnsupportedEncoding(format!(
            "thumbnail IFD {} has photometric interpretation {}, only RGB and YCbCr are supported for re-encoding",
            index, photometric_value
        )));
    }
    let quality = estimate_jpeg_quality(original_ifd);

    let base = decode_ifd(source_path, original_ifd, tiff_reader)?;
    let level_mask = resample_mask(mask_full, full_width, full_height, width, height);
    let composited = composite_over(&base, &level_mask);

    let scratch = ScratchFile::new(scratch_dir, "thumb", index)?;
    save_untiled_jpeg(&composited, scratch.path_str(), photometric_value, quality, big_endian)?;

    let mut scratch_reader = TiffReader::new(logger);
    let mut redacted_tiff = scratch_reader.load(scratch.path_str())?;
    let mut redacted_ifd = redacted_tiff.ifds.remove(0);

    for &tag in THUMBNAIL_BACKFILL_TAGS {
        backfill_tag(&mut redacted_ifd, original_ifd, tag)?;
    }

    writer.write_ifd(dest, &redacted_ifd, None, ifd_ptr)
}

/// Copies `tag` from `src` into `dst` if `dst` lacks it, by reconstructing the
/// raw bytes and re-embedding them inline (every tag this is used for fits in
/// the 8-byte BigTIFF inline slot).
fn backfill_tag(dst: &mut IFD, src: &IFD, tag: u16) -> TiffResult<()> {
    if dst.has_tag(tag) || !src.has_tag(tag) {
        return Ok(());
    }
    let entry = match src.get_entry(tag) {
        Some(e) => e.clone(),
        None => return Ok(()),
    };
    let bytes = src.raw_tag_bytes(tag)?;
    if bytes.len() > 8 {
        return Ok(());
    }
    let mut padded = [0u8; 8];
    padded[..bytes.len()].copy_from_slice(&bytes);
    let value = if dst.big_endian { u64::from_be_bytes(padded) } else { u64::from_le_bytes(padded) };
    dst.source_is_big_tiff = true;
    dst.add_entry(IFDEntry::new(tag, entry.field_type, entry.count, value));
    Ok(())
}
