//! Default raster compositor implementation, grounded on the tile/strip
//! readers used elsewhere in this crate for pixel access and on the BigTIFF
//! writer for emission.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};

use crate::extractor::strip_reader::StripReader;
use crate::extractor::tile_reader::TileReader;
use crate::extractor::Region;
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{compression, field_types, photometric, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::reader::TiffReader;
use crate::tiff::writer::BigTiffWriter;

/// Decodes the full pixel raster described by `ifd`, dispatching to the tiled
/// or stripped reader depending on which layout tags the IFD carries.
pub fn decode_ifd(source_path: &str, ifd: &IFD, tiff_reader: &TiffReader) -> TiffResult<RgbImage> {
    let (width, height) = ifd
        .get_dimensions()
        .ok_or_else(|| TiffError::InputMalformed("IFD is missing image dimensions".to_string()))?;
    let region = Region::new(0, 0, width as u32, height as u32);

    let file = File::open(source_path)?;
    let reader = BufReader::with_capacity(1024 * 1024, file);
    let mut image = image::ImageBuffer::<Rgb<u8>, Vec<u8>>::new(region.width, region.height);

    if ifd.has_tag(tags::TILE_WIDTH) && ifd.has_tag(tags::TILE_LENGTH) {
        let mut tile_reader = TileReader::new(reader, ifd, tiff_reader);
        tile_reader.extract(&mut image, region)?;
    } else {
        let mut strip_reader = StripReader::new(reader, ifd, tiff_reader);
        strip_reader.extract(&mut image, region)?;
    }

    Ok(image)
}

/// Standard "over" alpha compositing of `mask` onto `base`: pixels with
/// `mask` alpha 0 are untouched, alpha 255 fully replaced, anything between
/// blended proportionally.
pub fn composite_over(base: &RgbImage, mask: &RgbaImage) -> RgbImage {
    let (width, height) = base.dimensions();
    let mut out = base.clone();

    for y in 0..height.min(mask.height()) {
        for x in 0..width.min(mask.width()) {
            let mask_px = mask.get_pixel(x, y);
            let alpha = mask_px[3] as f32 / 255.0;
            if alpha <= 0.0 {
                continue;
            }
            let base_px = base.get_pixel(x, y);
            let blended = [0usize, 1, 2].map(|c| {
                let base_c = base_px[c] as f32;
                let mask_c = mask_px[c] as f32;
                (mask_c * alpha + base_c * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8
            });
            out.put_pixel(x, y, Rgb(blended));
        }
    }

    out
}

/// Accumulates tag payloads and tile/strip data for a synthetic single-IFD
/// BigTIFF so the writer can find real file bytes behind every entry.
struct Blob {
    bytes: Vec<u8>,
}

impl Blob {
    fn new() -> Self {
        Blob { bytes: Vec::new() }
    }

    fn spill(&mut self, payload: &[u8]) -> u64 {
        let offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(payload);
        offset
    }
}

fn pack_u16_array(values: &[u16], big_endian: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for v in values {
        if big_endian {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}

/// Extracts the header segments (everything before the first scan) of an
/// encoded JPEG stream: APPn, the quantization tables (DQT), SOF0, and the
/// Huffman tables (DHT). Stashed as the scratch IFD's `JPEGTables` entry so
/// the compatibility checker (C8) can recover the quality this tile was
/// actually encoded at instead of falling back to the default.
fn extract_jpeg_tables(encoded: &[u8]) -> Vec<u8> {
    let mut i = 0usize;
    while i + 1 < encoded.len() {
        if encoded[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = encoded[i + 1];
        if marker == 0xD8 {
            i += 2;
            continue;
        }
        if marker == 0xDA {
            return encoded[..i].to_vec();
        }
        if i + 3 >= encoded.len() {
            break;
        }
        let seg_len = ((encoded[i + 2] as usize) << 8) | encoded[i + 3] as usize;
        if seg_len < 2 {
            break;
        }
        i += 2 + seg_len;
    }
    encoded.to_vec()
}

/// Writes a single tiled-JPEG IFD BigTIFF scratch file per the raster
/// compositor contract. Tile dimensions and photometric are honoured exactly;
/// edge tiles are padded with black before JPEG encoding, matching the
/// padding every tiled-JPEG whole-slide image already carries.
pub fn save_tiled_jpeg(
    image: &RgbImage,
    path: &str,
    tile_width: u32,
    tile_height: u32,
    photometric_interpretation: u16,
    quality: u8,
    big_endian: bool,
) -> TiffResult<()> {
    let (width, height) = image.dimensions();
    let cols = width.div_ceil(tile_width);
    let rows = height.div_ceil(tile_height);

    let mut blob = Blob::new();
    let mut tile_offsets = Vec::with_capacity((cols * rows) as usize);
    let mut tile_bytecounts = Vec::with_capacity((cols * rows) as usize);
    let mut jpeg_tables: Option<Vec<u8>> = None;

    for row in 0..rows {
        for col in 0..cols {
            let x0 = col * tile_width;
            let y0 = row * tile_height;
            let mut tile = RgbImage::from_pixel(tile_width, tile_height, Rgb([0, 0, 0]));
            for ty in 0..tile_height {
                let src_y = y0 + ty;
                if src_y >= height {
                    continue;
                }
                for tx in 0..tile_width {
                    let src_x = x0 + tx;
                    if src_x >= width {
                        continue;
                    }
                    tile.put_pixel(tx, ty, *image.get_pixel(src_x, src_y));
                }
            }

            let mut encoded = Vec::new();
            let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
            encoder
                .encode(tile.as_raw(), tile_width, tile_height, image::ExtendedColorType::Rgb8)
                .map_err(|e| TiffError::GenericError(format!("JPEG tile encode failed: {}", e)))?;

            if jpeg_tables.is_none() {
                jpeg_tables = Some(extract_jpeg_tables(&encoded));
            }

            tile_bytecounts.push(encoded.len() as u64);
            tile_offsets.push(blob.spill(&encoded));
        }
    }

    write_single_ifd_bigtiff(
        path,
        width as u64,
        height as u64,
        photometric_interpretation,
        &mut blob,
        TagLayout::Tiled { tile_width: tile_width as u64, tile_height: tile_height as u64 },
        tile_offsets,
        tile_bytecounts,
        big_endian,
        jpeg_tables.unwrap_or_default(),
    )
}

/// Writes a single untiled-JPEG IFD BigTIFF scratch file (a single strip
/// spanning the whole image), for thumbnails.
pub fn save_untiled_jpeg(
    image: &RgbImage,
    path: &str,
    photometric_interpretation: u16,
    quality: u8,
    big_endian: bool,
) -> TiffResult<()> {
    let (width, height) = image.dimensions();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder
        .encode(image.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| TiffError::GenericError(format!("JPEG encode failed: {}", e)))?;

    let jpeg_tables = extract_jpeg_tables(&encoded);

    let mut blob = Blob::new();
    let bytecount = encoded.len() as u64;
    let offset = blob.spill(&encoded);

    write_single_ifd_bigtiff(
        path,
        width as u64,
        height as u64,
        photometric_interpretation,
        &mut blob,
        TagLayout::Strip { rows_per_strip: height as u64 },
        vec![offset],
        vec![bytecount],
        big_endian,
        jpeg_tables,
    )
}

enum TagLayout {
    Tiled { tile_width: u64, tile_height: u64 },
    Strip { rows_per_strip: u64 },
}

#[allow(clippy::too_many_arguments)]
fn write_single_ifd_bigtiff(
    path: &str,
    width: u64,
    height: u64,
    photometric_interpretation: u16,
    blob: &mut Blob,
    layout: TagLayout,
    data_offsets: Vec<u64>,
    data_bytecounts: Vec<u64>,
    big_endian: bool,
    jpeg_tables: Vec<u8>,
) -> TiffResult<()> {
    let bits_per_sample = pack_u16_array(&[8, 8, 8], big_endian);
    let bits_per_sample_offset = blob.spill(&bits_per_sample);

    let mut ifd = IFD::new(0, 0);
    ifd.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, width));
    ifd.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, height));
    ifd.add_entry(IFDEntry::new(tags::BITS_PER_SAMPLE, field_types::SHORT, 3, bits_per_sample_offset));
    ifd.add_entry(IFDEntry::new(tags::COMPRESSION, field_types::SHORT, 1, compression::JPEG as u64));
    ifd.add_entry(IFDEntry::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        field_types::SHORT,
        1,
        photometric_interpretation as u64,
    ));
    ifd.add_entry(IFDEntry::new(tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, 3));
    ifd.add_entry(IFDEntry::new(tags::PLANAR_CONFIGURATION, field_types::SHORT, 1, 1));

    if !jpeg_tables.is_empty() {
        let jpeg_tables_offset = blob.spill(&jpeg_tables);
        ifd.add_entry(IFDEntry::new(
            tags::JPEG_TABLES,
            field_types::UNDEFINED,
            jpeg_tables.len() as u64,
            jpeg_tables_offset,
        ));
    }

    match layout {
        TagLayout::Tiled { tile_width, tile_height } => {
            ifd.add_entry(IFDEntry::new(tags::TILE_WIDTH, field_types::LONG, 1, tile_width));
            ifd.add_entry(IFDEntry::new(tags::TILE_LENGTH, field_types::LONG, 1, tile_height));
            ifd.add_entry(IFDEntry::new(tags::TILE_OFFSETS, field_types::LONG8, data_offsets.len() as u64, 0));
            ifd.add_entry(IFDEntry::new(tags::TILE_BYTE_COUNTS, field_types::LONG8, data_bytecounts.len() as u64, 0));
            ifd.set_tag_values(tags::TILE_OFFSETS, data_offsets);
            ifd.set_tag_values(tags::TILE_BYTE_COUNTS, data_bytecounts);
        }
        TagLayout::Strip { rows_per_strip } => {
            ifd.add_entry(IFDEntry::new(tags::ROWS_PER_STRIP, field_types::LONG, 1, rows_per_strip));
            ifd.add_entry(IFDEntry::new(tags::STRIP_OFFSETS, field_types::LONG8, data_offsets.len() as u64, 0));
            ifd.add_entry(IFDEntry::new(tags::STRIP_BYTE_COUNTS, field_types::LONG8, data_bytecounts.len() as u64, 0));
            ifd.set_tag_values(tags::STRIP_OFFSETS, data_offsets);
            ifd.set_tag_values(tags::STRIP_BYTE_COUNTS, data_bytecounts);
        }
    }

    let blob_path = format!("{}.blob.tmp", path);
    {
        let mut blob_file = File::create(&blob_path)?;
        blob_file.write_all(&blob.bytes)?;
    }
    ifd.set_source(&blob_path, blob.bytes.len() as u64, big_endian, false);

    let byte_order = if big_endian { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
    let writer = BigTiffWriter::new(byte_order);
    let result = writer.write(path, std::slice::from_ref(&ifd), &HashMap::new());
    let _ = std::fs::remove_file(&blob_path);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn composite_over_blends_by_alpha() {
        let base = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let mut mask = RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 0, 0]));
        mask.put_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let out = composite_over(&base, &mask);
        assert_eq!(*out.get_pixel(1, 1), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn save_tiled_jpeg_round_trips_through_reader() {
        let image = RgbImage::from_pixel(300, 200, Rgb([10, 20, 30]));
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap().to_string();
        save_tiled_jpeg(&image, &path, 256, 256, photometric::RGB, 80, false).unwrap();

        let log_file = NamedTempFile::new().unwrap();
        let logger = crate::utils::logger::Logger::new(log_file.path().to_str().unwrap()).unwrap();
        let mut reader = TiffReader::new(&logger);
        let tiff = reader.load(&path).unwrap();
        assert_eq!(tiff.ifds.len(), 1);
        assert_eq!(tiff.ifds[0].get_dimensions(), Some((300, 200)));
    }

    #[test]
    fn save_untiled_jpeg_round_trips_through_reader() {
        let image = RgbImage::from_pixel(64, 48, Rgb([5, 5, 5]));
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap().to_string();
        save_untiled_jpeg(&image, &path, photometric::RGB, 80, false).unwrap();

        let log_file = NamedTempFile::new().unwrap();
        let logger = crate::utils::logger::Logger::new(log_file.path().to_str().unwrap()).unwrap();
        let mut reader = TiffReader::new(&logger);
        let tiff = reader.load(&path).unwrap();
        assert_eq!(tiff.ifds[0].get_dimensions(), Some((64, 48)));
    }

    #[test]
    fn extract_jpeg_tables_stops_before_scan_data() {
        let image = RgbImage::from_pixel(32, 32, Rgb([20, 40, 60]));
        let mut encoded = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, 80);
        encoder.encode(image.as_raw(), 32, 32, image::ExtendedColorType::Rgb8).unwrap();

        let tables = extract_jpeg_tables(&encoded);
        assert!(tables.len() < encoded.len(), "header segments should be shorter than the full stream");
        assert!(tables.windows(2).any(|w| w == [0xFF, 0xDB]), "expected a DQT marker in the extracted tables");
        assert!(!tables.windows(2).any(|w| w == [0xFF, 0xDA]), "SOS marker should not be included");
    }

    #[test]
    fn save_tiled_jpeg_scratch_ifd_carries_jpeg_tables() {
        let image = RgbImage::from_pixel(300, 200, Rgb([10, 20, 30]));
        let out = NamedTempFile::new().unwrap();
        let path = out.path().to_str().unwrap().to_string();
        save_tiled_jpeg(&image, &path, 256, 256, photometric::RGB, 80, false).unwrap();

        let log_file = NamedTempFile::new().unwrap();
        let logger = crate::utils::logger::Logger::new(log_file.path().to_str().unwrap()).unwrap();
        let mut reader = TiffReader::new(&logger);
        let tiff = reader.load(&path).unwrap();
        let ifd = &tiff.ifds[0];

        assert!(ifd.has_tag(tags::JPEG_TABLES));
        let raw = ifd.raw_tag_bytes(tags::JPEG_TABLES).unwrap();
        assert!(!raw.is_empty());
        let estimated = crate::compression::jpeg::estimate_quality(ifd, Some(&raw), None);
        assert!((60..=100).contains(&estimated), "expected an estimate near 80, got {}", estimated);
    }
}
