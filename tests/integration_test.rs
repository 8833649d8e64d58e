//! End-to-end redaction test: builds a synthetic two-IFD BigTIFF (one tiled
//! pyramid level, one thumbnail), redacts a single polygon over its top-left
//! tile, and checks that untouched tiles are copied byte-for-byte from the
//! source while the touched tile is recompressed.

use std::collections::HashMap;
use std::fs;
use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::Rgb;

use wsi_redactor::redact;
use wsi_redactor::tiff::constants::{compression, field_types, photometric, tags};
use wsi_redactor::tiff::writer::BigTiffWriter;
use wsi_redactor::tiff::{ByteOrder, IFDEntry, TiffReader, IFD};
use wsi_redactor::utils::logger::Logger;

const TILE: u32 = 128;
const LEVEL_SIZE: u32 = 256;
const THUMB_SIZE: u32 = 64;

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

fn encode_tile(color: [u8; 3]) -> Vec<u8> {
    let tile = image::RgbImage::from_pixel(TILE, TILE, Rgb(color));
    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, 90);
    encoder.encode(tile.as_raw(), TILE, TILE, image::ExtendedColorType::Rgb8).unwrap();
    encoded
}

fn pack_u16_array(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Builds a two-IFD source BigTIFF: a 256x256 tiled level (2x2 grid of
/// 128x128 tiles, each a distinct flat color) and a 64x64 thumbnail.
fn build_source(path: &str, blob_path: &str) {
    let mut blob = Blob::new();

    let bits_per_sample = pack_u16_array(&[8, 8, 8]);
    let tile_bps_offset = blob.spill(&bits_per_sample);

    let tile_colors = [[200, 0, 0], [0, 200, 0], [0, 0, 200], [200, 200, 0]];
    let mut tile_offsets = Vec::new();
    let mut tile_bytecounts = Vec::new();
    for color in tile_colors {
        let encoded = encode_tile(color);
        tile_bytecounts.push(encoded.len() as u64);
        tile_offsets.push(blob.spill(&encoded));
    }

    let mut tile_ifd = IFD::new(0, 0);
    tile_ifd.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, LEVEL_SIZE as u64));
    tile_ifd.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, LEVEL_SIZE as u64));
    tile_ifd.add_entry(IFDEntry::new(tags::BITS_PER_SAMPLE, field_types::SHORT, 3, tile_bps_offset));
    tile_ifd.add_entry(IFDEntry::new(tags::COMPRESSION, field_types::SHORT, 1, compression::JPEG as u64));
    tile_ifd.add_entry(IFDEntry::new(tags::PHOTOMETRIC_INTERPRETATION, field_types::SHORT, 1, photometric::RGB as u64));
    tile_ifd.add_entry(IFDEntry::new(tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, 3));
    tile_ifd.add_entry(IFDEntry::new(tags::PLANAR_CONFIGURATION, field_types::SHORT, 1, 1));
    tile_ifd.add_entry(IFDEntry::new(tags::TILE_WIDTH, field_types::LONG, 1, TILE as u64));
    tile_ifd.add_entry(IFDEntry::new(tags::TILE_LENGTH, field_types::LONG, 1, TILE as u64));
    tile_ifd.add_entry(IFDEntry::new(tags::TILE_OFFSETS, field_types::LONG8, tile_offsets.len() as u64, 0));
    tile_ifd.add_entry(IFDEntry::new(tags::TILE_BYTE_COUNTS, field_types::LONG8, tile_bytecounts.len() as u64, 0));
    tile_ifd.set_tag_values(tags::TILE_OFFSETS, tile_offsets);
    tile_ifd.set_tag_values(tags::TILE_BYTE_COUNTS, tile_bytecounts);

    let thumb_bps_offset = blob.spill(&bits_per_sample);
    let thumb_encoded = encode_tile_image(THUMB_SIZE, [128, 128, 128]);
    let thumb_bytecount = thumb_encoded.len() as u64;
    let thumb_offset = blob.spill(&thumb_encoded);

    let mut thumb_ifd = IFD::new(1, 0);
    thumb_ifd.add_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, field_types::LONG, 1, 0));
    thumb_ifd.add_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, THUMB_SIZE as u64));
    thumb_ifd.add_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, THUMB_SIZE as u64));
    thumb_ifd.add_entry(IFDEntry::new(tags::BITS_PER_SAMPLE, field_types::SHORT, 3, thumb_bps_offset));
    thumb_ifd.add_entry(IFDEntry::new(tags::COMPRESSION, field_types::SHORT, 1, compression::JPEG as u64));
    thumb_ifd.add_entry(IFDEntry::new(tags::PHOTOMETRIC_INTERPRETATION, field_types::SHORT, 1, photometric::RGB as u64));
    thumb_ifd.add_entry(IFDEntry::new(tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, 3));
    thumb_ifd.add_entry(IFDEntry::new(tags::PLANAR_CONFIGURATION, field_types::SHORT, 1, 1));
    thumb_ifd.add_entry(IFDEntry::new(tags::ROWS_PER_STRIP, field_types::LONG, 1, THUMB_SIZE as u64));
    thumb_ifd.add_entry(IFDEntry::new(tags::STRIP_OFFSETS, field_types::LONG8, 1, 0));
    thumb_ifd.add_entry(IFDEntry::new(tags::STRIP_BYTE_COUNTS, field_types::LONG8, 1, 0));
    thumb_ifd.set_tag_values(tags::STRIP_OFFSETS, vec![thumb_offset]);
    thumb_ifd.set_tag_values(tags::STRIP_BYTE_COUNTS, vec![thumb_bytecount]);

    {
        let mut blob_file = fs::File::create(blob_path).unwrap();
        blob_file.write_all(&blob.bytes).unwrap();
    }
    tile_ifd.set_source(blob_path, blob.bytes.len() as u64, false, false);
    thumb_ifd.set_source(blob_path, blob.bytes.len() as u64, false, false);

    let writer = BigTiffWriter::new(ByteOrder::LittleEndian);
    writer.write(path, &[tile_ifd, thumb_ifd], &HashMap::new()).unwrap();
}

fn encode_tile_image(size: u32, color: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(size, size, Rgb(color));
    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, 90);
    encoder.encode(image.as_raw(), size, size, image::ExtendedColorType::Rgb8).unwrap();
    encoded
}

fn read_tile_bytes(path: &str, ifd: &IFD, tile_index: usize) -> Vec<u8> {
    let offsets = ifd.get_tag_values(tags::TILE_OFFSETS).unwrap();
    let bytecounts = ifd.get_tag_values(tags::TILE_BYTE_COUNTS).unwrap();
    let offset = offsets[tile_index];
    let len = bytecounts[tile_index] as usize;
    let bytes = fs::read(path).unwrap();
    bytes[offset as usize..offset as usize + len].to_vec()
}

#[test]
fn redacts_only_tiles_under_the_polygon() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.tiff").to_str().unwrap().to_string();
    let blob_path = dir.path().join("source.blob").to_str().unwrap().to_string();
    let output_path = dir.path().join("output.tiff").to_str().unwrap().to_string();
    let annotation_path = dir.path().join("annotation.json").to_str().unwrap().to_string();
    let log_path = dir.path().join("log.txt").to_str().unwrap().to_string();

    build_source(&source_path, &blob_path);

    let annotation = r#"{
        "annotation": {
            "elements": [
                {"type": "polyline", "points": [[0,0],[100,0],[100,100],[0,100]], "fillColor": "black"}
            ]
        }
    }"#;
    fs::write(&annotation_path, annotation).unwrap();

    let logger = Logger::new(&log_path).unwrap();
    redact::redact(&source_path, &output_path, &annotation_path, &logger).unwrap();

    let mut reader = TiffReader::new(&logger);
    let source_tiff = reader.load(&source_path).unwrap();
    let mut out_reader = TiffReader::new(&logger);
    let output_tiff = out_reader.load(&output_path).unwrap();

    assert_eq!(output_tiff.ifds.len(), 2);
    assert_eq!(output_tiff.ifds[0].get_dimensions(), Some((LEVEL_SIZE as u64, LEVEL_SIZE as u64)));
    assert_eq!(output_tiff.ifds[1].get_dimensions(), Some((THUMB_SIZE as u64, THUMB_SIZE as u64)));

    // tile 0 (top-left, under the polygon) must have been recompressed
    let source_tile_0 = read_tile_bytes(&source_path, &source_tiff.ifds[0], 0);
    let output_tile_0 = read_tile_bytes(&output_path, &output_tiff.ifds[0], 0);
    assert_ne!(source_tile_0, output_tile_0, "redacted tile should differ from the source");

    // the other three tiles fall outside the polygon and must be byte-identical
    for i in 1..4 {
        let source_tile = read_tile_bytes(&source_path, &source_tiff.ifds[0], i);
        let output_tile = read_tile_bytes(&output_path, &output_tiff.ifds[0], i);
        assert_eq!(source_tile, output_tile, "untouched tile {} should be copied verbatim", i);
    }
}

#[test]
fn same_input_and_output_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.tiff").to_str().unwrap().to_string();
    let blob_path = dir.path().join("source.blob").to_str().unwrap().to_string();
    let annotation_path = dir.path().join("annotation.json").to_str().unwrap().to_string();
    let log_path = dir.path().join("log.txt").to_str().unwrap().to_string();

    build_source(&source_path, &blob_path);
    fs::write(&annotation_path, r#"{"annotation": {"elements": []}}"#).unwrap();

    let logger = Logger::new(&log_path).unwrap();
    let result = redact::redact(&source_path, &source_path, &annotation_path, &logger);
    assert!(result.is_err());
}
