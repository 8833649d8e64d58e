//! Annotation-driven redaction mask: parsing, rasterization, and per-tile
//! intersection (C5, C6, C13).

pub mod color;
pub mod polygon;
pub mod rasterizer;
pub mod tile_mask;

pub use polygon::{load_polygons, parse_annotation, Polygon};
pub use rasterizer::{PolygonRasterizer, ScanlineRasterizer};
pub use tile_mask::compute_tile_selection;
