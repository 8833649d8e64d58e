//! Polygon rasterizer (C5)
//!
//! Produces an RGBA alpha mask from a polygon list at a requested resolution.
//! Filled interiors get α=255 and the fill colour; exterior pixels get α=0.
//! Multi-ring polygons use the even-odd fill rule (a ring contributes to the
//! interior test by parity, so a hole ring subtracts from an outer ring).

use image::{Rgba, RgbaImage};

use crate::mask::color::parse_color;
use crate::mask::polygon::Polygon;

/// Strategy contract for turning polygons into a raster mask
pub trait PolygonRasterizer {
    /// Renders `polygons` into an RGBA image of the given dimensions
    fn rasterize(&self, width: u32, height: u32, polygons: &[Polygon]) -> RgbaImage;
}

/// Default rasterizer: one scanline pass per row, even-odd fill per polygon
pub struct ScanlineRasterizer;

impl PolygonRasterizer for ScanlineRasterizer {
    fn rasterize(&self, width: u32, height: u32, polygons: &[Polygon]) -> RgbaImage {
        let mut mask = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

        for polygon in polygons {
            let color = parse_color(&polygon.fill_color);
            fill_polygon(&mut mask, polygon, color);
        }

        mask
    }
}

fn fill_polygon(mask: &mut RgbaImage, polygon: &Polygon, color: Rgba<u8>) {
    let edges: Vec<(f64, f64, f64, f64)> = polygon
        .rings
        .iter()
        .flat_map(|ring| ring_edges(ring))
        .collect();

    if edges.is_empty() {
        return;
    }

    let (height, width) = (mask.height(), mask.width());

    for y in 0..height {
        let scan_y = y as f64 + 0.5;
        let mut crossings: Vec<f64> = edges
            .iter()
            .filter_map(|&(x0, y0, x1, y1)| {
                if (y0 <= scan_y && y1 > scan_y) || (y1 <= scan_y && y0 > scan_y) {
                    let t = (scan_y - y0) / (y1 - y0);
                    Some(x0 + t * (x1 - x0))
                } else {
                    None
                }
            })
            .collect();

        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for pair in crossings.chunks_exact(2) {
            let (x_start, x_end) = (pair[0], pair[1]);
            let from = x_start.floor().max(0.0) as u32;
            let to = x_end.ceil().min(width as f64) as u32;
            for x in from..to {
                let px = x as f64 + 0.5;
                if px >= x_start && px < x_end {
                    mask.put_pixel(x, y, color);
                }
            }
        }
    }
}

fn ring_edges(ring: &[(f64, f64)]) -> Vec<(f64, f64, f64, f64)> {
    if ring.len() < 2 {
        return Vec::new();
    }
    ring.windows(2)
        .map(|pair| (pair[0].0, pair[0].1, pair[1].0, pair[1].1))
        .chain(std::iter::once((
            ring[ring.len() - 1].0,
            ring[ring.len() - 1].1,
            ring[0].0,
            ring[0].1,
        )))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(points: Vec<(f64, f64)>) -> Polygon {
        Polygon { rings: vec![points], fill_color: "red".to_string() }
    }

    #[test]
    fn interior_pixel_is_opaque() {
        let rasterizer = ScanlineRasterizer;
        let polygon = triangle(vec![(10.0, 10.0), (200.0, 10.0), (10.0, 200.0)]);
        let mask = rasterizer.rasterize(256, 256, &[polygon]);
        assert_eq!(mask.get_pixel(30, 30)[3], 255);
    }

    #[test]
    fn exterior_pixel_is_transparent() {
        let rasterizer = ScanlineRasterizer;
        let polygon = triangle(vec![(10.0, 10.0), (200.0, 10.0), (10.0, 200.0)]);
        let mask = rasterizer.rasterize(256, 256, &[polygon]);
        assert_eq!(mask.get_pixel(250, 250)[3], 0);
    }

    #[test]
    fn hole_ring_is_not_filled_even_odd() {
        let rasterizer = ScanlineRasterizer;
        let outer = vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)];
        let hole = vec![(30.0, 30.0), (70.0, 30.0), (70.0, 70.0), (30.0, 70.0)];
        let polygon = Polygon { rings: vec![outer, hole], fill_color: "black".to_string() };
        let mask = rasterizer.rasterize(100, 100, &[polygon]);
        assert_eq!(mask.get_pixel(50, 50)[3], 0, "hole center must stay transparent");
        assert_eq!(mask.get_pixel(10, 10)[3], 255, "outer ring must be filled");
    }
}
