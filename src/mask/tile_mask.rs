//! Tile-mask computer (C6)
//!
//! Resamples the full-resolution polygon mask to a pyramid level's geometry
//! and decides, per tile, whether any pixel under it is marked for redaction.

use image::{imageops, RgbaImage};

/// Resamples `mask` to `(width, height)` if its size differs, then returns the
/// per-tile selection vector `R[i]` in row-major tile order: `R[i]` is true iff
/// the maximum alpha sample inside tile `i`'s rectangle is non-zero.
///
/// Resampling uses a triangle (linear) filter, which cannot zero out an
/// isolated positive alpha sample the way a sharpening kernel could — a
/// polygon must never vanish purely because of downscaling.
pub fn compute_tile_selection(
    mask: &RgbaImage,
    width: u64,
    height: u64,
    tile_width: u64,
    tile_height: u64,
) -> Vec<bool> {
    let resampled = if mask.width() as u64 != width || mask.height() as u64 != height {
        imageops::resize(mask, width as u32, height as u32, imageops::FilterType::Triangle)
    } else {
        mask.clone()
    };

    let cols = width.div_ceil(tile_width);
    let rows = height.div_ceil(tile_height);
    let mut selection = Vec::with_capacity((cols * rows) as usize);

    for row in 0..rows {
        for col in 0..cols {
            let x0 = col * tile_width;
            let y0 = row * tile_height;
            let x1 = (x0 + tile_width).min(width);
            let y1 = (y0 + tile_height).min(height);

            let mut max_alpha = 0u8;
            for y in y0..y1 {
                for x in x0..x1 {
                    let alpha = resampled.get_pixel(x as u32, y as u32)[3];
                    if alpha > max_alpha {
                        max_alpha = alpha;
                    }
                }
            }
            selection.push(max_alpha > 0);
        }
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn selects_only_tiles_under_mask() {
        let mut mask = RgbaImage::from_pixel(512, 512, Rgba([0, 0, 0, 0]));
        for y in 0..256u32 {
            for x in 0..256u32 {
                mask.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let selection = compute_tile_selection(&mask, 512, 512, 256, 256);
        assert_eq!(selection, vec![true, false, false, false]);
    }

    #[test]
    fn resamples_to_target_dimensions() {
        let mut mask = RgbaImage::from_pixel(512, 512, Rgba([0, 0, 0, 0]));
        for y in 0..512u32 {
            for x in 0..512u32 {
                mask.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let selection = compute_tile_selection(&mask, 256, 256, 256, 256);
        assert_eq!(selection, vec![true]);
    }

    #[test]
    fn empty_mask_selects_nothing() {
        let mask = RgbaImage::from_pixel(256, 256, Rgba([0, 0, 0, 0]));
        let selection = compute_tile_selection(&mask, 256, 256, 128, 128);
        assert_eq!(selection, vec![false, false, false, false]);
    }
}
