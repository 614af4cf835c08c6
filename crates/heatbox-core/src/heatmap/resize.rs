//! Bilinear grid resizing with half-pixel centres.
//!
//! Output pixel `x` samples source position `(x + 0.5) · src / dst − 0.5`,
//! clamped to the source edges, so the grid is stretched over the frame with
//! each cell centred in its footprint. `FilterType::Triangle` is exactly this
//! kernel when upsampling.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma};
use ndarray::Array2;

/// Single-channel float image a heat grid is resized through.
type HeatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// View a grid as a `cols × rows` float image.
fn to_heat_image(grid: &Array2<f32>) -> HeatImage {
    let (rows, cols) = grid.dim();
    ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
        Luma([grid[[y as usize, x as usize]]])
    })
}

/// Resize `grid` to `(height, width)` with bilinear interpolation.
///
/// Values are expected in [0, 1]; `image` clamps float pixels to that range.
pub fn resize_bilinear(grid: &Array2<f32>, height: usize, width: usize) -> Array2<f32> {
    if grid.is_empty() || height == 0 || width == 0 {
        return Array2::zeros((height, width));
    }

    let resized = imageops::resize(
        &to_heat_image(grid),
        width as u32,
        height as u32,
        FilterType::Triangle,
    );
    Array2::from_shape_fn((height, width), |(y, x)| {
        resized.get_pixel(x as u32, y as u32)[0]
    })
}

/// Map a grid cell index to the pixel at the centre of its resized footprint.
///
/// `pixel = floor((cell + 0.5) · target / grid)`, clamped to `target − 1`.
pub fn map_to_pixel(cell: usize, grid_size: usize, target_size: usize) -> usize {
    let pixel = ((cell as f32 + 0.5) * target_size as f32 / grid_size as f32) as usize;
    pixel.min(target_size.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_resize() {
        let grid = array![[0.1f32, 0.2], [0.3, 0.4]];
        let out = resize_bilinear(&grid, 2, 2);
        assert!(out.iter().zip(grid.iter()).all(|(a, b)| (a - b).abs() < 1e-6));
    }

    #[test]
    fn test_upsample_impulse_profile() {
        let mut grid = Array2::<f32>::zeros((4, 4));
        grid[[1, 1]] = 1.0;
        let out = resize_bilinear(&grid, 8, 8);

        let expected_axis = [0.0, 0.25, 0.75, 0.75, 0.25, 0.0, 0.0, 0.0];
        for y in 0..8 {
            for x in 0..8 {
                let want = expected_axis[y] * expected_axis[x];
                assert!(
                    (out[[y, x]] - want).abs() < 1e-6,
                    "({y},{x}): {} vs {want}",
                    out[[y, x]]
                );
            }
        }
    }

    #[test]
    fn test_constant_grid_stays_constant() {
        let grid = Array2::<f32>::from_elem((3, 5), 0.4);
        let out = resize_bilinear(&grid, 30, 17);
        assert_eq!(out.dim(), (30, 17));
        assert!(out.iter().all(|&v| (v - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_heat_image_layout() {
        let grid = array![[0.1f32, 0.2, 0.3], [0.4, 0.5, 0.6]];
        let image = to_heat_image(&grid);
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1)[0], 0.6);
    }

    #[test]
    fn test_map_to_pixel_centres_cells() {
        assert_eq!(map_to_pixel(1, 4, 8), 3);
        assert_eq!(map_to_pixel(0, 22, 720), 16);
        assert_eq!(map_to_pixel(21, 22, 720), 703);
        assert_eq!(map_to_pixel(39, 40, 1280), 1264);
    }
}
