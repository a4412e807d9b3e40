use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::GrayImage;
use log::warn;
use ndarray::Array2;

/// Min-max normalization of a raw intensity grid into an 8-bit image.
///
/// Maps the observed minimum to 0 and the observed maximum to 255, linearly
/// in between. Using the observed range rather than the nominal bit depth
/// matters for radiographs: exposures rarely span the full acquisition
/// range, and normalizing per image makes cohorts from different detectors
/// comparable.
///
/// A constant grid (max == min) carries no contrast to stretch; it becomes
/// an all-zero image and a warning is logged, since a flat radiograph is
/// almost always an export problem upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntensityNormalize;

impl Transform<Array2<u16>, GrayImage> for IntensityNormalize {
    fn apply(&self, grid: Array2<u16>) -> Result<GrayImage> {
        let (height, width) = grid.dim();
        ensure!(
            height > 0 && width > 0,
            "cannot normalize an empty intensity grid ({}x{})",
            height,
            width
        );

        // Single pass for the range; iteration order does not matter here.
        let mut min = u16::MAX;
        let mut max = u16::MIN;
        for &v in grid.iter() {
            min = min.min(v);
            max = max.max(v);
        }

        let mut out = GrayImage::new(width as u32, height as u32);
        if max == min {
            warn!(
                "intensity grid is constant (value {}); emitting an all-zero image",
                min
            );
            return Ok(out);
        }

        let span = (max - min) as f64;
        for ((row, col), &v) in grid.indexed_iter() {
            let scaled = ((v - min) as f64 / span * 255.0) as u8;
            out.put_pixel(col as u32, row as u32, image::Luma([scaled]));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_maps_observed_range_to_full_u8() -> Result<()> {
        let grid: Array2<u16> = array![[100, 300], [500, 100]];
        let img = IntensityNormalize.apply(grid)?;
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0[0], 0); // min -> 0
        assert_eq!(img.get_pixel(0, 1).0[0], 255); // max -> 255
        assert_eq!(img.get_pixel(1, 0).0[0], 127); // (300-100)/400*255 = 127.5, truncated
        Ok(())
    }

    #[test]
    fn test_constant_grid_becomes_all_zero() -> Result<()> {
        let grid = Array2::<u16>::from_elem((3, 3), 4096);
        let img = IntensityNormalize.apply(grid)?;
        assert!(img.pixels().all(|p| p.0[0] == 0));
        Ok(())
    }

    #[test]
    fn test_preserves_row_major_orientation() -> Result<()> {
        // One bright pixel at grid (row=2, col=1) must land at image (x=1, y=2).
        let mut grid = Array2::<u16>::zeros((4, 3));
        grid[[2, 1]] = 1000;
        let img = IntensityNormalize.apply(grid)?;
        assert_eq!(img.dimensions(), (3, 4));
        assert_eq!(img.get_pixel(1, 2).0[0], 255);
        assert_eq!(img.get_pixel(2, 1).0[0], 0);
        Ok(())
    }

    #[test]
    fn test_rejects_empty_grid() {
        let grid = Array2::<u16>::zeros((0, 5));
        assert!(IntensityNormalize.apply(grid).is_err());
    }
}
