use crate::error::PrepError;
use anyhow::{ensure, Result};
use ndarray::Array2;
use std::path::Path;

/// Decodes a radiograph file into a raw intensity grid.
///
/// The grid is row-major with shape `(height, width)`, holding the
/// acquisition bit depth widened to `u16`. Everything downstream works on
/// this grid, so swapping in a decoder for another acquisition format (for
/// example a DICOM reader) touches nothing but this seam.
///
/// Implementations must be `Send + Sync` so a decoder can be shared when
/// loading is parallelized later.
pub trait RadiographDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Array2<u16>>;
}

/// Decoder for standard raster formats (PNG, TIFF, JPEG and the other
/// formats the `image` crate understands).
///
/// Color inputs are collapsed to luminance; 8-bit inputs are widened to
/// 16-bit by the decoder, which is harmless because the normalization stage
/// rescales by the observed range rather than the nominal one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFormatDecoder;

impl RadiographDecoder for StandardFormatDecoder {
    fn decode(&self, path: &Path) -> Result<Array2<u16>> {
        let image = image::open(path).map_err(|source| PrepError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let gray = image.into_luma16();
        let (width, height) = gray.dimensions();
        ensure!(
            width > 0 && height > 0,
            "decoded image {} has a zero dimension ({}x{})",
            path.display(),
            width,
            height
        );
        let grid = Array2::from_shape_vec((height as usize, width as usize), gray.into_raw())?;
        Ok(grid)
    }
}
