use crate::sample::Landmarks;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::imageops::{self, FilterType};
use image::GrayImage;

/// Crops the centered square out of a rectangular radiograph, shifting
/// the landmarks into crop-local coordinates.
///
/// The square edge is the shorter image dimension. The crop starts at
/// `(longer - shorter) / 2` along the longer axis, with integer division,
/// so an odd surplus leaves the extra row or column on the far side. A
/// square input passes through unchanged.
///
/// Landmarks translate by the negated crop offset; a landmark that sat in
/// the discarded margin goes negative, which is the caller's signal that
/// the annotation fell outside the anatomy-centered square.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterSquareCrop;

impl Transform<(GrayImage, Landmarks), (GrayImage, Landmarks)> for CenterSquareCrop {
    fn apply(&self, (image, landmarks): (GrayImage, Landmarks)) -> Result<(GrayImage, Landmarks)> {
        let (width, height) = image.dimensions();
        ensure!(
            width > 0 && height > 0,
            "cannot crop an empty image ({}x{})",
            width,
            height
        );

        if height > width {
            let start = (height - width) / 2;
            let cropped = imageops::crop_imm(&image, 0, start, width, width).to_image();
            Ok((cropped, landmarks.translate_y(-(start as f64))))
        } else {
            let start = (width - height) / 2;
            let cropped = imageops::crop_imm(&image, start, 0, height, height).to_image();
            Ok((cropped, landmarks.translate_x(-(start as f64))))
        }
    }
}

/// Resamples a square radiograph to a fixed edge length, scaling the
/// landmarks by the same per-axis factors.
///
/// Bilinear filtering, matching the default of the usual raster resize
/// routines. The input is not required to be square; landmarks follow
/// `x * size / width` and `y * size / height` regardless, so the transform
/// composes correctly after [`CenterSquareCrop`] and also stands alone.
#[derive(Debug, Clone, Copy)]
pub struct RescaleToSquare {
    size: u32,
}

impl RescaleToSquare {
    pub fn new(size: u32) -> Result<Self> {
        ensure!(size > 0, "rescale edge must be > 0, but got size={}", size);
        Ok(Self { size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl Transform<(GrayImage, Landmarks), (GrayImage, Landmarks)> for RescaleToSquare {
    fn apply(&self, (image, landmarks): (GrayImage, Landmarks)) -> Result<(GrayImage, Landmarks)> {
        let (width, height) = image.dimensions();
        ensure!(
            width > 0 && height > 0,
            "cannot rescale an empty image ({}x{})",
            width,
            height
        );

        let resized = imageops::resize(&image, self.size, self.size, FilterType::Triangle);
        let sx = self.size as f64 / width as f64;
        let sy = self.size as f64 / height as f64;
        Ok((resized, landmarks.scale(sx, sy)))
    }
}
