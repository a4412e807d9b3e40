use crate::dataset::Dataset;
use crate::sample::{Landmarks, Sample};
use crate::sampler::RandomSampler;
use anyhow::{ensure, Result};
use image::imageops::{self, FilterType};
use image::GrayImage;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One randomized augmentation operator.
///
/// Every operator carries an activation probability `p`. When an operator
/// runs over a sample it always consumes exactly one uniform draw for the
/// activation decision, whether or not it fires; parameter draws happen only
/// when it fires. Keeping the draw count per inactive operator fixed at one
/// means toggling probabilities never shifts the random stream consumed by
/// the operators after it.
///
/// Operators that move pixels move the landmarks through the identical
/// mapping, so a landmark keeps pointing at the same anatomy afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum AugmentOp {
    /// Crops a random sub-window and resizes it to a fixed square.
    ///
    /// The window area is drawn as a fraction of the image area from
    /// `scale`, and its aspect ratio log-uniformly from `ratio`. Landmarks
    /// translate into the window then rescale with it; ones that fall in
    /// the discarded region leave the `0..size` range rather than being
    /// dropped.
    CropResize {
        size: u32,
        scale: (f64, f64),
        ratio: (f64, f64),
        p: f64,
    },
    /// Shifts brightness and scales contrast, both drawn uniformly from
    /// `[-limit, limit]`. Pixels map through
    /// `clamp(v * (1 + contrast) + brightness * 255)`; landmarks are
    /// untouched.
    BrightnessContrast {
        brightness_limit: f64,
        contrast_limit: f64,
        p: f64,
    },
    /// Rotates about the image center by an angle drawn uniformly from
    /// `[-limit_degrees, limit_degrees]`. The frame keeps its size; pixels
    /// rotated in from outside are black, landmarks rotated out of frame
    /// keep their out-of-range coordinates.
    Rotate { limit_degrees: f64, p: f64 },
    /// Inverts intensities (`255 - v`). Landmarks are untouched.
    Invert { p: f64 },
    /// Mirrors top-to-bottom; `y` becomes `(height - 1) - y`.
    VerticalFlip { p: f64 },
    /// Mirrors left-to-right; `x` becomes `(width - 1) - x`.
    HorizontalFlip { p: f64 },
}

impl AugmentOp {
    pub fn probability(&self) -> f64 {
        match *self {
            AugmentOp::CropResize { p, .. }
            | AugmentOp::BrightnessContrast { p, .. }
            | AugmentOp::Rotate { p, .. }
            | AugmentOp::Invert { p }
            | AugmentOp::VerticalFlip { p }
            | AugmentOp::HorizontalFlip { p } => p,
        }
    }

    fn validate(&self) -> Result<()> {
        let p = self.probability();
        ensure!(
            (0.0..=1.0).contains(&p),
            "activation probability must be in [0, 1], but got p={}",
            p
        );
        match *self {
            AugmentOp::CropResize { size, scale, ratio, .. } => {
                ensure!(size > 0, "crop target edge must be > 0");
                ensure!(
                    0.0 < scale.0 && scale.0 <= scale.1 && scale.1 <= 1.0,
                    "crop area range must satisfy 0 < lo <= hi <= 1, but got {:?}",
                    scale
                );
                ensure!(
                    0.0 < ratio.0 && ratio.0 <= ratio.1,
                    "aspect ratio range must satisfy 0 < lo <= hi, but got {:?}",
                    ratio
                );
            }
            AugmentOp::BrightnessContrast {
                brightness_limit,
                contrast_limit,
                ..
            } => {
                ensure!(
                    brightness_limit >= 0.0 && contrast_limit >= 0.0,
                    "brightness/contrast limits must be non-negative"
                );
            }
            AugmentOp::Rotate { limit_degrees, .. } => {
                ensure!(limit_degrees >= 0.0, "rotation limit must be non-negative");
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs the operator over one sample, consuming draws from the shared
    /// generator.
    pub fn apply(&self, sample: Sample, rng: &mut StdRng) -> Result<Sample> {
        // Always consumed, active or not.
        let active = rng.random::<f64>() < self.probability();
        if !active {
            return Ok(sample);
        }

        let (image, landmarks) = sample.into_parts();
        let (image, landmarks) = match *self {
            AugmentOp::CropResize {
                size, scale, ratio, ..
            } => crop_resize(image, landmarks, size, scale, ratio, rng),
            AugmentOp::BrightnessContrast {
                brightness_limit,
                contrast_limit,
                ..
            } => {
                let brightness = rng.random_range(-brightness_limit..=brightness_limit);
                let contrast = rng.random_range(-contrast_limit..=contrast_limit);
                (adjust_brightness_contrast(image, brightness, contrast), landmarks)
            }
            AugmentOp::Rotate { limit_degrees, .. } => {
                let angle = rng.random_range(-limit_degrees..=limit_degrees);
                rotate(image, landmarks, angle)
            }
            AugmentOp::Invert { .. } => {
                let mut image = image;
                for pixel in image.pixels_mut() {
                    pixel.0[0] = 255 - pixel.0[0];
                }
                (image, landmarks)
            }
            AugmentOp::VerticalFlip { .. } => {
                let height = image.height();
                let flipped = imageops::flip_vertical(&image);
                let landmarks = landmarks.map_points(|x, y| (x, (height - 1) as f64 - y));
                (flipped, landmarks)
            }
            AugmentOp::HorizontalFlip { .. } => {
                let width = image.width();
                let flipped = imageops::flip_horizontal(&image);
                let landmarks = landmarks.map_points(|x, y| ((width - 1) as f64 - x, y));
                (flipped, landmarks)
            }
        };
        Ok(Sample::new(image, landmarks))
    }
}

/// The default operator chain for lateral knee radiographs: brightness and
/// contrast jitter plus a vertical mirror, with the remaining operators
/// kept in the chain at zero probability so their stream slots stay
/// reserved.
pub fn default_chain() -> Vec<AugmentOp> {
    vec![
        AugmentOp::CropResize {
            size: 512,
            scale: (0.8, 1.0),
            ratio: (0.75, 4.0 / 3.0),
            p: 0.0,
        },
        AugmentOp::BrightnessContrast {
            brightness_limit: 0.2,
            contrast_limit: 0.2,
            p: 1.0,
        },
        AugmentOp::Rotate {
            limit_degrees: 90.0,
            p: 0.0,
        },
        AugmentOp::Invert { p: 0.0 },
        AugmentOp::VerticalFlip { p: 1.0 },
        AugmentOp::HorizontalFlip { p: 0.0 },
    ]
}

/// Seeded augmentation engine.
///
/// One run draws `num_samples` source indices with replacement, then passes
/// each drawn sample through the whole operator chain in order. Every
/// random decision comes from a single `StdRng` seeded once per run, so a
/// `(seed, chain, num_samples)` triple pins the output exactly.
///
/// # Examples
/// ```ignore
/// let augmenter = Augmenter::new(default_chain(), 50, 42)?;
/// let (augmented, sources) = augmenter.run(&dataset)?;
/// assert_eq!(augmented.len(), 50);
/// assert_eq!(sources.len(), 50);
/// ```
#[derive(Debug, Clone)]
pub struct Augmenter {
    ops: Vec<AugmentOp>,
    num_samples: usize,
    seed: u64,
}

impl Augmenter {
    pub fn new(ops: Vec<AugmentOp>, num_samples: usize, seed: u64) -> Result<Self> {
        ensure!(!ops.is_empty(), "augmentation chain must not be empty");
        for op in &ops {
            op.validate()?;
        }
        ensure!(
            num_samples > 0,
            "num_samples must be a positive integer value, but got num_samples={}",
            num_samples
        );
        Ok(Self {
            ops,
            num_samples,
            seed,
        })
    }

    /// Produces `num_samples` augmented variants drawn from `dataset`,
    /// returning them alongside the source index each variant came from.
    ///
    /// Index draws happen first, as one block, then the per-sample operator
    /// decisions; interleaving them would make the stream layout depend on
    /// how each operator consumes draws.
    pub fn run(&self, dataset: &Dataset) -> Result<(Dataset, Vec<usize>)> {
        let sampler = RandomSampler::new(dataset.len(), self.num_samples)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let indices = sampler.draw(&mut rng);
        debug!(
            "augmenting {} draws from {} sources with {} operators (seed {})",
            indices.len(),
            dataset.len(),
            self.ops.len(),
            self.seed
        );

        let mut out = Vec::with_capacity(indices.len());
        for &index in &indices {
            // Index came from the sampler, bounds hold by construction.
            let mut sample = dataset
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("sampled index {} out of bounds", index))?;
            for op in &self.ops {
                sample = op.apply(sample, &mut rng)?;
            }
            out.push(sample);
        }
        Ok((Dataset::new(out), indices))
    }
}

/// Bilinear read of a fractional source coordinate; anything outside the
/// frame reads as black.
fn bilinear_sample(image: &GrayImage, x: f64, y: f64) -> u8 {
    let (width, height) = image.dimensions();
    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return 0;
    }
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = image.get_pixel(x0, y0).0[0] as f64;
    let p10 = image.get_pixel(x1, y0).0[0] as f64;
    let p01 = image.get_pixel(x0, y1).0[0] as f64;
    let p11 = image.get_pixel(x1, y1).0[0] as f64;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

/// Rotates the frame in place about its center. Positive angles take
/// landmarks through the rotation matrix directly; pixels go through its
/// inverse so every destination pixel gets a source read.
fn rotate(image: GrayImage, landmarks: Landmarks, angle_degrees: f64) -> (GrayImage, Landmarks) {
    let (width, height) = image.dimensions();
    let theta = angle_degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;

    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let src_x = cx + dx * cos + dy * sin;
            let src_y = cy - dx * sin + dy * cos;
            out.put_pixel(x, y, image::Luma([bilinear_sample(&image, src_x, src_y)]));
        }
    }

    let landmarks = landmarks.map_points(|x, y| {
        let dx = x - cx;
        let dy = y - cy;
        (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    });
    (out, landmarks)
}

fn adjust_brightness_contrast(mut image: GrayImage, brightness: f64, contrast: f64) -> GrayImage {
    let alpha = 1.0 + contrast;
    let beta = brightness * 255.0;
    for pixel in image.pixels_mut() {
        let v = pixel.0[0] as f64 * alpha + beta;
        pixel.0[0] = v.round().clamp(0.0, 255.0) as u8;
    }
    image
}

fn crop_resize(
    image: GrayImage,
    landmarks: Landmarks,
    size: u32,
    scale: (f64, f64),
    ratio: (f64, f64),
    rng: &mut StdRng,
) -> (GrayImage, Landmarks) {
    let (width, height) = image.dimensions();
    let area = width as f64 * height as f64;

    // Rejection-sample a window; fall back to the centered square when the
    // drawn aspect ratio will not fit.
    let mut window = None;
    for _ in 0..10 {
        let target_area = area * rng.random_range(scale.0..=scale.1);
        let aspect = (rng.random_range(ratio.0.ln()..=ratio.1.ln())).exp();
        let w = (target_area * aspect).sqrt().round() as u32;
        let h = (target_area / aspect).sqrt().round() as u32;
        if w > 0 && h > 0 && w <= width && h <= height {
            let x0 = rng.random_range(0..=width - w);
            let y0 = rng.random_range(0..=height - h);
            window = Some((x0, y0, w, h));
            break;
        }
    }
    let (x0, y0, w, h) = window.unwrap_or_else(|| {
        let edge = width.min(height);
        ((width - edge) / 2, (height - edge) / 2, edge, edge)
    });

    let cropped = imageops::crop_imm(&image, x0, y0, w, h).to_image();
    let resized = imageops::resize(&cropped, size, size, FilterType::Triangle);
    let sx = size as f64 / w as f64;
    let sy = size as f64 / h as f64;
    let landmarks = landmarks
        .translate_x(-(x0 as f64))
        .translate_y(-(y0 as f64))
        .scale(sx, sy);
    (resized, landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const TEST_SEED: u64 = 42;

    fn gradient_sample(w: u32, h: u32) -> Sample {
        let image = GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]));
        Sample::new(
            image,
            Landmarks::from_points([(2.0, 3.0), (5.0, 1.0), (4.0, 6.0)]),
        )
    }

    #[test]
    fn test_zero_probability_op_is_identity() -> Result<()> {
        let sample = gradient_sample(8, 8);
        let expected = sample.clone();
        let op = AugmentOp::Invert { p: 0.0 };
        let out = op.apply(sample, &mut StdRng::seed_from_u64(TEST_SEED))?;
        assert_eq!(out.image(), expected.image());
        assert_eq!(out.landmarks().to_array(), expected.landmarks().to_array());
        Ok(())
    }

    #[test]
    fn test_inactive_op_still_consumes_one_draw() -> Result<()> {
        // An inactive operator must advance the stream exactly as much as
        // the activation check alone, so the next decision is unchanged
        // whether the preceding op had p=0 via skip or via never-firing.
        let mut a = StdRng::seed_from_u64(TEST_SEED);
        let mut b = StdRng::seed_from_u64(TEST_SEED);

        let op = AugmentOp::Rotate {
            limit_degrees: 45.0,
            p: 0.0,
        };
        op.apply(gradient_sample(4, 4), &mut a)?;
        let _: f64 = b.random();

        assert_eq!(a.random::<u64>(), b.random::<u64>());
        Ok(())
    }

    #[test]
    fn test_invert_reflects_intensities() -> Result<()> {
        let op = AugmentOp::Invert { p: 1.0 };
        let sample = gradient_sample(4, 4);
        let before = sample.image().get_pixel(1, 2).0[0];
        let out = op.apply(sample, &mut StdRng::seed_from_u64(TEST_SEED))?;
        assert_eq!(out.image().get_pixel(1, 2).0[0], 255 - before);
        Ok(())
    }

    #[test]
    fn test_vertical_flip_mirrors_landmark_y() -> Result<()> {
        let op = AugmentOp::VerticalFlip { p: 1.0 };
        let out = op.apply(gradient_sample(8, 10), &mut StdRng::seed_from_u64(TEST_SEED))?;
        // y=3 in a 10-row frame mirrors to 9-3=6.
        assert_eq!(out.landmarks().superior_patella(), (2.0, 6.0));
        Ok(())
    }

    #[test]
    fn test_horizontal_flip_mirrors_landmark_x() -> Result<()> {
        let op = AugmentOp::HorizontalFlip { p: 1.0 };
        let out = op.apply(gradient_sample(8, 10), &mut StdRng::seed_from_u64(TEST_SEED))?;
        assert_eq!(out.landmarks().superior_patella(), (5.0, 3.0));
        Ok(())
    }

    #[test]
    fn test_double_flip_restores_landmarks() -> Result<()> {
        let op = AugmentOp::VerticalFlip { p: 1.0 };
        let original = gradient_sample(8, 10);
        let expected = original.landmarks().to_array();
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        let once = op.apply(original, &mut rng)?;
        let twice = op.apply(once, &mut rng)?;
        assert_eq!(twice.landmarks().to_array(), expected);
        Ok(())
    }

    #[test]
    fn test_brightness_contrast_stays_in_range() -> Result<()> {
        let op = AugmentOp::BrightnessContrast {
            brightness_limit: 0.5,
            contrast_limit: 0.5,
            p: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(TEST_SEED);
        for _ in 0..20 {
            let out = op.apply(gradient_sample(6, 6), &mut rng)?;
            // u8 storage already bounds values; check landmarks untouched.
            assert_eq!(out.landmarks().superior_patella(), (2.0, 3.0));
        }
        Ok(())
    }

    #[test]
    fn test_rotation_by_360_degrees_restores_landmarks() {
        let landmarks = Landmarks::from_points([(2.0, 3.0), (5.0, 1.0), (4.0, 6.0)]);
        let (_, rotated) = rotate(GrayImage::new(8, 8), landmarks, 360.0);
        for (a, b) in rotated
            .to_array()
            .iter()
            .zip([2.0, 5.0, 4.0, 3.0, 1.0, 6.0])
        {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rotation_quarter_turn_moves_landmark() {
        // 90 degrees about the center of a 9x9 frame (cx=cy=4):
        // (6, 4) is dx=2, dy=0 -> (4 + 0, 4 + 2) = (4, 6).
        let landmarks = Landmarks::from_points([(6.0, 4.0), (4.0, 4.0), (4.0, 4.0)]);
        let (_, rotated) = rotate(GrayImage::new(9, 9), landmarks, 90.0);
        let (x, y) = rotated.superior_patella();
        assert!((x - 4.0).abs() < 1e-9);
        assert!((y - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_fills_new_area_with_black() {
        let image = GrayImage::from_pixel(9, 9, Luma([200]));
        let (rotated, _) = rotate(image, Landmarks::new([0.0; 6]), 45.0);
        // Frame corners rotate out of the source; they must read black.
        assert_eq!(rotated.get_pixel(0, 0).0[0], 0);
        assert_eq!(rotated.get_pixel(8, 8).0[0], 0);
        // The center is a fixed point and keeps its value.
        assert_eq!(rotated.get_pixel(4, 4).0[0], 200);
    }

    #[test]
    fn test_crop_resize_emits_target_edge() -> Result<()> {
        let op = AugmentOp::CropResize {
            size: 16,
            scale: (0.8, 1.0),
            ratio: (0.75, 4.0 / 3.0),
            p: 1.0,
        };
        let out = op.apply(gradient_sample(32, 32), &mut StdRng::seed_from_u64(TEST_SEED))?;
        assert_eq!(out.image().dimensions(), (16, 16));
        Ok(())
    }

    #[test]
    fn test_augmenter_is_deterministic_per_seed() -> Result<()> {
        let dataset = Dataset::new(vec![gradient_sample(16, 16), gradient_sample(12, 12)]);
        let augmenter = Augmenter::new(default_chain_for(16), 5, TEST_SEED)?;

        let (a, sources_a) = augmenter.run(&dataset)?;
        let (b, sources_b) = augmenter.run(&dataset)?;
        assert_eq!(a.len(), 5);
        assert_eq!(sources_a, sources_b);
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.image(), sb.image());
            assert_eq!(sa.landmarks().to_array(), sb.landmarks().to_array());
        }

        let (c, _) = Augmenter::new(default_chain_for(16), 5, TEST_SEED + 1)?.run(&dataset)?;
        let identical = a
            .iter()
            .zip(c.iter())
            .all(|(x, y)| x.image() == y.image());
        assert!(!identical, "a different seed must change the output");
        Ok(())
    }

    #[test]
    fn test_augmenter_validates_inputs() {
        assert!(Augmenter::new(vec![], 5, TEST_SEED).is_err());
        assert!(Augmenter::new(default_chain(), 0, TEST_SEED).is_err());
        assert!(
            Augmenter::new(vec![AugmentOp::Invert { p: 1.5 }], 5, TEST_SEED).is_err()
        );
    }

    #[test]
    fn test_augmenter_can_oversample() -> Result<()> {
        let dataset = Dataset::new(vec![gradient_sample(8, 8)]);
        let augmenter = Augmenter::new(vec![AugmentOp::Invert { p: 0.0 }], 7, TEST_SEED)?;
        let (out, sources) = augmenter.run(&dataset)?;
        assert_eq!(out.len(), 7);
        assert!(sources.iter().all(|&i| i == 0));
        Ok(())
    }

    // The stock chain, retargeted at a small edge so tests stay fast.
    fn default_chain_for(size: u32) -> Vec<AugmentOp> {
        default_chain()
            .into_iter()
            .map(|op| match op {
                AugmentOp::CropResize { scale, ratio, p, .. } => AugmentOp::CropResize {
                    size,
                    scale,
                    ratio,
                    p,
                },
                other => other,
            })
            .collect()
    }
}
