use crate::sample::{Sample, LANDMARK_NAMES};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;
use log::info;
use std::fs;
use std::path::PathBuf;

/// Marker colors per landmark, in [`LANDMARK_NAMES`] order.
const MARKER_COLORS: [Rgb<u8>; 3] = [
    Rgb([31, 119, 180]),  // superior patella
    Rgb([255, 127, 14]),  // inferior patella
    Rgb([44, 160, 44]),   // tibial plateau
];

const MARKER_RADIUS: i32 = 4;

/// Receives prepared samples for visual inspection.
///
/// A sink is a side channel: it never alters the sample and a pipeline runs
/// identically with or without one attached.
pub trait RenderSink: Send + Sync {
    fn render(&self, index: usize, sample: &Sample) -> Result<()>;
}

/// Renders each sample as an RGB PNG with a filled dot per landmark,
/// written to `<dir>/<prefix><index>.png`.
///
/// Landmarks outside the frame are skipped rather than clamped; a marker
/// pinned to the border would misrepresent where the annotation actually
/// sits.
///
/// # Examples
/// ```ignore
/// let sink = OverlayRenderer::new("out/overlays", "knee_")?;
/// for (i, sample) in dataset.iter().enumerate() {
///     sink.render(i, sample)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    dir: PathBuf,
    prefix: String,
}

impl OverlayRenderer {
    /// Creates the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    fn overlay(&self, sample: &Sample) -> RgbImage {
        let gray = sample.image();
        let mut canvas = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
            let v = gray.get_pixel(x, y).0[0];
            Rgb([v, v, v])
        });

        let (width, height) = sample.dimensions();
        for (point, color) in sample.landmarks().points().iter().zip(MARKER_COLORS) {
            let (x, y) = *point;
            if x < 0.0 || y < 0.0 || x >= width as f64 || y >= height as f64 {
                continue;
            }
            draw_filled_circle_mut(
                &mut canvas,
                (x.round() as i32, y.round() as i32),
                MARKER_RADIUS,
                color,
            );
        }
        canvas
    }
}

impl RenderSink for OverlayRenderer {
    fn render(&self, index: usize, sample: &Sample) -> Result<()> {
        let path = self.dir.join(format!("{}{}.png", self.prefix, index));
        self.overlay(sample)
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "rendered overlay {} ({} landmarks)",
            path.display(),
            LANDMARK_NAMES.len()
        );
        Ok(())
    }
}
