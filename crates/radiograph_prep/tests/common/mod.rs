#![allow(dead_code)] // each test binary uses a subset of the helpers

use anyhow::Result;
use image::GrayImage;
use radiograph_prep::{Dataset, Landmarks, Sample};
use std::io::Write;
use std::path::Path;

/// Builds a synthetic radiograph with a reproducible intensity pattern.
pub fn synthetic_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([((x * 3 + y * 5) % 256) as u8])
    })
}

/// A sample whose three landmarks sit at distinct, easily checked points.
pub fn synthetic_sample(width: u32, height: u32) -> Sample {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    Sample::new(
        synthetic_image(width, height),
        Landmarks::from_points([(cx, cy - 10.0), (cx, cy), (cx + 5.0, cy + 10.0)]),
    )
}

/// A small cohort of same-sized samples with distinct intensity patterns.
pub fn synthetic_dataset(count: usize, width: u32, height: u32) -> Dataset {
    let cx = width as f64 / 2.0;
    let cy = height as f64 / 2.0;
    let samples = (0..count)
        .map(|i| {
            let image = GrayImage::from_fn(width, height, |x, y| {
                image::Luma([((x * 3 + y * 5 + i as u32 * 17) % 256) as u8])
            });
            Sample::new(
                image,
                Landmarks::from_points([(cx, cy - 10.0), (cx, cy), (cx + 5.0, cy + 10.0)]),
            )
        })
        .collect();
    Dataset::new(samples)
}

/// Writes PNG radiographs plus a matching label table into `dir`, returning
/// the label file path. Landmarks land mid-image so crops keep them in
/// frame.
pub fn write_cohort(dir: &Path, dims: &[(u32, u32)]) -> Result<std::path::PathBuf> {
    let labels_path = dir.join("labels.csv");
    let mut labels = std::fs::File::create(&labels_path)?;
    writeln!(
        labels,
        "lateral_xray,superior_patella_x,superior_patella_y,\
         inferior_patella_x,inferior_patella_y,tibial_plateau_x,tibial_plateau_y"
    )?;
    for (i, &(width, height)) in dims.iter().enumerate() {
        let name = format!("knee_{i:03}.png");
        synthetic_image(width, height).save(dir.join(&name))?;
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        writeln!(
            labels,
            "{},{},{},{},{},{},{}",
            name,
            cx,
            cy - 10.0,
            cx,
            cy,
            cx + 5.0,
            cy + 10.0
        )?;
    }
    Ok(labels_path)
}
