use crate::dataset::Dataset;
use anyhow::{ensure, Result};
use log::warn;
use ndarray::{Array2, Zip};

/// Element-wise intensity statistics across a dataset: a mean image and a
/// population standard deviation image, each shaped `(height, width)` like
/// the samples themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub mean: Array2<f64>,
    pub std: Array2<f64>,
}

/// Computes the per-pixel mean and population standard deviation across
/// the N images of a dataset.
///
/// Each pixel position is its own population of N values, so the result is
/// a mean image and a deviation image rather than two scalars; a bright
/// corner shared by every radiograph contributes to that corner's
/// statistics only. All images must share one shape. Run this after
/// cropping and rescaling.
pub fn dataset_stats(dataset: &Dataset) -> Result<DatasetStats> {
    ensure!(
        !dataset.is_empty(),
        "cannot compute statistics over an empty dataset"
    );

    let (width, height) = dataset
        .get(0)
        .map(|s| s.dimensions())
        .unwrap_or((0, 0));
    let shape = (height as usize, width as usize);
    let mut sum = Array2::<f64>::zeros(shape);
    let mut sum_sq = Array2::<f64>::zeros(shape);

    for (index, sample) in dataset.iter().enumerate() {
        ensure!(
            sample.dimensions() == (width, height),
            "sample {} has shape {:?} but the first sample has {:?}; \
             standardization needs a uniform shape",
            index,
            sample.dimensions(),
            (width, height)
        );
        for (x, y, pixel) in sample.image().enumerate_pixels() {
            let v = pixel.0[0] as f64;
            sum[[y as usize, x as usize]] += v;
            sum_sq[[y as usize, x as usize]] += v * v;
        }
    }

    let n = dataset.len() as f64;
    let mean = sum.mapv(|s| s / n);
    // Population variance per pixel; clamp tiny negatives from
    // floating-point noise.
    let std = Zip::from(&sum_sq)
        .and(&mean)
        .map_collect(|&sq, &m| (sq / n - m * m).max(0.0).sqrt());
    Ok(DatasetStats { mean, std })
}

/// Standardizes every image element-wise against the dataset mean and
/// deviation images, producing `(pixel - mean) / std` grids in
/// `(height, width)` row-major order.
///
/// A pixel position with zero spread across the dataset standardizes to
/// `0.0` at that position rather than dividing by zero; it is already
/// centered. Positions like that are counted and logged at warn level,
/// since a cohort with many of them usually shares a constant border or
/// mask.
pub fn standardize(dataset: &Dataset) -> Result<Vec<Array2<f64>>> {
    let stats = dataset_stats(dataset)?;
    let zero_spread = stats.std.iter().filter(|&&s| s == 0.0).count();
    if zero_spread > 0 {
        warn!(
            "{} of {} pixel positions have zero spread across the dataset; \
             they standardize to 0.0",
            zero_spread,
            stats.std.len()
        );
    }

    let grids = dataset
        .iter()
        .map(|sample| {
            Array2::from_shape_fn(stats.mean.dim(), |(row, col)| {
                let s = stats.std[[row, col]];
                if s == 0.0 {
                    0.0
                } else {
                    let v = sample.image().get_pixel(col as u32, row as u32).0[0] as f64;
                    (v - stats.mean[[row, col]]) / s
                }
            })
        })
        .collect();
    Ok(grids)
}
