//! Preprocessing stages: deterministic transforms, randomized augmentation,
//! and dataset-wide standardization.

pub mod augmentation;
pub mod core;
pub mod geometric;
pub mod intensity;
pub mod standardize;

pub use augmentation::{default_chain, AugmentOp, Augmenter};
pub use core::{Chain, Transform};
pub use geometric::{CenterSquareCrop, RescaleToSquare};
pub use intensity::IntensityNormalize;
pub use standardize::{dataset_stats, standardize, DatasetStats};
