//! Dataset preparation for lateral knee radiographs with point landmarks:
//! decoding, intensity normalization, anatomy-preserving geometry, seeded
//! augmentation, and overlay rendering for inspection.

pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod readers;
pub mod sample;
pub mod sampler;
pub mod transforms;
pub mod viz;

pub use dataset::{Dataset, DimensionCache};
pub use error::PrepError;
pub use pipeline::{augment, prepare, unscale, PrepConfig, Prepared};
pub use sample::{Landmarks, Sample, LANDMARK_NAMES};
pub use transforms::Transform;
