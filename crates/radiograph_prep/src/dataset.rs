use crate::error::PrepError;
use crate::sample::{Landmarks, Sample};
use crate::transforms::Transform;
use anyhow::Result;
use image::GrayImage;

/// An ordered, in-memory collection of radiograph/landmark pairs.
///
/// Index `i` always refers to the same logical sample: because a [`Sample`]
/// owns both its image and its landmark vector, the image collection and
/// the label collection cannot drift apart once a dataset exists. The only
/// boundary where a mismatch is possible is construction from separate
/// collections, which [`Dataset::from_parts`] checks.
///
/// The whole dataset is materialized in memory; dataset-wide stages such as
/// standardization require every image at once and these cohorts are small.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Creates a dataset from already-paired samples.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Zips separate image and label collections into a dataset.
    ///
    /// # Errors
    /// Returns [`PrepError::LabelMismatch`] if the collections differ in
    /// length. This is the load-time boundary check; there is no partial
    /// recovery because downstream stages assume a complete dataset.
    pub fn from_parts(images: Vec<GrayImage>, labels: Vec<Landmarks>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(PrepError::LabelMismatch(format!(
                "{} images but {} label rows",
                images.len(),
                labels.len()
            ))
            .into());
        }
        Ok(Self {
            samples: images
                .into_iter()
                .zip(labels)
                .map(|(image, landmarks)| Sample::new(image, landmarks))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Runs a joint image+landmark transform over every sample.
    ///
    /// Consumes the dataset and rebuilds it so each stage owns its input
    /// outright; a half-transformed dataset can never be observed.
    pub fn apply<T>(self, transform: &T) -> Result<Self>
    where
        T: Transform<(GrayImage, Landmarks), (GrayImage, Landmarks)>,
    {
        let samples = self
            .samples
            .into_iter()
            .map(|sample| {
                let (image, landmarks) = transform.apply(sample.into_parts())?;
                Ok(Sample::new(image, landmarks))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { samples })
    }
}

/// Original `(width, height)` of every sample before cropping and rescaling.
///
/// Index-aligned with the dataset it was recorded from. Kept so that a
/// future inverse mapping of prepared coordinates back into original image
/// space has its inputs; see `pipeline::unscale`, which is deliberately
/// unimplemented.
#[derive(Debug, Clone, Default)]
pub struct DimensionCache {
    dims: Vec<(u32, u32)>,
}

impl DimensionCache {
    pub fn new(dims: Vec<(u32, u32)>) -> Self {
        Self { dims }
    }

    pub fn get(&self, index: usize) -> Option<(u32, u32)> {
        self.dims.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}
