use crate::sample::Landmarks;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs::File, path::PathBuf};

/// One row of the annotation table: the radiograph file name plus the three
/// knee landmarks, each as an `(x, y)` pixel coordinate in the original
/// image.
///
/// Column names follow the annotation export; coordinates may be fractional
/// because annotators click between pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelRow {
    #[serde(rename = "lateral_xray")]
    pub image_file: String,
    pub superior_patella_x: f64,
    pub superior_patella_y: f64,
    pub inferior_patella_x: f64,
    pub inferior_patella_y: f64,
    pub tibial_plateau_x: f64,
    pub tibial_plateau_y: f64,
}

impl LabelRow {
    /// Collects the six coordinates into the canonical landmark layout.
    pub fn landmarks(&self) -> Landmarks {
        Landmarks::from_points([
            (self.superior_patella_x, self.superior_patella_y),
            (self.inferior_patella_x, self.inferior_patella_y),
            (self.tibial_plateau_x, self.tibial_plateau_y),
        ])
    }
}

/// A typed CSV reader for the landmark annotation table.
///
/// Rows stream one at a time; a malformed row surfaces as an error carrying
/// its record number without stopping iteration, so the caller decides
/// whether a bad row aborts the run.
///
/// # Examples
/// ```ignore
/// let source = LabelTableSource::new("labels.csv");
/// for row in source.stream()? {
///     let row = row?;
///     println!("{} -> {:?}", row.image_file, row.landmarks());
/// }
/// ```
pub struct LabelTableSource {
    path: PathBuf,
}

impl LabelTableSource {
    /// Creates a new reader for a CSV annotation table at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Streams rows as typed [`LabelRow`] values.
    ///
    /// # Errors
    /// - Fails immediately if the file cannot be opened.
    /// - Yields `Err` per row when a record does not deserialize (missing
    ///   column, non-numeric coordinate), tagged with the record number.
    pub fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<LabelRow>> + Send>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let reader = csv::Reader::from_reader(file);

        let iter = reader
            .into_deserialize::<LabelRow>()
            .enumerate()
            .map(|(record_num, row)| {
                row.with_context(|| format!("Invalid label record {}", record_num + 1))
            });
        Ok(Box::new(iter))
    }

    /// Reads the whole table into memory, failing on the first bad row.
    pub fn read_all(&self) -> Result<Vec<LabelRow>> {
        self.stream()?.collect()
    }
}
