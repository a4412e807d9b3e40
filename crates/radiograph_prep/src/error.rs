//! Error kinds callers need to tell apart.
//!
//! Most fallible paths in this crate return `anyhow::Result` with context,
//! matching how the rest of the pipeline reports failures. The variants here
//! cover the cases a caller must distinguish programmatically: a radiograph
//! that cannot be decoded, a label table that does not line up with the
//! image set, and the deliberately unimplemented inverse mapping. All three
//! are fatal for the batch; there is no partial-dataset recovery because
//! every downstream stage assumes a complete, index-aligned dataset.
//!
//! Degenerate inputs with a defined fallback (constant-intensity images in
//! the intensity normalizer, zero-variance pixels in standardization) are
//! not errors; the affected stage applies its fallback and logs a warning.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    /// A radiograph file is missing, unreadable, or malformed.
    #[error("failed to decode radiograph {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The label table does not correspond to the image set.
    #[error("label table mismatch: {0}")]
    LabelMismatch(String),

    /// A declared-but-unimplemented operation was invoked.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}
