//! Input adapters: the label table reader and the radiograph decode seam.

mod decode;
mod labels;

pub use decode::{RadiographDecoder, StandardFormatDecoder};
pub use labels::{LabelRow, LabelTableSource};
