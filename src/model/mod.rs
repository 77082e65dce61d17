pub mod metadata;
pub mod tensor;

pub use metadata::{ElementRow, ImageMetadata, PixelSpacing};
pub use tensor::{InferenceTensor, PixelArray, Tensor};
