//! Fetch a DICOM instance from an imaging archive, decode it, and submit it to a model server's
//! predict endpoint.

pub mod app;
pub mod archive;
pub mod config;
pub mod decoder;
pub mod error;
pub mod image_pipeline;
pub mod inference;
pub mod model;
pub mod report;
pub mod tensor_adapter;
pub mod utils;

pub use archive::{locate, ArchiveConnection, ImageHandle, ImagePath, Selector};
pub use config::Config;
pub use decoder::{decode, DecodedImage};
pub use error::{Error, Result};
pub use inference::{predict, InferenceClient, InferenceResult};
pub use model::{ImageMetadata, InferenceTensor, PixelArray, PixelSpacing, Tensor};
pub use tensor_adapter::{build_input_tensor, AdaptOptions};
