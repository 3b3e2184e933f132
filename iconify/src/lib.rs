//! Converts PNG, JPEG, WEBP and SVG images into multi-resolution Windows icons.
//!
//! The pipeline has three stages: a [`raster::Rasterizer`] renders the source
//! at every requested size, [`ico::encode`] assembles the frames into an ICO
//! container and an [`export::Exporter`] writes the result.

pub mod convert;
pub mod error;
pub mod export;
pub mod ico;
pub mod profile;
pub mod raster;

pub use convert::{Conversion, Converter};
pub use error::IconifyError;
