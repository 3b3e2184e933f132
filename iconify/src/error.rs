use crate::export::ExportError;
use crate::ico::IcoEncodeError;
use crate::profile::ProfileError;
use crate::raster::RasterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IconifyError {
    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileError),

    #[error("rasterization failed: {0}")]
    Raster(#[from] RasterError),

    #[error("ICO encoding failed: {0}")]
    Encode(#[from] IcoEncodeError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
