use crate::ico::Frame;
use crate::profile::ResampleFilter;
use crate::raster::{RasterError, Rasterizer};
use image::imageops::FilterType;
use image::DynamicImage;
use std::sync::Arc;

/// Renders PNG, JPEG and WEBP sources.
///
/// The source is stretched onto the square target without preserving its
/// aspect ratio, transparent areas stay transparent.
#[derive(Debug, Clone)]
pub struct BitmapRasterizer {
    image: Arc<DynamicImage>,
    filter: FilterType,
}

impl BitmapRasterizer {
    /// Decodes the source image once, frames are resampled from the decoded copy.
    pub fn new(data: &[u8], filter: ResampleFilter) -> Result<Self, RasterError> {
        let image = image::load_from_memory(data)?;

        tracing::debug!(
            "Decoded {}x{} bitmap source",
            image.width(),
            image.height()
        );

        Ok(Self {
            image: Arc::new(image),
            filter: filter.into(),
        })
    }
}

#[async_trait::async_trait]
impl Rasterizer for BitmapRasterizer {
    async fn render(&self, size: u32) -> Result<Frame, RasterError> {
        crate::raster::check_size(size)?;

        let image = Arc::clone(&self.image);
        let filter = self.filter;

        tracing::trace!("Resampling bitmap to {}x{}", size, size);
        tokio::task::spawn_blocking(move || -> Result<Frame, RasterError> {
            let pixels = image.resize_exact(size, size, filter).to_rgba8();
            let png = crate::raster::encode_rgba_png(size, size, pixels.as_raw())?;

            Ok(Frame::new(size, png))
        })
        .await?
    }
}
