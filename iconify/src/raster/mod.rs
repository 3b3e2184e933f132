//! Turns a source image into PNG frames at the requested sizes.

mod bitmap;
mod svg;

pub use bitmap::BitmapRasterizer;
pub use svg::SvgRasterizer;

use crate::ico::{Frame, FrameSet, MAX_DIMENSION};
use crate::profile::ResampleFilter;
use resvg::usvg;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The formats accepted as conversion sources
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SourceFormat {
    Png,
    Jpeg,
    WebP,
    Svg,
}

impl SourceFormat {
    /// Sniffs the format from the leading bytes of the data.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match image::guess_format(data) {
            Ok(image::ImageFormat::Png) => return Some(Self::Png),
            Ok(image::ImageFormat::Jpeg) => return Some(Self::Jpeg),
            Ok(image::ImageFormat::WebP) => return Some(Self::WebP),
            _ => {}
        }

        if looks_like_svg(data) {
            Some(Self::Svg)
        } else {
            None
        }
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(1024)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();

    head.starts_with('<') && head.contains("<svg")
}

/// A loaded, not yet decoded source image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    format: SourceFormat,
    data: Vec<u8>,
    resources_dir: Option<PathBuf>,
}

impl SourceImage {
    /// Reads the source image from disk and determines its format.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RasterError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;

        let mut source = Self::from_bytes(data)?;
        source.resources_dir = path.parent().map(Path::to_path_buf);

        tracing::debug!("Loaded {:?} source from {}", source.format, path.display());
        Ok(source)
    }

    /// Wraps in-memory image data, rejecting anything that is not a supported image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, RasterError> {
        let format = SourceFormat::detect(&data).ok_or(RasterError::UnsupportedFormat)?;

        Ok(Self {
            format,
            data,
            resources_dir: None,
        })
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Creates the rasterizer matching the source format.
    pub fn rasterizer(&self, filter: ResampleFilter) -> Result<Box<dyn Rasterizer>, RasterError> {
        match self.format {
            SourceFormat::Svg => Ok(Box::new(SvgRasterizer::new(
                &self.data,
                self.resources_dir.clone(),
            )?)),
            _ => Ok(Box::new(BitmapRasterizer::new(&self.data, filter)?)),
        }
    }
}

#[async_trait::async_trait]
pub trait Rasterizer: Send + Sync + 'static {
    /// Renders a single square frame of the given size.
    async fn render(&self, size: u32) -> Result<Frame, RasterError>;

    /// Renders one frame per size, in the given order.
    ///
    /// Either every frame is produced or an error is returned, a partial
    /// frame set never escapes.
    async fn render_all(&self, sizes: &[u32]) -> Result<FrameSet, RasterError> {
        let mut frames = FrameSet::with_capacity(sizes.len());
        for size in sizes {
            frames.push(self.render(*size).await?);
        }

        Ok(frames)
    }
}

pub(crate) fn check_size(size: u32) -> Result<(), RasterError> {
    if size == 0 || size > MAX_DIMENSION {
        Err(RasterError::InvalidSize(size))
    } else {
        Ok(())
    }
}

/// Encodes straight (non premultiplied) RGBA8 pixels as PNG.
pub(crate) fn encode_rgba_png(
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<Vec<u8>, png::EncodingError> {
    let mut buffer = Vec::new();

    let mut encoder = png::Encoder::new(&mut buffer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    writer.finish()?;

    Ok(buffer)
}

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("an I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("the source is not a PNG, JPEG, WEBP or SVG image")]
    UnsupportedFormat,

    #[error("failed to decode the source image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to parse SVG: {0}")]
    SvgParse(usvg::Error),

    #[error("cannot render a frame of size {0}, expected a value between 1 and 256")]
    InvalidSize(u32),

    #[error("the pixmap dimensions are invalid: {width}x{height}")]
    InvalidPixmapDimensions { width: u32, height: u32 },

    #[error("an error occurred while encoding the PNG: {0}")]
    PngEncoding(#[from] png::EncodingError),

    #[error("the rendering task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
