use crate::ico::Frame;
use crate::raster::{RasterError, Rasterizer};
use resvg::usvg::TreeParsing;
use resvg::{tiny_skia, usvg};
use std::path::PathBuf;
use std::sync::Arc;

/// Renders vector sources.
///
/// The SVG is reparsed for every frame, the parsed tree can not be moved to
/// the blocking pool.
#[derive(Debug, Clone)]
pub struct SvgRasterizer {
    source: Arc<str>,
    resources_dir: Option<PathBuf>,
}

impl SvgRasterizer {
    pub fn new(data: &[u8], resources_dir: Option<PathBuf>) -> Result<Self, RasterError> {
        let source = std::str::from_utf8(data)
            .map_err(|_| RasterError::SvgParse(usvg::Error::NotAnUtf8Str))?;

        // Parse once up front so broken sources fail before any frame is rendered
        let tree = parse_svg(source, resources_dir.clone())?;
        tracing::debug!(
            "Parsed SVG source of {}x{}",
            tree.size.width(),
            tree.size.height()
        );

        Ok(Self {
            source: Arc::from(source),
            resources_dir,
        })
    }
}

#[async_trait::async_trait]
impl Rasterizer for SvgRasterizer {
    async fn render(&self, size: u32) -> Result<Frame, RasterError> {
        crate::raster::check_size(size)?;

        let source = Arc::clone(&self.source);
        let resources_dir = self.resources_dir.clone();

        tracing::trace!("Rendering SVG at {}x{}", size, size);
        tokio::task::spawn_blocking(move || -> Result<Frame, RasterError> {
            let tree = parse_svg(&source, resources_dir)?;
            let pixmap = render_svg_to_pixmap(&resvg::Tree::from_usvg(&tree), size, size)?;

            Ok(Frame::new(size, pixmap.encode_png()?))
        })
        .await?
    }
}

fn parse_svg(source: &str, resources_dir: Option<PathBuf>) -> Result<usvg::Tree, RasterError> {
    let parse_options = usvg::Options {
        resources_dir,
        ..Default::default()
    };

    usvg::Tree::from_str(source, &parse_options).map_err(RasterError::SvgParse)
}

fn render_svg_into_pixmap(
    render_tree: &resvg::Tree,
    pixmap: &mut tiny_skia::PixmapMut,
    width: u32,
    height: u32,
) {
    // Stretch the view box onto the whole target
    let x_scale = width as f32 / render_tree.size.width();
    let y_scale = height as f32 / render_tree.size.height();

    let transform = tiny_skia::Transform::from_scale(x_scale, y_scale);
    render_tree.render(transform, pixmap);
}

fn render_svg_to_pixmap(
    render_tree: &resvg::Tree,
    target_width: u32,
    target_height: u32,
) -> Result<tiny_skia::Pixmap, RasterError> {
    let mut pixmap = tiny_skia::Pixmap::new(target_width, target_height).ok_or(
        RasterError::InvalidPixmapDimensions {
            width: target_width,
            height: target_height,
        },
    )?;

    render_svg_into_pixmap(render_tree, &mut pixmap.as_mut(), target_width, target_height);

    Ok(pixmap)
}
