use crate::error::IconifyError;
use crate::ico::{self, FrameSet};
use crate::profile::ConversionProfile;
use crate::raster::SourceImage;

/// The result of converting a single source image.
#[derive(Debug)]
pub struct Conversion {
    /// The complete ICO file
    pub icon: Vec<u8>,

    /// The frames embedded in the icon, in directory order
    pub frames: FrameSet,
}

/// Runs the rasterize and encode stages for a profile.
#[derive(Debug, Clone)]
pub struct Converter {
    profile: ConversionProfile,
}

impl Converter {
    /// Creates a converter, rejecting profiles the encoder could not satisfy.
    pub fn new(profile: ConversionProfile) -> Result<Self, IconifyError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &ConversionProfile {
        &self.profile
    }

    /// Renders every profile size and encodes them into an ICO file.
    pub async fn convert(&self, source: &SourceImage) -> Result<Conversion, IconifyError> {
        let rasterizer = source.rasterizer(self.profile.filter)?;

        tracing::debug!("Rendering sizes {:?}", self.profile.sizes);
        let frames = rasterizer.render_all(&self.profile.sizes).await?;

        let icon = if self.profile.verify_frames {
            ico::encode_verified(&frames)?
        } else {
            ico::encode(&frames)?
        };

        tracing::debug!("Encoded {} frames into {} bytes", frames.len(), icon.len());
        Ok(Conversion { icon, frames })
    }

    /// Collects the preview frames, reusing frames of a finished conversion
    /// where the sizes match.
    pub async fn previews(
        &self,
        source: &SourceImage,
        conversion: &Conversion,
    ) -> Result<FrameSet, IconifyError> {
        let sizes = &self.profile.preview_sizes;
        let missing = sizes
            .iter()
            .copied()
            .filter(|size| conversion.frames.get(*size).is_none())
            .collect::<Vec<_>>();

        let rendered = if missing.is_empty() {
            FrameSet::new()
        } else {
            tracing::debug!("Rendering extra preview sizes {:?}", missing);
            source
                .rasterizer(self.profile.filter)?
                .render_all(&missing)
                .await?
        };

        let previews = sizes
            .iter()
            .filter_map(|size| {
                conversion
                    .frames
                    .get(*size)
                    .or_else(|| rendered.get(*size))
                    .cloned()
            })
            .collect();

        Ok(previews)
    }
}
