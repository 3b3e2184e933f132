use crate::ico::MAX_DIMENSION;
use image::imageops::FilterType;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Describes which frames to produce and how to name the output.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ConversionProfile {
    /// The frame sizes, in directory order
    pub sizes: Vec<u32>,

    /// The sizes written as standalone preview PNGs
    pub preview_sizes: Vec<u32>,

    /// The resampling filter for bitmap sources
    pub filter: ResampleFilter,

    /// Whether to check every rendered frame before encoding
    pub verify_frames: bool,

    /// The stem of the generated file name
    pub file_stem: String,
}

impl Default for ConversionProfile {
    fn default() -> Self {
        Self {
            // Largest first
            sizes: vec![256, 128, 48, 32, 16],
            preview_sizes: vec![16, 32, 48, 128],
            filter: ResampleFilter::default(),
            verify_frames: true,
            file_stem: "favicon".to_owned(),
        }
    }
}

impl ConversionProfile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ProfileError> {
        let profile = serde_json::from_str::<Self>(data).map_err(ProfileError::Parse)?;
        profile.validate()?;

        Ok(profile)
    }

    /// Checks the profile for values the encoder would refuse later on.
    pub fn validate(&self) -> Result<(), ProfileError> {
        validate_sizes(&self.sizes)?;

        // Previews are optional
        if !self.preview_sizes.is_empty() {
            validate_sizes(&self.preview_sizes)?;
        }

        if self.file_stem.is_empty()
            || self
                .file_stem
                .chars()
                .any(|c| std::path::is_separator(c) || c.is_control())
        {
            return Err(ProfileError::InvalidFileStem(self.file_stem.clone()));
        }

        Ok(())
    }
}

/// Validates an ordered list of icon frame sizes.
pub fn validate_sizes(sizes: &[u32]) -> Result<(), ProfileError> {
    if sizes.is_empty() {
        return Err(ProfileError::NoSizes);
    }

    let mut seen = HashSet::with_capacity(sizes.len());
    for size in sizes {
        if *size == 0 || *size > MAX_DIMENSION {
            return Err(ProfileError::InvalidSize(*size));
        }

        if !seen.insert(*size) {
            return Err(ProfileError::DuplicatedSize(*size));
        }
    }

    Ok(())
}

/// Parses a comma separated size list such as `256,48,16`.
pub fn parse_size_list(list: &str) -> Result<Vec<u32>, ProfileError> {
    let sizes = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| ProfileError::MalformedSize(s.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    validate_sizes(&sizes)?;
    Ok(sizes)
}

#[derive(Debug, Copy, Clone, Default, Deserialize, Eq, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ResampleFilter {
    /// Nearest neighbour, keeps pixel art sharp
    Nearest,

    /// Linear filter
    Triangle,

    /// Cubic filter
    CatmullRom,

    /// Gaussian filter
    Gaussian,

    /// Lanczos with window 3
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("an I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("an error occurred while parsing the profile: {0}")]
    Parse(serde_json::Error),

    #[error("at least one icon size is required")]
    NoSizes,

    #[error("the size {0} is invalid, expected a value between 1 and 256")]
    InvalidSize(u32),

    #[error("the size {0} is listed more than once")]
    DuplicatedSize(u32),

    #[error("the size {0:?} is not a number")]
    MalformedSize(String),

    #[error("the file stem {0:?} is not usable as a file name")]
    InvalidFileStem(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        let profile = ConversionProfile::default();

        profile.validate().unwrap();
        assert_eq!(profile.sizes, [256, 128, 48, 32, 16]);
        assert_eq!(profile.filter, ResampleFilter::Lanczos3);
    }

    #[test]
    fn partial_profile_uses_defaults() {
        let profile =
            ConversionProfile::from_json_str(r#"{ "sizes": [64, 32], "filter": "catmullRom" }"#)
                .unwrap();

        assert_eq!(profile.sizes, [64, 32]);
        assert_eq!(profile.filter, ResampleFilter::CatmullRom);
        assert!(profile.verify_frames);
        assert_eq!(profile.file_stem, "favicon");

        let profile = ConversionProfile::from_json_str(r#"{ "previewSizes": [] }"#).unwrap();
        assert!(profile.preview_sizes.is_empty());
    }

    #[test]
    fn rejects_bad_profiles() {
        assert!(matches!(
            ConversionProfile::from_json_str(r#"{ "sizes": [] }"#),
            Err(ProfileError::NoSizes)
        ));
        assert!(matches!(
            ConversionProfile::from_json_str(r#"{ "sizes": [16, 300] }"#),
            Err(ProfileError::InvalidSize(300))
        ));
        assert!(matches!(
            ConversionProfile::from_json_str(r#"{ "sizes": [16, 16] }"#),
            Err(ProfileError::DuplicatedSize(16))
        ));
        assert!(matches!(
            ConversionProfile::from_json_str(r#"{ "previewSizes": [48, 48] }"#),
            Err(ProfileError::DuplicatedSize(48))
        ));
        assert!(matches!(
            ConversionProfile::from_json_str(r#"{ "fileStem": "../icon" }"#),
            Err(ProfileError::InvalidFileStem(_))
        ));
        assert!(matches!(
            ConversionProfile::from_json_str(r#"{ "colors": 16 }"#),
            Err(ProfileError::Parse(_))
        ));
    }

    #[test]
    fn parses_size_lists() {
        assert_eq!(parse_size_list("256, 48,16").unwrap(), [256, 48, 16]);
        assert!(matches!(
            parse_size_list("32,big"),
            Err(ProfileError::MalformedSize(s)) if s == "big"
        ));
        assert!(matches!(parse_size_list(""), Err(ProfileError::NoSizes)));
        assert!(matches!(
            parse_size_list("0"),
            Err(ProfileError::InvalidSize(0))
        ));
    }
}
