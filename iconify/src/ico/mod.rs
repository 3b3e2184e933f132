//! Windows ICO container encoding.
//!
//! Every frame is stored as an embedded PNG. The encoder never looks inside
//! the payloads unless [`encode_verified`] is used.

mod entry;
mod verify;

pub use entry::{stored_dimension, DIRECTORY_ENTRY_SIZE, HEADER_SIZE};
pub use verify::verify_frame;

use crate::ico::entry::{IconDirEntry, IconDirHeader};
use thiserror::Error;

/// Largest frame dimension the directory can describe
pub const MAX_DIMENSION: u32 = 256;

/// Largest number of frames the 16-bit count field can describe
pub const MAX_FRAMES: usize = u16::MAX as usize;

/// A single square rendering of the source image.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    dimension: u32,
    encoded_bytes: Vec<u8>,
}

impl Frame {
    /// Creates a new frame from a PNG payload whose decoded size is
    /// `dimension`x`dimension`.
    pub fn new(dimension: u32, encoded_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            dimension,
            encoded_bytes: encoded_bytes.into(),
        }
    }

    /// Retrieves the width and height of the frame in pixels.
    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Retrieves the encoded PNG payload.
    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded_bytes
    }
}

/// An ordered collection of frames, directory order follows insertion order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Looks up the first frame with the given dimension.
    pub fn get(&self, dimension: u32) -> Option<&Frame> {
        self.frames.iter().find(|f| f.dimension == dimension)
    }
}

impl From<Vec<Frame>> for FrameSet {
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl FromIterator<Frame> for FrameSet {
    fn from_iter<T: IntoIterator<Item = Frame>>(iter: T) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FrameSet {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Encodes the frames into a complete ICO file.
///
/// The whole layout is validated and resolved before the first byte is
/// written, so an error never leaves a partial buffer behind.
pub fn encode(frames: &FrameSet) -> Result<Vec<u8>, IcoEncodeError> {
    let layout = plan_frames(frames)?;
    Ok(emit(frames, layout))
}

/// Like [`encode`], but also checks that every payload is an RGBA PNG whose
/// decoded size matches the declared dimension.
///
/// The frame count and dimensions are validated before any payload is read.
pub fn encode_verified(frames: &FrameSet) -> Result<Vec<u8>, IcoEncodeError> {
    let layout = plan_frames(frames)?;

    for (index, frame) in frames.iter().enumerate() {
        verify_frame(index, frame)?;
    }

    Ok(emit(frames, layout))
}

fn plan_frames(frames: &FrameSet) -> Result<(Vec<IconDirEntry>, usize), IcoEncodeError> {
    plan_layout(
        frames
            .iter()
            .map(|f| (f.dimension, f.encoded_bytes.len())),
    )
}

fn emit(frames: &FrameSet, (entries, total_len): (Vec<IconDirEntry>, usize)) -> Vec<u8> {
    let mut out = Vec::with_capacity(total_len);

    IconDirHeader {
        count: entries.len() as u16,
    }
    .write_to(&mut out);

    for entry in &entries {
        entry.write_to(&mut out);
    }

    for frame in frames {
        out.extend_from_slice(&frame.encoded_bytes);
    }

    debug_assert_eq!(out.len(), total_len);
    out
}

/// Validates the frame descriptions and computes every directory entry.
///
/// Takes `(dimension, payload length)` pairs and returns the entries plus the
/// total file length.
fn plan_layout(
    frames: impl ExactSizeIterator<Item = (u32, usize)>,
) -> Result<(Vec<IconDirEntry>, usize), IcoEncodeError> {
    let count = frames.len();
    if count == 0 || count > MAX_FRAMES {
        return Err(IcoEncodeError::InvalidFrameSet { count });
    }

    let mut entries = Vec::with_capacity(count);

    // Cannot overflow: count is bounded by MAX_FRAMES
    let mut offset = (HEADER_SIZE + DIRECTORY_ENTRY_SIZE * count) as u64;

    for (index, (dimension, length)) in frames.enumerate() {
        if dimension == 0 || dimension > MAX_DIMENSION {
            return Err(IcoEncodeError::InvalidDimension { index, dimension });
        }

        let too_large = || IcoEncodeError::PayloadTooLarge {
            index,
            length,
            offset,
        };

        let payload_len = u32::try_from(length).map_err(|_| too_large())?;
        let entry_offset = u32::try_from(offset).map_err(|_| too_large())?;

        // The end of the payload has to be addressable as well
        let end = offset + payload_len as u64;
        if end > u32::MAX as u64 {
            return Err(too_large());
        }

        entries.push(IconDirEntry {
            dimension,
            payload_len,
            offset: entry_offset,
        });
        offset = end;
    }

    Ok((entries, offset as usize))
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum IcoEncodeError {
    #[error("a frame set must contain between 1 and {} frames, got {count}", MAX_FRAMES)]
    InvalidFrameSet { count: usize },

    #[error("frame {index} has dimension {dimension}, expected a value between 1 and {}", MAX_DIMENSION)]
    InvalidDimension { index: usize, dimension: u32 },

    #[error("frame {index} with {length} bytes at offset {offset} does not fit into 32-bit size fields")]
    PayloadTooLarge {
        index: usize,
        length: usize,
        offset: u64,
    },

    #[error("frame {index} is not a valid RGBA PNG: {reason}")]
    InvalidPayload { index: usize, reason: String },

    #[error("frame {index} declares {dimension}x{dimension} but the payload is {width}x{height}")]
    PayloadMismatch {
        index: usize,
        dimension: u32,
        width: u32,
        height: u32,
    },
}
