use crate::ico::{Frame, IcoEncodeError};

/// Checks that the payload of a frame is an 8-bit RGBA PNG matching the
/// declared dimension.
///
/// Only the PNG header is decoded, pixel data is never inflated.
pub fn verify_frame(index: usize, frame: &Frame) -> Result<(), IcoEncodeError> {
    let invalid = |reason: String| IcoEncodeError::InvalidPayload { index, reason };

    let decoder = png::Decoder::new(frame.encoded_bytes());
    let reader = decoder.read_info().map_err(|err| invalid(err.to_string()))?;
    let info = reader.info();

    if info.width != frame.dimension() || info.height != frame.dimension() {
        return Err(IcoEncodeError::PayloadMismatch {
            index,
            dimension: frame.dimension(),
            width: info.width,
            height: info.height,
        });
    }

    if info.color_type != png::ColorType::Rgba || info.bit_depth != png::BitDepth::Eight {
        return Err(invalid(format!(
            "expected 8-bit RGBA, found {:?} at {:?}",
            info.color_type, info.bit_depth
        )));
    }

    Ok(())
}
