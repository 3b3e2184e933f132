/// Size of the `ICONDIR` header in bytes
pub const HEADER_SIZE: usize = 6;

/// Size of a single `ICONDIRENTRY` in bytes
pub const DIRECTORY_ENTRY_SIZE: usize = 16;

/// Resource type stored in the header, 1 marks an icon (2 would be a cursor)
const RESOURCE_TYPE_ICON: u16 = 1;

const COLOR_PLANES: u16 = 1;
const BITS_PER_PIXEL: u16 = 32;

/// Maps a frame dimension to the single byte stored in the directory.
///
/// The width and height fields only hold 1-255, so 256 is written as 0.
/// Callers must have validated the dimension beforehand.
pub fn stored_dimension(dimension: u32) -> u8 {
    if dimension == 256 {
        0
    } else {
        dimension as u8
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct IconDirHeader {
    pub count: u16,
}

impl IconDirHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved
        out.extend_from_slice(&RESOURCE_TYPE_ICON.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
    }
}

/// A fully resolved directory entry, offsets already computed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct IconDirEntry {
    pub dimension: u32,
    pub payload_len: u32,
    pub offset: u32,
}

impl IconDirEntry {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let stored = stored_dimension(self.dimension);

        // Frames are always square
        out.push(stored);
        out.push(stored);

        out.push(0); // no palette
        out.push(0); // reserved
        out.extend_from_slice(&COLOR_PLANES.to_le_bytes());
        out.extend_from_slice(&BITS_PER_PIXEL.to_le_bytes());
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out.extend_from_slice(&self.offset.to_le_bytes());
    }
}
