//! The compact binary layout.
//!
//! A buffer is a 16 byte header followed by the structure region:
//!
//! ```text
//! offset  size  field
//!      0     4  magic, the bytes "dawg"
//!      4     1  format version (1)
//!      5     1  character width in bytes (1)
//!      6     1  state header width: 1 (edge count only) or 5 (edge count + word count)
//!      7     1  offset width in bytes (4)
//!      8     4  size of the structure region, little endian
//!     12     4  CRC32C of the structure region, little endian
//! ```
//!
//! The structure region is a sequence of state records; the root is at
//! offset 0. A record is the edge count `N` (one byte), for counted buffers
//! the number of words continuing below the state (`u32`, little endian),
//! and then `N` edge records sorted by label. An edge record is the label
//! byte followed by a little endian `u32` whose top bit is the final flag and
//! whose low 31 bits are the target's offset, 0 meaning the edge leads to a
//! leaf.

use bytes::{Buf, BufMut};

use super::error::FormatError;

/// Leading bytes of every buffer.
pub const MAGIC: [u8; 4] = *b"dawg";
/// The only format version written and read.
pub const VERSION: u8 = 1;
/// Width of a label: the alphabet is single bytes.
pub const CHAR_WIDTH: u8 = 1;
/// Width of offsets inside edge records.
pub const OFFSET_WIDTH: u8 = 4;
/// Size of the header preceding the structure region.
pub const HEADER_SIZE: usize = 16;
/// Size of one edge record: label plus flagged offset.
pub const EDGE_SIZE: usize = 5;

pub(crate) const FINAL_FLAG: u32 = 0x8000_0000;
pub(crate) const OFFSET_MASK: u32 = 0x7fff_ffff;

/// Shape of the state records, stored in the header's width byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Each state starts with its edge count only.
    Plain,
    /// Each state also records how many words continue below it, enabling
    /// rank and count queries.
    Counted,
}

impl Layout {
    /// Picks the layout for an encoder call.
    pub fn from_preserve_counts(preserve_counts: bool) -> Self {
        if preserve_counts {
            Layout::Counted
        } else {
            Layout::Plain
        }
    }

    /// Bytes preceding the edge records of a state.
    #[inline]
    pub fn state_header_width(self) -> usize {
        match self {
            Layout::Plain => 1,
            Layout::Counted => 5,
        }
    }

    fn from_width(width: u8) -> Option<Self> {
        match width {
            1 => Some(Layout::Plain),
            5 => Some(Layout::Counted),
            _ => None,
        }
    }
}

/// Decoded buffer header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// Shape of the state records.
    pub layout: Layout,
    /// Size of the structure region.
    pub size: u32,
    /// CRC32C of the structure region.
    pub checksum: u32,
}

impl Header {
    /// Builds the header describing `structure`.
    pub fn describe(layout: Layout, structure: &[u8]) -> Self {
        Header {
            layout,
            size: structure.len() as u32,
            checksum: crc32c::crc32c(structure),
        }
    }

    /// Appends the 16 header bytes to `out`.
    pub fn write<B: BufMut>(&self, out: &mut B) {
        out.put_slice(&MAGIC);
        out.put_u8(VERSION);
        out.put_u8(CHAR_WIDTH);
        out.put_u8(self.layout.state_header_width() as u8);
        out.put_u8(OFFSET_WIDTH);
        out.put_u32_le(self.size);
        out.put_u32_le(self.checksum);
    }

    /// Decodes the fixed header fields without looking at the structure.
    pub fn parse(buf: &[u8]) -> Result<Self, FormatError> {
        if buf.len() < HEADER_SIZE {
            return Err(FormatError::Truncated);
        }
        let mut cursor = &buf[..HEADER_SIZE];

        let mut magic = [0u8; 4];
        cursor.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(FormatError::BadMagic);
        }

        let version = cursor.get_u8();
        if version != VERSION {
            return Err(FormatError::BadVersion(version));
        }

        let char_width = cursor.get_u8();
        if char_width != CHAR_WIDTH {
            return Err(FormatError::UnsupportedWidth {
                field: "character",
                value: char_width,
            });
        }

        let state_width = cursor.get_u8();
        let layout = Layout::from_width(state_width).ok_or(FormatError::UnsupportedWidth {
            field: "state header",
            value: state_width,
        })?;

        let offset_width = cursor.get_u8();
        if offset_width != OFFSET_WIDTH {
            return Err(FormatError::UnsupportedWidth {
                field: "offset",
                value: offset_width,
            });
        }

        Ok(Header {
            layout,
            size: cursor.get_u32_le(),
            checksum: cursor.get_u32_le(),
        })
    }
}

/// Checks every header field of `buf` against its structure region.
///
/// Returns the decoded header when the magic, version, widths, size and
/// checksum all match.
pub fn validate(buf: &[u8]) -> Result<Header, FormatError> {
    let header = Header::parse(buf)?;
    let structure = &buf[HEADER_SIZE..];

    if header.size as usize != structure.len() {
        return Err(FormatError::SizeMismatch {
            declared: header.size,
            actual: structure.len(),
        });
    }

    let actual = crc32c::crc32c(structure);
    if actual != header.checksum {
        return Err(FormatError::ChecksumMismatch {
            declared: header.checksum,
            actual,
        });
    }

    if structure.len() < header.layout.state_header_width() {
        return Err(FormatError::Truncated);
    }

    Ok(header)
}
