//! Image resource blocks
//!
//! The image resources section is a run of tagged blocks:
//! - Type: "8BIM" (4 bytes)
//! - ID: 2 bytes (big-endian)
//! - Name: Pascal string (length byte + chars, padded to even)
//! - Data length: 4 bytes (big-endian)
//! - Data: variable (padded to even)

use std::io::{Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::core::io::{
    expect_fourcc, length_field, padded_size, position, read_bytes, read_u16_be, read_u32_be,
    read_u8, skip, write_u16_be, write_u32_be, write_u8, write_zeros, CountingWriter,
};
use crate::core::options::{DecodeContext, WriteOptions};

/// Image resource signature
pub const PSIR_SIGNATURE: &[u8; 4] = b"8BIM";

// Well-known image resource IDs
pub const PSIR_RESOLUTION_INFO: u16 = 1005;
pub const PSIR_CAPTION: u16 = 1008;
pub const PSIR_LAYER_STATE: u16 = 1024;
pub const PSIR_LAYER_GROUPS: u16 = 1026;
pub const PSIR_IPTC: u16 = 1028;
pub const PSIR_GRID_GUIDES: u16 = 1032;
pub const PSIR_THUMBNAIL: u16 = 1036;
pub const PSIR_ICC_PROFILE: u16 = 1039;
pub const PSIR_EXIF: u16 = 1058;
pub const PSIR_XMP: u16 = 1060;

/// One tagged block of the image resources section
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageResourceBlock {
    pub image_resource_id: u16,
    /// Raw Pascal-string bytes, at most 255
    pub name: Vec<u8>,
    pub buffer: Vec<u8>,
}

impl ImageResourceBlock {
    pub fn new(
        image_resource_id: u16,
        name: impl Into<Vec<u8>>,
        buffer: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            image_resource_id,
            name: name.into(),
            buffer: buffer.into(),
        }
    }

    /// Bytes this block occupies on disk.
    pub fn size(&self) -> u64 {
        4 + 2
            + padded_size(1 + self.name.len() as u64, 2)
            + 4
            + padded_size(self.buffer.len() as u64, 2)
    }

    /// Name decoded as text, replacing invalid UTF-8
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Decode one block at the current position.
    pub fn read<R: Read + Seek>(reader: &mut R, ctx: &mut DecodeContext<'_>) -> PsdResult<Self> {
        let start = position(reader)?;

        if let Err(e) = expect_fourcc(reader, &[PSIR_SIGNATURE]) {
            if let PsdError::MagicMismatch { found, .. } = &e {
                ctx.warn(
                    start,
                    format!("invalid image resource block signature: {found}"),
                );
            }
            return Err(e);
        }

        let image_resource_id = read_u16_be(reader)?;

        let name_len = read_u8(reader)?;
        let name = read_bytes(reader, u64::from(name_len))?;
        // the pad test looks at the raw length, not length byte + chars
        if name_len % 2 == 0 {
            skip(reader, 1)?;
        }

        let len_offset = position(reader)?;
        let buffer_len = u64::from(read_u32_be(reader)?);
        ctx.check_len("image resource data", buffer_len, len_offset)?;
        let buffer = read_bytes(reader, buffer_len)?;
        if buffer_len % 2 == 1 {
            skip(reader, 1)?;
        }

        let block = Self {
            image_resource_id,
            name,
            buffer,
        };

        ctx.debug(
            start,
            format!(
                "image resource {} name: ({}){} {}",
                block.image_resource_id,
                name_len,
                block.name_lossy(),
                buffer_len
            ),
        );

        if ctx.options.verify_sizes {
            let consumed = position(reader)? - start;
            if consumed != block.size() {
                return Err(PsdError::SizeMismatch {
                    what: "image resource block",
                    expected: block.size(),
                    actual: consumed,
                    offset: start,
                });
            }
        }

        Ok(block)
    }

    /// Encode this block.
    ///
    /// Padding mirrors [`ImageResourceBlock::read`]: one byte after an
    /// even-length name and one after an odd-length payload.
    pub fn write<W: Write>(&self, writer: &mut W, options: &WriteOptions) -> PsdResult<()> {
        let name_len = u8::try_from(self.name.len()).map_err(|_| PsdError::UnsupportedFeature {
            feature: format!("image resource name of {} bytes", self.name.len()),
            offset: 0,
        })?;
        let buffer_len = length_field("image resource data", self.buffer.len() as u64)?;

        let mut out = CountingWriter::new(writer);
        out.write_all(PSIR_SIGNATURE)?;
        write_u16_be(&mut out, self.image_resource_id)?;

        write_u8(&mut out, name_len)?;
        out.write_all(&self.name)?;
        if name_len % 2 == 0 {
            write_zeros(&mut out, 1)?;
        }

        write_u32_be(&mut out, buffer_len)?;
        out.write_all(&self.buffer)?;
        if buffer_len % 2 == 1 {
            write_zeros(&mut out, 1)?;
        }

        if options.verify_sizes && out.written() != self.size() {
            return Err(PsdError::SizeMismatch {
                what: "image resource block",
                expected: self.size(),
                actual: out.written(),
                offset: 0,
            });
        }
        Ok(())
    }
}
