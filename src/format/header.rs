//! File header and color mode data section
//!
//! ## Header layout (26 bytes, big-endian)
//!
//! - Signature: "8BPS" (4 bytes)
//! - Version: 1 (2 bytes)
//! - Reserved: 6 bytes
//! - Channels: 2 bytes
//! - Height: 4 bytes
//! - Width: 4 bytes
//! - Depth: 2 bytes
//! - Color mode: 2 bytes
//!
//! The color mode data section that follows is a 4-byte length and that many
//! bytes. Only the empty section is supported.

use std::io::{Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::core::io::{
    expect_fourcc, position, read_exact, read_u16_be, read_u32_be, write_u16_be, write_u32_be,
};
use crate::core::options::DecodeContext;

/// PSD file signature
pub const PSD_SIGNATURE: &[u8; 4] = b"8BPS";

/// The only file version handled (2 is the large-document PSB variant)
pub const PSD_VERSION: u16 = 1;

/// Header size
pub const PSD_HEADER_SIZE: u64 = 26;

/// Document color modes
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorMode {
    Bitmap = 0,
    Grayscale = 1,
    Indexed = 2,
    Rgb = 3,
    Cmyk = 4,
    Multichannel = 7,
    Duotone = 8,
    Lab = 9,
}

impl ColorMode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(ColorMode::Bitmap),
            1 => Some(ColorMode::Grayscale),
            2 => Some(ColorMode::Indexed),
            3 => Some(ColorMode::Rgb),
            4 => Some(ColorMode::Cmyk),
            7 => Some(ColorMode::Multichannel),
            8 => Some(ColorMode::Duotone),
            9 => Some(ColorMode::Lab),
            _ => None,
        }
    }
}

/// Fixed-size file header
///
/// Immutable once read and written back unchanged by
/// [`PsdDocument::save`](crate::PsdDocument::save).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    pub version: u16,
    pub reserved: [u8; 6],
    pub num_channels: u16,
    pub height: u32,
    pub width: u32,
    pub bit_depth: u16,
    /// Raw color mode value; see [`Header::color_mode`]
    pub color_mode: u16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: PSD_VERSION,
            reserved: [0; 6],
            num_channels: 3,
            height: 0,
            width: 0,
            bit_depth: 8,
            color_mode: ColorMode::Rgb as u16,
        }
    }
}

impl Header {
    /// Decoded color mode, `None` for values outside the known set
    pub fn color_mode(&self) -> Option<ColorMode> {
        ColorMode::from_u16(self.color_mode)
    }
}

/// Read and validate the header.
pub fn read_header<R: Read + Seek>(
    reader: &mut R,
    ctx: &mut DecodeContext<'_>,
) -> PsdResult<Header> {
    reader.rewind()?;

    expect_fourcc(reader, &[PSD_SIGNATURE])?;

    let version_offset = position(reader)?;
    let version = read_u16_be(reader)?;
    if version != PSD_VERSION {
        return Err(PsdError::UnsupportedFeature {
            feature: format!("file version {version}"),
            offset: version_offset,
        });
    }

    let mut reserved = [0u8; 6];
    read_exact(reader, &mut reserved)?;

    let header = Header {
        version,
        reserved,
        num_channels: read_u16_be(reader)?,
        height: read_u32_be(reader)?,
        width: read_u32_be(reader)?,
        bit_depth: read_u16_be(reader)?,
        color_mode: read_u16_be(reader)?,
    };

    ctx.debug(
        0,
        format!(
            "header: version {} channels {} {}x{} depth {} color mode {}",
            header.version,
            header.num_channels,
            header.width,
            header.height,
            header.bit_depth,
            header.color_mode
        ),
    );

    Ok(header)
}

/// Write the header exactly as stored.
pub fn write_header<W: Write>(writer: &mut W, header: &Header) -> PsdResult<()> {
    writer.write_all(PSD_SIGNATURE)?;
    write_u16_be(writer, header.version)?;
    writer.write_all(&header.reserved)?;
    write_u16_be(writer, header.num_channels)?;
    write_u32_be(writer, header.height)?;
    write_u32_be(writer, header.width)?;
    write_u16_be(writer, header.bit_depth)?;
    write_u16_be(writer, header.color_mode)?;
    Ok(())
}

/// Read the color mode data section; only an empty section is accepted.
pub fn read_color_mode<R: Read + Seek>(
    reader: &mut R,
    header: &Header,
    ctx: &mut DecodeContext<'_>,
) -> PsdResult<()> {
    let offset = position(reader)?;
    let len = read_u32_be(reader)?;
    if len != 0 {
        ctx.warn(
            offset,
            format!(
                "color mode data ({len} bytes) for mode {} not implemented",
                header.color_mode
            ),
        );
        return Err(PsdError::UnsupportedFeature {
            feature: format!(
                "color mode data of {len} bytes (color mode {})",
                header.color_mode
            ),
            offset,
        });
    }
    Ok(())
}

/// Write an empty color mode data section.
pub fn write_color_mode<W: Write>(writer: &mut W) -> PsdResult<()> {
    write_u32_be(writer, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::ReadOptions;
    use std::io::Cursor;

    fn header_bytes() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BPS");
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 6]);
        data.extend_from_slice(&4u16.to_be_bytes()); // Channels
        data.extend_from_slice(&480u32.to_be_bytes()); // Height
        data.extend_from_slice(&640u32.to_be_bytes()); // Width
        data.extend_from_slice(&16u16.to_be_bytes()); // Depth
        data.extend_from_slice(&4u16.to_be_bytes()); // CMYK
        data
    }

    fn read(data: Vec<u8>) -> PsdResult<Header> {
        let mut sink = ();
        let mut ctx = DecodeContext::new(ReadOptions::default(), &mut sink);
        read_header(&mut Cursor::new(data), &mut ctx)
    }

    #[test]
    fn test_read_header() {
        let header = read(header_bytes()).unwrap();
        assert_eq!(header.num_channels, 4);
        assert_eq!(header.height, 480);
        assert_eq!(header.width, 640);
        assert_eq!(header.bit_depth, 16);
        assert_eq!(header.color_mode(), Some(ColorMode::Cmyk));
    }

    #[test]
    fn test_header_roundtrip() {
        let header = Header {
            reserved: [1, 2, 3, 4, 5, 6],
            num_channels: 5,
            height: 0x0102_0304,
            width: 7,
            bit_depth: 32,
            color_mode: 42,
            ..Header::default()
        };
        let mut out = Vec::new();
        write_header(&mut out, &header).unwrap();
        assert_eq!(out.len() as u64, PSD_HEADER_SIZE);
        assert_eq!(read(out).unwrap(), header);
    }

    #[test]
    fn test_bad_signature() {
        let mut data = header_bytes();
        data[0] = b'X';
        assert!(matches!(
            read(data),
            Err(PsdError::MagicMismatch { offset: 0, .. })
        ));
    }

    #[test]
    fn test_bad_version() {
        let mut data = header_bytes();
        data[5] = 2;
        match read(data) {
            Err(PsdError::UnsupportedFeature { offset, .. }) => assert_eq!(offset, 4),
            other => panic!("expected unsupported version, got {other:?}"),
        }
    }

    #[test]
    fn test_short_header() {
        let data = header_bytes()[..20].to_vec();
        assert!(matches!(read(data), Err(PsdError::Truncated { .. })));
    }

    #[test]
    fn test_color_mode_section() {
        let header = Header::default();
        let mut events = Vec::new();
        let mut ctx = DecodeContext::new(ReadOptions::default(), &mut events);

        let mut cursor = Cursor::new(0u32.to_be_bytes().to_vec());
        assert!(read_color_mode(&mut cursor, &header, &mut ctx).is_ok());

        let mut data = 768u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0u8; 768]);
        let err = read_color_mode(&mut Cursor::new(data), &header, &mut ctx).unwrap_err();
        assert!(err.is_unsupported());
        drop(ctx);
        assert_eq!(events.len(), 1);

        let mut out = Vec::new();
        write_color_mode(&mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
    }
}
