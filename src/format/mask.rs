//! Layer mask and blending ranges records
//!
//! Both are a 4-byte length followed by exactly that many bytes. A nonzero
//! mask starts with a fixed 18-byte record (bounding box, default color,
//! flags); anything after it is kept verbatim.

use std::io::{Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::core::io::{
    length_field, position, read_bytes, read_i32_be, read_u32_be, read_u8, write_i32_be,
    write_u32_be, write_u8,
};
use crate::core::options::DecodeContext;
use crate::types::Rect;

/// Bounding box + default color + flags
pub const MASK_FIXED_SIZE: u64 = 4 * 4 + 2;

/// Layer mask data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerMask {
    pub rect: Rect,
    pub default_color: u8,
    pub flags: u8,
    /// Bytes after the fixed record (real user mask, parameters, padding)
    pub tail: Vec<u8>,
}

impl LayerMask {
    /// Value of the length prefix
    pub fn length(&self) -> u64 {
        MASK_FIXED_SIZE + self.tail.len() as u64
    }

    /// Decode the length-prefixed mask record; `None` when the length is zero.
    pub fn read<R: Read + Seek>(
        reader: &mut R,
        ctx: &mut DecodeContext<'_>,
    ) -> PsdResult<Option<Self>> {
        let offset = position(reader)?;
        let length = u64::from(read_u32_be(reader)?);
        ctx.trace(offset, format!("mask ({length} bytes)"));
        if length == 0 {
            return Ok(None);
        }
        if length < MASK_FIXED_SIZE {
            return Err(PsdError::SizeMismatch {
                what: "layer mask",
                expected: MASK_FIXED_SIZE,
                actual: length,
                offset,
            });
        }
        ctx.check_len("layer mask", length, offset)?;

        let rect = read_rect(reader)?;
        let default_color = read_u8(reader)?;
        let flags = read_u8(reader)?;
        let tail = read_bytes(reader, length - MASK_FIXED_SIZE)?;

        Ok(Some(Self {
            rect,
            default_color,
            flags,
            tail,
        }))
    }

    /// Encode a mask record; `None` writes a zero length and nothing else.
    pub fn write<W: Write>(mask: Option<&Self>, writer: &mut W) -> PsdResult<()> {
        let Some(mask) = mask else {
            return write_u32_be(writer, 0);
        };
        write_u32_be(writer, length_field("layer mask", mask.length())?)?;
        write_rect(writer, &mask.rect)?;
        write_u8(writer, mask.default_color)?;
        write_u8(writer, mask.flags)?;
        writer.write_all(&mask.tail)?;
        Ok(())
    }

    /// Bytes the record occupies on disk, length prefix included.
    pub fn size(mask: Option<&Self>) -> u64 {
        4 + mask.map_or(0, Self::length)
    }
}

/// Layer blending ranges, kept uninterpreted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerBlendingRanges {
    pub data: Vec<u8>,
}

impl LayerBlendingRanges {
    pub fn size(&self) -> u64 {
        4 + self.data.len() as u64
    }

    pub fn read<R: Read + Seek>(reader: &mut R, ctx: &mut DecodeContext<'_>) -> PsdResult<Self> {
        let offset = position(reader)?;
        let length = u64::from(read_u32_be(reader)?);
        ctx.trace(offset, format!("blending ranges ({length} bytes)"));
        ctx.check_len("blending ranges", length, offset)?;
        Ok(Self {
            data: read_bytes(reader, length)?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> PsdResult<()> {
        let len = length_field("blending ranges", self.data.len() as u64)?;
        write_u32_be(writer, len)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

pub(crate) fn read_rect<R: Read + Seek>(reader: &mut R) -> PsdResult<Rect> {
    Ok(Rect {
        top: read_i32_be(reader)?,
        left: read_i32_be(reader)?,
        bottom: read_i32_be(reader)?,
        right: read_i32_be(reader)?,
    })
}

pub(crate) fn write_rect<W: Write>(writer: &mut W, rect: &Rect) -> PsdResult<()> {
    write_i32_be(writer, rect.top)?;
    write_i32_be(writer, rect.left)?;
    write_i32_be(writer, rect.bottom)?;
    write_i32_be(writer, rect.right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::ReadOptions;
    use std::io::Cursor;

    fn with_ctx<T>(f: impl FnOnce(&mut DecodeContext<'_>) -> T) -> T {
        let mut sink = ();
        let mut ctx = DecodeContext::new(ReadOptions::default(), &mut sink);
        f(&mut ctx)
    }

    #[test]
    fn test_empty_mask() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 0, 0xAA]);
        let mask = with_ctx(|ctx| LayerMask::read(&mut cursor, ctx)).unwrap();
        assert!(mask.is_none());
        assert_eq!(cursor.position(), 4);

        let mut out = Vec::new();
        LayerMask::write(None, &mut out).unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
        assert_eq!(LayerMask::size(None), 4);
    }

    #[test]
    fn test_mask_with_tail() {
        let mut data = 20u32.to_be_bytes().to_vec();
        for v in [1i32, 2, 3, 4] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        data.push(255); // default color
        data.push(0x02); // flags
        data.extend_from_slice(&[0, 0]); // padding tail

        let mask = with_ctx(|ctx| LayerMask::read(&mut Cursor::new(data.clone()), ctx))
            .unwrap()
            .unwrap();
        assert_eq!(mask.rect, Rect::new(1, 2, 3, 4));
        assert_eq!(mask.default_color, 255);
        assert_eq!(mask.flags, 2);
        assert_eq!(mask.tail, [0, 0]);
        assert_eq!(LayerMask::size(Some(&mask)), 24);

        let mut out = Vec::new();
        LayerMask::write(Some(&mask), &mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_mask_too_small() {
        let mut data = 10u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0u8; 10]);
        let result = with_ctx(|ctx| LayerMask::read(&mut Cursor::new(data), ctx));
        assert!(matches!(
            result,
            Err(PsdError::SizeMismatch { expected: 18, actual: 10, .. })
        ));
    }

    #[test]
    fn test_blending_ranges() {
        let mut data = 8u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0, 0, 255, 255, 0, 0, 255, 255]);
        let ranges =
            with_ctx(|ctx| LayerBlendingRanges::read(&mut Cursor::new(data.clone()), ctx)).unwrap();
        assert_eq!(ranges.size(), 12);

        let mut out = Vec::new();
        ranges.write(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_blending_ranges_truncated() {
        let mut data = 40u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0u8; 8]);
        let result = with_ctx(|ctx| LayerBlendingRanges::read(&mut Cursor::new(data), ctx));
        assert!(matches!(
            result,
            Err(PsdError::Truncated {
                offset: 4,
                wanted: 40
            })
        ));
    }
}
