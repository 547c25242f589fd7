//! Additional layer information blocks
//!
//! Each layer record ends with a run of keyed blocks:
//! - Signature: "8BIM" or "8B64" (4 bytes)
//! - Key: 4 characters
//! - Length: 4 bytes (big-endian)
//! - Data: `length` bytes
//!
//! Only `luni` (Unicode layer name) and `TySh` (type tool object) are
//! interpreted; every other key is kept as opaque bytes.

use std::io::{Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::core::io::{
    expect_fourcc, length_field, position, read_bytes, read_fourcc, read_u32_be, write_u32_be,
    write_zeros,
};
use crate::core::options::DecodeContext;
use crate::types::FourCc;

/// Standard signature
pub const EXTRA_SIGNATURE: &[u8; 4] = b"8BIM";

/// Alternate signature used by keys with large payloads
pub const EXTRA_SIGNATURE_64: &[u8; 4] = b"8B64";

/// Unicode layer name
pub const KEY_UNICODE_NAME: &[u8; 4] = b"luni";

/// Type tool object (text layer)
pub const KEY_TYPE_TOOL: &[u8; 4] = b"TySh";

/// Signature + key + length
const EXTRA_HEADER_SIZE: u64 = 12;

/// One keyed block of additional layer information
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtraDataBlock {
    pub signature: FourCc,
    pub key: FourCc,
    pub data: Vec<u8>,
}

impl ExtraDataBlock {
    pub fn new(key: &[u8; 4], data: impl Into<Vec<u8>>) -> Self {
        Self {
            signature: FourCc(*EXTRA_SIGNATURE),
            key: FourCc(*key),
            data: data.into(),
        }
    }

    /// Build a `luni` block holding `name` as UTF-16 code units.
    pub fn unicode_name_block(name: &str) -> Self {
        let units: Vec<u16> = name.encode_utf16().collect();
        let mut data = Vec::with_capacity(4 + units.len() * 2);
        data.extend_from_slice(&(units.len() as u32).to_be_bytes());
        for unit in units {
            data.extend_from_slice(&unit.to_be_bytes());
        }
        Self::new(KEY_UNICODE_NAME, data)
    }

    /// Payload length as written: odd payloads gain one pad byte.
    fn padded_len(&self) -> u64 {
        let len = self.data.len() as u64;
        len + len % 2
    }

    /// Bytes this block occupies when written.
    pub fn size(&self) -> u64 {
        EXTRA_HEADER_SIZE + self.padded_len()
    }

    /// Decode one block at the current position.
    ///
    /// The length field is read as 32 bits for both signatures, and no pad
    /// byte is skipped after the payload.
    pub fn read<R: Read + Seek>(reader: &mut R, ctx: &mut DecodeContext<'_>) -> PsdResult<Self> {
        let start = position(reader)?;
        let signature = match expect_fourcc(reader, &[EXTRA_SIGNATURE, EXTRA_SIGNATURE_64]) {
            Ok(sig) => sig,
            Err(e) => {
                if let PsdError::MagicMismatch { found, .. } = &e {
                    ctx.warn(start, format!("extra data signature error: {found}"));
                }
                return Err(e);
            }
        };

        let key = read_fourcc(reader)?;
        let len_offset = position(reader)?;
        let length = u64::from(read_u32_be(reader)?);
        ctx.check_len("extra data", length, len_offset)?;
        let data = read_bytes(reader, length)?;

        ctx.trace(start, format!("extra data {key} ({length} bytes)"));

        Ok(Self {
            signature,
            key,
            data,
        })
    }

    /// Encode this block.
    ///
    /// An odd payload is followed by one zero byte and the length field
    /// reports the padded length, so it reads back as a one-byte-longer
    /// payload.
    pub fn write<W: Write>(&self, writer: &mut W) -> PsdResult<()> {
        let length = length_field("extra data", self.padded_len())?;
        writer.write_all(self.signature.as_bytes())?;
        writer.write_all(self.key.as_bytes())?;
        write_u32_be(writer, length)?;
        writer.write_all(&self.data)?;
        if self.data.len() % 2 == 1 {
            write_zeros(writer, 1)?;
        }
        Ok(())
    }

    pub fn is_unicode_name(&self) -> bool {
        self.key == KEY_UNICODE_NAME
    }

    pub fn is_type_tool(&self) -> bool {
        self.key == KEY_TYPE_TOOL
    }

    /// Decode a `luni` payload into UTF-16 code units and UTF-8 bytes.
    ///
    /// Returns `None` for other keys.
    pub fn unicode_name(&self) -> Option<PsdResult<(Vec<u16>, Vec<u8>)>> {
        self.is_unicode_name().then(|| luni_read_name(&self.data))
    }
}

/// Decode a `luni` payload: a 32-bit count followed by that many big-endian
/// UTF-16 code units. Returns the code units and their UTF-8 encoding.
///
/// Surrogate pairs are not combined; each half is encoded on its own as a
/// three-byte sequence, so astral characters do not come out as valid UTF-8.
pub fn luni_read_name(payload: &[u8]) -> PsdResult<(Vec<u16>, Vec<u8>)> {
    let count_bytes: [u8; 4] = payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or(PsdError::Truncated {
            offset: 0,
            wanted: 4,
        })?;
    let count = u64::from(u32::from_be_bytes(count_bytes));

    let wanted = 4 + count * 2;
    if (payload.len() as u64) < wanted {
        return Err(PsdError::SizeMismatch {
            what: "unicode layer name",
            expected: wanted,
            actual: payload.len() as u64,
            offset: 0,
        });
    }

    let units: Vec<u16> = payload[4..wanted as usize]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let utf8 = encode_ucs2_as_utf8(&units);
    Ok((units, utf8))
}

/// Encode each code unit independently with the 1, 2 or 3 byte UTF-8 forms.
pub fn encode_ucs2_as_utf8(units: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len());
    for &wc in units {
        if wc < 0x80 {
            out.push(wc as u8);
        } else if wc < 0x800 {
            out.push(0xC0 | ((wc >> 6) & 0x1F) as u8);
            out.push(0x80 | (wc & 0x3F) as u8);
        } else {
            out.push(0xE0 | ((wc >> 12) & 0x0F) as u8);
            out.push(0x80 | ((wc >> 6) & 0x3F) as u8);
            out.push(0x80 | (wc & 0x3F) as u8);
        }
    }
    out
}
