//! Layer records
//!
//! ## Layer record layout
//!
//! ```text
//! top, left, bottom, right        4 x i32
//! channel count                   u16
//! channel info                    count x (i16 id, u32 length)
//! blend signature "8BIM"          4 bytes
//! blend mode key                  4 bytes
//! opacity, clipping, flags, filler 4 x u8
//! extra data length               u32
//!   layer mask                    u32 length + data
//!   blending ranges               u32 length + data
//!   name                          Pascal string padded to 4 bytes
//!   additional layer information  keyed blocks up to extra data length
//! ```

use std::io::{Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::core::io::{
    expect_fourcc, length_field, position, read_bytes, read_fourcc, read_i16_be, read_u16_be,
    read_u32_be, read_u8, skip, write_i16_be, write_u16_be, write_u32_be, write_u8, write_zeros,
};
use crate::core::options::DecodeContext;
use crate::format::extra::ExtraDataBlock;
use crate::format::mask::{read_rect, write_rect, LayerBlendingRanges, LayerMask};
use crate::types::{FourCc, Rect};

/// Blend mode signature
pub const BLEND_SIGNATURE: &[u8; 4] = b"8BIM";

/// Blend mode key for "normal"
pub const BLEND_NORMAL: &[u8; 4] = b"norm";

/// Bounding box + channel count
const LAYER_BOUNDS_SIZE: u64 = 4 * 4 + 2;

/// Signature, mode key, opacity/clipping/flags/filler, extra data length
const LAYER_BLEND_SIZE: u64 = 4 * 3 + 4;

/// Bytes per channel info entry
const CHANNEL_INFO_SIZE: u64 = 6;

/// Flags bit set when the layer is hidden
const FLAG_HIDDEN: u8 = 0x02;

/// Channel id and the byte length of its image data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelInfo {
    /// 0, 1, 2... color channels; -1 transparency; -2 user mask
    pub id: i16,
    pub length: u32,
}

/// One layer record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layer {
    pub rect: Rect,
    pub channels: Vec<ChannelInfo>,
    pub blend_mode: FourCc,
    pub opacity: u8,
    pub clipping: u8,
    pub flags: u8,
    pub filler: u8,
    pub mask: Option<LayerMask>,
    pub blending_ranges: LayerBlendingRanges,
    /// Legacy Pascal-string name
    pub name: Vec<u8>,
    pub extra: Vec<ExtraDataBlock>,
    /// Display name as UTF-16 code units
    pub wide_name: Vec<u16>,
    /// Display name as UTF-8 bytes, not validated. See
    /// [`luni_read_name`](crate::format::extra::luni_read_name).
    pub utf8_name: Vec<u8>,
    /// A `TySh` block is present
    pub has_text: bool,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            rect: Rect::default(),
            channels: Vec::new(),
            blend_mode: FourCc(*BLEND_NORMAL),
            opacity: 255,
            clipping: 0,
            flags: 0,
            filler: 0,
            mask: None,
            blending_ranges: LayerBlendingRanges::default(),
            name: Vec::new(),
            extra: Vec::new(),
            wide_name: Vec::new(),
            utf8_name: Vec::new(),
            has_text: false,
        }
    }
}

/// Pad bytes after a name of `len` bytes so length byte + name + pad is a multiple of 4.
pub fn name_padding(len: u8) -> u64 {
    match len % 4 {
        0 => 3,
        1 => 2,
        2 => 1,
        _ => 0,
    }
}

impl Layer {
    /// A normal, fully opaque layer with the given legacy name.
    pub fn new(name: &str, rect: Rect) -> Self {
        let mut layer = Self {
            rect,
            name: name.as_bytes().to_vec(),
            ..Self::default()
        };
        layer.refresh_names();
        layer
    }

    /// Display name, with invalid UTF-8 replaced
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.utf8_name).into_owned()
    }

    pub fn is_visible(&self) -> bool {
        self.flags & FLAG_HIDDEN == 0
    }

    pub fn is_text_layer(&self) -> bool {
        self.has_text
    }

    /// Find the first additional information block with `key`
    pub fn extra_block(&self, key: &[u8; 4]) -> Option<&ExtraDataBlock> {
        self.extra.iter().find(|b| b.key == key)
    }

    /// Bytes of the name field: length byte, name, padding
    pub fn name_field_size(&self) -> u64 {
        let len = self.name.len().min(u8::MAX as usize) as u8;
        1 + u64::from(len) + name_padding(len)
    }

    /// Extra data length as written: mask, blending ranges, name field and
    /// every additional information block.
    pub fn extra_data_length(&self) -> u64 {
        LayerMask::size(self.mask.as_ref())
            + self.blending_ranges.size()
            + self.name_field_size()
            + self.extra.iter().map(ExtraDataBlock::size).sum::<u64>()
    }

    /// Bytes this record occupies when written
    pub fn size(&self) -> u64 {
        LAYER_BOUNDS_SIZE
            + CHANNEL_INFO_SIZE * self.channels.len() as u64
            + LAYER_BLEND_SIZE
            + self.extra_data_length()
    }

    /// Recompute the display names and text marker from the name and blocks.
    ///
    /// Without a `luni` block the wide name is the legacy name widened byte
    /// by byte and the UTF-8 name is the legacy bytes as stored.
    pub fn refresh_names(&mut self) {
        self.wide_name = self.name.iter().map(|&b| u16::from(b)).collect();
        self.utf8_name = self.name.clone();
        self.has_text = false;

        for block in &self.extra {
            if block.is_type_tool() {
                self.has_text = true;
            } else if let Some(Ok((wide, utf8))) = block.unicode_name() {
                self.wide_name = wide;
                self.utf8_name = utf8;
            }
        }
    }

    /// Decode one layer record at the current position.
    pub fn read<R: Read + Seek>(reader: &mut R, ctx: &mut DecodeContext<'_>) -> PsdResult<Self> {
        let start = position(reader)?;
        let rect = read_rect(reader)?;
        let num_channels = read_u16_be(reader)?;
        ctx.trace(
            start,
            format!(
                "bounds {} {} {} {}, {num_channels} channels",
                rect.top, rect.left, rect.bottom, rect.right
            ),
        );

        let mut channels = Vec::with_capacity(usize::from(num_channels));
        for _ in 0..num_channels {
            channels.push(ChannelInfo {
                id: read_i16_be(reader)?,
                length: read_u32_be(reader)?,
            });
        }

        let sig_offset = position(reader)?;
        if let Err(e) = expect_fourcc(reader, &[BLEND_SIGNATURE]) {
            if let PsdError::MagicMismatch { found, .. } = &e {
                ctx.warn(sig_offset, format!("invalid blend signature: {found}"));
            }
            return Err(e);
        }
        let blend_mode = read_fourcc(reader)?;
        let opacity = read_u8(reader)?;
        let clipping = read_u8(reader)?;
        let flags = read_u8(reader)?;
        let filler = read_u8(reader)?;
        let extra_len_offset = position(reader)?;
        let extra_data_length = u64::from(read_u32_be(reader)?);
        ctx.check_len("layer extra data", extra_data_length, extra_len_offset)?;

        let checkpoint = position(reader)?;
        let mask = LayerMask::read(reader, ctx)?;
        let blending_ranges = LayerBlendingRanges::read(reader, ctx)?;

        let name_len = read_u8(reader)?;
        let name = read_bytes(reader, u64::from(name_len))?;
        skip(reader, name_padding(name_len))?;

        let mut extra = Vec::new();
        while position(reader)? - checkpoint < extra_data_length {
            extra.push(ExtraDataBlock::read(reader, ctx)?);
        }

        let consumed = position(reader)? - checkpoint;
        if consumed != extra_data_length {
            return Err(PsdError::SizeMismatch {
                what: "layer extra data",
                expected: extra_data_length,
                actual: consumed,
                offset: checkpoint,
            });
        }

        let mut layer = Self {
            rect,
            channels,
            blend_mode,
            opacity,
            clipping,
            flags,
            filler,
            mask,
            blending_ranges,
            name,
            extra,
            wide_name: Vec::new(),
            utf8_name: Vec::new(),
            has_text: false,
        };
        layer.refresh_names();

        if let Some(Err(e)) = layer.extra.iter().find_map(ExtraDataBlock::unicode_name) {
            ctx.warn(checkpoint, format!("ignoring malformed unicode name: {e}"));
        }

        let keys: Vec<String> = layer.extra.iter().map(|b| b.key.to_string()).collect();
        ctx.debug(
            start,
            format!("layer {} [{}]", layer.display_name(), keys.join(" ")),
        );

        Ok(layer)
    }

    /// Encode this record.
    ///
    /// The channel count and extra data length are recomputed from the
    /// current contents rather than taken from what was read.
    pub fn write<W: Write>(&self, writer: &mut W) -> PsdResult<()> {
        let num_channels =
            u16::try_from(self.channels.len()).map_err(|_| PsdError::UnsupportedFeature {
                feature: format!("{} channels in one layer", self.channels.len()),
                offset: 0,
            })?;
        let name_len = u8::try_from(self.name.len()).map_err(|_| PsdError::UnsupportedFeature {
            feature: format!("layer name of {} bytes", self.name.len()),
            offset: 0,
        })?;
        let extra_data_length = length_field("layer extra data", self.extra_data_length())?;

        write_rect(writer, &self.rect)?;
        write_u16_be(writer, num_channels)?;
        for channel in &self.channels {
            write_i16_be(writer, channel.id)?;
            write_u32_be(writer, channel.length)?;
        }

        writer.write_all(BLEND_SIGNATURE)?;
        writer.write_all(self.blend_mode.as_bytes())?;
        write_u8(writer, self.opacity)?;
        write_u8(writer, self.clipping)?;
        write_u8(writer, self.flags)?;
        write_u8(writer, self.filler)?;
        write_u32_be(writer, extra_data_length)?;

        LayerMask::write(self.mask.as_ref(), writer)?;
        self.blending_ranges.write(writer)?;

        write_u8(writer, name_len)?;
        writer.write_all(&self.name)?;
        write_zeros(writer, name_padding(name_len) as usize)?;

        for block in &self.extra {
            block.write(writer)?;
        }
        Ok(())
    }
}
