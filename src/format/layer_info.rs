//! Layer info section
//!
//! - Length: 4 bytes (big-endian)
//! - Layer count: 2 bytes, signed; a negative count means the first alpha
//!   channel holds the merged result's transparency
//! - Layer records, `|count|` of them
//! - Channel image data for every layer, up to the declared length

use std::io::{Read, Seek, Write};

use crate::core::error::{PsdError, PsdResult};
use crate::core::io::{
    length_field, position, read_bytes, read_i16_be, read_u32_be, write_i16_be, write_u32_be,
};
use crate::core::options::DecodeContext;
use crate::format::layer::Layer;

/// Ordered layer records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerInfo {
    pub layers: Vec<Layer>,
    pub has_merged_alpha_channel: bool,
    /// Channel image data following the records, kept compressed and
    /// uninterpreted
    pub channel_data: Vec<u8>,
}

impl LayerInfo {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    /// Signed count as stored on disk
    ///
    /// The merged alpha flag is carried by the sign, so it cannot be stored
    /// without at least one layer.
    pub fn stored_count(&self) -> PsdResult<i16> {
        let count = i16::try_from(self.layers.len()).map_err(|_| PsdError::UnsupportedFeature {
            feature: format!("{} layers", self.layers.len()),
            offset: 0,
        })?;
        if count == 0 && self.has_merged_alpha_channel {
            return Err(PsdError::UnsupportedFeature {
                feature: "merged alpha channel without layers".to_string(),
                offset: 0,
            });
        }
        Ok(if self.has_merged_alpha_channel {
            -count
        } else {
            count
        })
    }

    /// Bytes the section occupies when written, length prefix included
    pub fn size(&self) -> u64 {
        4 + 2 + self.layers.iter().map(Layer::size).sum::<u64>() + self.channel_data.len() as u64
    }

    /// Decode the section at the current position.
    pub fn read<R: Read + Seek>(reader: &mut R, ctx: &mut DecodeContext<'_>) -> PsdResult<Self> {
        let start = position(reader)?;
        let length = u64::from(read_u32_be(reader)?);
        let body_start = position(reader)?;

        let count_offset = position(reader)?;
        let raw_count = read_i16_be(reader)?;
        let has_merged_alpha_channel = raw_count < 0;
        let count = raw_count.unsigned_abs();

        ctx.debug(
            count_offset,
            format!("number of layers: {count} (merged alpha: {has_merged_alpha_channel})"),
        );

        if count > ctx.options.max_layers {
            return Err(PsdError::UnsupportedFeature {
                feature: format!(
                    "{count} layers exceeds the limit of {}",
                    ctx.options.max_layers
                ),
                offset: count_offset,
            });
        }

        let mut layers = Vec::with_capacity(usize::from(count));
        for i in 0..count {
            let offset = position(reader)?;
            ctx.trace(offset, format!("layer {i}"));
            layers.push(Layer::read(reader, ctx)?);
        }

        let consumed = position(reader)? - body_start;
        let channel_data = if consumed < length {
            let remaining = length - consumed;
            ctx.check_len("channel image data", remaining, body_start + consumed)?;
            read_bytes(reader, remaining)?
        } else if consumed > length && length != 0 {
            return Err(PsdError::SizeMismatch {
                what: "layer info",
                expected: length,
                actual: consumed,
                offset: start,
            });
        } else {
            Vec::new()
        };

        Ok(Self {
            layers,
            has_merged_alpha_channel,
            channel_data,
        })
    }

    /// Encode the section.
    ///
    /// The count's sign comes from the merged alpha flag and the length is
    /// recomputed from the records and retained channel data.
    pub fn write<W: Write>(&self, writer: &mut W) -> PsdResult<()> {
        let count = self.stored_count()?;
        write_u32_be(writer, length_field("layer info", self.size() - 4)?)?;
        write_i16_be(writer, count)?;
        for layer in &self.layers {
            layer.write(writer)?;
        }
        writer.write_all(&self.channel_data)?;
        Ok(())
    }
}
