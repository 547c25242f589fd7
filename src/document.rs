//! PSD document
//!
//! [`PsdDocument`] drives decoding of the four framing sections in order:
//! header, color mode data, image resources, and layer/mask information.
//! Each stage must succeed before the next one starts; the document is
//! only marked valid once all of them have.
//!
//! Encoding is partial. [`PsdDocument::save`] writes the header and an
//! empty color mode section. The image resources and layer/mask sections
//! have their own writers, [`PsdDocument::write_image_resources`] and
//! [`PsdDocument::write_layers_and_masks`], which are not chained into
//! `save`.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::core::diagnostics::{DiagnosticSink, LogSink};
use crate::core::error::{PsdError, PsdResult, Stage};
use crate::core::io::{length_field, position, read_bytes, read_u32_be, write_u32_be};
use crate::core::options::{DecodeContext, ReadOptions, WriteOptions};
use crate::format::header::{read_color_mode, read_header, write_color_mode, write_header, Header};
use crate::format::layer::Layer;
use crate::format::layer_info::LayerInfo;
use crate::format::resource::{ImageResourceBlock, PSIR_XMP};

/// Decode stages in the order they run
pub const STAGES: [Stage; 4] = [
    Stage::Header,
    Stage::ColorMode,
    Stage::ImageResources,
    Stage::LayersAndMasks,
];

/// A decoded PSD document (framing and metadata only, no pixel data)
///
/// # Example
///
/// ```rust,no_run
/// use psdkit::PsdDocument;
///
/// # fn main() -> Result<(), psdkit::PsdError> {
/// let doc = PsdDocument::open("poster.psd")?;
/// for name in doc.layer_names() {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsdDocument {
    pub header: Header,
    pub image_resources: Vec<ImageResourceBlock>,
    /// `None` when the layer and mask section is empty
    pub layer_info: Option<LayerInfo>,
    /// Bytes after the layer info (global mask info, additional layer
    /// information, padding), kept uninterpreted
    pub global_layer_data: Vec<u8>,
    valid: bool,
}

impl PsdDocument {
    /// Create an empty, not yet loaded document
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a document from a stream with default options, logging
    /// diagnostics through the `log` crate.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> PsdResult<Self> {
        let mut doc = Self::new();
        doc.load(reader)?;
        Ok(doc)
    }

    /// Decode a document held in memory
    pub fn from_bytes(data: &[u8]) -> PsdResult<Self> {
        Self::from_reader(&mut Cursor::new(data))
    }

    /// Decode the document stored at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> PsdResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_reader(&mut reader)
    }

    /// True once every stage of the last [`load`](Self::load) succeeded
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Decode with default options, logging through the `log` crate.
    pub fn load<R: Read + Seek>(&mut self, reader: &mut R) -> PsdResult<()> {
        let mut sink = LogSink;
        self.load_with(reader, ReadOptions::default(), &mut sink)
    }

    /// Decode all stages in order, reporting diagnostics to `sink`.
    ///
    /// On failure the error carries the stage it happened in and the
    /// document is left invalid.
    pub fn load_with<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        options: ReadOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> PsdResult<()> {
        self.valid = false;
        let mut ctx = DecodeContext::new(options, sink);
        for stage in STAGES {
            self.run_stage(stage, reader, &mut ctx)
                .map_err(|e| e.in_stage(stage))?;
        }
        self.valid = true;
        Ok(())
    }

    fn run_stage<R: Read + Seek>(
        &mut self,
        stage: Stage,
        reader: &mut R,
        ctx: &mut DecodeContext<'_>,
    ) -> PsdResult<()> {
        match stage {
            Stage::Header => {
                self.header = read_header(reader, ctx)?;
                Ok(())
            }
            Stage::ColorMode => read_color_mode(reader, &self.header, ctx),
            Stage::ImageResources => self.read_image_resources(reader, ctx),
            Stage::LayersAndMasks => self.read_layers_and_masks(reader, ctx),
        }
    }

    /// Decode blocks until the declared section length is used up.
    fn read_image_resources<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        ctx: &mut DecodeContext<'_>,
    ) -> PsdResult<()> {
        let len_offset = position(reader)?;
        let length = u64::from(read_u32_be(reader)?);
        ctx.debug(
            len_offset,
            format!("image resource section length: {length}"),
        );
        ctx.check_len("image resource section", length, len_offset)?;

        let start = position(reader)?;
        self.image_resources.clear();
        while position(reader)? - start < length {
            let block = ImageResourceBlock::read(reader, ctx)?;
            self.image_resources.push(block);
        }

        let consumed = position(reader)? - start;
        if consumed != length {
            return Err(PsdError::SizeMismatch {
                what: "image resource section",
                expected: length,
                actual: consumed,
                offset: len_offset,
            });
        }
        Ok(())
    }

    fn read_layers_and_masks<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        ctx: &mut DecodeContext<'_>,
    ) -> PsdResult<()> {
        let len_offset = position(reader)?;
        let length = u64::from(read_u32_be(reader)?);
        ctx.debug(
            len_offset,
            format!("layer and mask section length: {length}"),
        );

        self.layer_info = None;
        self.global_layer_data.clear();
        if length == 0 {
            return Ok(());
        }
        ctx.check_len("layer and mask section", length, len_offset)?;

        let start = position(reader)?;
        self.layer_info = Some(LayerInfo::read(reader, ctx)?);

        let consumed = position(reader)? - start;
        if consumed > length {
            return Err(PsdError::SizeMismatch {
                what: "layer and mask section",
                expected: length,
                actual: consumed,
                offset: len_offset,
            });
        }
        self.global_layer_data = read_bytes(reader, length - consumed)?;
        Ok(())
    }

    /// Write the header and an empty color mode section.
    pub fn save<W: Write>(&self, writer: &mut W) -> PsdResult<()> {
        write_header(writer, &self.header)?;
        write_color_mode(writer)
    }

    /// [`save`](Self::save) into a new buffer
    pub fn save_to_vec(&self) -> PsdResult<Vec<u8>> {
        let mut out = Vec::new();
        self.save(&mut out)?;
        Ok(out)
    }

    /// Write the image resources section: total length, then every block.
    pub fn write_image_resources<W: Write>(
        &self,
        writer: &mut W,
        options: &WriteOptions,
    ) -> PsdResult<()> {
        let length: u64 = self
            .image_resources
            .iter()
            .map(ImageResourceBlock::size)
            .sum();
        write_u32_be(writer, length_field("image resource section", length)?)?;
        for block in &self.image_resources {
            block.write(writer, options)?;
        }
        Ok(())
    }

    /// Write the layer and mask section from the layer records and the
    /// retained trailing bytes. Channel image data is written back only as
    /// far as it was retained by [`LayerInfo`].
    pub fn write_layers_and_masks<W: Write>(&self, writer: &mut W) -> PsdResult<()> {
        let info_size = self.layer_info.as_ref().map_or(0, LayerInfo::size);
        let length = info_size + self.global_layer_data.len() as u64;
        write_u32_be(writer, length_field("layer and mask section", length)?)?;
        if let Some(info) = &self.layer_info {
            info.write(writer)?;
        }
        writer.write_all(&self.global_layer_data)?;
        Ok(())
    }

    /// First image resource with `id`
    pub fn image_resource(&self, id: u16) -> Option<&ImageResourceBlock> {
        self.image_resources
            .iter()
            .find(|block| block.image_resource_id == id)
    }

    /// Raw XMP packet stored in image resource 1060
    pub fn xmp_packet(&self) -> Option<&[u8]> {
        self.image_resource(PSIR_XMP)
            .map(|block| block.buffer.as_slice())
    }

    /// Layer records in file order (bottom-most first)
    pub fn layers(&self) -> &[Layer] {
        self.layer_info
            .as_ref()
            .map_or(&[], |info| info.layers.as_slice())
    }

    /// Display names of all layers, in file order
    pub fn layer_names(&self) -> Vec<String> {
        self.layers().iter().map(Layer::display_name).collect()
    }

    pub fn has_merged_alpha_channel(&self) -> bool {
        self.layer_info
            .as_ref()
            .is_some_and(|info| info.has_merged_alpha_channel)
    }
}
