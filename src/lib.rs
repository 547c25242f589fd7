//! # psdkit
//!
//! Pure Rust reader for the framing of Adobe Photoshop (PSD) documents:
//! the file header, color mode data, image resource blocks, and the layer
//! records with their masks, blending ranges and additional layer
//! information. Channel pixel data is carried as opaque bytes and never
//! decompressed.
//!
//! ## Reading a document
//!
//! ```rust,no_run
//! use psdkit::PsdDocument;
//!
//! # fn main() -> Result<(), psdkit::PsdError> {
//! let doc = PsdDocument::open("artwork.psd")?;
//! println!("{}x{}", doc.header.width, doc.header.height);
//! for layer in doc.layers() {
//!     println!("{} (text: {})", layer.display_name(), layer.is_text_layer());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Diagnostics
//!
//! Decoders report what they parse to a [`DiagnosticSink`]. The default
//! sink forwards to the `log` crate; pass a `Vec<Diagnostic>` to
//! [`PsdDocument::load_with`] to collect them instead.

pub mod core;
pub mod document;
pub mod format;
pub mod types;

pub use crate::core::{
    Diagnostic, DiagnosticSink, Level, LogSink, PsdError, PsdResult, ReadOptions, Stage,
    WriteOptions,
};
pub use document::PsdDocument;
pub use format::{
    ChannelInfo, ColorMode, ExtraDataBlock, Header, ImageResourceBlock, Layer,
    LayerBlendingRanges, LayerInfo, LayerMask,
};
pub use types::{FourCc, Rect};
