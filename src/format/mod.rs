//! On-disk PSD structures
//!
//! One module per record type. Every record decodes from a `Read + Seek`
//! stream positioned at its first byte and encodes to any `Write`.

pub mod extra;
pub mod header;
pub mod layer;
pub mod layer_info;
pub mod mask;
pub mod resource;

pub use extra::{luni_read_name, ExtraDataBlock};
pub use header::{read_color_mode, read_header, write_color_mode, write_header, ColorMode, Header};
pub use layer::{ChannelInfo, Layer};
pub use layer_info::LayerInfo;
pub use mask::{LayerBlendingRanges, LayerMask};
pub use resource::ImageResourceBlock;
