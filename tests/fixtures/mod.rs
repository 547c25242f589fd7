//! Synthetic PSD documents for integration tests

#![allow(dead_code)]

use psdkit::{ExtraDataBlock, Layer, LayerInfo, Rect};

/// Header for an 8-bit RGB document
pub fn header(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"8BPS"); // Signature
    data.extend_from_slice(&1u16.to_be_bytes()); // Version 1
    data.extend_from_slice(&[0u8; 6]); // Reserved
    data.extend_from_slice(&3u16.to_be_bytes()); // Channels
    data.extend_from_slice(&height.to_be_bytes()); // Height
    data.extend_from_slice(&width.to_be_bytes()); // Width
    data.extend_from_slice(&8u16.to_be_bytes()); // Depth
    data.extend_from_slice(&3u16.to_be_bytes()); // Color mode (RGB)
    data
}

/// Image resource block with the given id, name and payload
pub fn resource(id: u16, name: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"8BIM");
    data.extend_from_slice(&id.to_be_bytes());
    data.push(name.len() as u8);
    data.extend_from_slice(name);
    if name.len() % 2 == 0 {
        data.push(0);
    }
    data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    data.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        data.push(0);
    }
    data
}

/// Header, empty color mode, the given resources and layer section bytes
pub fn document(resources: &[Vec<u8>], layer_section: &[u8]) -> Vec<u8> {
    let mut data = header(64, 32);
    data.extend_from_slice(&0u32.to_be_bytes());

    let resources: Vec<u8> = resources.concat();
    let resources_len = resources.len() as u32;
    data.extend_from_slice(&resources_len.to_be_bytes());
    data.extend_from_slice(&resources);

    let layer_section_len = layer_section.len() as u32;
    data.extend_from_slice(&layer_section_len.to_be_bytes());
    data.extend_from_slice(layer_section);

    // Image data section: raw compression, left unread by the decoder
    data.extend_from_slice(&0u16.to_be_bytes());
    data
}

/// Header with empty color mode, image resources and layer sections
pub fn minimal() -> Vec<u8> {
    document(&[], &[])
}

/// Encoded layer info for `names`; a name starting with `T:` becomes a text layer
pub fn layer_info(names: &[&str], merged_alpha: bool) -> Vec<u8> {
    let layers = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let top = i as i32 * 10;
            let mut layer = Layer::new(name, Rect::new(top, 0, top + 10, 64));
            layer.extra.push(ExtraDataBlock::unicode_name_block(name));
            if name.starts_with("T:") {
                layer.extra.push(ExtraDataBlock::new(b"TySh", vec![0u8; 8]));
            }
            layer.refresh_names();
            layer
        })
        .collect();
    let info = LayerInfo {
        layers,
        has_merged_alpha_channel: merged_alpha,
        channel_data: Vec::new(),
    };
    let mut out = Vec::new();
    info.write(&mut out).unwrap();
    out
}
