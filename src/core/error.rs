//! Error types for PSD operations
//!
//! This module defines all error types used throughout the crate.

use std::fmt;

use thiserror::Error;

use crate::types::FourCc;

/// Decode stages of a document, executed strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    /// File header (26 bytes)
    Header,
    /// Color mode data section
    ColorMode,
    /// Image resources section
    ImageResources,
    /// Layer and mask information section
    LayersAndMasks,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Header => "header",
            Stage::ColorMode => "color mode data",
            Stage::ImageResources => "image resources",
            Stage::LayersAndMasks => "layer and mask information",
        };
        f.write_str(name)
    }
}

/// Error types for PSD operations
#[derive(Debug, Error)]
pub enum PsdError {
    /// A signature did not hold the expected magic value
    #[error("Bad signature at offset {offset}: expected {expected}, found {found}")]
    MagicMismatch {
        expected: FourCc,
        found: FourCc,
        offset: u64,
    },

    /// The structure is valid PSD but not handled by this crate
    #[error("Unsupported feature at offset {offset}: {feature}")]
    UnsupportedFeature { feature: String, offset: u64 },

    /// A computed size disagrees with the declared or consumed size
    #[error("Size mismatch in {what} at offset {offset}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: u64,
        actual: u64,
        offset: u64,
    },

    /// The stream ended before a declared length was satisfied
    #[error("Unexpected end of stream at offset {offset} while reading {wanted} bytes")]
    Truncated { offset: u64, wanted: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A document stage failed
    #[error("Failed to decode {stage}: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PsdError>,
    },
}

impl PsdError {
    /// Wrap this error with the document stage it occurred in.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            e @ PsdError::Stage { .. } => e,
            e => PsdError::Stage {
                stage,
                source: Box::new(e),
            },
        }
    }

    /// The innermost error, with any stage annotation removed.
    pub fn root(&self) -> &PsdError {
        match self {
            PsdError::Stage { source, .. } => source.root(),
            e => e,
        }
    }

    /// The stage this error was raised in, if known.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PsdError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// True when the input is not a PSD file at all.
    ///
    /// Only a bad header (wrong magic, wrong version, or too short to hold a
    /// header) counts; a broken signature deeper in the file means the input
    /// is a damaged PSD.
    pub fn is_not_psd(&self) -> bool {
        if self.stage() != Some(Stage::Header) {
            return false;
        }
        matches!(
            self.root(),
            PsdError::MagicMismatch { .. }
                | PsdError::Truncated { .. }
                | PsdError::UnsupportedFeature { .. }
        )
    }

    /// True when the input is a recognized structure this crate does not handle.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root(), PsdError::UnsupportedFeature { .. })
    }
}

/// Result type alias for PSD operations
pub type PsdResult<T> = Result<T, PsdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PsdError::MagicMismatch {
            expected: FourCc(*b"8BPS"),
            found: FourCc(*b"GIF8"),
            offset: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("8BPS"));
        assert!(msg.contains("GIF8"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let psd_err: PsdError = io_err.into();
        assert!(matches!(psd_err, PsdError::Io(_)));
    }

    #[test]
    fn test_stage_wrapping() {
        let err = PsdError::UnsupportedFeature {
            feature: "color mode data".to_string(),
            offset: 26,
        }
        .in_stage(Stage::ColorMode);

        assert_eq!(err.stage(), Some(Stage::ColorMode));
        assert!(err.is_unsupported());
        assert!(!err.is_not_psd());

        // wrapping twice keeps the first stage
        let err = err.in_stage(Stage::LayersAndMasks);
        assert_eq!(err.stage(), Some(Stage::ColorMode));
    }

    #[test]
    fn test_not_psd() {
        let err = PsdError::MagicMismatch {
            expected: FourCc(*b"8BPS"),
            found: FourCc(*b"\x89PNG"),
            offset: 0,
        }
        .in_stage(Stage::Header);
        assert!(err.is_not_psd());
        assert!(!err.is_unsupported());
    }
}
