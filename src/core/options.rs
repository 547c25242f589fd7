//! Decode and encode configuration
//!
//! Use the builder methods to configure options, then hand them to
//! [`PsdDocument::load_with`](crate::PsdDocument::load_with) together with a
//! diagnostic sink.

use crate::core::diagnostics::{Diagnostic, DiagnosticSink, Level};
use crate::core::error::{PsdError, PsdResult};

/// Default ceiling for a single length prefix: 512 MiB
pub const DEFAULT_MAX_BLOCK_LEN: u64 = 512 * 1024 * 1024;

/// Options for reading PSD structures.
///
/// # Example
///
/// ```rust
/// use psdkit::ReadOptions;
///
/// let options = ReadOptions::default().lenient().max_layers(64);
/// assert!(!options.verify_sizes);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ReadOptions {
    /// Check each image resource block consumed exactly its computed size
    pub verify_sizes: bool,
    /// Largest layer count accepted
    pub max_layers: u16,
    /// Largest length prefix accepted before allocating
    pub max_block_len: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verify_sizes: true,
            max_layers: i16::MAX as u16,
            max_block_len: DEFAULT_MAX_BLOCK_LEN,
        }
    }
}

impl ReadOptions {
    /// Check consumed sizes against computed sizes (default).
    pub fn strict(mut self) -> Self {
        self.verify_sizes = true;
        self
    }

    /// Skip the consumed-size check on image resource blocks.
    pub fn lenient(mut self) -> Self {
        self.verify_sizes = false;
        self
    }

    /// Refuse documents with more layers than `max`.
    pub fn max_layers(mut self, max: u16) -> Self {
        self.max_layers = max;
        self
    }

    /// Refuse any single length prefix above `max` bytes.
    pub fn max_block_len(mut self, max: u64) -> Self {
        self.max_block_len = max;
        self
    }
}

/// Options for writing PSD structures.
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    /// Check each image resource block produced exactly its computed size
    pub verify_sizes: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { verify_sizes: true }
    }
}

impl WriteOptions {
    /// Skip the produced-size check.
    pub fn lenient(mut self) -> Self {
        self.verify_sizes = false;
        self
    }
}

/// State threaded through every decoder: options plus the diagnostic sink.
pub struct DecodeContext<'a> {
    pub options: ReadOptions,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> DecodeContext<'a> {
    pub fn new(options: ReadOptions, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { options, sink }
    }

    pub fn warn(&mut self, offset: u64, message: impl Into<String>) {
        self.emit(Level::Warn, offset, message.into());
    }

    pub fn debug(&mut self, offset: u64, message: impl Into<String>) {
        self.emit(Level::Debug, offset, message.into());
    }

    pub fn trace(&mut self, offset: u64, message: impl Into<String>) {
        self.emit(Level::Trace, offset, message.into());
    }

    fn emit(&mut self, level: Level, offset: u64, message: String) {
        self.sink.record(Diagnostic {
            level,
            offset,
            message,
        });
    }

    /// Refuse a length prefix larger than the configured ceiling.
    pub fn check_len(&self, what: &str, len: u64, offset: u64) -> PsdResult<()> {
        if len > self.options.max_block_len {
            return Err(PsdError::UnsupportedFeature {
                feature: format!(
                    "{what} of {len} bytes exceeds the {} byte limit",
                    self.options.max_block_len
                ),
                offset,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = ReadOptions::default();
        assert!(options.verify_sizes);
        assert_eq!(options.max_layers, 32767);

        let options = options.lenient().max_layers(3).max_block_len(10);
        assert!(!options.verify_sizes);
        assert_eq!(options.max_layers, 3);
        assert_eq!(options.max_block_len, 10);
        assert!(options.strict().verify_sizes);
    }

    #[test]
    fn test_context_records_diagnostics() {
        let mut events: Vec<Diagnostic> = Vec::new();
        let mut ctx = DecodeContext::new(ReadOptions::default(), &mut events);
        ctx.debug(4, "hello");
        ctx.warn(8, "careful");
        drop(ctx);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, Level::Debug);
        assert_eq!(events[1].offset, 8);
        assert_eq!(events[1].to_string(), "@8: careful");
    }

    #[test]
    fn test_check_len() {
        let mut sink = ();
        let ctx = DecodeContext::new(ReadOptions::default().max_block_len(16), &mut sink);
        assert!(ctx.check_len("payload", 16, 0).is_ok());
        let err = ctx.check_len("payload", 17, 40).unwrap_err();
        assert!(err.is_unsupported());
    }
}
