//! Diagnostic reporting during decode
//!
//! Decoders report what they see (header fields, block names, layer counts,
//! rejected signatures) to a [`DiagnosticSink`] supplied by the caller.
//! The default sink forwards everything to the `log` facade, so nothing is
//! printed unless the application installs a logger.

use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Warn,
    Debug,
    Trace,
}

/// One event reported by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    /// Stream offset the event refers to
    pub offset: u64,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}: {}", self.offset, self.message)
    }
}

/// Receiver for decoder diagnostics
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` crate under the `psdkit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&mut self, d: Diagnostic) {
        match d.level {
            Level::Warn => log::warn!(target: "psdkit", "{d}"),
            Level::Debug => log::debug!(target: "psdkit", "{d}"),
            Level::Trace => log::trace!(target: "psdkit", "{d}"),
        }
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl DiagnosticSink for () {
    fn record(&mut self, _diagnostic: Diagnostic) {}
}
