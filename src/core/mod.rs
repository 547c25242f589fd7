//! PSD core module
//!
//! This module contains the plumbing shared by every record decoder:
//! errors, big-endian field I/O, options and diagnostics.

pub mod diagnostics;
pub mod error;
pub mod io;
pub mod options;

pub use diagnostics::{Diagnostic, DiagnosticSink, Level, LogSink};
pub use error::{PsdError, PsdResult, Stage};
pub use io::padded_size;
pub use options::{DecodeContext, ReadOptions, WriteOptions};
