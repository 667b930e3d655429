//! Request and result models for a single conversion.

use std::time::Duration;

use bytes::Bytes;

use crate::formats::{FormatId, StrategyDescriptor};

/// A raw upload as it arrives from the HTTP layer, before validation.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Client-supplied filename.
    pub filename: Option<String>,
    /// Declared content type of the file part.
    pub content_type: Option<String>,
    /// File contents; `None` when no file part was sent.
    pub data: Option<Bytes>,
    /// Raw `target_format` field.
    pub target_format: Option<String>,
    /// Raw `quality` field.
    pub quality: Option<String>,
}

/// A validated conversion request.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Input bytes.
    pub data: Bytes,
    /// Detected source format.
    pub source: FormatId,
    /// Requested target format.
    pub target: FormatId,
    /// Lossy quality, 1-100.
    pub quality: u8,
    /// Original filename, if the client sent one.
    pub filename: Option<String>,
}

/// The converted file.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Output bytes.
    pub data: Bytes,
    /// MIME type of `data`.
    pub content_type: &'static str,
    /// Suggested download name.
    pub filename: String,
    /// The strategy that produced it.
    pub strategy: StrategyDescriptor,
    /// Pipeline wall-clock time.
    pub elapsed: Duration,
}
