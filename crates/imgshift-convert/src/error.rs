//! Error types for the conversion pipeline.
//!
//! Backends report a [`BackendCause`]; the pipeline attaches the strategy
//! to form a [`BackendFailure`]; the service surfaces everything as a
//! [`ConversionError`], which maps onto `imgshift_core::AppError`.

use imgshift_core::error::{AppError, ErrorKind};
use thiserror::Error;

use crate::formats::{Capability, FormatId, StrategyDescriptor, Unrecognized, Unsupported};
use crate::tools::ToolError;

/// Why a backend could not produce output.
#[derive(Debug, Error)]
pub enum BackendCause {
    /// An external tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// In-process decode or encode failed.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// The WebP encoder rejected the image.
    #[error("webp encoder error: {0}")]
    Webp(String),

    /// The TIFF encoder failed.
    #[error("tiff encoder error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Filesystem error in the workspace.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking codec task panicked or was cancelled.
    #[error("codec task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The backend has no route for the requested formats.
    #[error("{capability} cannot handle {format}")]
    NoRoute {
        /// The capability asked.
        capability: Capability,
        /// The format it could not handle.
        format: FormatId,
    },
}

impl BackendCause {
    /// Whether the failure was an external tool timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Tool(ToolError::Timeout { .. }))
    }
}

/// A backend failure tied to the strategy that was running.
#[derive(Debug, Error)]
#[error("{} failed converting {} to {}", .strategy.capability, .strategy.source, .strategy.target)]
pub struct BackendFailure {
    /// The strategy that failed.
    pub strategy: StrategyDescriptor,
    /// Underlying cause.
    #[source]
    pub cause: BackendCause,
}

impl BackendFailure {
    /// Attach a strategy to a cause.
    pub fn new(strategy: StrategyDescriptor, cause: BackendCause) -> Self {
        Self { strategy, cause }
    }
}

/// Errors returned by the conversion service.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// No file was uploaded, or it was empty.
    #[error("No image file provided")]
    MissingInput,

    /// The source format could not be identified.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(#[from] Unrecognized),

    /// The (source, target) pair is not supported.
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(#[from] Unsupported),

    /// A request parameter is malformed or out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The backend failed.
    #[error("Conversion failed")]
    Backend(#[from] BackendFailure),
}

impl ConversionError {
    /// Core error kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput => ErrorKind::MissingInput,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::UnsupportedConversion(_) => ErrorKind::UnsupportedConversion,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        let kind = err.kind();
        match err {
            // Backend details stay in the logs.
            ConversionError::Backend(failure) => {
                AppError::with_source(kind, "Conversion failed", failure)
            }
            other => AppError::new(kind, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::StrategyTable;

    fn failure() -> BackendFailure {
        let strategy = *StrategyTable::global()
            .lookup(FormatId::Eps, FormatId::Png)
            .expect("eps->png");
        BackendFailure::new(
            strategy,
            BackendCause::Tool(ToolError::Timeout {
                command: "gs".to_string(),
                seconds: 60,
            }),
        )
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ConversionError::MissingInput.kind(), ErrorKind::MissingInput);
        assert_eq!(
            ConversionError::InvalidParameter("quality".into()).kind(),
            ErrorKind::InvalidParameter
        );
        assert_eq!(ConversionError::from(failure()).kind(), ErrorKind::Backend);
    }

    #[test]
    fn test_backend_message_is_generic() {
        let app: AppError = ConversionError::from(failure()).into();
        assert_eq!(app.kind, ErrorKind::Backend);
        assert_eq!(app.message, "Conversion failed");
        assert!(!app.message.contains("gs"));
        let chain = app.chain();
        assert!(chain.contains("timed out"), "{chain}");
    }

    #[test]
    fn test_failure_display_names_strategy() {
        let text = failure().to_string();
        assert!(text.contains("vector_rasterizer"));
        assert!(text.contains("eps"));
        assert!(text.contains("png"));
        assert!(failure().cause.is_timeout());
    }

    #[test]
    fn test_client_errors_keep_message() {
        let err = ConversionError::UnsupportedConversion(Unsupported {
            from: FormatId::Gif,
            to: FormatId::Bmp,
        });
        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::UnsupportedConversion);
        assert!(app.message.contains("gif"));
        assert!(app.message.contains("bmp"));
    }
}
