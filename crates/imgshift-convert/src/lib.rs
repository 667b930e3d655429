//! # imgshift-convert
//!
//! Format routing and the conversion pipeline.
//!
//! A request flows through four stages:
//!
//! 1. [`formats::FormatRegistry`] detects the source format from the
//!    filename, the payload bytes, or the declared MIME type.
//! 2. [`formats::StrategyTable`] maps the (source, target) pair to a
//!    [`formats::StrategyDescriptor`].
//! 3. [`pipeline::PipelineExecutor`] runs the strategy inside a scoped
//!    [`workspace::Workspace`] using the configured [`backend::Backends`].
//! 4. [`service::ConversionService`] packages the result and maps every
//!    failure into [`error::ConversionError`].

pub mod backend;
pub mod error;
pub mod filesystem;
pub mod formats;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod service;
pub mod tools;
pub mod workspace;

pub use backend::Backends;
pub use error::{BackendCause, BackendFailure, ConversionError};
pub use formats::{Capability, FormatId, StrategyDescriptor, StrategyTable};
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use models::{ConversionRequest, ConversionResult, Upload};
pub use pipeline::PipelineExecutor;
pub use service::ConversionService;
pub use workspace::Workspace;
