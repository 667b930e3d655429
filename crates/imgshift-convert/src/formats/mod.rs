//! Format identification and conversion routing.

pub mod format;
pub mod registry;
pub mod strategy;

pub use format::FormatId;
pub use registry::{Detection, DetectionSource, FormatRegistry, Unrecognized};
pub use strategy::{Capability, StrategyDescriptor, StrategyTable, Unsupported};
