//! # imgshift-core
//!
//! Core crate for imgshift. Contains the configuration schemas and the
//! unified error system shared by the conversion engine and the HTTP layer.
//!
//! This crate has **no** internal dependencies on other imgshift crates.

pub mod config;
pub mod error;
pub mod result;

pub use config::AppConfig;
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
