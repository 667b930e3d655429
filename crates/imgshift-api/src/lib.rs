//! # imgshift-api
//!
//! HTTP API layer for imgshift built on Axum.
//!
//! Exposes `POST /convert`, `GET /formats` and `GET /health`, the CORS and
//! request-logging middleware, and the mapping from [`imgshift_core::AppError`]
//! to JSON error responses.

pub mod app;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, check_tools, run_server};
pub use error::ApiError;
pub use state::AppState;
