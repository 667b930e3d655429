//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use bytes::Bytes;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use imgshift_api::{AppState, build_app};
use imgshift_convert::Backends;
use imgshift_convert::backend::mock::mock_backends;
use imgshift_core::config::AppConfig;

pub use imgshift_convert::backend::mock::{MockTools, sample_input, sample_png, sample_raster};

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "imgshift-test-boundary-7MA4YWxkTrZu0gW";

/// Test application context.
pub struct TestApp {
    /// The Axum router for making test requests.
    pub router: Router,
    /// Workspace root; every conversion must leave it empty.
    pub temp_root: TempDir,
    /// Mock tool backend, for call counting.
    pub tools: Arc<MockTools>,
    /// Application config.
    pub config: AppConfig,
}

impl TestApp {
    /// App over mock tools that succeed.
    pub fn new() -> Self {
        Self::with_tools(MockTools::default(), |_| {})
    }

    /// App over the given mock tools, with config tweaks applied.
    pub fn with_tools(tools: MockTools, configure: impl FnOnce(&mut AppConfig)) -> Self {
        let temp_root = tempfile::tempdir().expect("Failed to create temp root");
        let mut config = test_config(temp_root.path());
        configure(&mut config);

        let tools = Arc::new(tools);
        let backends = mock_backends(&config.conversion, Arc::clone(&tools));
        Self::build(temp_root, config, backends, tools)
    }

    /// App over arbitrary backends.
    pub fn with_backends(temp_root: TempDir, config: AppConfig, backends: Backends) -> Self {
        Self::build(temp_root, config, backends, Arc::new(MockTools::default()))
    }

    fn build(temp_root: TempDir, config: AppConfig, backends: Backends, tools: Arc<MockTools>) -> Self {
        let router = build_app(AppState::new(config.clone(), backends));
        Self {
            router,
            temp_root,
            tools,
            config,
        }
    }

    /// Entries left under the workspace root.
    pub fn residue(&self) -> usize {
        std::fs::read_dir(self.temp_root.path())
            .map(|d| d.count())
            .unwrap_or(0)
    }

    /// Send a request with an optional body.
    pub async fn request(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.request(req).await
    }

    /// POST a multipart form to `/convert`.
    pub async fn convert(&self, parts: &[Part<'_>]) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri("/convert")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .expect("Failed to build request");
        self.request(req).await
    }

    /// Upload `data` as `filename` and ask for `target`.
    pub async fn convert_file(&self, filename: &str, data: &[u8], target: &str) -> TestResponse {
        self.convert(&[
            Part::file("image", filename, "application/octet-stream", data),
            Part::text("target_format", target),
        ])
        .await
    }
}

/// Test response.
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub bytes: Bytes,
    /// Body parsed as JSON, `Null` when it is not JSON.
    pub body: Value,
}

impl TestResponse {
    /// A header as a string.
    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// The `code` of a JSON error body.
    pub fn error_code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

/// One multipart form part.
pub enum Part<'a> {
    /// A file upload.
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    /// A plain text field.
    Text { name: &'a str, value: &'a str },
}

impl<'a> Part<'a> {
    /// File part.
    pub fn file(name: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self::File {
            name,
            filename,
            content_type,
            data,
        }
    }

    /// Text part.
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self::Text { name, value }
    }
}

/// Encode parts as a `multipart/form-data` body delimited by [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Config pointing the workspace root at `temp_root`.
pub fn test_config(temp_root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.conversion.temp_root = Some(temp_root.to_path_buf());
    config.tools.require_all = false;
    config
}
