//! Test doubles for the external capabilities.
//!
//! Compiled for unit tests and, through the `test-util` feature, for the
//! workspace integration tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use imgshift_core::config::ConversionConfig;

use super::{
    BackendResult, Backends, DecodeLimits, DocumentRasterizer, ImageCodec, LayerFlattener,
    PageSelection, RawDecoder, VectorRasterizer, VectorReencoder,
};
use crate::error::BackendCause;
use crate::formats::FormatId;
use crate::tools::ToolError;
use crate::workspace::Workspace;

/// Encode a `width` x `height` noisy gradient in an `image` crate format.
///
/// The noise gives lossy encoders something to discard. ICO is encoded
/// from RGBA, the only layout its PNG-backed decoder accepts.
pub fn sample_raster(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let rgb = RgbImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let noise = (state & 0x3f) as u8;
        image::Rgb([
            (x * 255 / width.max(1)) as u8 ^ noise,
            (y * 255 / height.max(1)) as u8,
            noise.wrapping_mul(3),
        ])
    });
    let image = match format {
        ImageFormat::Ico => DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(rgb).to_rgba8()),
        _ => DynamicImage::ImageRgb8(rgb),
    };
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode sample");
    buf
}

/// A small PNG.
pub fn sample_png() -> Vec<u8> {
    sample_raster(ImageFormat::Png, 24, 16)
}

/// Plausible input bytes for any source format.
pub fn sample_input(format: FormatId) -> Vec<u8> {
    match format.image_format() {
        Some(image_format) => sample_raster(image_format, 24, 16),
        None => format!("mock {format} payload").into_bytes(),
    }
}

/// Writes valid sample outputs instead of calling tools.
#[derive(Debug, Default)]
pub struct MockTools {
    /// Fail every call with a tool error.
    pub fail: bool,
    /// Number of calls made.
    pub calls: AtomicUsize,
}

impl MockTools {
    /// Mock that fails every call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn produce(&self, workspace: &Workspace, name: &str, data: &[u8]) -> BackendResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BackendCause::Tool(ToolError::ProcessFailed {
                command: "mock-tool".to_string(),
                code: Some(2),
                stderr: "mock-tool: /secret/path exploded".to_string(),
            }));
        }
        let path = workspace.file(name);
        std::fs::write(&path, data)?;
        Ok(path)
    }
}

#[async_trait]
impl VectorRasterizer for MockTools {
    async fn rasterize(
        &self,
        workspace: &Workspace,
        _input: &Path,
        _source: FormatId,
        _dpi: u32,
    ) -> BackendResult<PathBuf> {
        self.produce(workspace, "rendered.png", &sample_png())
    }
}

#[async_trait]
impl DocumentRasterizer for MockTools {
    async fn rasterize(
        &self,
        workspace: &Workspace,
        _input: &Path,
        _dpi: u32,
        pages: PageSelection,
    ) -> BackendResult<PathBuf> {
        match pages {
            PageSelection::First => {
                self.produce(workspace, "rendered.png", &sample_png())
            }
            PageSelection::All => {
                self.produce(workspace, "pages.tiff", &sample_raster(ImageFormat::Tiff, 24, 16))
            }
        }
    }
}

#[async_trait]
impl RawDecoder for MockTools {
    async fn demosaic(&self, workspace: &Workspace, _input: &Path) -> BackendResult<PathBuf> {
        self.produce(workspace, "demosaiced.tiff", &sample_raster(ImageFormat::Tiff, 24, 16))
    }
}

#[async_trait]
impl VectorReencoder for MockTools {
    async fn reencode(
        &self,
        workspace: &Workspace,
        _input: &Path,
        _source: FormatId,
        target: FormatId,
    ) -> BackendResult<PathBuf> {
        let body: &[u8] = match target {
            FormatId::Pdf => b"%PDF-1.4\n%mock\n",
            FormatId::Svg => b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>",
            _ => b"%!PS-Adobe-3.0 EPSF-3.0\n",
        };
        self.produce(workspace, &format!("output.{}", target.extension()), body)
    }
}

#[async_trait]
impl LayerFlattener for MockTools {
    async fn flatten(
        &self,
        workspace: &Workspace,
        _input: &Path,
        _source: FormatId,
    ) -> BackendResult<PathBuf> {
        self.produce(workspace, "flattened.png", &sample_png())
    }
}

/// Real raster codec plus the given mock for every tool capability.
pub fn mock_backends(config: &ConversionConfig, tools: Arc<MockTools>) -> Backends {
    Backends {
        raster: Arc::new(ImageCodec::new(DecodeLimits::from_config(config))),
        vector_rasterizer: tools.clone(),
        document_rasterizer: tools.clone(),
        raw_decoder: tools.clone(),
        vector_reencoder: tools.clone(),
        layer_flattener: tools,
    }
}
