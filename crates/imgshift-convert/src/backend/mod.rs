//! Backend capabilities.
//!
//! Each [`Capability`](crate::formats::Capability) is served by a trait
//! object so the pipeline never knows whether work happens in-process or in
//! an external tool. [`Backends`] bundles one implementation of each.

pub mod external;
pub mod raster;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Frame};
use imgshift_core::config::{ConversionConfig, ToolsConfig};

use crate::error::BackendCause;
use crate::formats::FormatId;
use crate::workspace::Workspace;

pub use external::ExternalTools;
pub use raster::ImageCodec;

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendCause>;

/// A decoded raster.
#[derive(Clone)]
pub enum RasterImage {
    /// A single image.
    Still(DynamicImage),
    /// Animation frames with their delays.
    Animated(Vec<Frame>),
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Still(image) => f
                .debug_struct("Still")
                .field("width", &image.width())
                .field("height", &image.height())
                .field("color", &image.color())
                .finish(),
            Self::Animated(frames) => f
                .debug_struct("Animated")
                .field("frames", &frames.len())
                .finish(),
        }
    }
}

impl RasterImage {
    /// The first (or only) frame.
    pub fn first(&self) -> DynamicImage {
        match self {
            Self::Still(image) => image.clone(),
            Self::Animated(frames) => frames
                .first()
                .map(|f| DynamicImage::ImageRgba8(f.buffer().clone()))
                .unwrap_or_else(|| DynamicImage::new_rgba8(0, 0)),
        }
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        match self {
            Self::Still(_) => 1,
            Self::Animated(frames) => frames.len(),
        }
    }
}

/// Encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Lossy quality, 1-100.
    pub quality: u8,
    /// Keep every frame when the target can animate.
    pub keep_frames: bool,
}

/// Decoder resource bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum width or height in pixels.
    pub max_dimension: u32,
    /// Maximum decoder allocation in bytes.
    pub max_alloc_bytes: u64,
}

impl DecodeLimits {
    /// Derive limits from the conversion config.
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            max_dimension: config.max_image_dimension,
            max_alloc_bytes: config.max_decode_alloc_mb * 1024 * 1024,
        }
    }
}

/// Which pages of a document to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelection {
    /// Page one only, as PNG.
    First,
    /// Every page, as one multi-page TIFF.
    All,
}

/// In-process raster decoding and encoding. Synchronous; callers run it on
/// the blocking pool.
pub trait RasterCodec: Send + Sync {
    /// Decode bytes, sniffing the format and falling back to `hint`.
    fn decode(
        &self,
        data: &[u8],
        hint: Option<FormatId>,
        keep_frames: bool,
    ) -> BackendResult<RasterImage>;

    /// Encode to a target format.
    fn encode(
        &self,
        image: &RasterImage,
        target: FormatId,
        options: EncodeOptions,
    ) -> BackendResult<Vec<u8>>;
}

/// Renders vector drawings (SVG, EPS, AI, DXF) to a PNG in the workspace.
#[async_trait]
pub trait VectorRasterizer: Send + Sync {
    /// Render `input` at `dpi` and return the PNG path.
    async fn rasterize(
        &self,
        workspace: &Workspace,
        input: &Path,
        source: FormatId,
        dpi: u32,
    ) -> BackendResult<PathBuf>;
}

/// Renders PDF pages.
#[async_trait]
pub trait DocumentRasterizer: Send + Sync {
    /// Render pages of `input`; PNG for [`PageSelection::First`], TIFF for
    /// [`PageSelection::All`].
    async fn rasterize(
        &self,
        workspace: &Workspace,
        input: &Path,
        dpi: u32,
        pages: PageSelection,
    ) -> BackendResult<PathBuf>;
}

/// Demosaics camera RAW files to a TIFF.
#[async_trait]
pub trait RawDecoder: Send + Sync {
    /// Demosaic `input` and return the TIFF path.
    async fn demosaic(&self, workspace: &Workspace, input: &Path) -> BackendResult<PathBuf>;
}

/// Converts between vector and document formats.
#[async_trait]
pub trait VectorReencoder: Send + Sync {
    /// Re-encode `input` to `target` and return the output path.
    async fn reencode(
        &self,
        workspace: &Workspace,
        input: &Path,
        source: FormatId,
        target: FormatId,
    ) -> BackendResult<PathBuf>;
}

/// Flattens layered or codec-less raster formats to a PNG.
#[async_trait]
pub trait LayerFlattener: Send + Sync {
    /// Flatten `input` and return the PNG path.
    async fn flatten(
        &self,
        workspace: &Workspace,
        input: &Path,
        source: FormatId,
    ) -> BackendResult<PathBuf>;
}

/// One implementation per capability.
#[derive(Clone)]
pub struct Backends {
    /// In-process codec.
    pub raster: Arc<dyn RasterCodec>,
    /// Vector renderer.
    pub vector_rasterizer: Arc<dyn VectorRasterizer>,
    /// PDF renderer.
    pub document_rasterizer: Arc<dyn DocumentRasterizer>,
    /// RAW demosaicer.
    pub raw_decoder: Arc<dyn RawDecoder>,
    /// Vector/document re-encoder.
    pub vector_reencoder: Arc<dyn VectorReencoder>,
    /// Layer flattener.
    pub layer_flattener: Arc<dyn LayerFlattener>,
}

impl Backends {
    /// The production set: `image` crate codec plus external tools.
    pub fn standard(conversion: &ConversionConfig, tools: &ToolsConfig) -> Self {
        let external = Arc::new(ExternalTools::new(tools.clone()));
        Self {
            raster: Arc::new(ImageCodec::new(DecodeLimits::from_config(conversion))),
            vector_rasterizer: external.clone(),
            document_rasterizer: external.clone(),
            raw_decoder: external.clone(),
            vector_reencoder: external.clone(),
            layer_flattener: external,
        }
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}
