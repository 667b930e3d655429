//! Pipeline executor: runs one strategy inside a scoped workspace.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use imgshift_core::config::ConversionConfig;

use crate::backend::{BackendResult, Backends, EncodeOptions, PageSelection, RasterCodec};
use crate::error::{BackendCause, BackendFailure};
use crate::filesystem::FsUtils;
use crate::formats::{Capability, FormatId, StrategyDescriptor};
use crate::models::{ConversionRequest, ConversionResult};
use crate::workspace::Workspace;

/// Executes conversion strategies against the configured backends.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    temp_root: PathBuf,
    raster_dpi: u32,
    backends: Backends,
}

impl PipelineExecutor {
    /// Create an executor.
    pub fn new(config: &ConversionConfig, backends: Backends) -> Self {
        Self {
            temp_root: config.effective_temp_root(),
            raster_dpi: config.raster_dpi,
            backends,
        }
    }

    /// Root under which workspaces are created.
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Run `strategy` for `request`.
    ///
    /// The workspace is removed before this returns, whatever the outcome.
    pub async fn execute(
        &self,
        request: &ConversionRequest,
        strategy: &StrategyDescriptor,
    ) -> Result<ConversionResult, BackendFailure> {
        let start = Instant::now();

        let workspace = Workspace::create(&self.temp_root)
            .map_err(|e| BackendFailure::new(*strategy, e.into()))?;

        let outcome = self.run(&workspace, request, strategy).await;

        if let Err(e) = workspace.close() {
            tracing::warn!(error = %e, "Failed to remove workspace");
        }

        let data = outcome.map_err(|cause| BackendFailure::new(*strategy, cause))?;

        Ok(ConversionResult {
            data,
            content_type: strategy.target.mime_type(),
            filename: FsUtils::output_filename(request.filename.as_deref(), strategy.target),
            strategy: *strategy,
            elapsed: start.elapsed(),
        })
    }

    async fn run(
        &self,
        workspace: &Workspace,
        request: &ConversionRequest,
        strategy: &StrategyDescriptor,
    ) -> BackendResult<Bytes> {
        let input = workspace.stage_input(request.source, &request.data).await?;
        let backends = &self.backends;

        match strategy.capability {
            Capability::RasterCodec => {
                let (raster, hint) = if strategy.flatten_to_raster {
                    let flat = backends
                        .layer_flattener
                        .flatten(workspace, &input, request.source)
                        .await?;
                    (flat, FormatId::Png)
                } else {
                    (input, request.source)
                };
                self.transcode(&raster, hint, request, strategy).await
            }
            Capability::VectorRasterizer => {
                let rendered = backends
                    .vector_rasterizer
                    .rasterize(workspace, &input, request.source, self.raster_dpi)
                    .await?;
                self.transcode(&rendered, FormatId::Png, request, strategy).await
            }
            Capability::DocumentRasterizer => {
                // Multi-page targets get every page straight from the renderer.
                if strategy.target.supports_multiple_pages() {
                    let pages = backends
                        .document_rasterizer
                        .rasterize(workspace, &input, self.raster_dpi, PageSelection::All)
                        .await?;
                    return read(&pages).await;
                }
                let page = backends
                    .document_rasterizer
                    .rasterize(workspace, &input, self.raster_dpi, PageSelection::First)
                    .await?;
                self.transcode(&page, FormatId::Png, request, strategy).await
            }
            Capability::RawDecoder => {
                let tiff = backends.raw_decoder.demosaic(workspace, &input).await?;
                self.transcode(&tiff, FormatId::Tiff, request, strategy).await
            }
            Capability::VectorReencoder => {
                let output = backends
                    .vector_reencoder
                    .reencode(workspace, &input, request.source, strategy.target)
                    .await?;
                read(&output).await
            }
        }
    }

    /// Decode a workspace file and encode it to the target on the blocking
    /// pool.
    async fn transcode(
        &self,
        path: &Path,
        hint: FormatId,
        request: &ConversionRequest,
        strategy: &StrategyDescriptor,
    ) -> BackendResult<Bytes> {
        let data = tokio::fs::read(path).await?;
        let codec: Arc<dyn RasterCodec> = Arc::clone(&self.backends.raster);
        let target = strategy.target;
        let options = EncodeOptions {
            quality: request.quality,
            keep_frames: strategy.preserves_frames,
        };

        let encoded = tokio::task::spawn_blocking(move || -> BackendResult<Vec<u8>> {
            let image = codec.decode(&data, Some(hint), options.keep_frames)?;
            codec.encode(&image, target, options)
        })
        .await??;

        Ok(Bytes::from(encoded))
    }
}

async fn read(path: &Path) -> BackendResult<Bytes> {
    let data = tokio::fs::read(path).await.map_err(BackendCause::Io)?;
    Ok(Bytes::from(data))
}
