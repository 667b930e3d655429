//! Backends implemented by external command-line tools.
//!
//! | Capability | Tool chain |
//! |------------|------------|
//! | SVG → raster | `rsvg-convert` |
//! | EPS/AI → raster | Ghostscript `png16m` |
//! | DXF → raster | `dxf2svg` then `rsvg-convert` |
//! | PDF → raster | Ghostscript `png16m` (page 1) or `tiff24nc` (all pages) |
//! | RAW → TIFF | `dcraw -c -w -T` |
//! | SVG → PDF | `rsvg-convert --format=pdf` |
//! | EPS/AI → PDF, AI → EPS | Ghostscript `pdfwrite` / `eps2write` |
//! | EPS/AI → SVG | Ghostscript `pdfwrite` then `pdf2svg` |
//! | PDF → SVG | `pdf2svg` (page 1) |
//! | DXF → SVG/PDF | `dxf2svg`, then `rsvg-convert` for PDF |
//! | HEIF → PNG | `heif-convert` |
//! | PSD/PCX/JXR/XCF → PNG | ImageMagick |

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use imgshift_core::config::{ToolConfig, ToolsConfig};

use super::{
    BackendResult, DocumentRasterizer, LayerFlattener, PageSelection, RawDecoder,
    VectorRasterizer, VectorReencoder,
};
use crate::error::BackendCause;
use crate::formats::{Capability, FormatId};
use crate::tools::{ArgVars, StdoutMode, ToolInvocation, ToolRunner};
use crate::workspace::Workspace;

const GS_BASE: &[&str] = &["-dSAFER", "-dBATCH", "-dNOPAUSE", "-dQUIET"];

/// Every non-raster capability, served by host tools.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    tools: ToolsConfig,
    runner: ToolRunner,
}

impl ExternalTools {
    /// Create the tool backend from configuration.
    pub fn new(tools: ToolsConfig) -> Self {
        Self {
            tools,
            runner: ToolRunner::new(),
        }
    }

    async fn run(
        &self,
        tool: &ToolConfig,
        workspace: &Workspace,
        template: &[&str],
        input: &Path,
        output_name: &str,
        dpi: Option<u32>,
    ) -> BackendResult<PathBuf> {
        self.run_with(tool, workspace, template, input, output_name, dpi, StdoutMode::Discard)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_with(
        &self,
        tool: &ToolConfig,
        workspace: &Workspace,
        template: &[&str],
        input: &Path,
        output_name: &str,
        dpi: Option<u32>,
        stdout: StdoutMode,
    ) -> BackendResult<PathBuf> {
        let output = workspace.file(output_name);
        let args = self.runner.substitute_args(
            template,
            &ArgVars {
                input: Some(input),
                output: Some(&output),
                dpi,
            },
        );
        let invocation = ToolInvocation {
            command: tool.command.clone(),
            args,
            working_dir: workspace.path().to_path_buf(),
            timeout: Duration::from_secs(self.tools.timeout_for(tool)),
            output_path: output,
            stdout,
        };
        let outcome = self.runner.execute(&invocation).await?;
        Ok(outcome.output_path)
    }

    async fn ghostscript(
        &self,
        workspace: &Workspace,
        device_args: &[&str],
        input: &Path,
        output_name: &str,
        dpi: Option<u32>,
    ) -> BackendResult<PathBuf> {
        let template: Vec<&str> = GS_BASE
            .iter()
            .chain(device_args)
            .chain(&["-sOutputFile={output}", "{input}"])
            .copied()
            .collect();
        self.run(&self.tools.ghostscript, workspace, &template, input, output_name, dpi)
            .await
    }

    async fn svg_to_png(
        &self,
        workspace: &Workspace,
        input: &Path,
        dpi: u32,
    ) -> BackendResult<PathBuf> {
        self.run(
            &self.tools.rsvg_convert,
            workspace,
            &[
                "--format=png",
                "--dpi-x",
                "{dpi}",
                "--dpi-y",
                "{dpi}",
                "--output",
                "{output}",
                "{input}",
            ],
            input,
            "rendered.png",
            Some(dpi),
        )
        .await
    }

    async fn svg_to_pdf(&self, workspace: &Workspace, input: &Path) -> BackendResult<PathBuf> {
        self.run(
            &self.tools.rsvg_convert,
            workspace,
            &["--format=pdf", "--output", "{output}", "{input}"],
            input,
            "output.pdf",
            None,
        )
        .await
    }

    async fn dxf_to_svg(
        &self,
        workspace: &Workspace,
        input: &Path,
        output_name: &str,
    ) -> BackendResult<PathBuf> {
        self.run(
            &self.tools.dxf2svg,
            workspace,
            &["{input}", "-o", "{output}"],
            input,
            output_name,
            None,
        )
        .await
    }

    async fn pdf_to_svg(&self, workspace: &Workspace, input: &Path) -> BackendResult<PathBuf> {
        self.run(
            &self.tools.pdf2svg,
            workspace,
            &["{input}", "{output}", "1"],
            input,
            "output.svg",
            None,
        )
        .await
    }

    async fn postscript_to_pdf(
        &self,
        workspace: &Workspace,
        input: &Path,
        output_name: &str,
    ) -> BackendResult<PathBuf> {
        self.ghostscript(
            workspace,
            &["-sDEVICE=pdfwrite", "-dEPSCrop"],
            input,
            output_name,
            None,
        )
        .await
    }
}

fn no_route(capability: Capability, format: FormatId) -> BackendCause {
    BackendCause::NoRoute { capability, format }
}

#[async_trait]
impl VectorRasterizer for ExternalTools {
    async fn rasterize(
        &self,
        workspace: &Workspace,
        input: &Path,
        source: FormatId,
        dpi: u32,
    ) -> BackendResult<PathBuf> {
        match source {
            FormatId::Svg => self.svg_to_png(workspace, input, dpi).await,
            FormatId::Eps | FormatId::Ai => {
                self.ghostscript(
                    workspace,
                    &[
                        "-sDEVICE=png16m",
                        "-r{dpi}",
                        "-dEPSCrop",
                        "-dFirstPage=1",
                        "-dLastPage=1",
                    ],
                    input,
                    "rendered.png",
                    Some(dpi),
                )
                .await
            }
            FormatId::Dxf => {
                let svg = self.dxf_to_svg(workspace, input, "drawing.svg").await?;
                self.svg_to_png(workspace, &svg, dpi).await
            }
            other => Err(no_route(Capability::VectorRasterizer, other)),
        }
    }
}

#[async_trait]
impl DocumentRasterizer for ExternalTools {
    async fn rasterize(
        &self,
        workspace: &Workspace,
        input: &Path,
        dpi: u32,
        pages: PageSelection,
    ) -> BackendResult<PathBuf> {
        match pages {
            PageSelection::First => {
                self.ghostscript(
                    workspace,
                    &["-sDEVICE=png16m", "-r{dpi}", "-dFirstPage=1", "-dLastPage=1"],
                    input,
                    "rendered.png",
                    Some(dpi),
                )
                .await
            }
            PageSelection::All => {
                self.ghostscript(
                    workspace,
                    &["-sDEVICE=tiff24nc", "-r{dpi}"],
                    input,
                    "pages.tiff",
                    Some(dpi),
                )
                .await
            }
        }
    }
}

#[async_trait]
impl RawDecoder for ExternalTools {
    async fn demosaic(&self, workspace: &Workspace, input: &Path) -> BackendResult<PathBuf> {
        self.run_with(
            &self.tools.dcraw,
            workspace,
            &["-c", "-w", "-T", "{input}"],
            input,
            "demosaiced.tiff",
            None,
            StdoutMode::IntoOutput,
        )
        .await
    }
}

#[async_trait]
impl VectorReencoder for ExternalTools {
    async fn reencode(
        &self,
        workspace: &Workspace,
        input: &Path,
        source: FormatId,
        target: FormatId,
    ) -> BackendResult<PathBuf> {
        match (source, target) {
            (FormatId::Svg, FormatId::Pdf) => self.svg_to_pdf(workspace, input).await,
            (FormatId::Eps | FormatId::Ai, FormatId::Pdf) => {
                self.postscript_to_pdf(workspace, input, "output.pdf").await
            }
            (FormatId::Eps | FormatId::Ai, FormatId::Svg) => {
                let pdf = self
                    .postscript_to_pdf(workspace, input, "intermediate.pdf")
                    .await?;
                self.pdf_to_svg(workspace, &pdf).await
            }
            (FormatId::Ai, FormatId::Eps) => {
                self.ghostscript(workspace, &["-sDEVICE=eps2write"], input, "output.eps", None)
                    .await
            }
            (FormatId::Pdf, FormatId::Svg) => self.pdf_to_svg(workspace, input).await,
            (FormatId::Dxf, FormatId::Svg) => self.dxf_to_svg(workspace, input, "output.svg").await,
            (FormatId::Dxf, FormatId::Pdf) => {
                let svg = self.dxf_to_svg(workspace, input, "drawing.svg").await?;
                self.svg_to_pdf(workspace, &svg).await
            }
            _ => Err(no_route(Capability::VectorReencoder, target)),
        }
    }
}

#[async_trait]
impl LayerFlattener for ExternalTools {
    async fn flatten(
        &self,
        workspace: &Workspace,
        input: &Path,
        source: FormatId,
    ) -> BackendResult<PathBuf> {
        match source {
            FormatId::Heif => {
                self.run(
                    &self.tools.heif_convert,
                    workspace,
                    &["{input}", "{output}"],
                    input,
                    "flattened.png",
                    None,
                )
                .await
            }
            // Layer 0 of a PSD is the stored composite.
            FormatId::Psd => {
                self.run(
                    &self.tools.imagemagick,
                    workspace,
                    &["{input}[0]", "PNG32:{output}"],
                    input,
                    "flattened.png",
                    None,
                )
                .await
            }
            FormatId::Pcx | FormatId::Jxr | FormatId::Xcf => {
                self.run(
                    &self.tools.imagemagick,
                    workspace,
                    &["{input}", "-background", "white", "-flatten", "PNG32:{output}"],
                    input,
                    "flattened.png",
                    None,
                )
                .await
            }
            other => Err(no_route(Capability::RasterCodec, other)),
        }
    }
}
