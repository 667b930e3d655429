//! External conversion tool configuration.
//!
//! Every backend capability that is not handled in-process resolves to a
//! command on the host. Commands are looked up on `PATH` unless an absolute
//! path is configured.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single external tool.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToolConfig {
    /// Executable name or absolute path.
    pub command: String,
    /// Per-invocation timeout override in seconds.
    #[serde(default)]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_seconds: Option<u64>,
}

impl ToolConfig {
    fn named(command: &str) -> Self {
        Self {
            command: command.to_string(),
            timeout_seconds: None,
        }
    }
}

/// The set of external tools backing the non-raster capabilities.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ToolsConfig {
    /// Fail startup when any configured tool cannot be found.
    #[serde(default = "default_true")]
    pub require_all: bool,
    /// Timeout applied when a tool has no override.
    #[serde(default = "default_timeout")]
    #[validate(range(min = 1, max = 3600))]
    pub default_timeout_seconds: u64,
    /// SVG renderer (librsvg).
    #[serde(default = "default_rsvg_convert")]
    #[validate(nested)]
    pub rsvg_convert: ToolConfig,
    /// PostScript / PDF interpreter.
    #[serde(default = "default_ghostscript")]
    #[validate(nested)]
    pub ghostscript: ToolConfig,
    /// PDF page to SVG converter.
    #[serde(default = "default_pdf2svg")]
    #[validate(nested)]
    pub pdf2svg: ToolConfig,
    /// Camera RAW demosaicing tool.
    #[serde(default = "default_dcraw")]
    #[validate(nested)]
    pub dcraw: ToolConfig,
    /// HEIF/HEIC decoder.
    #[serde(default = "default_heif_convert")]
    #[validate(nested)]
    pub heif_convert: ToolConfig,
    /// ImageMagick, used to flatten layered and exotic raster formats.
    #[serde(default = "default_imagemagick")]
    #[validate(nested)]
    pub imagemagick: ToolConfig,
    /// DXF drawing to SVG converter.
    #[serde(default = "default_dxf2svg")]
    #[validate(nested)]
    pub dxf2svg: ToolConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            require_all: default_true(),
            default_timeout_seconds: default_timeout(),
            rsvg_convert: default_rsvg_convert(),
            ghostscript: default_ghostscript(),
            pdf2svg: default_pdf2svg(),
            dcraw: default_dcraw(),
            heif_convert: default_heif_convert(),
            imagemagick: default_imagemagick(),
            dxf2svg: default_dxf2svg(),
        }
    }
}

impl ToolsConfig {
    /// All tools with their logical names, in a stable order.
    pub fn all(&self) -> [(&'static str, &ToolConfig); 7] {
        [
            ("rsvg_convert", &self.rsvg_convert),
            ("ghostscript", &self.ghostscript),
            ("pdf2svg", &self.pdf2svg),
            ("dcraw", &self.dcraw),
            ("heif_convert", &self.heif_convert),
            ("imagemagick", &self.imagemagick),
            ("dxf2svg", &self.dxf2svg),
        ]
    }

    /// Effective timeout for a tool.
    pub fn timeout_for(&self, tool: &ToolConfig) -> u64 {
        tool.timeout_seconds.unwrap_or(self.default_timeout_seconds)
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    60
}

fn default_rsvg_convert() -> ToolConfig {
    ToolConfig::named("rsvg-convert")
}

fn default_ghostscript() -> ToolConfig {
    ToolConfig::named("gs")
}

fn default_pdf2svg() -> ToolConfig {
    ToolConfig::named("pdf2svg")
}

fn default_dcraw() -> ToolConfig {
    ToolConfig::named("dcraw")
}

fn default_heif_convert() -> ToolConfig {
    ToolConfig::named("heif-convert")
}

fn default_imagemagick() -> ToolConfig {
    ToolConfig::named("magick")
}

fn default_dxf2svg() -> ToolConfig {
    ToolConfig::named("dxf2svg")
}
