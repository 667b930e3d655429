//! Conversion pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the pipeline executor and the conversion service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConversionConfig {
    /// Root directory under which per-request workspaces are created.
    ///
    /// Defaults to `<system temp>/imgshift`.
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
    /// Quality applied to lossy targets when the request omits it.
    #[serde(default = "default_quality")]
    #[validate(range(min = 1, max = 100))]
    pub default_quality: u8,
    /// Resolution used when rasterizing vector and document sources.
    #[serde(default = "default_raster_dpi")]
    #[validate(range(min = 36, max = 1200))]
    pub raster_dpi: u32,
    /// Largest accepted width or height of a decoded raster, in pixels.
    #[serde(default = "default_max_image_dimension")]
    #[validate(range(min = 16))]
    pub max_image_dimension: u32,
    /// Upper bound on decoder allocations, in megabytes.
    #[serde(default = "default_max_decode_alloc_mb")]
    #[validate(range(min = 16))]
    pub max_decode_alloc_mb: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            default_quality: default_quality(),
            raster_dpi: default_raster_dpi(),
            max_image_dimension: default_max_image_dimension(),
            max_decode_alloc_mb: default_max_decode_alloc_mb(),
        }
    }
}

impl ConversionConfig {
    /// Resolve the effective workspace root directory.
    pub fn effective_temp_root(&self) -> PathBuf {
        self.temp_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("imgshift"))
    }
}

fn default_quality() -> u8 {
    90
}

fn default_raster_dpi() -> u32 {
    300
}

fn default_max_image_dimension() -> u32 {
    16_384
}

fn default_max_decode_alloc_mb() -> u64 {
    1024
}
