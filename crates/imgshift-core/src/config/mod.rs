//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod conversion;
pub mod logging;
pub mod tools;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::app::{CorsConfig, ServerConfig};
pub use self::conversion::ConversionConfig;
pub use self::logging::LoggingConfig;
pub use self::tools::{ToolConfig, ToolsConfig};

use crate::error::AppError;
use crate::result::AppResult;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    /// Conversion pipeline settings.
    #[serde(default)]
    #[validate(nested)]
    pub conversion: ConversionConfig,
    /// External tool settings.
    #[serde(default)]
    #[validate(nested)]
    pub tools: ToolsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `<dir>/default.toml` with `<dir>/<env>.toml` and environment
    /// variables prefixed with `IMGSHIFT__` (e.g. `IMGSHIFT__SERVER__PORT`).
    /// Missing files are fine; every field has a default.
    pub fn load(config_dir: &str, env: &str) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{config_dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{config_dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("IMGSHIFT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.validate()?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_files_uses_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load(&dir, "test").expect("load");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_size_bytes, 16 * 1024 * 1024);
        assert_eq!(config.conversion.default_quality, 90);
        assert_eq!(config.tools.ghostscript.command, "gs");
    }

    #[test]
    fn test_env_overlay_file_wins() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join("default.toml"),
            "[server]\nport = 7000\n[conversion]\nraster_dpi = 150\n",
        )
        .expect("write default");
        std::fs::write(temp.path().join("staging.toml"), "[server]\nport = 7100\n")
            .expect("write overlay");

        let dir = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load(&dir, "staging").expect("load");
        assert_eq!(config.server.port, 7100);
        assert_eq!(config.conversion.raster_dpi, 150);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join("default.toml"),
            "[conversion]\ndefault_quality = 250\n",
        )
        .expect("write default");

        let dir = temp.path().to_string_lossy().to_string();
        let result = AppConfig::load(&dir, "test");
        assert!(result.is_err());
    }
}
