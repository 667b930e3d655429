//! Conversion service: validates an upload, routes it, and runs the
//! pipeline.

use std::sync::Arc;

use imgshift_core::config::ConversionConfig;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::backend::Backends;
use crate::error::ConversionError;
use crate::formats::{DetectionSource, FormatId, FormatRegistry, StrategyTable};
use crate::metrics::{ConversionMetrics, MetricsSnapshot};
use crate::models::{ConversionRequest, ConversionResult, Upload};
use crate::pipeline::PipelineExecutor;

/// Entry point for conversions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ConversionService {
    registry: FormatRegistry,
    table: &'static StrategyTable,
    pipeline: PipelineExecutor,
    default_quality: u8,
    metrics: Arc<ConversionMetrics>,
}

impl ConversionService {
    /// Create a service over the given backends.
    pub fn new(config: &ConversionConfig, backends: Backends) -> Self {
        Self {
            registry: FormatRegistry,
            table: StrategyTable::global(),
            pipeline: PipelineExecutor::new(config, backends),
            default_quality: config.default_quality,
            metrics: Arc::new(ConversionMetrics::new()),
        }
    }

    /// The strategy table this service routes with.
    pub fn strategies(&self) -> &'static StrategyTable {
        self.table
    }

    /// Current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Convert an upload.
    ///
    /// Validation order: input present, source detected, parameters valid,
    /// strategy found. The first failing check decides the error.
    #[instrument(
        skip(self, upload),
        fields(
            request_id = %Uuid::new_v4(),
            filename = upload.filename.as_deref().unwrap_or_default(),
            source = tracing::field::Empty,
            target = tracing::field::Empty,
        )
    )]
    pub async fn convert(&self, upload: Upload) -> Result<ConversionResult, ConversionError> {
        let input_len = upload.data.as_ref().map_or(0, |d| d.len() as u64);
        self.metrics.record_started(input_len);

        let request = match self.validate(upload) {
            Ok(request) => request,
            Err(e) => {
                self.metrics.record_rejected();
                debug!(error = %e, "Rejected conversion request");
                return Err(e);
            }
        };

        let strategy = match self.table.lookup(request.source, request.target) {
            Ok(strategy) => *strategy,
            Err(e) => {
                self.metrics.record_rejected();
                debug!(error = %e, "No strategy for pair");
                return Err(e.into());
            }
        };

        debug!(
            capability = %strategy.capability,
            quality = request.quality,
            honors_quality = strategy.honors_quality,
            "Executing strategy"
        );

        match self.pipeline.execute(&request, &strategy).await {
            Ok(result) => {
                self.metrics
                    .record_success(result.elapsed, result.data.len() as u64);
                info!(
                    output_bytes = result.data.len(),
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "Conversion completed"
                );
                Ok(result)
            }
            Err(failure) => {
                if failure.cause.is_timeout() {
                    self.metrics.record_timeout();
                } else {
                    self.metrics.record_failure();
                }
                error!(
                    capability = %failure.strategy.capability,
                    cause = %failure.cause,
                    "Conversion backend failed"
                );
                Err(failure.into())
            }
        }
    }

    /// Steps 1-3: input presence, source detection, parameter checks.
    fn validate(&self, upload: Upload) -> Result<ConversionRequest, ConversionError> {
        let data = upload
            .data
            .filter(|d| !d.is_empty())
            .ok_or(ConversionError::MissingInput)?;

        let detection = self.registry.detect(
            upload.filename.as_deref(),
            upload.content_type.as_deref(),
            &data,
        )?;
        let span = tracing::Span::current();
        span.record("source", detection.format.extension());

        let target = parse_target(upload.target_format.as_deref())?;
        span.record("target", target.extension());

        let quality = match upload.quality.as_deref() {
            Some(raw) => parse_quality(raw)?,
            None => self.default_quality,
        };

        if detection.source != DetectionSource::Extension {
            debug!(
                detected = %detection.format,
                via = ?detection.source,
                "Source format not taken from the filename"
            );
        }

        Ok(ConversionRequest {
            data,
            source: detection.format,
            target,
            quality,
            filename: upload.filename,
        })
    }
}

/// Resolve the `target_format` field against the output allow-list.
pub fn parse_target(raw: Option<&str>) -> Result<FormatId, ConversionError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConversionError::InvalidParameter("target_format is required".into()))?;

    FormatId::from_token(raw)
        .filter(FormatId::is_output)
        .ok_or_else(|| {
            ConversionError::InvalidParameter(format!("'{raw}' is not a supported output format"))
        })
}

/// Parse the `quality` field: an integer from 1 to 100.
pub fn parse_quality(raw: &str) -> Result<u8, ConversionError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|q| (1..=100).contains(q))
        .ok_or_else(|| {
            ConversionError::InvalidParameter(format!(
                "quality must be an integer between 1 and 100, got '{raw}'"
            ))
        })
}
