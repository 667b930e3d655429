//! The conversion strategy table.
//!
//! Every supported (source, target) pair maps to exactly one
//! [`StrategyDescriptor`]. Pairs absent from the table are unsupported.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;
use thiserror::Error;

use super::format::FormatId;
use FormatId::*;

/// The class of backend functionality a strategy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// In-process raster decode and encode.
    RasterCodec,
    /// Render a vector drawing to pixels.
    VectorRasterizer,
    /// Render document pages to pixels.
    DocumentRasterizer,
    /// Demosaic a camera RAW file.
    RawDecoder,
    /// Vector to vector or document re-encoding.
    VectorReencoder,
}

impl Capability {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RasterCodec => "raster_codec",
            Self::VectorRasterizer => "vector_rasterizer",
            Self::DocumentRasterizer => "document_rasterizer",
            Self::RawDecoder => "raw_decoder",
            Self::VectorReencoder => "vector_reencoder",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one (source, target) pair is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyDescriptor {
    /// Source format.
    pub source: FormatId,
    /// Target format.
    pub target: FormatId,
    /// Backend capability required.
    pub capability: Capability,
    /// Whether the `quality` parameter affects the output.
    pub honors_quality: bool,
    /// Whether animation frames survive the conversion.
    pub preserves_frames: bool,
    /// Whether the source is flattened to a PNG intermediate before decoding.
    pub flatten_to_raster: bool,
}

impl StrategyDescriptor {
    fn new(source: FormatId, target: FormatId, capability: Capability) -> Self {
        Self {
            source,
            target,
            capability,
            honors_quality: matches!(target, Jpeg | Webp),
            preserves_frames: matches!(source, Gif | Webp) && target.supports_animation(),
            flatten_to_raster: capability == Capability::RasterCodec
                && matches!(source, Heif | Psd | Pcx | Jxr | Xcf),
        }
    }
}

/// The pair is not in the table.
#[derive(Debug, Clone, Copy, Error)]
#[error("conversion from {from} to {to} is not supported")]
pub struct Unsupported {
    /// Requested source.
    pub from: FormatId,
    /// Requested target.
    pub to: FormatId,
}

/// Declarative route list: (source, capability, targets).
const ROUTES: &[(FormatId, Capability, &[FormatId])] = &[
    (Jpeg, Capability::RasterCodec, &[Png, Gif, Webp, Tiff, Bmp]),
    (Png, Capability::RasterCodec, &[Jpeg, Gif, Webp, Tiff, Bmp]),
    (Gif, Capability::RasterCodec, &[Png, Jpeg, Webp, Tiff]),
    (Webp, Capability::RasterCodec, &[Png, Jpeg, Gif, Tiff]),
    (Tiff, Capability::RasterCodec, &[Png, Jpeg, Gif, Webp, Bmp]),
    (Bmp, Capability::RasterCodec, &[Jpeg, Png, Gif, Tiff, Webp]),
    (Svg, Capability::VectorRasterizer, &[Png, Jpeg, Gif, Webp]),
    (Svg, Capability::VectorReencoder, &[Pdf]),
    (Heif, Capability::RasterCodec, &[Jpeg, Png, Webp, Tiff, Gif]),
    (Raw, Capability::RawDecoder, &[Jpeg, Png, Tiff, Bmp]),
    (Eps, Capability::VectorRasterizer, &[Jpeg, Png, Tiff]),
    (Eps, Capability::VectorReencoder, &[Svg, Pdf]),
    (Psd, Capability::RasterCodec, &[Jpeg, Png, Tiff, Gif, Webp]),
    (Ai, Capability::VectorRasterizer, &[Jpeg, Png]),
    (Ai, Capability::VectorReencoder, &[Svg, Eps, Pdf]),
    (Pdf, Capability::DocumentRasterizer, &[Jpeg, Png, Gif, Tiff]),
    (Pdf, Capability::VectorReencoder, &[Svg]),
    (Ico, Capability::RasterCodec, &[Png, Jpeg, Gif, Bmp, Tiff]),
    (Pcx, Capability::RasterCodec, &[Jpeg, Png, Tiff, Bmp, Gif]),
    (Jxr, Capability::RasterCodec, &[Jpeg, Png, Webp, Tiff]),
    (Tga, Capability::RasterCodec, &[Jpeg, Png, Tiff, Gif]),
    (Ppm, Capability::RasterCodec, &[Png, Jpeg, Tiff, Bmp]),
    (Xcf, Capability::RasterCodec, &[Jpeg, Png, Tiff, Gif, Webp]),
    (Dxf, Capability::VectorRasterizer, &[Png, Jpeg, Tiff]),
    (Dxf, Capability::VectorReencoder, &[Svg, Pdf]),
];

static GLOBAL_TABLE: LazyLock<StrategyTable> = LazyLock::new(StrategyTable::new);

/// Immutable (source, target) → strategy map.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    entries: HashMap<(FormatId, FormatId), StrategyDescriptor>,
}

impl StrategyTable {
    /// Build the table from the route list.
    pub fn new() -> Self {
        let entries = ROUTES
            .iter()
            .flat_map(|(source, capability, targets)| {
                targets.iter().map(move |target| {
                    (
                        (*source, *target),
                        StrategyDescriptor::new(*source, *target, *capability),
                    )
                })
            })
            .collect();
        Self { entries }
    }

    /// The process-wide table.
    pub fn global() -> &'static StrategyTable {
        &GLOBAL_TABLE
    }

    /// Find the strategy for a pair.
    pub fn lookup(
        &self,
        source: FormatId,
        target: FormatId,
    ) -> Result<&StrategyDescriptor, Unsupported> {
        self.entries.get(&(source, target)).ok_or(Unsupported {
            from: source,
            to: target,
        })
    }

    /// Targets reachable from `source`, in output allow-list order.
    pub fn supported_targets(&self, source: FormatId) -> Vec<FormatId> {
        FormatId::OUTPUTS
            .into_iter()
            .filter(|target| self.entries.contains_key(&(source, *target)))
            .collect()
    }

    /// Every descriptor, ordered by (source, target).
    pub fn entries(&self) -> Vec<&StrategyDescriptor> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by_key(|d| (d.source, d.target));
        all
    }

    /// Number of supported pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no pairs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size() {
        assert_eq!(StrategyTable::new().len(), 94);
    }

    #[test]
    fn test_every_source_has_routes() {
        let table = StrategyTable::global();
        for format in FormatId::ALL {
            assert!(
                !table.supported_targets(format).is_empty(),
                "{format} has no targets"
            );
        }
    }

    #[test]
    fn test_targets_are_outputs_and_never_identity() {
        for descriptor in StrategyTable::global().entries() {
            assert!(descriptor.target.is_output(), "{descriptor:?}");
            assert_ne!(descriptor.source, descriptor.target);
        }
    }

    #[test]
    fn test_input_only_formats_are_never_targets() {
        let table = StrategyTable::global();
        for source in FormatId::ALL {
            for target in [Raw, Psd, Ai, Heif, Ico, Pcx, Jxr, Tga, Ppm, Xcf, Dxf] {
                assert!(table.lookup(source, target).is_err());
            }
        }
    }

    #[test]
    fn test_capabilities() {
        let table = StrategyTable::global();
        let cap = |s, t| table.lookup(s, t).map(|d| d.capability).ok();
        assert_eq!(cap(Png, Jpeg), Some(Capability::RasterCodec));
        assert_eq!(cap(Svg, Png), Some(Capability::VectorRasterizer));
        assert_eq!(cap(Svg, Pdf), Some(Capability::VectorReencoder));
        assert_eq!(cap(Pdf, Tiff), Some(Capability::DocumentRasterizer));
        assert_eq!(cap(Pdf, Svg), Some(Capability::VectorReencoder));
        assert_eq!(cap(Raw, Bmp), Some(Capability::RawDecoder));
        assert_eq!(cap(Ai, Eps), Some(Capability::VectorReencoder));
        assert_eq!(cap(Dxf, Tiff), Some(Capability::VectorRasterizer));
        assert_eq!(cap(Gif, Bmp), None);
        assert_eq!(cap(Raw, Webp), None);
    }

    #[test]
    fn test_flags() {
        let table = StrategyTable::global();

        let d = table.lookup(Webp, Gif).expect("webp->gif");
        assert!(d.preserves_frames);
        assert!(!d.honors_quality);

        let d = table.lookup(Png, Jpeg).expect("png->jpg");
        assert!(d.honors_quality);
        assert!(!d.preserves_frames);

        let d = table.lookup(Psd, Png).expect("psd->png");
        assert!(d.flatten_to_raster);
        assert!(!d.honors_quality);

        let d = table.lookup(Png, Webp).expect("png->webp");
        assert!(d.honors_quality);
        assert!(!d.flatten_to_raster);
    }

    #[test]
    fn test_unsupported_pair() {
        let err = StrategyTable::global()
            .lookup(Jpeg, Jpeg)
            .expect_err("identity is unsupported");
        assert_eq!(err.from, Jpeg);
        assert_eq!(err.to, Jpeg);
        assert!(err.to_string().contains("jpg"));
    }

    #[test]
    fn test_supported_targets_order() {
        let targets = StrategyTable::global().supported_targets(Ai);
        assert_eq!(targets, vec![Jpeg, Png, Pdf, Svg, Eps]);
    }
}
