//! The closed set of formats imgshift understands.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token map macro
// ---------------------------------------------------------------------------

macro_rules! define_format_tokens {
    ($($token:literal => $variant:ident),* $(,)?) => {
        static TOKEN_MAP: LazyLock<HashMap<&'static str, FormatId>> = LazyLock::new(|| {
            HashMap::from([$(($token, FormatId::$variant),)*])
        });
    };
}

define_format_tokens! {
    "jpg"  => Jpeg,
    "jpeg" => Jpeg,
    "jpe"  => Jpeg,
    "png"  => Png,
    "gif"  => Gif,
    "webp" => Webp,
    "tiff" => Tiff,
    "tif"  => Tiff,
    "bmp"  => Bmp,
    "svg"  => Svg,
    "heif" => Heif,
    "heic" => Heif,
    "raw"  => Raw,
    "arw"  => Raw,
    "cr2"  => Raw,
    "nef"  => Raw,
    "orf"  => Raw,
    "rw2"  => Raw,
    "dng"  => Raw,
    "eps"  => Eps,
    "psd"  => Psd,
    "ai"   => Ai,
    "pdf"  => Pdf,
    "ico"  => Ico,
    "pcx"  => Pcx,
    "jxr"  => Jxr,
    "tga"  => Tga,
    "ppm"  => Ppm,
    "xcf"  => Xcf,
    "dxf"  => Dxf,
}

/// Canonical identifier of a supported format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    /// JPEG (.jpg)
    Jpeg,
    /// Portable Network Graphics (.png)
    Png,
    /// Graphics Interchange Format (.gif)
    Gif,
    /// WebP (.webp)
    Webp,
    /// Tagged Image File Format (.tiff)
    Tiff,
    /// Windows bitmap (.bmp)
    Bmp,
    /// Scalable Vector Graphics (.svg)
    Svg,
    /// HEIF / HEIC (.heif)
    Heif,
    /// Camera RAW family (.arw, .cr2, .nef, .orf, .rw2, .dng)
    Raw,
    /// Encapsulated PostScript (.eps)
    Eps,
    /// Photoshop document (.psd)
    Psd,
    /// Adobe Illustrator (.ai)
    Ai,
    /// Portable Document Format (.pdf)
    Pdf,
    /// Windows icon (.ico)
    Ico,
    /// PC Paintbrush (.pcx)
    Pcx,
    /// JPEG XR (.jxr)
    Jxr,
    /// Truevision TGA (.tga)
    Tga,
    /// Portable pixmap (.ppm)
    Ppm,
    /// GIMP image (.xcf)
    Xcf,
    /// AutoCAD Drawing Exchange Format (.dxf)
    Dxf,
}

impl FormatId {
    /// Every format, in declaration order.
    pub const ALL: [FormatId; 20] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Webp,
        Self::Tiff,
        Self::Bmp,
        Self::Svg,
        Self::Heif,
        Self::Raw,
        Self::Eps,
        Self::Psd,
        Self::Ai,
        Self::Pdf,
        Self::Ico,
        Self::Pcx,
        Self::Jxr,
        Self::Tga,
        Self::Ppm,
        Self::Xcf,
        Self::Dxf,
    ];

    /// The formats a caller may request as `target_format`.
    pub const OUTPUTS: [FormatId; 9] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Webp,
        Self::Tiff,
        Self::Bmp,
        Self::Pdf,
        Self::Svg,
        Self::Eps,
    ];

    /// Resolve a user-supplied token such as `"JPEG"`, `".tif"` or `"nef"`.
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = token.trim().trim_start_matches('.').to_ascii_lowercase();
        TOKEN_MAP.get(normalized.as_str()).copied()
    }

    /// Resolve the extension of a filename, if it has a known one.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = std::path::Path::new(filename).extension()?.to_str()?;
        Self::from_token(ext)
    }

    /// Resolve a MIME type (parameters such as `; charset=` are ignored).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next()?.trim().to_ascii_lowercase();
        let format = match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "image/gif" => Self::Gif,
            "image/webp" => Self::Webp,
            "image/tiff" => Self::Tiff,
            "image/bmp" | "image/x-bmp" | "image/x-ms-bmp" => Self::Bmp,
            "image/svg+xml" => Self::Svg,
            "image/heif" | "image/heic" => Self::Heif,
            "image/x-dcraw" | "image/x-adobe-dng" | "image/x-canon-cr2"
            | "image/x-nikon-nef" | "image/x-sony-arw" | "image/x-olympus-orf"
            | "image/x-panasonic-rw2" => Self::Raw,
            "application/postscript" | "image/x-eps" => Self::Eps,
            "image/vnd.adobe.photoshop" | "application/x-photoshop" => Self::Psd,
            "application/illustrator" => Self::Ai,
            "application/pdf" => Self::Pdf,
            "image/x-icon" | "image/vnd.microsoft.icon" => Self::Ico,
            "image/x-pcx" | "image/vnd.zbrush.pcx" => Self::Pcx,
            "image/jxr" | "image/vnd.ms-photo" => Self::Jxr,
            "image/x-tga" | "image/x-targa" => Self::Tga,
            "image/x-portable-pixmap" => Self::Ppm,
            "image/x-xcf" => Self::Xcf,
            "image/vnd.dxf" | "application/dxf" => Self::Dxf,
            _ => return None,
        };
        Some(format)
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::Svg => "svg",
            Self::Heif => "heif",
            Self::Raw => "raw",
            Self::Eps => "eps",
            Self::Psd => "psd",
            Self::Ai => "ai",
            Self::Pdf => "pdf",
            Self::Ico => "ico",
            Self::Pcx => "pcx",
            Self::Jxr => "jxr",
            Self::Tga => "tga",
            Self::Ppm => "ppm",
            Self::Xcf => "xcf",
            Self::Dxf => "dxf",
        }
    }

    /// Canonical MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
            Self::Svg => "image/svg+xml",
            Self::Heif => "image/heif",
            Self::Raw => "image/x-dcraw",
            Self::Eps => "application/postscript",
            Self::Psd => "image/vnd.adobe.photoshop",
            Self::Ai => "application/illustrator",
            Self::Pdf => "application/pdf",
            Self::Ico => "image/x-icon",
            Self::Pcx => "image/x-pcx",
            Self::Jxr => "image/jxr",
            Self::Tga => "image/x-tga",
            Self::Ppm => "image/x-portable-pixmap",
            Self::Xcf => "image/x-xcf",
            Self::Dxf => "image/vnd.dxf",
        }
    }

    /// Whether the format is in the documented output set.
    pub fn is_output(&self) -> bool {
        Self::OUTPUTS.contains(self)
    }

    /// Whether one file of this format can hold several pages.
    pub fn supports_multiple_pages(&self) -> bool {
        matches!(self, Self::Tiff | Self::Pdf)
    }

    /// Whether the encoder keeps animation frames.
    pub fn supports_animation(&self) -> bool {
        matches!(self, Self::Gif)
    }

    /// The matching in-process codec format, for formats the `image` crate
    /// reads without help from an external tool.
    pub fn image_format(&self) -> Option<image::ImageFormat> {
        let format = match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Gif => image::ImageFormat::Gif,
            Self::Webp => image::ImageFormat::WebP,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Ico => image::ImageFormat::Ico,
            Self::Tga => image::ImageFormat::Tga,
            Self::Ppm => image::ImageFormat::Pnm,
            _ => return None,
        };
        Some(format)
    }

    /// Map an `image` crate format back to a [`FormatId`].
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        let id = match format {
            image::ImageFormat::Jpeg => Self::Jpeg,
            image::ImageFormat::Png => Self::Png,
            image::ImageFormat::Gif => Self::Gif,
            image::ImageFormat::WebP => Self::Webp,
            image::ImageFormat::Tiff => Self::Tiff,
            image::ImageFormat::Bmp => Self::Bmp,
            image::ImageFormat::Ico => Self::Ico,
            image::ImageFormat::Tga => Self::Tga,
            image::ImageFormat::Pnm => Self::Ppm,
            _ => return None,
        };
        Some(id)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
