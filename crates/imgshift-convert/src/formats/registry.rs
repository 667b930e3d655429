//! Source format detection.
//!
//! Detection order:
//! 1. the extension of the uploaded filename,
//! 2. magic-byte sniffing of the payload,
//! 3. the MIME type declared by the client for the upload part.
//!
//! The extension wins when it disagrees with the content. A renamed file is
//! therefore routed by its name; the codec paths still decode by content,
//! so a PNG named `photo.jpg` converts fine while an SVG named `photo.jpg`
//! fails in the backend.

use thiserror::Error;

use super::format::FormatId;

/// How many leading bytes the text-based sniffers inspect.
const TEXT_SNIFF_WINDOW: usize = 4096;

/// HEIF `ftyp` major/compatible brands.
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];

/// Which signal produced the detected format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// The upload's filename extension.
    Extension,
    /// Magic bytes of the payload.
    Content,
    /// The client-declared MIME type.
    DeclaredType,
}

/// A successful detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The detected format.
    pub format: FormatId,
    /// The signal it came from.
    pub source: DetectionSource,
}

/// No signal identified a supported format.
#[derive(Debug, Clone, Error)]
#[error("could not detect the format of '{}'", filename.as_deref().unwrap_or("<unnamed>"))]
pub struct Unrecognized {
    /// The filename that was offered, if any.
    pub filename: Option<String>,
}

/// Stateless detector mapping uploads to [`FormatId`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatRegistry;

impl FormatRegistry {
    /// Detect the source format of an upload.
    pub fn detect(
        &self,
        filename: Option<&str>,
        declared_hint: Option<&str>,
        data: &[u8],
    ) -> Result<Detection, Unrecognized> {
        let sniffed = sniff(data);

        if let Some(format) = filename.and_then(FormatId::from_filename) {
            if let Some(content) = sniffed.filter(|c| *c != format) {
                tracing::debug!(
                    filename = filename.unwrap_or_default(),
                    extension_format = %format,
                    content_format = %content,
                    "Extension and content disagree, extension wins"
                );
            }
            return Ok(Detection {
                format,
                source: DetectionSource::Extension,
            });
        }

        if let Some(format) = sniffed {
            return Ok(Detection {
                format,
                source: DetectionSource::Content,
            });
        }

        if let Some(format) = declared_hint.and_then(FormatId::from_mime) {
            return Ok(Detection {
                format,
                source: DetectionSource::DeclaredType,
            });
        }

        Err(Unrecognized {
            filename: filename.map(str::to_string),
        })
    }
}

/// Identify a payload by its leading bytes.
pub fn sniff(data: &[u8]) -> Option<FormatId> {
    if data.is_empty() {
        return None;
    }

    if let Some(format) = sniff_binary_signature(data) {
        return Some(format);
    }

    if let Some(format) = image::guess_format(data)
        .ok()
        .and_then(FormatId::from_image_format)
    {
        return Some(format);
    }

    if is_pcx(data) {
        return Some(FormatId::Pcx);
    }

    sniff_text(data)
}

fn sniff_binary_signature(data: &[u8]) -> Option<FormatId> {
    if data.starts_with(b"%PDF-") {
        return Some(FormatId::Pdf);
    }
    if data.starts_with(&[0xC5, 0xD0, 0xD3, 0xC6]) {
        // DOS EPS binary header wrapping PostScript + preview.
        return Some(FormatId::Eps);
    }
    if data.starts_with(b"%!PS") {
        return Some(postscript_flavor(data));
    }
    if data.starts_with(b"8BPS") {
        return Some(FormatId::Psd);
    }
    if data.starts_with(b"gimp xcf") {
        return Some(FormatId::Xcf);
    }
    if data.starts_with(&[0x49, 0x49, 0xBC, 0x01]) {
        return Some(FormatId::Jxr);
    }
    if is_heif(data) {
        return Some(FormatId::Heif);
    }
    if is_tiff_based_raw(data) {
        return Some(FormatId::Raw);
    }
    if data.starts_with(b"AutoCAD Binary DXF") {
        return Some(FormatId::Dxf);
    }
    None
}

fn postscript_flavor(data: &[u8]) -> FormatId {
    let head = &data[..data.len().min(TEXT_SNIFF_WINDOW)];
    if contains(head, b"Adobe Illustrator") {
        FormatId::Ai
    } else {
        FormatId::Eps
    }
}

fn is_heif(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }
    let box_len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let end = box_len.clamp(12, data.len());
    data[8..end]
        .chunks_exact(4)
        .any(|brand| HEIF_BRANDS.iter().any(|b| b.as_slice() == brand))
}

fn is_tiff_based_raw(data: &[u8]) -> bool {
    // Canon CR2: little-endian TIFF with "CR" at offset 8.
    if data.len() >= 10 && data.starts_with(b"II*\0") && &data[8..10] == b"CR" {
        return true;
    }
    // Olympus ORF and Panasonic RW2 use their own TIFF magic numbers.
    data.starts_with(b"IIRO") || data.starts_with(b"IIRS") || data.starts_with(b"IIU\0")
}

fn is_pcx(data: &[u8]) -> bool {
    data.len() >= 128 && data[0] == 0x0A && matches!(data[1], 0 | 2 | 3 | 4 | 5) && data[2] <= 1
}

fn sniff_text(data: &[u8]) -> Option<FormatId> {
    let head = &data[..data.len().min(TEXT_SNIFF_WINDOW)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();

    if trimmed.starts_with('<') && trimmed.contains("<svg") {
        return Some(FormatId::Svg);
    }

    let mut lines = trimmed.lines().map(str::trim);
    if lines.next() == Some("0") && lines.next() == Some("SECTION") {
        return Some(FormatId::Dxf);
    }

    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
