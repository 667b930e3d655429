//! In-process raster codec backed by the `image` crate, with `webp` and
//! `tiff` for lossy WebP and LZW TIFF output.

use std::io::Cursor;

use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPDecoder;
use image::{
    AnimationDecoder, DynamicImage, Frame, ImageDecoder, ImageFormat, ImageReader, Limits,
    RgbImage,
};
use tiff::encoder::compression::Lzw;
use tiff::encoder::{TiffEncoder, colortype};

use super::{BackendResult, DecodeLimits, EncodeOptions, RasterCodec, RasterImage};
use crate::error::BackendCause;
use crate::formats::{Capability, FormatId};

/// Decodes and encodes rasters in-process.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    limits: DecodeLimits,
}

impl ImageCodec {
    /// Create a codec with the given decoder bounds.
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    fn image_limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.limits.max_dimension);
        limits.max_image_height = Some(self.limits.max_dimension);
        limits.max_alloc = Some(self.limits.max_alloc_bytes);
        limits
    }

    fn decode_frames(&self, data: &[u8], format: ImageFormat) -> BackendResult<Option<Vec<Frame>>> {
        let frames = match format {
            ImageFormat::Gif => {
                let mut decoder = GifDecoder::new(Cursor::new(data))?;
                decoder.set_limits(self.image_limits())?;
                decoder.into_frames().collect_frames()?
            }
            ImageFormat::WebP => {
                let mut decoder = WebPDecoder::new(Cursor::new(data))?;
                if !decoder.has_animation() {
                    return Ok(None);
                }
                decoder.set_limits(self.image_limits())?;
                decoder.into_frames().collect_frames()?
            }
            _ => return Ok(None),
        };
        Ok((frames.len() > 1).then_some(frames))
    }
}

impl RasterCodec for ImageCodec {
    fn decode(
        &self,
        data: &[u8],
        hint: Option<FormatId>,
        keep_frames: bool,
    ) -> BackendResult<RasterImage> {
        let mut reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        if reader.format().is_none() {
            if let Some(format) = hint.and_then(|h| h.image_format()) {
                reader.set_format(format);
            }
        }

        if keep_frames {
            if let Some(format) = reader.format() {
                if let Some(frames) = self.decode_frames(data, format)? {
                    return Ok(RasterImage::Animated(frames));
                }
            }
        }

        reader.limits(self.image_limits());
        Ok(RasterImage::Still(reader.decode()?))
    }

    fn encode(
        &self,
        image: &RasterImage,
        target: FormatId,
        options: EncodeOptions,
    ) -> BackendResult<Vec<u8>> {
        let mut buf = Vec::new();

        match target {
            FormatId::Jpeg => {
                let rgb = flatten_onto_white(&image.first());
                let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.clamp(1, 100));
                DynamicImage::ImageRgb8(rgb).write_with_encoder(encoder)?;
            }
            FormatId::Png => {
                let encoder =
                    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
                normalize(&image.first()).write_with_encoder(encoder)?;
            }
            FormatId::Gif => {
                let mut encoder = GifEncoder::new(&mut buf);
                match image {
                    RasterImage::Animated(frames) if options.keep_frames => {
                        encoder.set_repeat(Repeat::Infinite)?;
                        encoder.encode_frames(frames.iter().cloned())?;
                    }
                    _ => encoder.encode_frame(Frame::new(image.first().to_rgba8()))?,
                }
            }
            FormatId::Webp => {
                buf = encode_webp(&image.first(), options.quality.clamp(1, 100))?;
            }
            FormatId::Tiff => {
                encode_tiff(&image.first(), &mut buf)?;
            }
            FormatId::Bmp => {
                normalize(&image.first()).write_with_encoder(BmpEncoder::new(&mut buf))?;
            }
            other => {
                return Err(BackendCause::NoRoute {
                    capability: Capability::RasterCodec,
                    format: other,
                });
            }
        }

        Ok(buf)
    }
}

/// 8-bit RGB or RGBA, which every encoder here accepts.
fn normalize(image: &DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        DynamicImage::ImageRgba8(image.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Lossy WebP at the given quality, keeping alpha when present.
fn encode_webp(image: &DynamicImage, quality: u8) -> BackendResult<Vec<u8>> {
    let (width, height) = (image.width(), image.height());
    let rgba;
    let rgb;
    let encoder = if image.color().has_alpha() {
        rgba = image.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height)
    } else {
        rgb = image.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height)
    };
    let memory = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| BackendCause::Webp(format!("{e:?}")))?;
    Ok(memory.to_vec())
}

/// LZW-compressed TIFF, RGBA when the source has alpha.
fn encode_tiff(image: &DynamicImage, buf: &mut Vec<u8>) -> BackendResult<()> {
    let (width, height) = (image.width(), image.height());
    let mut encoder = TiffEncoder::new(Cursor::new(buf))?;
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        encoder.write_image_with_compression::<colortype::RGBA8, _>(
            width,
            height,
            Lzw::default(),
            rgba.as_raw(),
        )?;
    } else {
        let rgb = image.to_rgb8();
        encoder.write_image_with_compression::<colortype::RGB8, _>(
            width,
            height,
            Lzw::default(),
            rgb.as_raw(),
        )?;
    }
    Ok(())
}

/// Composite any alpha channel over a white background.
fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
