//! Client-side image transcoding: bounded resize and WebP re-encode
//!
//! Every uploaded image goes through [`WebpTranscoder`]: decode whatever
//! raster format the file is in, turn it upright per its EXIF orientation,
//! shrink it to at most [`MAX_WIDTH`] pixels wide (never enlarge), and
//! encode lossy WebP at [`QUALITY`].

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use thiserror::Error;

use crate::storage::types::RawImage;

/// Widest image ever uploaded
pub const MAX_WIDTH: u32 = 1200;

/// Encoder quality on libwebp's 0-100 scale (0.8 of full quality)
pub const QUALITY: f32 = 80.0;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
    #[error("WebP encoding failed: {0}")]
    Encode(String),
    #[error("transcoding task failed: {0}")]
    Task(String),
}

/// Encoded output of a transcode
#[derive(Clone, Debug)]
pub struct TranscodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Turns an arbitrary raster file into the bytes that get uploaded
#[async_trait]
pub trait ImageTranscoder: Send + Sync {
    async fn compress(&self, file: &RawImage) -> Result<TranscodedImage, TranscodeError>;
}

/// The production transcoder. Decoding and encoding run on the blocking pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebpTranscoder;

impl WebpTranscoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageTranscoder for WebpTranscoder {
    async fn compress(&self, file: &RawImage) -> Result<TranscodedImage, TranscodeError> {
        let bytes = file.bytes.clone();
        tokio::task::spawn_blocking(move || compress_bytes(&bytes))
            .await
            .map_err(|e| TranscodeError::Task(e.to_string()))?
    }
}

/// Output dimensions for an input of `width` x `height`
pub fn target_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_WIDTH {
        return (width, height);
    }
    let scaled = (f64::from(height) * f64::from(MAX_WIDTH) / f64::from(width)).round();
    (MAX_WIDTH, (scaled as u32).max(1))
}

/// Synchronous transcode of encoded image bytes
pub fn compress_bytes(data: &[u8]) -> Result<TranscodedImage, TranscodeError> {
    let decoded = decode_upright(data)?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(TranscodeError::Empty);
    }

    let (target_w, target_h) = target_dimensions(width, height);
    let resized = if (target_w, target_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_w, target_h, FilterType::Lanczos3)
    };
    tracing::trace!(width, height, target_w, target_h, "resized image");

    encode_webp(&resized).map(|bytes| TranscodedImage {
        bytes,
        width: target_w,
        height: target_h,
    })
}

/// Decode and apply the EXIF orientation, so width is the displayed width
fn decode_upright(data: &[u8]) -> Result<DynamicImage, TranscodeError> {
    let mut decoder = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, TranscodeError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, QUALITY)
        .map_err(|e| TranscodeError::Encode(format!("{:?}", e)))?;

    if encoded.is_empty() {
        return Err(TranscodeError::Encode("encoder produced no data".to_string()));
    }
    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageFormat, Rgb, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Baseline JPEG with an EXIF APP1 segment holding only `Orientation`
    fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([180, 120, 60]));
        let mut plain = Vec::new();
        JpegEncoder::new_with_quality(&mut plain, 85).encode_image(&img).unwrap();

        // little-endian TIFF header, one IFD with a single SHORT entry
        let mut tiff = b"II*\0".to_vec();
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);

        let mut out = plain[..2].to_vec();
        out.extend_from_slice(&[0xff, 0xe1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&plain[2..]);
        out
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(2400, 1000), (1200, 500));
        assert_eq!(target_dimensions(1999, 1001), (1200, 601));
        assert_eq!(target_dimensions(1200, 900), (1200, 900));
        assert_eq!(target_dimensions(640, 480), (640, 480));
        assert_eq!(target_dimensions(10000, 1), (1200, 1));
    }

    #[test]
    fn test_wide_png_becomes_1200_wide_webp() {
        let out = compress_bytes(&png(2400, 1000)).unwrap();
        assert_eq!((out.width, out.height), (1200, 500));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::WebP);

        let decoded = image::load_from_memory_with_format(&out.bytes, ImageFormat::WebP).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 500));
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let out = compress_bytes(&png(300, 200)).unwrap();
        assert_eq!((out.width, out.height), (300, 200));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn test_rotated_photo_is_uploaded_upright() {
        // stored landscape, displayed portrait once rotated 90 degrees
        let out = compress_bytes(&jpeg_with_orientation(2400, 1000, 6)).unwrap();
        assert_eq!((out.width, out.height), (1000, 2400));

        let decoded = image::load_from_memory_with_format(&out.bytes, ImageFormat::WebP).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1000, 2400));
    }

    #[test]
    fn test_upright_jpeg_is_resized_as_stored() {
        let out = compress_bytes(&jpeg_with_orientation(2400, 1000, 1)).unwrap();
        assert_eq!((out.width, out.height), (1200, 500));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = compress_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, TranscodeError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transcoder_runs_off_thread() {
        let file = RawImage::new("image/png", png(1600, 1200));
        let out = WebpTranscoder::new().compress(&file).await.unwrap();
        assert_eq!((out.width, out.height), (1200, 900));
    }
}
