use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::io::Cursor;

/// Uploads above this size get re-encoded before storage.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;
/// Longest edge after the first downsizing pass.
pub const MAX_DIMENSION: u32 = 2048;
const JPEG_QUALITY: u8 = 80;
const MIN_DIMENSION: u32 = 256;

#[derive(Debug)]
pub enum ImageProcessingError {
    InvalidFormat(String),
    DecodeError(String),
    EncodeError(String),
    StillTooLarge(String),
}

impl std::fmt::Display for ImageProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageProcessingError::InvalidFormat(err) => write!(f, "Invalid image format: {}", err),
            ImageProcessingError::DecodeError(err) => write!(f, "Image decode error: {}", err),
            ImageProcessingError::EncodeError(err) => write!(f, "Image encode error: {}", err),
            ImageProcessingError::StillTooLarge(err) => write!(f, "Image too large: {}", err),
        }
    }
}

impl std::error::Error for ImageProcessingError {}

#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// HEIC/HEIF screenshots come straight off iPhones and most decoders choke
/// on them, so they are rejected up front by declared type or file suffix.
pub fn is_heic(content_type: &str, file_name: &str) -> bool {
    let content_type = content_type.to_lowercase();
    if content_type == "image/heic" || content_type == "image/heif" {
        return true;
    }

    let file_name = file_name.to_lowercase();
    file_name.ends_with(".heic") || file_name.ends_with(".heif")
}

pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Best-effort size reduction: payloads at or under the threshold pass
/// through untouched; anything larger is re-encoded as bounded JPEG,
/// halving the dimension cap until the result fits. Refusing to fit is an
/// error, never a silent pass-through of the oversized original.
pub fn prepare_for_storage(
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<PreparedImage, ImageProcessingError> {
    if extension_for_content_type(content_type).is_none() {
        return Err(ImageProcessingError::InvalidFormat(format!(
            "Unsupported file type: {}",
            content_type
        )));
    }

    if bytes.len() <= MAX_IMAGE_BYTES {
        return Ok(PreparedImage {
            bytes,
            content_type: content_type.to_string(),
        });
    }

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| ImageProcessingError::DecodeError(e.to_string()))?;

    let mut max_dimension = MAX_DIMENSION;
    loop {
        let encoded = encode_bounded_jpeg(&decoded, max_dimension)?;
        if encoded.len() <= MAX_IMAGE_BYTES {
            return Ok(PreparedImage {
                bytes: encoded,
                content_type: "image/jpeg".to_string(),
            });
        }

        if max_dimension <= MIN_DIMENSION {
            return Err(ImageProcessingError::StillTooLarge(format!(
                "Could not reduce image below {} bytes",
                MAX_IMAGE_BYTES
            )));
        }
        max_dimension /= 2;
    }
}

/// Re-encodes as JPEG with the longest edge capped at `max_dimension`,
/// preserving aspect ratio. Alpha channels are flattened since JPEG has
/// no transparency.
pub fn encode_bounded_jpeg(
    img: &DynamicImage,
    max_dimension: u32,
) -> Result<Vec<u8>, ImageProcessingError> {
    let resized = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img.clone()
    };

    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(|e| ImageProcessingError::EncodeError(e.to_string()))?;

    Ok(out.into_inner())
}
