use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use std::fmt;
use std::path::Path;

use crate::error::ScanError;

/// Represents the source of a label photo
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image from a file path
    Path(String),
    /// Image as base64-encoded data
    Base64(String),
    /// Image already in memory (camera capture, upload)
    Bytes(Vec<u8>),
}

/// Raster formats the model endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
    Webp,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Identify the format from the file's magic bytes
    pub fn sniff(data: &[u8]) -> Result<Self, ScanError> {
        let kind = infer::get(data).ok_or_else(|| {
            ScanError::UnsupportedImage("could not recognise the image format".to_string())
        })?;

        match kind.mime_type() {
            "image/jpeg" => Ok(ImageMime::Jpeg),
            "image/png" => Ok(ImageMime::Png),
            "image/webp" => Ok(ImageMime::Webp),
            other => Err(ScanError::UnsupportedImage(format!(
                "{} is not supported, use JPEG, PNG or WebP",
                other
            ))),
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded photo ready to be sent to the model
#[derive(Clone)]
pub struct LabelImage {
    mime: ImageMime,
    data: Vec<u8>,
}

impl fmt::Debug for LabelImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelImage")
            .field("mime", &self.mime)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl LabelImage {
    /// Wrap raw bytes, detecting the MIME type
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ScanError> {
        if data.is_empty() {
            return Err(ScanError::UnsupportedImage("image is empty".to_string()));
        }
        let mime = ImageMime::sniff(&data)?;
        Ok(Self { mime, data })
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Standard base64 encoding of the image bytes, as the wire format expects
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

impl ImageSource {
    /// Load and validate the image behind this source
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The base64 data does not decode
    /// - The bytes are not a JPEG, PNG or WebP image
    pub async fn load(&self) -> Result<LabelImage, ScanError> {
        let data = match self {
            ImageSource::Path(path) => read_file(Path::new(path)).await?,
            ImageSource::Base64(encoded) => decode_base64(encoded)?,
            ImageSource::Bytes(bytes) => bytes.clone(),
        };

        let image = LabelImage::from_bytes(data)?;
        debug!("Loaded {} image ({} bytes)", image.mime(), image.len());
        Ok(image)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ScanError> {
    Ok(tokio::fs::read(path).await?)
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, ScanError> {
    // Accept data URLs as produced by browser uploads
    let payload = match encoded.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => encoded,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ScanError::UnsupportedImage(format!("invalid base64 image data: {}", e)))
}
