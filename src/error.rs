use thiserror::Error;

/// Errors that can occur while scanning an ingredients label
#[derive(Error, Debug)]
pub enum ScanError {
    /// API key missing or configuration unusable; no request is attempted
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to load configuration sources
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Failed to read the image from disk
    #[error("Failed to read image: {0}")]
    ImageRead(#[from] std::io::Error),

    /// Image is empty, undecodable, or not JPEG/PNG/WebP
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// Network error, timeout, or non-success status from the model endpoint
    #[error("Transport failure: {message}")]
    Transport {
        message: String,
        /// Response body, verbatim, when the endpoint answered
        body: Option<String>,
    },

    /// The model endpoint refused to answer for safety reasons
    #[error("Content blocked by the model: {reason}")]
    ContentBlocked { reason: String },

    /// The model reply did not contain parseable JSON
    #[error("Malformed JSON in model reply: {reason}")]
    MalformedJson { reason: String, raw: String },

    /// The model reply parsed but matches neither result shape
    #[error("Model reply does not match the result schema: {reason}")]
    SchemaMismatch { reason: String, raw: String },

    /// Builder configuration error
    #[error("Builder error: {0}")]
    Builder(String),
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key
        let err = err.without_url();
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        ScanError::Transport {
            message,
            body: None,
        }
    }
}

impl ScanError {
    /// A message suitable for showing to the person holding the camera
    pub fn user_message(&self) -> &'static str {
        match self {
            ScanError::Configuration(_) | ScanError::Config(_) => {
                "The scanner is not configured. Set GEMINI_API_KEY and try again."
            }
            ScanError::ImageRead(_) | ScanError::UnsupportedImage(_) => {
                "That image could not be used. Please submit a JPEG, PNG or WebP photo."
            }
            ScanError::Transport { .. } => {
                "Could not reach the analysis service. Please try again in a moment."
            }
            ScanError::ContentBlocked { .. } => {
                "The analysis service declined this image. Try retaking the photo, or contact support if it keeps happening."
            }
            ScanError::MalformedJson { .. } => {
                "Could not read the label clearly. Please try again with better lighting!"
            }
            ScanError::SchemaMismatch { .. } => {
                "The analysis came back incomplete. Please report this if it keeps happening."
            }
            ScanError::Builder(_) => "The scanner was called incorrectly.",
        }
    }

    /// Raw text available for inspection, if any
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ScanError::MalformedJson { raw, .. } | ScanError::SchemaMismatch { raw, .. } => {
                Some(raw)
            }
            ScanError::Transport { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
